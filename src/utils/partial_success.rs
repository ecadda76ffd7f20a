//! Outcomes that can succeed with casualties.

/// A success, plus the failures of parts that were skipped on the way to it.
///
/// Runtime selection returns the selected runtime together with every candidate
/// that was tried and rejected before it.
pub type PartialSuccess<T, E> = ( T, Vec<E> );
