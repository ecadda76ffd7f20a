//! Per-session dispatch tables.
//!
//! A dispatch table holds the typed entry points one session's calls are routed
//! through. Filling the individual fields is the job of a [`DispatchTable`]
//! implementation; the loader only decides when a table is built and who owns it.

use thiserror::Error ;

use crate::abi::{ entry_points, DestroySessionFn, GetProcAddrFn };
use crate::resolver::{ ProcAddrResolver, ResolveError };
use crate::SessionHandle ;



/// Building a dispatch table failed. Population is all-or-nothing.
#[derive( Debug, Error )]
pub enum PopulateError {
    /// A required entry point could not be resolved.
    #[error( "Entry Point Unavailable: {0}" )] EntryPoint( #[from] ResolveError ),
    /// The implementation refused the session for another reason.
    #[error( "Population Rejected: {0}" )] Rejected( String ),
}

/// A typed set of entry points resolved for one session.
///
/// Implementations resolve every field they need through `resolver` and either
/// return a complete table or an error; a partially filled table must never
/// escape `populate`.
pub trait DispatchTable: Send + Sync + Sized + 'static {
    /// Resolves the table for `session`.
    ///
    /// # Errors
    /// Any failure aborts session creation; the loader then destroys the
    /// runtime-side session.
    fn populate( session: SessionHandle, resolver: &ProcAddrResolver ) -> Result<Self, PopulateError> ;
}

/// The entry points the loader itself routes through.
#[derive( Copy, Clone )]
pub struct CoreDispatchTable {
    pub get_proc_addr: GetProcAddrFn,
    pub destroy_session: DestroySessionFn,
}

impl DispatchTable for CoreDispatchTable {
    fn populate( session: SessionHandle, resolver: &ProcAddrResolver ) -> Result<Self, PopulateError> {
        // SAFETY: the names resolve to the signatures declared in `abi`.
        unsafe {
            Ok( Self {
                get_proc_addr: resolver.resolve_as( session, entry_points::GET_PROC_ADDR )?,
                destroy_session: resolver.resolve_as( session, entry_points::DESTROY_SESSION )?,
            })
        }
    }
}

impl std::fmt::Debug for CoreDispatchTable {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "CoreDispatchTable" )
            .field( "get_proc_addr", &( self.get_proc_addr as *const () ))
            .field( "destroy_session", &( self.destroy_session as *const () ))
            .finish()
    }
}
