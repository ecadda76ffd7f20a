//! The negotiation and dispatch core of an API loader.
//!
//! An application links against the loader, not against any particular
//! implementation of the API. At startup the loader picks one **runtime** out of
//! a list of candidate dynamic libraries, agrees with it on an interface and API
//! version, and from then on routes every call straight to the function
//! pointers that runtime hands out. `runtime_link` is the part of the loader that
//! does the picking, the agreeing and the routing.
//!
//! # Core Concepts
//!
//! - [`CandidateDescriptor`]: Where a candidate runtime's library lives and how its
//! 	exports are named. Descriptors come from a [`CandidateSource`]; finding them
//! 	(manifest files, environment overrides) is up to the caller.
//!
//! - **Negotiation**: A fixed-shape handshake through the library's
//! 	`negotiate_loader_runtime_interface` export. The loader offers version ranges
//! 	([`NegotiationConfig`]), the runtime answers with its picks and a
//! 	`get_proc_addr` function. The answer is validated field by field before any
//! 	pointer in it is trusted. The wire structs live in [`abi`].
//!
//! - [`Broker`]: Process-scoped state that selects exactly one runtime. The
//! 	first candidate that negotiates wins; the ones before it are reported back as
//! 	[`RejectedCandidate`]s, the ones after it are never opened. Concurrent
//! 	callers racing to select get the same runtime.
//!
//! - [`Runtime`]: The selected runtime. It owns the [`ProcAddrResolver`], the
//! 	[`ExtensionSet`] advertised at selection time, and the registry of
//! 	per-session dispatch tables. The resolver shares ownership of the library,
//! 	so the library stays open while any clone of it is alive.
//!
//! - [`DispatchTable`]: The typed entry points of one session, built when the
//! 	session is created and dropped when it is destroyed. A session whose table
//! 	cannot be built is destroyed again before creation reports the failure.
//!
//! - [`LoaderInit`]: One-time storage for the platform init payload some
//! 	platforms require before any runtime may be negotiated with.
//!
//! # Example
//!
//! ```no_run
//! use runtime_link::{ Broker, CandidateDescriptor, ExtensionProperty, SessionHandle };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let candidates = vec![
//! 	CandidateDescriptor::new( "/opt/vendor/libvendor_runtime.so" ).with_function_prefix( "vendor_" ),
//! 	CandidateDescriptor::new( "/usr/lib/libfallback_runtime.so" ),
//! ];
//!
//! // Skipped candidates come back alongside the selection.
//! let ( selection, skipped ) = Broker::global().load_runtime( "create_session", &candidates )?;
//! for candidate in &skipped { eprintln!( "{}", candidate ); }
//! let runtime = selection.into_runtime();
//!
//! // The runtime is authoritative on extension versions.
//! let extensions = runtime.extension_properties([ ExtensionProperty::new( "EXT_debug_utils", 1 )]);
//! # let _ = extensions ;
//!
//! // SAFETY: this runtime accepts a null creation struct.
//! let session = unsafe { runtime.create_session( std::ptr::null() )? };
//! let table = runtime.lookup( session ).expect( "session was just created" );
//! # let _ = table ;
//! runtime.destroy_session( session );
//! assert!( runtime.lookup( session ).is_none() );
//! runtime.destroy_session( SessionHandle::NULL );
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//!
//! Calls into a runtime are opaque. There is no timeout or cancellation: a
//! runtime that never returns blocks the calling thread indefinitely. No loader
//! lock is held during such a call, so lookups from other threads keep working.

pub mod abi ;
mod broker ;
mod candidate ;
mod dispatch_table ;
mod extension ;
mod handle ;
mod library ;
mod loader_init ;
mod negotiation ;
mod registry ;
mod resolver ;
mod runtime ;
mod utils ;
mod version ;

pub use broker::{ Broker, RejectedCandidate, Selection, SelectionError };
pub use candidate::{ CandidateDescriptor, CandidateSource, DiscoveryError };
pub use dispatch_table::{ CoreDispatchTable, DispatchTable, PopulateError };
pub use extension::{ merge_extensions, ExtensionProperty, ExtensionSet };
pub use handle::{ AuxHandle, SessionHandle };
pub use library::{ Dylib, DylibLoader, LibraryError, LibraryLoader, RuntimeLibrary };
pub use loader_init::{ InitError, InitRequirement, LoaderInit };
pub use negotiation::{ IncompatibleVersion, MalformedResponse, NegotiationConfig, NegotiationError };
pub use registry::HandleRegistry ;
pub use resolver::{ ProcAddrResolver, ResolveError };
pub use runtime::{ Runtime, SessionError };
pub use utils::PartialSuccess ;
pub use version::ApiVersion ;
