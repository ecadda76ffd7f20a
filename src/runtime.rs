//! The selected runtime.
//!
//! A [`Runtime`] owns the negotiated library, its entry-point resolver, the
//! extensions it advertised and the registry of per-session dispatch tables.
//! It is created by [`Broker::load_runtime`]( crate::Broker::load_runtime )
//! and torn down when the last reference to it is dropped after
//! [`Broker::unload`]( crate::Broker::unload ).
//!
//! Calls into the runtime are opaque and may block indefinitely; no loader lock
//! is held while one is in progress.

use std::ffi::c_void ;
use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use thiserror::Error ;

use crate::abi::{
    entry_points, CreateSessionFn, DestroySessionFn, EnumerateExtensionPropertiesFn,
    RawExtensionProperties, ResultCode, VoidFunction,
};
use crate::dispatch_table::{ CoreDispatchTable, DispatchTable, PopulateError };
use crate::extension::{ merge_extensions, ExtensionProperty, ExtensionSet };
use crate::negotiation::Negotiated ;
use crate::registry::HandleRegistry ;
use crate::resolver::{ ProcAddrResolver, ResolveError };
use crate::{ ApiVersion, AuxHandle, CandidateDescriptor, SessionHandle };



/// Session creation failed. No dispatch table was registered.
#[derive( Debug, Error )]
pub enum SessionError {
    /// A runtime entry point needed for the operation could not be resolved.
    #[error( "Entry Point Unavailable: {0}" )] EntryPoint( #[from] ResolveError ),
    /// The runtime's `create_session` returned a failure code.
    #[error( "Session Create Failed: {0}" )] SessionCreateFailed( ResultCode ),
    /// The session was created but its dispatch table could not be built; the
    /// runtime-side session has been destroyed again.
    #[error( "Dispatch Population Failed for session {rolled_back}: {source}" )]
    DispatchPopulationFailed { rolled_back: SessionHandle, source: PopulateError },
}

#[derive( Debug, Error )]
enum ExtensionQueryError {
    #[error( "{0}" )] EntryPoint( #[from] ResolveError ),
    #[error( "enumerate_extension_properties returned {0}" )] Failed( ResultCode ),
}

/// The loaded, negotiated runtime. At most one is published per broker.
///
/// The runtime's library stays open for as long as the runtime or any clone of
/// its [`ProcAddrResolver`] is alive.
pub struct Runtime<T: DispatchTable = CoreDispatchTable> {
    registry: HandleRegistry<T>,
    extensions: ExtensionSet,
    interface_version: u32,
    api_version: ApiVersion,
    library_path: PathBuf,
    // Declared last so the library is released only after every table.
    resolver: ProcAddrResolver,
}

impl<T: DispatchTable> Runtime<T> {

    pub(crate) fn new(
        command: &str,
        descriptor: &CandidateDescriptor,
        negotiated: Negotiated,
    ) -> Self {

        let extensions = match query_extensions( &negotiated.resolver ) {
            Ok( properties ) => ExtensionSet::new( properties ),
            Err( err ) => {
                tracing::warn!(
                    command,
                    library = %descriptor.library_path().display(),
                    error = %err,
                    "runtime did not report its extensions"
                );
                ExtensionSet::default()
            }
        };

        Self {
            registry: HandleRegistry::new(),
            extensions,
            interface_version: negotiated.interface_version,
            api_version: negotiated.api_version,
            library_path: descriptor.library_path().to_path_buf(),
            resolver: negotiated.resolver,
        }

    }

    /// The library this runtime was loaded from.
    #[inline] pub fn library_path( &self ) -> &Path { &self.library_path }

    /// The negotiated loader/runtime interface version.
    #[inline] pub fn interface_version( &self ) -> u32 { self.interface_version }

    /// The negotiated API version.
    #[inline] pub fn api_version( &self ) -> ApiVersion { self.api_version }

    /// The runtime's entry-point resolver. A clone keeps the library open.
    #[inline] pub fn resolver( &self ) -> &ProcAddrResolver { &self.resolver }

    /// The extensions the runtime advertised when it was selected.
    #[inline] pub fn extensions( &self ) -> &ExtensionSet { &self.extensions }

    pub fn supports_extension( &self, name: &str ) -> bool { self.extensions.contains( name ) }

    /// Merges the runtime's extensions into `known`; see [`merge_extensions`].
    pub fn extension_properties( &self, known: impl IntoIterator<Item = ExtensionProperty> ) -> Vec<ExtensionProperty> {
        merge_extensions( known, self.extensions.properties() )
    }

    /// Resolves an entry point through the runtime.
    ///
    /// # Errors
    /// See [`ProcAddrResolver::resolve`].
    pub fn get_proc_addr( &self, session: SessionHandle, name: &str ) -> Result<VoidFunction, ResolveError> {
        self.resolver.resolve( session, name )
    }

    /// Creates a session and registers its dispatch table.
    ///
    /// If the runtime creates the session but its dispatch table cannot be
    /// built, the session is destroyed again before the error is returned, so
    /// the caller never sees a half-created session.
    ///
    /// # Safety
    /// `create_info` is forwarded untouched; it must be whatever the runtime's
    /// `create_session` expects, typically a valid pointer to a creation struct.
    ///
    /// # Errors
    /// - [`SessionError::EntryPoint`] if `create_session` cannot be resolved.
    /// - [`SessionError::SessionCreateFailed`] with the runtime's code, verbatim.
    /// - [`SessionError::DispatchPopulationFailed`] after rolling the session back.
    pub unsafe fn create_session( &self, create_info: *const c_void ) -> Result<SessionHandle, SessionError> {

        // SAFETY: the name resolves to the signature declared in `abi`.
        let create = unsafe { self.resolver.resolve_as::<CreateSessionFn>( SessionHandle::NULL, entry_points::CREATE_SESSION )? };

        let mut session = SessionHandle::NULL ;
        // SAFETY: `create_info` is the caller's responsibility; `session` is live.
        let code = unsafe { create( create_info, &mut session )};
        if !code.is_success() { return Err( SessionError::SessionCreateFailed( code ))}
        if session.is_null() {
            tracing::error!( command = "create_session", "runtime reported success but returned a null session" );
            return Err( SessionError::SessionCreateFailed( ResultCode::ERROR_RUNTIME_FAILURE ));
        }

        match T::populate( session, &self.resolver ) {
            Ok( table ) => {
                self.registry.insert( session, table );
                Ok( session )
            }
            Err( source ) => {
                tracing::warn!(
                    command = "create_session",
                    %session,
                    error = %source,
                    "failed to populate dispatch table, destroying session"
                );
                self.destroy_runtime_session( session );
                Err( SessionError::DispatchPopulationFailed { rolled_back: session, source })
            }
        }

    }

    /// Destroys a session. A null handle is a no-op.
    ///
    /// The dispatch table is unregistered before the runtime is called, so no
    /// lookup can observe a session that is being torn down. Runtime-side
    /// failures are logged, never returned.
    pub fn destroy_session( &self, session: SessionHandle ) {
        if session.is_null() { return }
        self.registry.remove( session );
        self.destroy_runtime_session( session );
    }

    fn destroy_runtime_session( &self, session: SessionHandle ) {
        // SAFETY: the name resolves to the signature declared in `abi`.
        let destroy = match unsafe { self.resolver.resolve_as::<DestroySessionFn>( session, entry_points::DESTROY_SESSION )} {
            Ok( destroy ) => destroy,
            Err( err ) => {
                tracing::warn!( command = "destroy_session", %session, error = %err, "cannot destroy session" );
                return
            }
        };
        // SAFETY: `session` was produced by this runtime's `create_session`.
        let code = unsafe { destroy( session )};
        if !code.is_success() {
            tracing::warn!( command = "destroy_session", %session, %code, "runtime failed to destroy session" );
        }
    }

    /// The dispatch table of a live session.
    pub fn lookup( &self, session: SessionHandle ) -> Option<Arc<T>> { self.registry.lookup( session )}

    /// Number of live sessions.
    pub fn session_count( &self ) -> usize { self.registry.session_count() }

    /// Associates an auxiliary handle with the session that owns it.
    pub fn track_aux( &self, aux: AuxHandle, session: SessionHandle ) -> bool { self.registry.track_aux( aux, session )}

    /// Removes an auxiliary handle's association. Null and unknown handles are ignored.
    pub fn forget_aux( &self, aux: AuxHandle ) { self.registry.forget_aux( aux )}

    /// The dispatch table of the session owning `aux`.
    pub fn lookup_via_aux( &self, aux: AuxHandle ) -> Option<Arc<T>> { self.registry.lookup_via_aux( aux )}

}

impl<T: DispatchTable> Drop for Runtime<T> {
    fn drop( &mut self ) {
        tracing::info!( command = "destroy_runtime", library = %self.library_path.display(), "runtime being destroyed" );
        self.registry.clear();
    }
}

impl<T: DispatchTable> std::fmt::Debug for Runtime<T> {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "Runtime" )
            .field( "library_path", &self.library_path )
            .field( "interface_version", &self.interface_version )
            .field( "api_version", &self.api_version )
            .field( "extensions", &self.extensions )
            .field( "sessions", &self.registry.session_count() )
            .finish_non_exhaustive()
    }
}

/// Two-call enumeration of the runtime's extensions.
fn query_extensions( resolver: &ProcAddrResolver ) -> Result<Vec<ExtensionProperty>, ExtensionQueryError> {

    // SAFETY: the name resolves to the signature declared in `abi`.
    let enumerate = unsafe {
        resolver.resolve_as::<EnumerateExtensionPropertiesFn>( SessionHandle::NULL, entry_points::ENUMERATE_EXTENSION_PROPERTIES )?
    };

    let mut count = 0u32 ;
    // SAFETY: a zero capacity with a null buffer asks only for the count.
    let code = unsafe { enumerate( std::ptr::null(), 0, &mut count, std::ptr::null_mut() )};
    if !code.is_success() { return Err( ExtensionQueryError::Failed( code ))}
    if count == 0 { return Ok( Vec::new() )}

    let mut raw = vec![ RawExtensionProperties::empty(); count as usize ];
    // SAFETY: `raw` holds exactly `count` initialised slots.
    let code = unsafe { enumerate( std::ptr::null(), count, &mut count, raw.as_mut_ptr() )};
    if !code.is_success() { return Err( ExtensionQueryError::Failed( code ))}
    raw.truncate( count as usize );

    Ok( raw.iter().map( ExtensionProperty::from ).collect() )

}
