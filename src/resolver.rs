use std::ffi::CString ;
use std::sync::Arc ;
use thiserror::Error ;

use crate::abi::{ cast_function, GetProcAddrFn, ResultCode, VoidFunction };
use crate::library::RuntimeLibrary ;
use crate::SessionHandle ;



/// An entry point could not be resolved through the runtime.
#[derive( Debug, Error )]
pub enum ResolveError {
    /// The entry point name contains an interior nul byte.
    #[error( "Invalid Entry Point Name: {0:?}" )] InvalidName( String ),
    /// The runtime's `get_proc_addr` returned a failure code.
    #[error( "Runtime failed to resolve {name}: {code}" )] Failed { name: String, code: ResultCode },
    /// The runtime reported success but produced no function.
    #[error( "Runtime returned no function for {0}" )] Missing( String ),
}

/// The runtime's primary entry-point resolver, returned by negotiation.
///
/// Every entry point other than the handshake itself is obtained through this.
/// A resolver keeps the runtime's library open: the library is closed only
/// once the runtime and every clone of its resolver are gone.
#[derive( Clone )]
pub struct ProcAddrResolver {
    get_proc_addr: GetProcAddrFn,
    _library: Arc<dyn RuntimeLibrary>,
}

impl ProcAddrResolver {

    pub(crate) fn new( get_proc_addr: GetProcAddrFn, library: Arc<dyn RuntimeLibrary> ) -> Self {
        Self { get_proc_addr, _library: library }
    }

    /// The raw `get_proc_addr` function, for forwarding to callers that resolve
    /// entry points themselves. It is only valid while this resolver (or a clone
    /// of it) is alive.
    pub fn raw( &self ) -> GetProcAddrFn { self.get_proc_addr }

    /// Resolves `name` in the context of `session` (or [`SessionHandle::NULL`]
    /// for session-independent entry points).
    ///
    /// # Errors
    /// Fails if the name is not a valid C string, the runtime returns a failure
    /// code, or the runtime returns a null function.
    pub fn resolve( &self, session: SessionHandle, name: &str ) -> Result<VoidFunction, ResolveError> {
        let c_name = CString::new( name ).map_err(|_| ResolveError::InvalidName( name.to_string() ))?;
        let mut function: Option<VoidFunction> = None ;
        // SAFETY: the pointer was validated as non-null during negotiation and
        // `self._library` keeps the code it points into mapped.
        let code = unsafe { ( self.get_proc_addr )( session, c_name.as_ptr(), &mut function )};
        if !code.is_success() { return Err( ResolveError::Failed { name: name.to_string(), code })}
        function.ok_or_else(|| ResolveError::Missing( name.to_string() ))
    }

    /// Resolves `name` and reinterprets it as the function pointer type `F`.
    ///
    /// # Safety
    /// `F` must be an `extern "C"` function pointer type matching the runtime's
    /// actual signature for `name`.
    ///
    /// # Errors
    /// See [`resolve`]( Self::resolve ).
    pub unsafe fn resolve_as<F: Copy>( &self, session: SessionHandle, name: &str ) -> Result<F, ResolveError> {
        let function = self.resolve( session, name )?;
        // SAFETY: forwarded to the caller.
        Ok( unsafe { cast_function::<F>( function )})
    }

}

impl std::fmt::Debug for ProcAddrResolver {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "ProcAddrResolver" )
            .field( "get_proc_addr", &( self.get_proc_addr as *const () ))
            .finish_non_exhaustive()
    }
}
