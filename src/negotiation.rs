//! The loader/runtime handshake.
//!
//! Each candidate library exports a negotiate entry point. The loader sends the
//! interface and API version ranges it supports, the runtime answers with the
//! versions it picked and its `get_proc_addr`. Nothing the runtime returns is
//! trusted until the whole response has been validated.

use std::sync::Arc ;
use thiserror::Error ;

use crate::abi::{
    cast_function, entry_points, InitializeLoaderFn, InterfaceStructType, NegotiateFn,
    NegotiateLoaderInfo, NegotiateRuntimeRequest, ResultCode,
    CURRENT_LOADER_RUNTIME_VERSION, LOADER_INFO_STRUCT_VERSION, RUNTIME_INFO_STRUCT_VERSION,
};
use crate::library::{ LibraryError, RuntimeLibrary };
use crate::loader_init::LoaderInit ;
use crate::resolver::ProcAddrResolver ;
use crate::{ ApiVersion, CandidateDescriptor };



/// The version ranges this loader offers during negotiation.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct NegotiationConfig {
    min_interface_version: u32,
    max_interface_version: u32,
    min_api_version: ApiVersion,
    max_api_version: ApiVersion,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            min_interface_version: 1,
            max_interface_version: CURRENT_LOADER_RUNTIME_VERSION,
            min_api_version: ApiVersion::new( 1, 0, 0 ),
            max_api_version: ApiVersion::new( 1, 0x3ff, 0xfff ),
        }
    }
}

impl NegotiationConfig {

    /// Sets the loader/runtime interface versions offered to runtimes.
    pub fn with_interface_versions( mut self, min: u32, max: u32 ) -> Self {
        self.min_interface_version = min ;
        self.max_interface_version = max ;
        self
    }

    /// Sets the API versions offered to runtimes.
    ///
    /// The major component of `max` is the only major version accepted back.
    pub fn with_api_versions( mut self, min: ApiVersion, max: ApiVersion ) -> Self {
        self.min_api_version = min ;
        self.max_api_version = max ;
        self
    }

    #[inline] pub fn min_interface_version( &self ) -> u32 { self.min_interface_version }
    #[inline] pub fn max_interface_version( &self ) -> u32 { self.max_interface_version }
    #[inline] pub fn min_api_version( &self ) -> ApiVersion { self.min_api_version }
    #[inline] pub fn max_api_version( &self ) -> ApiVersion { self.max_api_version }

    /// The API major version a runtime must agree on.
    #[inline] pub fn supported_api_major( &self ) -> u16 { self.max_api_version.major() }

    /// The request struct sent to the runtime.
    pub fn loader_info( &self ) -> NegotiateLoaderInfo {
        NegotiateLoaderInfo {
            struct_type: InterfaceStructType::LOADER_INFO,
            struct_version: LOADER_INFO_STRUCT_VERSION,
            struct_size: std::mem::size_of::<NegotiateLoaderInfo>(),
            min_interface_version: self.min_interface_version,
            max_interface_version: self.max_interface_version,
            min_api_version: self.min_api_version,
            max_api_version: self.max_api_version,
        }
    }

}

/// Why a negotiation response could not be trusted.
#[derive( Debug, Error, PartialEq, Eq )]
pub enum MalformedResponse {
    #[error( "unexpected struct type {0}" )] StructType( i32 ),
    #[error( "unexpected struct version {0}" )] StructVersion( u32 ),
    #[error( "struct size {actual} is smaller than {expected}" )] StructSize { actual: usize, expected: usize },
    #[error( "negotiation succeeded but returned a null get_proc_addr" )] NullProcAddr,
}

/// The runtime picked versions this loader cannot work with.
#[derive( Debug, Error, PartialEq, Eq )]
pub enum IncompatibleVersion {
    #[error( "interface version {negotiated} is outside 1..={max}" )]
    Interface { negotiated: u32, max: u32 },
    #[error( "API version {negotiated} is not compatible with major version {supported_major}" )]
    Api { negotiated: ApiVersion, supported_major: u16 },
}

/// A single candidate was rejected. Never fatal on its own.
#[derive( Debug, Error )]
pub enum NegotiationError {
    /// The candidate's library could not be opened.
    #[error( "Library Load Failure: {0}" )] LibraryLoadFailure( #[from] LibraryError ),
    /// The library does not export the negotiate entry point.
    #[error( "Negotiation Symbol Missing: {0}" )] NegotiationSymbolMissing( String ),
    /// The negotiate entry point returned a failure code.
    #[error( "Negotiation Rejected: {0}" )] NegotiationRejected( ResultCode ),
    /// The library's init entry point refused the platform init payload.
    #[error( "Loader Init Rejected: {0}" )] LoaderInitRejected( ResultCode ),
    /// The response failed structural validation.
    #[error( "Malformed Response: {0}" )] MalformedResponse( #[from] MalformedResponse ),
    /// The response carried versions outside the loader's range.
    #[error( "Incompatible Version: {0}" )] IncompatibleVersion( #[from] IncompatibleVersion ),
}

/// The validated outcome of a successful handshake.
#[derive( Debug, Clone )]
pub(crate) struct Negotiated {
    pub(crate) interface_version: u32,
    pub(crate) api_version: ApiVersion,
    pub(crate) resolver: ProcAddrResolver,
}

/// Runs the handshake against an open candidate library. On success the
/// returned resolver shares ownership of `library`.
pub(crate) fn negotiate(
    library: Arc<dyn RuntimeLibrary>,
    descriptor: &CandidateDescriptor,
    config: &NegotiationConfig,
    init: &LoaderInit,
) -> Result<Negotiated, NegotiationError> {

    forward_loader_init( &*library, descriptor, init )?;

    let symbol = descriptor.function_name( entry_points::NEGOTIATE_LOADER_RUNTIME_INTERFACE );
    let negotiate = library.symbol( &symbol ).ok_or( NegotiationError::NegotiationSymbolMissing( symbol ))?;
    // SAFETY: the negotiate export has this signature by contract.
    let negotiate: NegotiateFn = unsafe { cast_function( negotiate )};

    let loader_info = config.loader_info();
    let mut response = NegotiateRuntimeRequest::new();
    // SAFETY: both structs are live for the duration of the call.
    let code = unsafe { negotiate( &loader_info, &mut response )};
    if !code.is_success() { return Err( NegotiationError::NegotiationRejected( code ))}

    validate_response( &response, config, library )

}

/// Hands the captured platform init payload to the candidate, if both exist.
fn forward_loader_init(
    library: &dyn RuntimeLibrary,
    descriptor: &CandidateDescriptor,
    init: &LoaderInit,
) -> Result<(), NegotiationError> {
    let Some( param ) = init.param() else { return Ok(()) };
    let Some( initialize ) = library.symbol( &descriptor.function_name( entry_points::INITIALIZE_LOADER )) else {
        return Ok(())
    };
    // SAFETY: the init export has this signature by contract, and `param` points
    // into `init`, which outlives the call.
    let code = unsafe { cast_function::<InitializeLoaderFn>( initialize )( param )};
    match code.is_success() {
        true => Ok(()),
        false => Err( NegotiationError::LoaderInitRejected( code )),
    }
}

/// Validates a response the runtime reported as successful.
pub(crate) fn validate_response(
    response: &NegotiateRuntimeRequest,
    config: &NegotiationConfig,
    library: Arc<dyn RuntimeLibrary>,
) -> Result<Negotiated, NegotiationError> {

    if response.struct_type != InterfaceStructType::RUNTIME_REQUEST {
        return Err( MalformedResponse::StructType( response.struct_type.0 ).into() );
    }
    if response.struct_version != RUNTIME_INFO_STRUCT_VERSION {
        return Err( MalformedResponse::StructVersion( response.struct_version ).into() );
    }
    let expected = std::mem::size_of::<NegotiateRuntimeRequest>();
    if response.struct_size < expected {
        return Err( MalformedResponse::StructSize { actual: response.struct_size, expected }.into() );
    }

    let get_proc_addr = response.get_proc_addr.ok_or( MalformedResponse::NullProcAddr )?;

    let negotiated = response.runtime_interface_version ;
    if negotiated == 0 || negotiated > config.max_interface_version() {
        return Err( IncompatibleVersion::Interface { negotiated, max: config.max_interface_version() }.into() );
    }

    let api_version = response.runtime_api_version ;
    let supported_major = config.supported_api_major();
    if api_version.major() != supported_major || ( api_version.major() == 0 && api_version.minor() == 0 ) {
        return Err( IncompatibleVersion::Api { negotiated: api_version, supported_major }.into() );
    }

    Ok( Negotiated {
        interface_version: negotiated,
        api_version,
        resolver: ProcAddrResolver::new( get_proc_addr, library ),
    })

}



#[cfg( test )]
mod tests {
    use std::ffi::c_char ;
    use std::sync::Arc ;
    use super::{ validate_response, IncompatibleVersion, MalformedResponse, Negotiated, NegotiationConfig, NegotiationError };
    use crate::abi::{ InterfaceStructType, NegotiateRuntimeRequest, ResultCode, VoidFunction };
    use crate::library::RuntimeLibrary ;
    use crate::{ ApiVersion, SessionHandle };

    struct NoExports ;

    impl RuntimeLibrary for NoExports {
        fn symbol( &self, _: &str ) -> Option<VoidFunction> { None }
    }

    fn validate( response: &NegotiateRuntimeRequest, config: &NegotiationConfig ) -> Result<Negotiated, NegotiationError> {
        validate_response( response, config, Arc::new( NoExports ))
    }

    unsafe extern "C" fn get_proc_addr( _: SessionHandle, _: *const c_char, _: *mut Option<VoidFunction> ) -> ResultCode {
        ResultCode::ERROR_FUNCTION_UNSUPPORTED
    }

    fn valid_response() -> NegotiateRuntimeRequest {
        NegotiateRuntimeRequest {
            runtime_interface_version: 1,
            runtime_api_version: ApiVersion::new( 1, 0, 34 ),
            get_proc_addr: Some( get_proc_addr ),
            ..NegotiateRuntimeRequest::new()
        }
    }

    #[test]
    fn loader_info_carries_configured_ranges() {
        let info = NegotiationConfig::default().loader_info();
        assert_eq!( info.struct_type, InterfaceStructType::LOADER_INFO );
        assert_eq!( info.min_interface_version, 1 );
        assert_eq!( info.max_interface_version, 1 );
        assert_eq!( info.min_api_version, ApiVersion::new( 1, 0, 0 ));
        assert_eq!( info.max_api_version, ApiVersion::new( 1, 0x3ff, 0xfff ));
    }

    #[test]
    fn valid_response_is_accepted() {
        let negotiated = validate( &valid_response(), &NegotiationConfig::default() ).unwrap();
        assert_eq!( negotiated.interface_version, 1 );
        assert_eq!( negotiated.api_version, ApiVersion::new( 1, 0, 34 ));
    }

    #[test]
    fn overwritten_tag_is_malformed() {
        let response = NegotiateRuntimeRequest { struct_type: InterfaceStructType::LOADER_INFO, ..valid_response() };
        assert!( matches!(
            validate( &response, &NegotiationConfig::default() ),
            Err( NegotiationError::MalformedResponse( MalformedResponse::StructType( 1 ))),
        ));
    }

    #[test]
    fn unknown_struct_version_is_malformed() {
        let response = NegotiateRuntimeRequest { struct_version: 2, ..valid_response() };
        assert!( matches!(
            validate( &response, &NegotiationConfig::default() ),
            Err( NegotiationError::MalformedResponse( MalformedResponse::StructVersion( 2 ))),
        ));
    }

    #[test]
    fn undersized_struct_is_malformed() {
        let response = NegotiateRuntimeRequest { struct_size: 8, ..valid_response() };
        assert!( matches!(
            validate( &response, &NegotiationConfig::default() ),
            Err( NegotiationError::MalformedResponse( MalformedResponse::StructSize { actual: 8, .. })),
        ));
    }

    #[test]
    fn null_proc_addr_is_checked_before_versions() {
        let response = NegotiateRuntimeRequest {
            get_proc_addr: None,
            runtime_interface_version: 0,
            ..valid_response()
        };
        assert!( matches!(
            validate( &response, &NegotiationConfig::default() ),
            Err( NegotiationError::MalformedResponse( MalformedResponse::NullProcAddr )),
        ));
    }

    #[test]
    fn interface_version_must_be_in_range() {
        for negotiated in [ 0, 2 ] {
            let response = NegotiateRuntimeRequest { runtime_interface_version: negotiated, ..valid_response() };
            assert!( matches!(
                validate( &response, &NegotiationConfig::default() ),
                Err( NegotiationError::IncompatibleVersion( IncompatibleVersion::Interface { max: 1, .. })),
            ));
        }
    }

    #[test]
    fn raised_interface_ceiling_accepts_newer_runtimes() {
        let config = NegotiationConfig::default().with_interface_versions( 1, 2 );
        let response = NegotiateRuntimeRequest { runtime_interface_version: 2, ..valid_response() };
        assert!( validate( &response, &config ).is_ok() );
    }

    #[test]
    fn api_major_must_match() {
        let response = NegotiateRuntimeRequest { runtime_api_version: ApiVersion::new( 2, 0, 0 ), ..valid_response() };
        assert!( matches!(
            validate( &response, &NegotiationConfig::default() ),
            Err( NegotiationError::IncompatibleVersion( IncompatibleVersion::Api { supported_major: 1, .. })),
        ));
    }

    #[test]
    fn api_version_zero_zero_is_rejected() {
        let config = NegotiationConfig::default()
            .with_api_versions( ApiVersion::new( 0, 0, 0 ), ApiVersion::new( 0, 0x3ff, 0xfff ));
        let response = NegotiateRuntimeRequest { runtime_api_version: ApiVersion::new( 0, 0, 5 ), ..valid_response() };
        assert!( matches!(
            validate( &response, &config ),
            Err( NegotiationError::IncompatibleVersion( IncompatibleVersion::Api { .. })),
        ));
    }
}
