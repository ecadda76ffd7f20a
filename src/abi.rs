//! The C ABI shared between the loader and runtime libraries.
//!
//! Everything in this module is `#[repr(C)]` or `#[repr(transparent)]` and must
//! stay bit-exact with what runtimes are built against. Struct tags, versions and
//! sizes travel with every negotiation struct so either side can reject a
//! mismatched layout.

use std::ffi::{ c_char, c_void };

use crate::{ ApiVersion, SessionHandle };



/// Entry point names resolved by the loader.
///
/// Names exported directly by the library may be prefixed per candidate, see
/// [`CandidateDescriptor::function_name`]( crate::CandidateDescriptor::function_name ).
/// The rest are resolved through the runtime's `get_proc_addr` and are never prefixed.
pub mod entry_points {
    /// Exported by the library; performs the version handshake.
    pub const NEGOTIATE_LOADER_RUNTIME_INTERFACE: &str = "negotiate_loader_runtime_interface" ;
    /// Exported by the library on platforms that take an init payload; optional.
    pub const INITIALIZE_LOADER: &str = "initialize_loader" ;
    /// Resolved with the null session.
    pub const CREATE_SESSION: &str = "create_session" ;
    /// Resolved with the session being destroyed.
    pub const DESTROY_SESSION: &str = "destroy_session" ;
    /// Resolved with the null session.
    pub const ENUMERATE_EXTENSION_PROPERTIES: &str = "enumerate_extension_properties" ;
    /// Resolved with any session.
    pub const GET_PROC_ADDR: &str = "get_proc_addr" ;
}

/// Result code returned by every runtime entry point. Non-negative means success.
#[repr( transparent )]
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub struct ResultCode( pub i32 );

impl ResultCode {
    pub const SUCCESS: Self = Self( 0 );
    pub const ERROR_VALIDATION_FAILURE: Self = Self( -1 );
    pub const ERROR_RUNTIME_FAILURE: Self = Self( -2 );
    pub const ERROR_INITIALIZATION_FAILED: Self = Self( -6 );
    pub const ERROR_FUNCTION_UNSUPPORTED: Self = Self( -7 );
    pub const ERROR_SIZE_INSUFFICIENT: Self = Self( -11 );
    pub const ERROR_INSTANCE_LOST: Self = Self( -13 );
    pub const ERROR_FILE_CONTENTS_INVALID: Self = Self( -23 );

    /// Whether the code denotes success (including qualified successes).
    pub const fn is_success( self ) -> bool { self.0 >= 0 }
}

impl std::fmt::Display for ResultCode {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{}", self.0 )}
}

/// Tag carried by the loader/runtime negotiation structs.
#[repr( transparent )]
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub struct InterfaceStructType( pub i32 );

impl InterfaceStructType {
    pub const UNINITIALIZED: Self = Self( 0 );
    pub const LOADER_INFO: Self = Self( 1 );
    pub const RUNTIME_REQUEST: Self = Self( 3 );
}

/// Tag carried by API-level structs passed to the runtime.
#[repr( transparent )]
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub struct StructureType( pub i32 );

impl StructureType {
    pub const UNKNOWN: Self = Self( 0 );
    pub const EXTENSION_PROPERTIES: Self = Self( 2 );
    pub const LOADER_INIT_INFO_ANDROID: Self = Self( 1_000_089_000 );
}

pub const LOADER_INFO_STRUCT_VERSION: u32 = 1 ;
pub const RUNTIME_INFO_STRUCT_VERSION: u32 = 1 ;
/// Highest loader/runtime interface version this loader speaks.
pub const CURRENT_LOADER_RUNTIME_VERSION: u32 = 1 ;
pub const MAX_EXTENSION_NAME_SIZE: usize = 128 ;

pub type VoidFunction = unsafe extern "C" fn();
pub type GetProcAddrFn = unsafe extern "C" fn(
    session: SessionHandle,
    name: *const c_char,
    function: *mut Option<VoidFunction>,
) -> ResultCode ;
pub type NegotiateFn = unsafe extern "C" fn(
    loader_info: *const NegotiateLoaderInfo,
    runtime_request: *mut NegotiateRuntimeRequest,
) -> ResultCode ;
pub type InitializeLoaderFn = unsafe extern "C" fn( info: *const LoaderInitInfoBaseHeader ) -> ResultCode ;
pub type CreateSessionFn = unsafe extern "C" fn( create_info: *const c_void, session: *mut SessionHandle ) -> ResultCode ;
pub type DestroySessionFn = unsafe extern "C" fn( session: SessionHandle ) -> ResultCode ;
pub type EnumerateExtensionPropertiesFn = unsafe extern "C" fn(
    layer_name: *const c_char,
    property_capacity: u32,
    property_count_output: *mut u32,
    properties: *mut RawExtensionProperties,
) -> ResultCode ;

/// What the loader supports, sent to the runtime's negotiate entry point.
#[repr( C )]
#[derive( Copy, Clone, Debug )]
pub struct NegotiateLoaderInfo {
    pub struct_type: InterfaceStructType,
    pub struct_version: u32,
    pub struct_size: usize,
    pub min_interface_version: u32,
    pub max_interface_version: u32,
    pub min_api_version: ApiVersion,
    pub max_api_version: ApiVersion,
}

/// Filled in by the runtime's negotiate entry point.
///
/// The loader pre-fills the tag, version and size; the runtime must leave them
/// intact.
#[repr( C )]
#[derive( Copy, Clone, Debug )]
pub struct NegotiateRuntimeRequest {
    pub struct_type: InterfaceStructType,
    pub struct_version: u32,
    pub struct_size: usize,
    pub runtime_interface_version: u32,
    pub runtime_api_version: ApiVersion,
    pub get_proc_addr: Option<GetProcAddrFn>,
}

impl NegotiateRuntimeRequest {
    /// An empty request with the loader's tag, version and size.
    pub const fn new() -> Self {
        Self {
            struct_type: InterfaceStructType::RUNTIME_REQUEST,
            struct_version: RUNTIME_INFO_STRUCT_VERSION,
            struct_size: std::mem::size_of::<Self>(),
            runtime_interface_version: 0,
            runtime_api_version: ApiVersion::from_raw( 0 ),
            get_proc_addr: None,
        }
    }
}

impl Default for NegotiateRuntimeRequest {
    fn default() -> Self { Self::new() }
}

/// One extension as reported by `enumerate_extension_properties`.
#[repr( C )]
#[derive( Copy, Clone, Debug )]
pub struct RawExtensionProperties {
    pub ty: StructureType,
    pub next: *mut c_void,
    pub extension_name: [c_char; MAX_EXTENSION_NAME_SIZE],
    pub extension_version: u32,
}

impl RawExtensionProperties {
    /// An output slot ready to be filled by the runtime.
    pub const fn empty() -> Self {
        Self {
            ty: StructureType::EXTENSION_PROPERTIES,
            next: std::ptr::null_mut(),
            extension_name: [0; MAX_EXTENSION_NAME_SIZE],
            extension_version: 0,
        }
    }
}

/// Common header of every platform init struct.
#[repr( C )]
#[derive( Copy, Clone, Debug )]
pub struct LoaderInitInfoBaseHeader {
    pub ty: StructureType,
    pub next: *const c_void,
}

/// Android init payload: the Java VM and the application context.
#[repr( C )]
#[derive( Copy, Clone, Debug )]
pub struct LoaderInitInfoAndroid {
    pub ty: StructureType,
    pub next: *const c_void,
    pub application_vm: *mut c_void,
    pub application_context: *mut c_void,
}

/// Reinterprets a resolved entry point as its concrete signature.
///
/// # Safety
/// `F` must be an `extern "C"` function pointer type matching the signature the
/// runtime actually exports under the resolved name.
pub(crate) unsafe fn cast_function<F: Copy>( function: VoidFunction ) -> F {
    debug_assert_eq!( std::mem::size_of::<F>(), std::mem::size_of::<VoidFunction>() );
    // SAFETY: both are thin function pointers; the caller vouches for the signature.
    unsafe { std::mem::transmute_copy::<VoidFunction, F>( &function ) }
}
