//! One-time platform initialisation.
//!
//! Some platforms hand the loader a payload that every runtime needs before it
//! can negotiate (on Android: the Java VM and the application context). The
//! payload is captured once into a [`LoaderInit`] and is immutable thereafter.
//! Whether discovery may proceed without it is decided by an explicit
//! [`InitRequirement`], never by the mere presence of a payload.

use std::sync::Arc ;
use once_cell::sync::{ Lazy, OnceCell };
use thiserror::Error ;

use crate::abi::{ LoaderInitInfoAndroid, LoaderInitInfoBaseHeader, StructureType };



/// Whether discovery must refuse to run until the platform init payload is captured.
#[derive( Copy, Clone, Debug, Eq, PartialEq )]
pub enum InitRequirement {
    /// Discovery fails with an "initialization required" error until initialised.
    Required,
    /// Initialisation is optional; its absence never blocks discovery.
    NotRequired,
}

impl InitRequirement {
    /// `Required` on platforms that mandate a payload, `NotRequired` elsewhere.
    pub const fn platform_default() -> Self {
        match cfg!( target_os = "android" ) {
            true => Self::Required,
            false => Self::NotRequired,
        }
    }
}

/// Errors returned when capturing the init payload.
#[derive( Debug, Error, PartialEq, Eq )]
pub enum InitError {
    /// The struct tag or payload failed validation.
    #[error( "Validation Failure: {0}" )] Validation( &'static str ),
    /// A payload was already captured for this process.
    #[error( "Loader Already Initialized" )] AlreadyInitialized,
}

#[derive( Debug )]
struct InitPayload( LoaderInitInfoAndroid );

// SAFETY: the payload holds process-global handles that the platform allows
// to be used from any thread; the loader never dereferences them itself.
unsafe impl Send for InitPayload {}
unsafe impl Sync for InitPayload {}

static GLOBAL: Lazy<Arc<LoaderInit>> = Lazy::new(|| Arc::new( LoaderInit::new( InitRequirement::platform_default() )));

/// Process-wide storage for the platform init payload.
#[derive( Debug )]
pub struct LoaderInit {
    requirement: InitRequirement,
    payload: OnceCell<InitPayload>,
}

impl LoaderInit {

    pub const fn new( requirement: InitRequirement ) -> Self {
        Self { requirement, payload: OnceCell::new() }
    }

    /// The process-wide instance, using [`InitRequirement::platform_default`].
    pub fn global() -> Arc<Self> { Arc::clone( &GLOBAL )}

    #[inline] pub fn requirement( &self ) -> InitRequirement { self.requirement }

    #[inline] pub fn is_initialized( &self ) -> bool { self.payload.get().is_some() }

    /// Whether discovery may run: initialised, or initialisation is not required.
    pub fn is_satisfied( &self ) -> bool {
        self.requirement == InitRequirement::NotRequired || self.is_initialized()
    }

    /// Validates and captures the init payload.
    ///
    /// The `next` chain is not retained.
    ///
    /// # Errors
    /// - [`InitError::Validation`] if the tag is wrong or a required pointer is null.
    /// - [`InitError::AlreadyInitialized`] if a payload was captured before.
    pub fn initialize( &self, info: &LoaderInitInfoAndroid ) -> Result<(), InitError> {
        if info.ty != StructureType::LOADER_INIT_INFO_ANDROID {
            return Err( InitError::Validation( "unexpected init struct type" ));
        }
        if info.application_vm.is_null() {
            return Err( InitError::Validation( "application_vm is null" ));
        }
        if info.application_context.is_null() {
            return Err( InitError::Validation( "application_context is null" ));
        }
        let payload = LoaderInitInfoAndroid { next: std::ptr::null(), ..*info };
        self.payload.set( InitPayload( payload )).map_err(|_| InitError::AlreadyInitialized )?;
        tracing::debug!( command = "initialize_loader", "captured loader init payload" );
        Ok(())
    }

    /// Captures an init payload given only its tagged header.
    ///
    /// # Safety
    /// `info` must be null or point to a live struct whose full layout matches
    /// the type named by its tag.
    ///
    /// # Errors
    /// See [`initialize`]( Self::initialize ); a null pointer is a validation failure.
    pub unsafe fn initialize_raw( &self, info: *const LoaderInitInfoBaseHeader ) -> Result<(), InitError> {
        // SAFETY: the caller guarantees `info` is null or valid for its tag.
        let Some( header ) = ( unsafe { info.as_ref() }) else {
            return Err( InitError::Validation( "init info is null" ));
        };
        if header.ty != StructureType::LOADER_INIT_INFO_ANDROID {
            return Err( InitError::Validation( "unexpected init struct type" ));
        }
        // SAFETY: the tag names the Android struct, which starts with the header.
        let android = unsafe { &*info.cast::<LoaderInitInfoAndroid>() };
        self.initialize( android )
    }

    /// The captured payload as the header pointer runtimes expect, if any.
    ///
    /// The pointer is valid for as long as `self` is alive.
    pub(crate) fn param( &self ) -> Option<*const LoaderInitInfoBaseHeader> {
        self.payload.get().map(| payload | std::ptr::from_ref( &payload.0 ).cast::<LoaderInitInfoBaseHeader>() )
    }

}



#[cfg( test )]
mod tests {
    use std::ffi::c_void ;
    use super::{ InitError, InitRequirement, LoaderInit };
    use crate::abi::{ LoaderInitInfoAndroid, StructureType };

    fn android_info( vm: usize, context: usize ) -> LoaderInitInfoAndroid {
        LoaderInitInfoAndroid {
            ty: StructureType::LOADER_INIT_INFO_ANDROID,
            next: std::ptr::null(),
            application_vm: vm as *mut c_void,
            application_context: context as *mut c_void,
        }
    }

    #[test]
    fn not_required_is_satisfied_without_payload() {
        let init = LoaderInit::new( InitRequirement::NotRequired );
        assert!( init.is_satisfied() );
        assert!( !init.is_initialized() );
    }

    #[test]
    fn required_is_satisfied_only_after_capture() {
        let init = LoaderInit::new( InitRequirement::Required );
        assert!( !init.is_satisfied() );
        init.initialize( &android_info( 0x10, 0x20 )).unwrap();
        assert!( init.is_satisfied() );
        assert!( init.param().is_some() );
    }

    #[test]
    fn null_pointers_are_rejected() {
        let init = LoaderInit::new( InitRequirement::Required );
        assert!( matches!( init.initialize( &android_info( 0, 0x20 )), Err( InitError::Validation( _ ))));
        assert!( matches!( init.initialize( &android_info( 0x10, 0 )), Err( InitError::Validation( _ ))));
        assert!( !init.is_initialized() );
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let init = LoaderInit::new( InitRequirement::Required );
        let info = LoaderInitInfoAndroid { ty: StructureType::UNKNOWN, ..android_info( 0x10, 0x20 ) };
        assert!( matches!( init.initialize( &info ), Err( InitError::Validation( _ ))));
        let header = std::ptr::from_ref( &info ).cast();
        assert!( matches!( unsafe { init.initialize_raw( header )}, Err( InitError::Validation( _ ))));
    }

    #[test]
    fn payload_is_captured_once() {
        let init = LoaderInit::new( InitRequirement::NotRequired );
        init.initialize( &android_info( 0x10, 0x20 )).unwrap();
        assert_eq!( init.initialize( &android_info( 0x30, 0x40 )), Err( InitError::AlreadyInitialized ));
    }
}
