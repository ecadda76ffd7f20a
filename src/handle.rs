//! Opaque handles returned by the runtime.
//!
//! Handles are never interpreted by the loader. They only serve as keys in the
//! [`HandleRegistry`]( crate::HandleRegistry ).



/// A session created against the selected runtime.
///
/// `SessionHandle::NULL` is the null sentinel; the runtime never hands it out
/// for a live session.
#[repr( transparent )]
#[derive( Copy, Clone, Debug, Default, Eq, Hash, PartialEq )]
pub struct SessionHandle( u64 );

/// A secondary handle owned by a session, such as a diagnostic messenger.
///
/// Used for indirect dispatch-table lookup through the session that created it.
#[repr( transparent )]
#[derive( Copy, Clone, Debug, Default, Eq, Hash, PartialEq )]
pub struct AuxHandle( u64 );

macro_rules! handle_impls {
    ( $handle:ident ) => {
        impl $handle {
            /// The null sentinel.
            pub const NULL: Self = Self( 0 );

            /// Wraps a raw handle value.
            pub const fn from_raw( raw: u64 ) -> Self { Self( raw )}

            /// The raw handle value.
            pub const fn raw( self ) -> u64 { self.0 }

            /// Whether this is the null sentinel.
            pub const fn is_null( self ) -> bool { self.0 == 0 }
        }

        impl std::fmt::Display for $handle {
            fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
                write!( f, "{:#x}", self.0 )
            }
        }

        impl From<$handle> for u64 {
            fn from( handle: $handle ) -> Self { handle.0 }
        }
    };
}

handle_impls!( SessionHandle );
handle_impls!( AuxHandle );
