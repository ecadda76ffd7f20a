/// A packed API version as exchanged over the negotiation ABI.
///
/// The layout is `major` in the top 16 bits, `minor` in the next 16 bits and
/// `patch` in the low 32 bits, so versions compare correctly as plain integers.
#[repr( transparent )]
#[derive( Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash )]
pub struct ApiVersion( u64 );

impl ApiVersion {

    /// Packs a version from its components.
    pub const fn new( major: u16, minor: u16, patch: u32 ) -> Self {
        Self((( major as u64 ) << 48 ) | (( minor as u64 ) << 32 ) | patch as u64 )
    }

    /// Wraps a raw packed value received over the ABI.
    pub const fn from_raw( raw: u64 ) -> Self { Self( raw )}

    /// The raw packed value.
    pub const fn raw( self ) -> u64 { self.0 }

    #[allow( clippy::cast_possible_truncation )]
    pub const fn major( self ) -> u16 { ( self.0 >> 48 ) as u16 }

    #[allow( clippy::cast_possible_truncation )]
    pub const fn minor( self ) -> u16 { ( self.0 >> 32 ) as u16 }

    #[allow( clippy::cast_possible_truncation )]
    pub const fn patch( self ) -> u32 { self.0 as u32 }

}

impl std::fmt::Display for ApiVersion {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
        write!( f, "{}.{}.{}", self.major(), self.minor(), self.patch() )
    }
}

impl From<ApiVersion> for u64 {
    fn from( version: ApiVersion ) -> Self { version.0 }
}



#[cfg( test )]
mod tests {
    use super::ApiVersion ;

    #[test]
    fn components_survive_packing() {
        let version = ApiVersion::new( 1, 0x3ff, 0xfff );
        assert_eq!( version.major(), 1 );
        assert_eq!( version.minor(), 0x3ff );
        assert_eq!( version.patch(), 0xfff );
        assert_eq!( version.to_string(), "1.1023.4095" );
    }

    #[test]
    fn ordering_follows_major_then_minor_then_patch() {
        assert!( ApiVersion::new( 1, 0, 0 ) < ApiVersion::new( 1, 0, 1 ));
        assert!( ApiVersion::new( 1, 0, u32::MAX ) < ApiVersion::new( 1, 1, 0 ));
        assert!( ApiVersion::new( 1, u16::MAX, 0 ) < ApiVersion::new( 2, 0, 0 ));
    }
}
