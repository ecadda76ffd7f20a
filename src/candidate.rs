//! Candidate runtime descriptors.
//!
//! Discovering descriptors (reading manifest files, honouring environment
//! overrides) happens outside this crate. The loader only consumes the ordered
//! list a [`CandidateSource`] produces.

use std::path::{ Path, PathBuf };
use thiserror::Error ;



/// One candidate runtime: where its library lives and how its exports are named.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct CandidateDescriptor {
    library_path: PathBuf,
    function_prefix: Option<String>,
}

impl CandidateDescriptor {

    /// Creates a descriptor for the library at `library_path` with unprefixed exports.
    pub fn new( library_path: impl Into<PathBuf> ) -> Self {
        Self { library_path: library_path.into(), function_prefix: None }
    }

    /// Sets a prefix prepended to the names of the library's exported entry points.
    pub fn with_function_prefix( mut self, prefix: impl Into<String> ) -> Self {
        self.function_prefix = Some( prefix.into() );
        self
    }

    #[inline] pub fn library_path( &self ) -> &Path { &self.library_path }

    #[inline] pub fn function_prefix( &self ) -> Option<&str> { self.function_prefix.as_deref() }

    /// The name under which this library exports the entry point `base`.
    pub fn function_name( &self, base: &str ) -> String {
        match &self.function_prefix {
            Some( prefix ) => format!( "{}{}", prefix, base ),
            None => base.to_string(),
        }
    }

}

/// Candidate enumeration failed as a whole.
#[derive( Debug, Error )]
pub enum DiscoveryError {
    /// Reading descriptor sources failed.
    #[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
    /// A descriptor source could not be interpreted.
    #[error( "Invalid Descriptor: {0}" )] InvalidDescriptor( String ),
}

/// Produces the ordered list of runtime candidates.
///
/// Order matters: the first candidate that negotiates successfully is selected.
pub trait CandidateSource {
    /// Enumerates candidates, most preferred first.
    ///
    /// # Errors
    /// Any error is a hard failure for runtime selection as a whole.
    fn find_candidates( &self ) -> Result<Vec<CandidateDescriptor>, DiscoveryError> ;
}

impl CandidateSource for [CandidateDescriptor] {
    fn find_candidates( &self ) -> Result<Vec<CandidateDescriptor>, DiscoveryError> { Ok( self.to_vec() )}
}

impl CandidateSource for Vec<CandidateDescriptor> {
    fn find_candidates( &self ) -> Result<Vec<CandidateDescriptor>, DiscoveryError> { Ok( self.clone() )}
}

impl<const N: usize> CandidateSource for [CandidateDescriptor; N] {
    fn find_candidates( &self ) -> Result<Vec<CandidateDescriptor>, DiscoveryError> { Ok( self.to_vec() )}
}



#[cfg( test )]
mod tests {
    use super::CandidateDescriptor ;

    #[test]
    fn function_name_without_prefix_is_unchanged() {
        let descriptor = CandidateDescriptor::new( "libruntime.so" );
        assert_eq!( descriptor.function_name( "create_session" ), "create_session" );
    }

    #[test]
    fn function_name_applies_prefix() {
        let descriptor = CandidateDescriptor::new( "libruntime.so" ).with_function_prefix( "vendor_" );
        assert_eq!(
            descriptor.function_name( "negotiate_loader_runtime_interface" ),
            "vendor_negotiate_loader_runtime_interface",
        );
    }
}
