//! Access to dynamic libraries.
//!
//! The loader never talks to the OS directly. A [`LibraryLoader`] opens a
//! library by path and hands back an owned [`RuntimeLibrary`]; dropping that
//! value closes the library. Ownership is what guarantees a library is closed
//! exactly once, whether its candidate was rejected or the selected runtime is
//! later unloaded.

use std::path::{ Path, PathBuf };
use thiserror::Error ;

use crate::abi::VoidFunction ;



/// A library could not be opened.
#[derive( Debug, Error )]
#[error( "Failed to open library {}: {message}", path.display() )]
pub struct LibraryError {
    /// The path that was passed to the loader.
    pub path: PathBuf,
    /// Platform error text.
    pub message: String,
}

/// An open dynamic library. Dropping it closes the library.
pub trait RuntimeLibrary: Send + Sync + 'static {
    /// Resolves an exported symbol, returning `None` if it is not exported.
    fn symbol( &self, name: &str ) -> Option<VoidFunction> ;
}

/// Opens dynamic libraries by path.
pub trait LibraryLoader: Send + Sync {
    /// The library type this loader produces.
    type Library: RuntimeLibrary ;

    /// Opens the library at `path`.
    ///
    /// # Errors
    /// Returns a [`LibraryError`] carrying the platform's error text if the
    /// library cannot be opened.
    fn open( &self, path: &Path ) -> Result<Self::Library, LibraryError> ;
}

/// Loads libraries through the platform's dynamic linker.
#[derive( Debug, Default, Clone, Copy )]
pub struct DylibLoader ;

/// A library opened by [`DylibLoader`].
#[derive( Debug )]
pub struct Dylib {
    library: libloading::Library,
}

impl LibraryLoader for DylibLoader {
    type Library = Dylib ;

    fn open( &self, path: &Path ) -> Result<Dylib, LibraryError> {
        // SAFETY: running a runtime's initialisers is inherent to loading it.
        // Candidates are only ever opened from paths discovery deemed eligible.
        let library = unsafe { libloading::Library::new( path ) }
            .map_err(| err | LibraryError { path: path.to_path_buf(), message: err.to_string() })?;
        Ok( Dylib { library })
    }
}

impl RuntimeLibrary for Dylib {
    fn symbol( &self, name: &str ) -> Option<VoidFunction> {
        // SAFETY: the symbol is only read as an opaque function pointer here;
        // callers cast it to its concrete signature before calling it.
        unsafe { self.library.get::<VoidFunction>( name.as_bytes() ) }
            .ok()
            .map(| symbol | *symbol )
    }
}
