//! Runtime selection.
//!
//! A [`Broker`] is the process-scoped state that owns the selected runtime.
//! Selection walks the candidates in order and keeps the first one that
//! negotiates; candidates that fail are logged and reported back, never fatal
//! on their own. Selection happens exactly once: concurrent callers either
//! perform it or observe its result.

use std::path::PathBuf ;
use std::sync::{ Arc, Mutex, PoisonError, RwLock };
use once_cell::sync::Lazy ;
use thiserror::Error ;

use crate::candidate::{ CandidateDescriptor, CandidateSource, DiscoveryError };
use crate::dispatch_table::{ CoreDispatchTable, DispatchTable };
use crate::library::{ DylibLoader, LibraryLoader, RuntimeLibrary };
use crate::loader_init::{ InitRequirement, LoaderInit };
use crate::negotiation::{ negotiate, NegotiationConfig, NegotiationError };
use crate::runtime::Runtime ;
use crate::utils::PartialSuccess ;



/// A candidate that was skipped during selection.
#[derive( Debug, Error )]
#[error( "Skipped runtime {}: {error}", library_path.display() )]
pub struct RejectedCandidate {
    pub library_path: PathBuf,
    #[source] pub error: NegotiationError,
}

/// Selection failed as a whole.
#[derive( Debug, Error )]
pub enum SelectionError {
    /// Candidates could not be enumerated.
    #[error( "Discovery Failed: {0}" )] Discovery( #[from] DiscoveryError ),
    /// Every candidate was rejected, or there were none.
    #[error( "No Backend Found: {} candidates rejected", rejected.len() )]
    NoBackendFound { rejected: Vec<RejectedCandidate> },
    /// The platform requires loader initialisation and it has not happened.
    #[error( "Initialization Required" )] InitializationRequired,
}

/// The outcome of a successful [`Broker::load_runtime`].
#[derive( Debug, Clone )]
pub enum Selection<T: DispatchTable = CoreDispatchTable> {
    /// This call selected the runtime.
    Selected( Arc<Runtime<T>> ),
    /// A runtime had already been selected; nothing was loaded.
    AlreadySelected( Arc<Runtime<T>> ),
}

impl<T: DispatchTable> Selection<T> {

    #[inline] pub fn runtime( &self ) -> &Arc<Runtime<T>> {
        match self { Self::Selected( runtime ) | Self::AlreadySelected( runtime ) => runtime }
    }

    #[inline] pub fn into_runtime( self ) -> Arc<Runtime<T>> {
        match self { Self::Selected( runtime ) | Self::AlreadySelected( runtime ) => runtime }
    }

}

static GLOBAL: Lazy<Broker> = Lazy::new(|| Broker::new( DylibLoader ).with_loader_init( LoaderInit::global() ));

/// Owns the selected runtime of a process.
///
/// # Type Parameters
/// - `L`: how candidate libraries are opened
/// - `T`: the dispatch table built for every session
pub struct Broker<L: LibraryLoader = DylibLoader, T: DispatchTable = CoreDispatchTable> {
    loader: L,
    config: NegotiationConfig,
    loader_init: Arc<LoaderInit>,
    selecting: Mutex<()>,
    runtime: RwLock<Option<Arc<Runtime<T>>>>,
}

impl Broker {
    /// The process-wide broker, loading libraries through the platform's dynamic
    /// linker and sharing [`LoaderInit::global`].
    pub fn global() -> &'static Self { &GLOBAL }
}

impl<L: LibraryLoader, T: DispatchTable> Broker<L, T> {

    /// Creates a broker with the default [`NegotiationConfig`] and a private
    /// [`LoaderInit`] using the platform's default requirement.
    pub fn new( loader: L ) -> Self {
        Self {
            loader,
            config: NegotiationConfig::default(),
            loader_init: Arc::new( LoaderInit::new( InitRequirement::platform_default() )),
            selecting: Mutex::new(()),
            runtime: RwLock::new( None ),
        }
    }

    /// Sets the version ranges offered during negotiation.
    pub fn with_config( mut self, config: NegotiationConfig ) -> Self {
        self.config = config ;
        self
    }

    /// Sets the platform init storage consulted before discovery.
    pub fn with_loader_init( mut self, loader_init: Arc<LoaderInit> ) -> Self {
        self.loader_init = loader_init ;
        self
    }

    #[inline] pub fn loader( &self ) -> &L { &self.loader }

    #[inline] pub fn config( &self ) -> &NegotiationConfig { &self.config }

    #[inline] pub fn loader_init( &self ) -> &LoaderInit { &self.loader_init }

    /// The selected runtime, if any.
    pub fn runtime( &self ) -> Option<Arc<Runtime<T>>> {
        self.runtime.read().unwrap_or_else( PoisonError::into_inner ).clone()
    }

    /// Selects a runtime from `source`, unless one is already selected.
    ///
    /// `command` names the API call that triggered loading and is attached to
    /// every log event.
    ///
    /// # Partial Success
    /// Candidates that fail to open or negotiate are skipped. When a later
    /// candidate succeeds, the skipped ones are returned next to the
    /// [`Selection`].
    ///
    /// # Errors
    /// - [`SelectionError::InitializationRequired`] if the platform requires
    ///   loader initialisation and it has not happened.
    /// - [`SelectionError::Discovery`] if `source` cannot enumerate candidates.
    /// - [`SelectionError::NoBackendFound`] if no candidate negotiated.
    pub fn load_runtime<S>(
        &self,
        command: &str,
        source: &S,
    ) -> Result<PartialSuccess<Selection<T>, RejectedCandidate>, SelectionError>
    where
        S: CandidateSource + ?Sized,
    {

        if let Some( runtime ) = self.runtime() {
            return Ok(( Selection::AlreadySelected( runtime ), Vec::new() ));
        }

        if !self.loader_init.is_satisfied() {
            tracing::error!( command, "cannot load a runtime before the loader is initialized" );
            return Err( SelectionError::InitializationRequired );
        }

        // Whoever holds this is the only caller that may construct a runtime.
        let _claim = self.selecting.lock().unwrap_or_else( PoisonError::into_inner );
        if let Some( runtime ) = self.runtime() {
            return Ok(( Selection::AlreadySelected( runtime ), Vec::new() ));
        }

        let candidates = source.find_candidates().inspect_err(| err | {
            tracing::error!( command, error = %err, "failed to enumerate runtime candidates" );
        })?;

        let mut rejected = Vec::new();
        for descriptor in candidates {
            match self.try_candidate( command, &descriptor ) {
                Ok( runtime ) => {
                    let runtime = Arc::new( runtime );
                    *self.runtime.write().unwrap_or_else( PoisonError::into_inner ) = Some( Arc::clone( &runtime ));
                    return Ok(( Selection::Selected( runtime ), rejected ));
                }
                Err( error ) => {
                    tracing::warn!(
                        command,
                        library = %descriptor.library_path().display(),
                        %error,
                        "skipping runtime candidate"
                    );
                    rejected.push( RejectedCandidate { library_path: descriptor.library_path().to_path_buf(), error });
                }
            }
        }

        tracing::error!( command, rejected = rejected.len(), "failed to find a valid runtime" );
        Err( SelectionError::NoBackendFound { rejected })

    }

    /// Opens and negotiates one candidate. A rejected candidate's library is
    /// closed before this returns.
    fn try_candidate( &self, command: &str, descriptor: &CandidateDescriptor ) -> Result<Runtime<T>, NegotiationError> {

        let library: Arc<dyn RuntimeLibrary> = Arc::new( self.loader.open( descriptor.library_path() )? );
        let negotiated = negotiate( library, descriptor, &self.config, &self.loader_init )?;

        tracing::info!(
            command,
            library = %descriptor.library_path().display(),
            interface_version = negotiated.interface_version,
            api_version = %negotiated.api_version,
            "loaded runtime"
        );

        Ok( Runtime::new( command, descriptor, negotiated ))

    }

    /// Drops the selected runtime. Its library is closed once the last
    /// reference to the runtime or to its resolver is gone. Returns whether a
    /// runtime was selected.
    pub fn unload( &self, command: &str ) -> bool {
        let _claim = self.selecting.lock().unwrap_or_else( PoisonError::into_inner );
        let runtime = self.runtime.write().unwrap_or_else( PoisonError::into_inner ).take();
        match runtime {
            Some( runtime ) => {
                tracing::info!( command, library = %runtime.library_path().display(), "unloading runtime" );
                true
            }
            None => false,
        }
    }

}

impl<L: LibraryLoader + std::fmt::Debug, T: DispatchTable> std::fmt::Debug for Broker<L, T> {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "Broker" )
            .field( "loader", &self.loader )
            .field( "config", &self.config )
            .field( "loader_init", &self.loader_init )
            .field( "runtime", &self.runtime() )
            .finish_non_exhaustive()
    }
}
