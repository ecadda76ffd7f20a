//! Handle-to-table maps shared by every thread.
//!
//! Two independent locks: one for session → table, one for aux handle →
//! session. No method holds both at once, so lock order can never invert.

use std::collections::HashMap ;
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };

use crate::{ AuxHandle, SessionHandle };



/// Dispatch Table Registry and Auxiliary Handle Registry of one runtime.
#[derive( Debug )]
pub struct HandleRegistry<T> {
    tables: Mutex<HashMap<SessionHandle, Arc<T>>>,
    aux: Mutex<HashMap<AuxHandle, SessionHandle>>,
}

impl<T> HandleRegistry<T> {

    pub fn new() -> Self {
        Self {
            tables: Mutex::new( HashMap::new() ),
            aux: Mutex::new( HashMap::new() ),
        }
    }

    // Both maps hold plain data, so a panic elsewhere never leaves them torn.
    fn tables( &self ) -> MutexGuard<'_, HashMap<SessionHandle, Arc<T>>> {
        self.tables.lock().unwrap_or_else( PoisonError::into_inner )
    }

    fn aux( &self ) -> MutexGuard<'_, HashMap<AuxHandle, SessionHandle>> {
        self.aux.lock().unwrap_or_else( PoisonError::into_inner )
    }

    pub(crate) fn insert( &self, session: SessionHandle, table: T ) {
        self.tables().insert( session, Arc::new( table ));
    }

    pub(crate) fn remove( &self, session: SessionHandle ) -> Option<Arc<T>> {
        self.tables().remove( &session )
    }

    pub(crate) fn clear( &self ) {
        self.tables().clear();
        self.aux().clear();
    }

    /// The dispatch table of `session`, or `None` if the handle is not live.
    pub fn lookup( &self, session: SessionHandle ) -> Option<Arc<T>> {
        self.tables().get( &session ).cloned()
    }

    /// Number of live sessions.
    pub fn session_count( &self ) -> usize { self.tables().len() }

    /// Records that `aux` belongs to `session`, replacing any previous owner.
    pub fn track_aux( &self, aux: AuxHandle, session: SessionHandle ) -> bool {
        self.aux().insert( aux, session );
        true
    }

    /// Drops the mapping for `aux`, if any.
    pub fn forget_aux( &self, aux: AuxHandle ) {
        if aux.is_null() { return }
        self.aux().remove( &aux );
    }

    /// The dispatch table of the session that owns `aux`.
    pub fn lookup_via_aux( &self, aux: AuxHandle ) -> Option<Arc<T>> {
        let session = self.aux().get( &aux ).copied()?;
        self.lookup( session )
    }

}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self { Self::new() }
}



#[cfg( test )]
mod tests {
    use std::sync::Arc ;
    use super::HandleRegistry ;
    use crate::{ AuxHandle, SessionHandle };

    #[test]
    fn lookup_of_unknown_session_is_none() {
        let registry = HandleRegistry::<u32>::new();
        assert!( registry.lookup( SessionHandle::from_raw( 7 )).is_none() );
    }

    #[test]
    fn removal_ends_lookup() {
        let registry = HandleRegistry::new();
        let session = SessionHandle::from_raw( 1 );
        registry.insert( session, "table" );
        assert_eq!( registry.lookup( session ).as_deref(), Some( &"table" ));
        assert!( registry.remove( session ).is_some() );
        assert!( registry.lookup( session ).is_none() );
        assert_eq!( registry.session_count(), 0 );
    }

    #[test]
    fn aux_lookup_follows_owning_session() {
        let registry = HandleRegistry::new();
        let first = SessionHandle::from_raw( 1 );
        let second = SessionHandle::from_raw( 2 );
        let messenger = AuxHandle::from_raw( 10 );
        registry.insert( first, 1 );
        registry.insert( second, 2 );

        assert!( registry.track_aux( messenger, first ));
        assert!( Arc::ptr_eq( &registry.lookup_via_aux( messenger ).unwrap(), &registry.lookup( first ).unwrap() ));

        assert!( registry.track_aux( messenger, second ));
        assert_eq!( registry.lookup_via_aux( messenger ).as_deref(), Some( &2 ));

        registry.forget_aux( messenger );
        assert!( registry.lookup_via_aux( messenger ).is_none() );
    }

    #[test]
    fn aux_of_destroyed_session_resolves_to_none() {
        let registry = HandleRegistry::new();
        let session = SessionHandle::from_raw( 3 );
        let messenger = AuxHandle::from_raw( 30 );
        registry.insert( session, () );
        registry.track_aux( messenger, session );
        registry.remove( session );
        assert!( registry.lookup_via_aux( messenger ).is_none() );
    }

    #[test]
    fn forgetting_null_or_unknown_is_a_no_op() {
        let registry = HandleRegistry::<()>::new();
        registry.forget_aux( AuxHandle::NULL );
        registry.forget_aux( AuxHandle::from_raw( 99 ));
    }
}
