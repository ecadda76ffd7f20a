use std::sync::Arc ;
use runtime_link::abi::entry_points ;
use runtime_link::CoreDispatchTable ;
use crate::{ negotiate_ok, selected_runtime };

#[test]
fn session_create_registers_dispatch_table() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );

    let session = unsafe { runtime.create_session( std::ptr::null() )}.unwrap();
    assert!( !session.is_null() );
    assert_eq!( runtime.session_count(), 1 );

    let table = runtime.lookup( session ).expect( "table registered" );
    assert!( Arc::ptr_eq( &table, &runtime.lookup( session ).unwrap() ));
    assert!( runtime.get_proc_addr( session, entry_points::DESTROY_SESSION ).is_ok() );

    runtime.destroy_session( session );

}

#[test]
fn session_create_from_many_threads_yields_distinct_sessions() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );

    let sessions = std::thread::scope(| scope | {
        let handles = ( 0..8 )
            .map(|_| scope.spawn(|| unsafe { runtime.create_session( std::ptr::null() )}.unwrap() ))
            .collect::<Vec<_>>();
        handles.into_iter().map(| handle | handle.join().unwrap() ).collect::<std::collections::HashSet<_>>()
    });

    assert_eq!( sessions.len(), 8 );
    assert_eq!( runtime.session_count(), 8 );
    assert!( sessions.iter().all(| &session | runtime.lookup( session ).is_some() ));

}
