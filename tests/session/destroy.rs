use std::sync::Arc ;
use runtime_link::{ CoreDispatchTable, SessionHandle };
use crate::{ negotiate_ok, observe_destroy, observed_during_destroy, selected_runtime, was_destroyed };

#[test]
fn session_destroy_removes_dispatch_table() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );
    let kept = unsafe { runtime.create_session( std::ptr::null() )}.unwrap();
    let destroyed = unsafe { runtime.create_session( std::ptr::null() )}.unwrap();

    runtime.destroy_session( destroyed );

    assert!( runtime.lookup( destroyed ).is_none() );
    assert!( was_destroyed( destroyed ));
    assert!( runtime.lookup( kept ).is_some() );
    assert!( !was_destroyed( kept ));
    assert_eq!( runtime.session_count(), 1 );

}

#[test]
fn session_destroy_of_null_handle_is_a_no_op() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );
    let session = unsafe { runtime.create_session( std::ptr::null() )}.unwrap();

    runtime.destroy_session( SessionHandle::NULL );

    assert!( !was_destroyed( SessionHandle::NULL ));
    assert_eq!( runtime.session_count(), 1 );
    assert!( runtime.lookup( session ).is_some() );

}

#[test]
fn session_destroy_unregisters_before_calling_runtime() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );
    let session = unsafe { runtime.create_session( std::ptr::null() )}.unwrap();

    // Looking the session up from inside the runtime's destroy call would block
    // if the table lock were still held.
    let observed = Arc::downgrade( &runtime );
    observe_destroy( move | destroyed | observed.upgrade().is_some_and(| runtime | runtime.lookup( destroyed ).is_none() ));

    runtime.destroy_session( session );

    assert_eq!( observed_during_destroy( session ), Some( true ));

}
