use std::sync::Arc ;
use runtime_link::{ AuxHandle, CoreDispatchTable };
use crate::{ negotiate_ok, selected_runtime };

#[test]
fn aux_handle_resolves_to_owning_session() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );
    let session = unsafe { runtime.create_session( std::ptr::null() )}.unwrap();
    let messenger = AuxHandle::from_raw( 0xd3b6 );

    assert!( runtime.track_aux( messenger, session ));
    let via_aux = runtime.lookup_via_aux( messenger ).expect( "aux handle tracked" );
    assert!( Arc::ptr_eq( &via_aux, &runtime.lookup( session ).unwrap() ));

    runtime.forget_aux( messenger );
    assert!( runtime.lookup_via_aux( messenger ).is_none() );
    runtime.forget_aux( AuxHandle::NULL );

}

#[test]
fn aux_handle_of_destroyed_session_resolves_to_none() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );
    let session = unsafe { runtime.create_session( std::ptr::null() )}.unwrap();
    let messenger = AuxHandle::from_raw( 0xd3b7 );

    runtime.track_aux( messenger, session );
    runtime.destroy_session( session );

    assert!( runtime.lookup_via_aux( messenger ).is_none() );

}
