use runtime_link::abi::entry_points ;
use runtime_link::{ CandidateDescriptor, Selection, SessionHandle };
use crate::{ mock_broker, negotiate_ok, MockLoader };

#[test]
fn unload_closes_library_exactly_once() {

    let broker = mock_broker( MockLoader::new().with_runtime( "runtime.so", negotiate_ok ));
    let candidates = [ CandidateDescriptor::new( "runtime.so" )];

    let ( selection, _ ) = broker.load_runtime( "create_session", &candidates ).unwrap();
    let runtime = selection.into_runtime();
    assert!( broker.unload( "destroy_session" ));
    assert!( broker.runtime().is_none() );

    // Still referenced here, so still open.
    assert_eq!( broker.loader().close_count(), 0 );
    drop( runtime );
    assert_eq!( broker.loader().close_count(), 1 );

    assert!( !broker.unload( "destroy_session" ));
    assert_eq!( broker.loader().close_count(), 1 );

}

#[test]
fn unload_allows_a_fresh_selection() {

    let broker = mock_broker( MockLoader::new().with_runtime( "runtime.so", negotiate_ok ));
    let candidates = [ CandidateDescriptor::new( "runtime.so" )];

    broker.load_runtime( "create_session", &candidates ).unwrap();
    broker.unload( "destroy_session" );

    match broker.load_runtime( "create_session", &candidates ) {
        Ok(( Selection::Selected( _ ), _ )) => {},
        Ok(( Selection::AlreadySelected( _ ), _ )) => panic!( "Runtime survived unload" ),
        Err( err ) => panic!( "Unexpected error: {}", err ),
    }
    assert_eq!( broker.loader().open_count(), 2 );
    assert_eq!( broker.loader().close_count(), 1 );

}

#[test]
fn unload_keeps_library_open_while_resolver_is_held() {

    let broker = mock_broker( MockLoader::new().with_runtime( "runtime.so", negotiate_ok ));
    let ( selection, _ ) = broker.load_runtime( "create_session", &[ CandidateDescriptor::new( "runtime.so" )]).unwrap();
    let runtime = selection.into_runtime();
    let resolver = runtime.resolver().clone();

    broker.unload( "destroy_session" );
    drop( runtime );
    assert_eq!( broker.loader().close_count(), 0 );
    assert!( resolver.resolve( SessionHandle::NULL, entry_points::CREATE_SESSION ).is_ok() );

    drop( resolver );
    assert_eq!( broker.loader().close_count(), 1 );

}
