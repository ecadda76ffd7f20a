use std::sync::Arc ;
use runtime_link::{ CandidateDescriptor, Selection };
use crate::{ mock_broker, negotiate_ok, MockLoader };

#[test]
fn selection_happens_once() {

    let loader = MockLoader::new()
        .with_runtime( "first.so", negotiate_ok )
        .with_runtime( "other.so", negotiate_ok );
    let broker = mock_broker( loader );

    let ( first, _ ) = broker.load_runtime( "create_session", &[ CandidateDescriptor::new( "first.so" )]).unwrap();
    let ( second, rejected ) = broker.load_runtime( "enumerate_extension_properties", &[ CandidateDescriptor::new( "other.so" )]).unwrap();

    assert!( matches!( first, Selection::Selected( _ )));
    assert!( rejected.is_empty() );
    match second {
        Selection::AlreadySelected( runtime ) => assert!( Arc::ptr_eq( &runtime, first.runtime() )),
        Selection::Selected( _ ) => panic!( "Selected a second runtime" ),
    }
    assert_eq!( broker.loader().open_count(), 1 );

}
