use std::ffi::c_void ;
use std::sync::Arc ;
use runtime_link::abi::{ entry_points, InitializeLoaderFn, LoaderInitInfoAndroid, NegotiateFn, StructureType };
use runtime_link::{ Broker, CandidateDescriptor, InitRequirement, LoaderInit, NegotiationError, SelectionError };
use crate::{ erase, init_seen_vm, mock_broker, initialize_loader_ok, initialize_loader_rejecting, negotiate_ok, MockLoader };

fn android_info() -> LoaderInitInfoAndroid {
    LoaderInitInfoAndroid {
        ty: StructureType::LOADER_INIT_INFO_ANDROID,
        next: std::ptr::null(),
        application_vm: 0xa11 as *mut c_void,
        application_context: 0xc0e as *mut c_void,
    }
}

fn runtime_with_init( initialize: InitializeLoaderFn ) -> MockLoader {
    MockLoader::new().with_library( "runtime.so", [
        ( entry_points::NEGOTIATE_LOADER_RUNTIME_INTERFACE, erase( negotiate_ok as NegotiateFn )),
        ( entry_points::INITIALIZE_LOADER, erase( initialize )),
    ])
}

#[test]
fn init_required_blocks_discovery_until_initialized() {

    let init = Arc::new( LoaderInit::new( InitRequirement::Required ));
    let broker: Broker<MockLoader> = Broker::new( runtime_with_init( initialize_loader_ok )).with_loader_init( Arc::clone( &init ));
    let candidates = [ CandidateDescriptor::new( "runtime.so" )];

    match broker.load_runtime( "create_session", &candidates ) {
        Err( SelectionError::InitializationRequired ) => {},
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }
    assert_eq!( broker.loader().open_count(), 0 );

    init.initialize( &android_info() ).unwrap();
    broker.load_runtime( "create_session", &candidates ).unwrap();
    assert_eq!( init_seen_vm(), 0xa11 );

}

#[test]
fn init_not_required_never_blocks_discovery() {

    let broker = mock_broker( runtime_with_init( initialize_loader_ok ));

    let ( selection, rejected ) = broker.load_runtime( "create_session", &[ CandidateDescriptor::new( "runtime.so" )]).unwrap();
    assert!( rejected.is_empty() );
    assert!( !broker.loader_init().is_initialized() );
    assert_eq!( selection.runtime().interface_version(), 1 );

}

#[test]
fn init_rejected_by_runtime_skips_candidate() {

    let init = Arc::new( LoaderInit::new( InitRequirement::Required ));
    init.initialize( &android_info() ).unwrap();
    let broker: Broker<MockLoader> = Broker::new( runtime_with_init( initialize_loader_rejecting )).with_loader_init( init );

    match broker.load_runtime( "create_session", &[ CandidateDescriptor::new( "runtime.so" )]) {
        Err( SelectionError::NoBackendFound { rejected }) => {
            assert!( matches!( rejected[0].error, NegotiationError::LoaderInitRejected( _ )));
        },
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }
    assert_eq!( broker.loader().close_count(), 1 );

}
