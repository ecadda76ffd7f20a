use runtime_link::abi::{ entry_points, NegotiateFn };
use runtime_link::{ CandidateDescriptor, NegotiationError };
use crate::{ erase, mock_broker, negotiate_ok, rejection_of, MockLoader };

fn prefixed_runtime() -> MockLoader {
    MockLoader::new().with_library( "vendor.so", [
        ( "vendor_negotiate_loader_runtime_interface", erase( negotiate_ok as NegotiateFn )),
    ])
}

#[test]
fn negotiation_uses_function_prefix() {

    let broker = mock_broker( prefixed_runtime() );
    let candidate = CandidateDescriptor::new( "vendor.so" ).with_function_prefix( "vendor_" );

    let ( selection, rejected ) = broker.load_runtime( "create_session", &[ candidate ]).unwrap();
    assert!( rejected.is_empty() );
    assert_eq!( selection.runtime().library_path(), std::path::Path::new( "vendor.so" ));

}

#[test]
fn negotiation_without_prefix_misses_symbol() {

    match rejection_of( prefixed_runtime(), CandidateDescriptor::new( "vendor.so" )) {
        NegotiationError::NegotiationSymbolMissing( symbol ) => {
            assert_eq!( symbol, entry_points::NEGOTIATE_LOADER_RUNTIME_INTERFACE );
        },
        err => panic!( "Unexpected error: {}", err ),
    }

}
