use runtime_link::{ ApiVersion, CandidateDescriptor, NegotiationConfig };
use crate::{ mock_broker, negotiate_ok, MockLoader };

#[test]
fn negotiation_accepts_conforming_runtime() {

    let broker = mock_broker( MockLoader::new().with_runtime( "runtime.so", negotiate_ok ));
    let ( selection, rejected ) = broker.load_runtime( "create_session", &[ CandidateDescriptor::new( "runtime.so" )]).unwrap();
    let runtime = selection.runtime();

    assert!( rejected.is_empty() );
    assert_eq!( runtime.interface_version(), 1 );
    assert_eq!( runtime.api_version(), ApiVersion::new( 1, 0, 34 ));
    assert_eq!( runtime.api_version().major(), NegotiationConfig::default().supported_api_major() );

}
