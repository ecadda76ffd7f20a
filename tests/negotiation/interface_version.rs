use runtime_link::{ CandidateDescriptor, IncompatibleVersion, NegotiationError };
use crate::{ negotiate_interface_two, negotiate_interface_zero, rejection_of, MockLoader };

#[test]
fn negotiation_rejects_interface_version_zero() {

    let loader = MockLoader::new().with_runtime( "runtime.so", negotiate_interface_zero );

    match rejection_of( loader, CandidateDescriptor::new( "runtime.so" )) {
        NegotiationError::IncompatibleVersion( IncompatibleVersion::Interface { negotiated: 0, max: 1 }) => {},
        err => panic!( "Unexpected error: {}", err ),
    }

}

#[test]
fn negotiation_rejects_interface_version_above_max() {

    let loader = MockLoader::new().with_runtime( "runtime.so", negotiate_interface_two );

    match rejection_of( loader, CandidateDescriptor::new( "runtime.so" )) {
        NegotiationError::IncompatibleVersion( IncompatibleVersion::Interface { negotiated: 2, max: 1 }) => {},
        err => panic!( "Unexpected error: {}", err ),
    }

}
