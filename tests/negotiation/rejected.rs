use runtime_link::abi::ResultCode ;
use runtime_link::{ CandidateDescriptor, NegotiationError };
use crate::{ negotiate_rejecting, rejection_of, MockLoader };

#[test]
fn negotiation_failure_code_is_reported() {

    let loader = MockLoader::new().with_runtime( "runtime.so", negotiate_rejecting );

    match rejection_of( loader, CandidateDescriptor::new( "runtime.so" )) {
        NegotiationError::NegotiationRejected( ResultCode::ERROR_INITIALIZATION_FAILED ) => {},
        err => panic!( "Unexpected error: {}", err ),
    }

}

#[test]
fn negotiation_of_missing_library_is_a_load_failure() {

    match rejection_of( MockLoader::new(), CandidateDescriptor::new( "absent.so" )) {
        NegotiationError::LibraryLoadFailure( err ) => assert_eq!( err.path, std::path::PathBuf::from( "absent.so" )),
        err => panic!( "Unexpected error: {}", err ),
    }

}
