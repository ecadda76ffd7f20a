/// Runs selection over one candidate that is expected to be skipped, and
/// returns why it was.
#[allow( dead_code )]
fn rejection_of( loader: MockLoader, candidate: runtime_link::CandidateDescriptor ) -> runtime_link::NegotiationError {
    let broker = mock_broker( loader );
    match broker.load_runtime( "create_session", &[ candidate ]) {
        Err( runtime_link::SelectionError::NoBackendFound { mut rejected }) if rejected.len() == 1 => {
            assert_eq!( broker.loader().close_count(), broker.loader().open_count() );
            assert!( broker.runtime().is_none() );
            rejected.remove( 0 ).error
        },
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok(( selection, _ )) => panic!( "Expected failure, selected {}", selection.runtime().library_path().display() ),
    }
}
