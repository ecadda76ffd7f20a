use std::path::PathBuf ;
use runtime_link::{ CandidateDescriptor, SelectionError };
use crate::{ mock_broker, MockLoader };

#[test]
fn selection_without_candidates_finds_no_backend() {

    let broker = mock_broker( MockLoader::new() );
    let candidates: [CandidateDescriptor; 0] = [];

    match broker.load_runtime( "create_session", &candidates ) {
        Err( SelectionError::NoBackendFound { rejected }) if rejected.is_empty() => {},
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

    assert!( broker.runtime().is_none() );
    assert_eq!( broker.loader().open_count(), 0 );

}

#[test]
fn selection_with_only_missing_libraries_reports_each() {

    let broker = mock_broker( MockLoader::new() );
    let candidates = vec![ CandidateDescriptor::new( "missing-a.so" ), CandidateDescriptor::new( "missing-b.so" )];

    match broker.load_runtime( "create_session", &candidates ) {
        Err( SelectionError::NoBackendFound { rejected }) => {
            let paths = rejected.iter().map(| candidate | candidate.library_path.clone() ).collect::<Vec<_>>();
            assert_eq!( paths, vec![ PathBuf::from( "missing-a.so" ), PathBuf::from( "missing-b.so" )]);
        },
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

}
