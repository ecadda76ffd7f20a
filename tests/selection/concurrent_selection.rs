use std::sync::{ Arc, Barrier };
use runtime_link::{ CandidateDescriptor, Selection };
use crate::{ mock_broker, negotiate_ok, MockLoader };

const THREADS: usize = 16 ;

#[test]
fn concurrent_selection_constructs_one_runtime() {

    let broker = mock_broker( MockLoader::new().with_runtime( "runtime.so", negotiate_ok ));
    let candidates = [ CandidateDescriptor::new( "runtime.so" )];
    let barrier = Barrier::new( THREADS );

    let selections = std::thread::scope(| scope | {
        let handles = ( 0..THREADS )
            .map(|_| scope.spawn(|| {
                barrier.wait();
                broker.load_runtime( "create_session", &candidates ).unwrap().0
            }))
            .collect::<Vec<_>>();
        handles.into_iter().map(| handle | handle.join().unwrap() ).collect::<Vec<_>>()
    });

    let selected = selections.iter().filter(| selection | matches!( selection, Selection::Selected( _ ))).count();
    assert_eq!( selected, 1 );
    let runtime = selections[0].runtime();
    assert!( selections.iter().all(| selection | Arc::ptr_eq( selection.runtime(), runtime )));
    assert_eq!( broker.loader().open_count(), 1 );
    assert_eq!( broker.loader().close_count(), 0 );

}
