use runtime_link::{ CoreDispatchTable, ExtensionProperty };
use crate::{ negotiate_ok, negotiate_without_extensions, selected_runtime };

#[test]
fn extensions_are_queried_at_selection() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );

    assert_eq!( runtime.extensions().len(), 2 );
    assert_eq!( runtime.extensions().version_of( "EXT_hand_tracking" ), Some( 2 ));
    assert!( runtime.supports_extension( "EXT_debug_utils" ));
    assert!( !runtime.supports_extension( "EXT_local_floor" ));

}

#[test]
fn extensions_merge_with_runtime_as_authority() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_ok );

    let merged = runtime.extension_properties([
        ExtensionProperty::new( "EXT_hand_tracking", 1 ),
        ExtensionProperty::new( "EXT_local_floor", 1 ),
    ]);

    assert_eq!( merged, vec![
        ExtensionProperty::new( "EXT_hand_tracking", 2 ),
        ExtensionProperty::new( "EXT_local_floor", 1 ),
        ExtensionProperty::new( "EXT_debug_utils", 1 ),
    ]);

}

#[test]
fn extensions_missing_enumeration_leaves_set_empty() {

    let runtime = selected_runtime::<CoreDispatchTable>( negotiate_without_extensions );

    assert!( runtime.extensions().is_empty() );
    let known = vec![ ExtensionProperty::new( "EXT_local_floor", 1 )];
    assert_eq!( runtime.extension_properties( known.clone() ), known );

}
