//! Extension (capability) bookkeeping.
//!
//! A runtime advertises a set of named, independently versioned extensions.
//! The set is queried once when the runtime is selected and frozen in an
//! [`ExtensionSet`]; [`merge_extensions`] reconciles it with a caller's list.

use std::collections::HashMap ;
use std::ffi::CStr ;
use itertools::Itertools ;
use pipe_trait::Pipe ;

use crate::abi::RawExtensionProperties ;



/// A named extension and its version.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct ExtensionProperty {
    pub name: String,
    pub version: u32,
}

impl ExtensionProperty {
    pub fn new( name: impl Into<String>, version: u32 ) -> Self {
        Self { name: name.into(), version }
    }
}

impl From<&RawExtensionProperties> for ExtensionProperty {
    fn from( raw: &RawExtensionProperties ) -> Self {
        #[allow( clippy::cast_sign_loss )]
        let bytes = raw.extension_name.map(| c | c as u8 );
        let name = CStr::from_bytes_until_nul( &bytes )
            .map_or_else(
                |_| String::from_utf8_lossy( &bytes ).into_owned(),
                | name | name.to_string_lossy().into_owned(),
            );
        Self { name, version: raw.extension_version }
    }
}

/// The extensions a runtime advertised when it was selected. Never mutated.
#[derive( Debug, Clone, Default )]
pub struct ExtensionSet {
    properties: Vec<ExtensionProperty>,
}

impl ExtensionSet {

    /// Freezes `properties`, dropping repeated names after their first occurrence.
    pub fn new( properties: impl IntoIterator<Item = ExtensionProperty> ) -> Self {
        properties.into_iter()
            .unique_by(| property | property.name.clone() )
            .collect::<Vec<_>>()
            .pipe(| properties | Self { properties })
    }

    #[inline] pub fn properties( &self ) -> &[ExtensionProperty] { &self.properties }

    #[inline] pub fn len( &self ) -> usize { self.properties.len() }

    #[inline] pub fn is_empty( &self ) -> bool { self.properties.is_empty() }

    pub fn contains( &self, name: &str ) -> bool {
        self.properties.iter().any(| property | property.name == name )
    }

    pub fn version_of( &self, name: &str ) -> Option<u32> {
        self.properties.iter().find(| property | property.name == name ).map(| property | property.version )
    }

}

/// Merges the runtime's advertised extensions into a caller's list.
///
/// The caller's order is kept. A caller entry with the same name as a runtime
/// entry takes the runtime's version. Runtime entries the caller didn't list are
/// appended in the runtime's order. No name appears twice in the result.
pub fn merge_extensions(
    caller: impl IntoIterator<Item = ExtensionProperty>,
    runtime: &[ExtensionProperty],
) -> Vec<ExtensionProperty> {

    let runtime_versions = runtime.iter()
        .rev()
        .map(| property | ( property.name.as_str(), property.version ))
        .collect::<HashMap<_, _>>();

    let merged = caller.into_iter()
        .unique_by(| property | property.name.clone() )
        .map(| property | match runtime_versions.get( property.name.as_str() ) {
            Some( &version ) => ExtensionProperty { version, ..property },
            None => property,
        })
        .collect::<Vec<_>>();

    let appended = runtime.iter()
        .filter(| property | !merged.iter().any(| known | known.name == property.name ))
        .unique_by(| property | property.name.clone() )
        .cloned()
        .collect::<Vec<_>>();

    merged.into_iter().chain( appended ).collect()

}



#[cfg( test )]
mod tests {
    use super::{ merge_extensions, ExtensionProperty, ExtensionSet };
    use crate::abi::RawExtensionProperties ;

    fn ext( name: &str, version: u32 ) -> ExtensionProperty { ExtensionProperty::new( name, version )}

    #[test]
    fn runtime_version_wins_and_new_entries_are_appended() {
        let merged = merge_extensions([ ext( "A", 1 )], &[ ext( "A", 2 ), ext( "B", 1 )]);
        assert_eq!( merged, vec![ ext( "A", 2 ), ext( "B", 1 )]);
    }

    #[test]
    fn caller_order_is_preserved() {
        let merged = merge_extensions(
            [ ext( "C", 1 ), ext( "A", 1 ), ext( "X", 7 )],
            &[ ext( "A", 3 ), ext( "B", 1 ), ext( "C", 4 )],
        );
        assert_eq!( merged, vec![ ext( "C", 4 ), ext( "A", 3 ), ext( "X", 7 ), ext( "B", 1 )]);
    }

    #[test]
    fn names_are_never_duplicated() {
        let merged = merge_extensions(
            [ ext( "A", 1 ), ext( "A", 5 )],
            &[ ext( "B", 1 ), ext( "B", 2 ), ext( "A", 9 )],
        );
        assert_eq!( merged, vec![ ext( "A", 9 ), ext( "B", 1 )]);
    }

    #[test]
    fn empty_caller_list_takes_runtime_list() {
        let merged = merge_extensions( Vec::new(), &[ ext( "A", 2 ), ext( "B", 1 )]);
        assert_eq!( merged, vec![ ext( "A", 2 ), ext( "B", 1 )]);
    }

    #[test]
    fn set_deduplicates_and_answers_queries() {
        let set = ExtensionSet::new([ ext( "A", 2 ), ext( "A", 3 ), ext( "B", 1 )]);
        assert_eq!( set.len(), 2 );
        assert!( set.contains( "B" ));
        assert!( !set.contains( "C" ));
        assert_eq!( set.version_of( "A" ), Some( 2 ));
    }

    #[test]
    fn raw_properties_convert_up_to_nul() {
        let mut raw = RawExtensionProperties::empty();
        for ( slot, byte ) in raw.extension_name.iter_mut().zip( b"EXT_debug_utils" ) {
            *slot = *byte as _ ;
        }
        raw.extension_version = 4 ;
        assert_eq!( ExtensionProperty::from( &raw ), ext( "EXT_debug_utils", 4 ));
    }
}
