use proptest::prelude::*;
use surface_sync::codec::{
    address_to_export_name, collapse_address, expand_address, export_name_to_address,
};

const WORDS: &[&str] = &[
    "video", "audio", "opacity", "transform", "mixer", "params", "speed", "position", "blend",
];
const KINDS: &[&str] = &["layers", "clips", "decks", "effects"];
const ROOTS: &[&str] = &["/composition", "/arena/composition", "/project1/render/composition"];

/// One or two path segments: a plain word, or a collection followed by a numeric id.
fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(WORDS).prop_map(str::to_string),
        (proptest::sample::select(KINDS), 0u32..10_000).prop_map(|(k, id)| format!("{k}/{id}")),
    ]
}

/// Ends in either a word (`.../opacity`) or an id (`.../layers/3`).
fn numeric_address() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 1..7).prop_map(|segments| {
        let mut address = String::from("/composition");
        for s in segments {
            address.push('/');
            address.push_str(&s);
        }
        address
    })
}

proptest! {
    #[test]
    fn collapse_inverts_expand(address in numeric_address(), root in proptest::sample::select(ROOTS)) {
        let location = expand_address(&address, root).unwrap();
        prop_assert!(location.container.starts_with(root));
        prop_assert!(!location.leaf.contains('/'));

        let collapsed = collapse_address(&location.path()).unwrap();
        prop_assert_eq!(collapsed.as_str(), address.as_str());
    }

    #[test]
    fn export_name_inverts_address(address in numeric_address()) {
        let name = address_to_export_name(&address).unwrap();
        prop_assert_eq!(name.matches(':').count(), 1);
        prop_assert!(!name.starts_with('/'));

        let back = export_name_to_address(&name).unwrap();
        prop_assert_eq!(back.as_str(), address.as_str());
        prop_assert_eq!(address_to_export_name(back.as_str()).unwrap(), name);
    }

    #[test]
    fn expanded_paths_carry_no_bare_ids(address in numeric_address()) {
        let path = expand_address(&address, "/composition").unwrap().path();
        for kind in KINDS {
            let marker = format!("/{kind}/");
            for (i, _) in path.match_indices(&marker) {
                prop_assert!(path[i + marker.len()..].starts_with(kind.trim_end_matches('s')));
            }
        }
    }

    #[test]
    fn non_composition_input_never_panics(input in "\\PC{0,40}") {
        let _ = expand_address(&input, "/composition");
        let _ = collapse_address(&input);
        let _ = export_name_to_address(&input);
    }
}
