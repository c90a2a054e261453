use super::*;

fn letters(items: &[&str]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(*s)).collect())
}

fn doc() -> Map {
    [
        ("name", Value::from("alice")),
        ("letters", letters(&["a", "b", "c", "d"])),
        (
            "settings",
            [
                ("theme", Value::from("dark")),
                ("volume", Value::Integer(3)),
                (
                    "nested",
                    [("keep", Value::Boolean(true)), ("drop", Value::Null)]
                        .into_iter()
                        .collect(),
                ),
            ]
            .into_iter()
            .collect(),
        ),
        (
            "rows",
            Value::from(vec![
                [("id", Value::Integer(1)), ("tmp", Value::Null)]
                    .into_iter()
                    .collect::<Value>(),
                [("id", Value::Integer(2))].into_iter().collect::<Value>(),
            ]),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (SmolStr::from(k), v))
    .collect()
}

fn key(k: &str) -> SmolStr {
    SmolStr::from(k)
}

#[test]
fn empty_overlays_leave_document_unchanged() {
    let mut document = doc();
    let spliced = apply_replace(&mut document, &ReplaceTree::new());
    apply_delete(&mut document, &DeleteTree::new());
    assert!(!spliced);
    assert_eq!(document, doc());
}

#[test]
fn replace_inserts_overwrites_and_recurses() {
    let mut document = doc();
    let replace: ReplaceTree = [
        (key("name"), Replace::Set(Value::from("bob"))),
        (key("age"), Replace::Set(Value::Integer(40))),
        (
            key("settings"),
            Replace::Merge([(key("volume"), Replace::Set(Value::Integer(11)))].into()),
        ),
    ]
    .into();
    assert!(!apply_replace(&mut document, &replace));

    assert_eq!(document["name"], Value::from("bob"));
    assert_eq!(document["age"], Value::Integer(40));
    let settings = document["settings"].as_map().unwrap();
    assert_eq!(settings["volume"], Value::Integer(11));
    assert_eq!(settings["theme"], Value::from("dark"));
    assert!(settings.contains_key("nested"));
}

#[test]
fn plain_map_overlay_merges_instead_of_replacing() {
    let mut document = doc();
    let overlay: Map = [(
        key("settings"),
        [("theme", Value::from("light"))].into_iter().collect(),
    )]
    .into();
    apply_replace(&mut document, &Replace::tree(overlay));
    let settings = document["settings"].as_map().unwrap();
    assert_eq!(settings["theme"], Value::from("light"));
    assert_eq!(settings["volume"], Value::Integer(3));
}

#[test]
fn array_set_replaces_whole_sequence() {
    let mut document = doc();
    let replace: ReplaceTree = [(key("letters"), Replace::Set(letters(&["z"])))].into();
    assert!(!apply_replace(&mut document, &replace));
    assert_eq!(document["letters"], letters(&["z"]));
}

#[test]
fn splice_replaces_and_appends() {
    let mut document = doc();
    let replace: ReplaceTree = [(
        key("letters"),
        Replace::Splice(vec![
            (1, Value::from("B")),
            (4, Value::from("e")),
            (9, Value::from("ignored")),
        ]),
    )]
    .into();
    assert!(apply_replace(&mut document, &replace));
    assert_eq!(document["letters"], letters(&["a", "B", "c", "d", "e"]));
}

#[test]
fn splice_over_non_array_replaces_wholesale() {
    let mut document = doc();
    let replace: ReplaceTree =
        [(key("name"), Replace::Splice(vec![(0, Value::from("x")), (3, Value::Null)]))].into();
    assert!(!apply_replace(&mut document, &replace));
    assert_eq!(document["name"], letters(&["x"]));
}

#[test]
fn merge_over_scalar_replaces_it_with_a_map() {
    let mut document = doc();
    let replace: ReplaceTree = [(
        key("name"),
        Replace::Merge([(key("first"), Replace::Set(Value::from("al")))].into()),
    )]
    .into();
    apply_replace(&mut document, &replace);
    assert_eq!(document["name"].get("first"), Some(&Value::from("al")));
}

#[test]
fn nested_splice_reports_positional_edit() {
    let mut document = doc();
    let replace: ReplaceTree = [(
        key("settings"),
        Replace::Merge(
            [(
                key("nested"),
                Replace::Merge(
                    [(key("list"), Replace::Splice(vec![(0, Value::Integer(1))]))].into(),
                ),
            )]
            .into(),
        ),
    )]
    .into();
    // "list" does not exist yet, so this is an insert, not a splice
    assert!(!apply_replace(&mut document, &replace));
    assert_eq!(
        document["settings"].get("nested").and_then(|n| n.get("list")),
        Some(&Value::from(vec![Value::Integer(1)]))
    );

    let again: ReplaceTree = [(
        key("settings"),
        Replace::Merge(
            [(
                key("nested"),
                Replace::Merge(
                    [(key("list"), Replace::Splice(vec![(1, Value::Integer(2))]))].into(),
                ),
            )]
            .into(),
        ),
    )]
    .into();
    assert!(apply_replace(&mut document, &again));
}

#[test]
fn delete_leaf_and_nested_keys() {
    let mut document = doc();
    let delete: DeleteTree = [
        (key("name"), Delete::Remove),
        (
            key("settings"),
            Delete::Fields(
                [(
                    key("nested"),
                    Delete::Fields([(key("drop"), Delete::Remove)].into()),
                )]
                .into(),
            ),
        ),
        (key("missing"), Delete::Remove),
    ]
    .into();
    apply_delete(&mut document, &delete);

    assert!(!document.contains_key("name"));
    let nested = document["settings"].get("nested").unwrap().as_map().unwrap();
    assert!(nested.contains_key("keep"));
    assert!(!nested.contains_key("drop"));
}

#[test]
fn empty_nested_spec_removes_whole_key() {
    let mut document = doc();
    apply_delete(
        &mut document,
        &[
            (key("settings"), Delete::Fields(DeleteTree::new())),
            (key("letters"), Delete::Elements(Vec::new())),
        ]
        .into(),
    );
    assert!(!document.contains_key("settings"));
    assert!(!document.contains_key("letters"));
}

#[test]
fn positional_delete_is_order_independent() {
    for elements in [
        vec![(0, Delete::Remove), (2, Delete::Remove)],
        vec![(2, Delete::Remove), (0, Delete::Remove)],
    ] {
        let mut document = doc();
        apply_delete(
            &mut document,
            &[(key("letters"), Delete::Elements(elements))].into(),
        );
        assert_eq!(document["letters"], letters(&["b", "d"]));
    }
}

#[test]
fn positional_delete_ignores_out_of_range_and_duplicates() {
    let mut document = doc();
    apply_delete(
        &mut document,
        &[(
            key("letters"),
            Delete::Elements(vec![(7, Delete::Remove), (1, Delete::Remove), (1, Delete::Remove)]),
        )]
        .into(),
    );
    assert_eq!(document["letters"], letters(&["a", "c", "d"]));
}

#[test]
fn positional_delete_descends_into_elements() {
    let mut document = doc();
    apply_delete(
        &mut document,
        &[(
            key("rows"),
            Delete::Elements(vec![(
                0,
                Delete::Fields([(key("tmp"), Delete::Remove)].into()),
            )]),
        )]
        .into(),
    );
    let rows = document["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
    assert!(rows[0].get("tmp").is_none());
}

#[test]
fn shape_mismatch_is_ignored() {
    let mut document = doc();
    apply_delete(
        &mut document,
        &[(
            key("name"),
            Delete::Fields([(key("x"), Delete::Remove)].into()),
        )]
        .into(),
    );
    assert_eq!(document, doc());
}

#[test]
fn delete_keys_helper() {
    let mut document = doc();
    apply_delete(&mut document, &Delete::keys(["name", "rows"]));
    assert_eq!(document.len(), 2);
}

#[test]
fn count_leaves_matches_structure() {
    // name 1 + letters 4 + settings 4 + rows 3
    assert_eq!(count_leaves(&doc()), 12);
    assert_eq!(count_leaves(&Map::new()), 0);
}
