use kobo_model::PathMapping;

const FLAT: &str = r#"{
    "sector": "RESPONSES/sector",
    "community": "RESPONSES/FIGURES_COMMUNITY/community",
    "FIGURES_COMMUNITY": "RESPONSES/FIGURES_COMMUNITY"
}"#;

const RICH: &str = r#"{
    "fields": {
        "sector": "RESPONSES/sector",
        "community": "RESPONSES/FIGURES_COMMUNITY/community",
        "FIGURES_COMMUNITY": "RESPONSES/FIGURES_COMMUNITY"
    },
    "choices": {
        "sector": { "Health": "HEALTH", "Education": "EDU" }
    }
}"#;

#[test]
fn flat_and_rich_shapes_normalize_identically() {
    let flat = PathMapping::from_json(FLAT).unwrap();
    let rich = PathMapping::from_json(RICH).unwrap();

    let flat_fields: Vec<(String, String)> = flat
        .fields()
        .map(|(name, path)| (name.to_string(), path.to_string()))
        .collect();
    let rich_fields: Vec<(String, String)> = rich
        .fields()
        .map(|(name, path)| (name.to_string(), path.to_string()))
        .collect();
    assert_eq!(flat_fields, rich_fields);

    // The flat shape simply carries no choice tables.
    assert!(flat.choices_for("sector").is_none());
    assert_eq!(rich.choices_for("sector").unwrap().len(), 2);
}

#[test]
fn rich_shape_without_choices_key_is_accepted() {
    let mapping = PathMapping::from_json(r#"{ "fields": { "a": "G/a" } }"#).unwrap();
    assert_eq!(mapping.field_count(), 1);
    assert_eq!(mapping.path_of("a").unwrap().to_string(), "G/a");
}

#[test]
fn field_declaration_order_is_preserved() {
    let mapping = PathMapping::from_json(
        r#"{ "zulu": "G/zulu", "alpha": "G/alpha", "mike": "G/mike" }"#,
    )
    .unwrap();
    let order: Vec<&str> = mapping.fields().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["zulu", "alpha", "mike"]);
}

#[test]
fn malformed_path_fails_load() {
    assert!(PathMapping::from_json(r#"{ "a": "G//a" }"#).is_err());
}

#[test]
fn invalid_json_is_a_mapping_error() {
    assert!(PathMapping::from_json("not json").is_err());
}
