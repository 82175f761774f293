use kobo_convert::{LabelResolver, ValidationPolicy, ValidationReporter, looks_like_code};
use kobo_model::{CellValue, PathMapping, RecordKey};
use proptest::prelude::*;

fn mapping() -> PathMapping {
    PathMapping::from_json(
        r#"{
            "fields": { "community": "RESPONSES/community" },
            "choices": { "community": { "Port Royal": "JM0101", "Hope Bay": "JM0402" } }
        }"#,
    )
    .unwrap()
}

proptest! {
    // Resolution is total: any cell yields a value (or a deliberate blank),
    // never a panic, whatever the input looks like.
    #[test]
    fn resolution_never_fails(raw in "\\PC{0,40}") {
        let mapping = mapping();
        let policy = ValidationPolicy::default();
        let resolver = LabelResolver::new(&mapping, &policy);
        let mut reporter = ValidationReporter::new();
        let key = RecordKey::new("U1").unwrap();

        let cell = CellValue::from_raw(&raw);
        let resolved = resolver.resolve("community", &cell, &key, &mut reporter);
        match cell {
            CellValue::Text(_) => prop_assert!(resolved.is_some()),
            CellValue::Missing => prop_assert!(resolved.is_none()),
        }
        // Summarizing is always safe, findings or not.
        let _ = reporter.summarize();
    }

    #[test]
    fn code_shape_is_panic_free(raw in "\\PC{0,20}") {
        let _ = looks_like_code(&raw);
    }
}
