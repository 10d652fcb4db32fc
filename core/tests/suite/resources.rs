use std::fs;

use tarry::{Mapping, Recorder, assert_equal_dictionaries};

fn load(name: &str) -> Mapping {
    let path = tarry::test_resource_directory!().join(name);
    let raw = fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    let value: serde_json::Value = serde_json::from_str(&raw).expect("fixture is JSON");
    Mapping::try_from(value).expect("fixture is an object")
}

#[test]
fn resource_directory_sits_beside_the_suite() {
    let dir = tarry::test_resource_directory!();

    assert!(dir.ends_with("core/tests/resources"), "{}", dir.display());
    assert!(dir.join("order.json").is_file());
}

#[test]
fn fixture_matches_literal_mapping() {
    let recorder = Recorder::new();
    let expected = Mapping::new()
        .with("id", 1042)
        .with("status", "shipped")
        .with("items", 3)
        .with(
            "customer",
            Mapping::new().with("name", "Ada").with(
                "address",
                Mapping::new()
                    .with("city", "London")
                    .with("postcode", "NW1 6XE"),
            ),
        );

    assert_eq!(assert_equal_dictionaries(&recorder, &load("order.json"), &expected), 0);
    recorder.assert_clean();
}
