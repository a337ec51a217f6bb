use std::io::Write;

use trellis_core::config::{LoweringOptions, StructuralTypes};

fn write_options(raw: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(raw.as_bytes()).expect("write options");
    file
}

#[test]
fn missing_fields_take_defaults() {
    let file = write_options(r#"{"library_mode": true}"#);
    let options = LoweringOptions::load_from_file(file.path()).expect("load");
    assert!(options.library_mode);
    assert!(options.defer_linkage, "linkage is deferred unless disabled");
    assert!(options.is_native_module("Swift"));
    assert_eq!(options.structural_types, StructuralTypes::Reject);
}

#[test]
fn structural_policy_is_lowercase() {
    let file = write_options(r#"{"structural_types": "typescript", "native_modules": ["Kit"]}"#);
    let options = LoweringOptions::load_from_file(file.path()).expect("load");
    assert_eq!(options.structural_types, StructuralTypes::Typescript);
    assert!(options.is_native_module("Kit"));
    assert!(!options.is_native_module("Swift"), "the list replaces the defaults");
}

#[test]
fn duplicate_native_module_is_rejected() {
    let file = write_options(r#"{"native_modules": ["Swift", "Swift"]}"#);
    let err = LoweringOptions::load_from_file(file.path()).expect_err("duplicate must fail");
    assert!(err.contains("duplicate"), "{}", err);
}

#[test]
fn unreadable_path_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = LoweringOptions::load_from_file(dir.path().join("absent.json")).expect_err("missing file");
    assert!(err.starts_with("read options"), "{}", err);
}
