//! Integration test: load and index files through `TreeSitterParser`.

use std::fs;
use std::path::Path;

use churnlens_core::{ChurnError, LineRange, StructuralParser};
use churnlens_structure::TreeSitterParser;

#[test]
fn indexes_this_crate_sources() {
    let crate_root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let parser = TreeSitterParser::new(crate_root);

    let index = parser.entity_ranges("src/source.rs").unwrap();
    assert!(index.classes.ranges("SourceFile").is_some());
    assert!(index.classes.ranges("Language").is_some());
    assert!(index.methods.ranges("Language#from_extension").is_some());
    assert!(index.methods.ranges("#load_source").is_some());

    let index = parser.entity_ranges("src/lib.rs").unwrap();
    assert!(index.methods.ranges("TreeSitterParser#new").is_some());
    assert!(index.methods.ranges("TreeSitterParser#entity_ranges").is_some());
}

#[test]
fn indexes_files_relative_to_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::write(
        dir.path().join("lib/foo.rb"),
        "class Foo\n  def bar\n    1\n  end\nend\n",
    )
    .unwrap();

    let parser = TreeSitterParser::new(dir.path());
    let index = parser.entity_ranges("lib/foo.rb").unwrap();

    assert_eq!(index.classes.ranges("Foo"), Some(&[LineRange::new(1, 5)][..]));
    assert_eq!(index.methods.ranges("Foo#bar"), Some(&[LineRange::new(2, 4)][..]));
}

#[test]
fn unsupported_extensions_are_not_read() {
    let dir = tempfile::tempdir().unwrap();
    let parser = TreeSitterParser::new(dir.path());

    // The file does not exist; an unknown language never touches disk.
    let index = parser.entity_ranges("docs/README.md").unwrap();
    assert!(index.classes.is_empty());
    assert!(index.methods.is_empty());
}

#[test]
fn missing_source_is_a_structural_failure() {
    let dir = tempfile::tempdir().unwrap();
    let parser = TreeSitterParser::new(dir.path());

    let err = parser.entity_ranges("lib/deleted.rb").unwrap_err();
    assert!(matches!(err, ChurnError::StructuralParse { .. }));
}
