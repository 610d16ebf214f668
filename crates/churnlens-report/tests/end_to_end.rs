//! Report pipeline over real source files indexed with tree-sitter.

use std::fs;

use churnlens_core::OutputFormat;
use churnlens_report::{build_report, output, ReportOptions};
use churnlens_structure::TreeSitterParser;

const FOO_RB: &str = "\
class Foo
  def bar
    1
  end

  def baz
    2
  end
end
";

const WIDGET_PY: &str = "\
class Widget:
    def render(self):
        return 1


def helper():
    return 2
";

#[test]
fn ruby_and_python_entities_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib/foo.rb"), FOO_RB).unwrap();
    fs::write(dir.path().join("widget.py"), WIDGET_PY).unwrap();

    let mut log = vec!["lib/foo.rb"; 8];
    log.extend(vec!["widget.py"; 6]);
    log.extend(vec!["README.md"; 9]);
    log.push("rarely.rb");

    let diff = [
        "--- a/lib/foo.rb",
        "+++ b/lib/foo.rb",
        "@@ -7 +7 @@",
        "--- a/widget.py",
        "+++ b/widget.py",
        "@@ -7,0 +7,2 @@",
        "--- a/README.md",
        "+++ b/README.md",
        "@@ -1 +1 @@",
    ];

    let parser = TreeSitterParser::new(dir.path());
    let report = build_report(&log, diff, &parser, &ReportOptions::default()).unwrap();

    let files: Vec<&str> = report.changes.iter().map(|e| e.file_path.as_str()).collect();
    assert_eq!(files, vec!["README.md", "lib/foo.rb", "widget.py"]);

    let readme = &report.changes[0];
    assert!(readme.changed_classes.is_empty());
    assert!(readme.changed_methods.is_empty());

    let foo = &report.changes[1];
    assert_eq!(foo.times_changed, 8);
    assert_eq!(foo.changed_classes, vec!["Foo"]);
    assert_eq!(foo.changed_methods, vec!["Foo#baz"]);

    let widget = &report.changes[2];
    assert!(widget.changed_classes.is_empty());
    assert_eq!(widget.changed_methods, vec!["#helper"]);

    let json = output::render(&report, OutputFormat::Json, 0).unwrap();
    assert!(json.contains("\"Foo#baz\""));
}

#[test]
fn deleted_file_still_reported_without_entities() {
    let dir = tempfile::tempdir().unwrap();
    let log = vec!["lib/gone.rb"; 5];
    let diff = ["--- a/lib/gone.rb", "+++ /dev/null", "@@ -1,20 +0,0 @@"];

    let parser = TreeSitterParser::new(dir.path());
    let report = build_report(&log, diff, &parser, &ReportOptions::default()).unwrap();

    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].file_path, "lib/gone.rb");
    assert!(report.changes[0].changed_methods.is_empty());
}
