use std::path::{Path, PathBuf};

use churnlens_core::ChurnError;

/// Maximum file size to index (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Number of bytes to check for binary detection.
const BINARY_CHECK_SIZE: usize = 8192;

/// A source file loaded for indexing.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use churnlens_structure::source::{Language, SourceFile};
///
/// let file = SourceFile {
///     path: PathBuf::from("lib/foo.rb"),
///     language: Language::Ruby,
///     content: "class Foo\nend\n".to_string(),
/// };
/// assert_eq!(file.language, Language::Ruby);
/// ```
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the repository root.
    pub path: PathBuf,
    /// Detected programming language.
    pub language: Language,
    /// Full file content.
    pub content: String,
}

/// Programming language detected from file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use churnlens_structure::source::Language;
///
/// assert_eq!(Language::from_extension("rb"), Language::Ruby);
/// assert_eq!(Language::from_extension("tsx"), Language::Tsx);
/// assert_eq!(Language::from_path(Path::new("src/lib.rs")), Language::Rust);
/// assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Php,
    Kotlin,
    Swift,
    Unknown,
}

impl Language {
    /// Detect language from a file extension string (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "rs" => Language::Rust,
            "py" => Language::Python,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Language::Cpp,
            "rb" | "rake" => Language::Ruby,
            "php" => Language::Php,
            "kt" | "kts" => Language::Kotlin,
            "swift" => Language::Swift,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Language::Unknown, Language::from_extension)
    }

    /// Get the tree-sitter language grammar for this language.
    ///
    /// Returns `None` for `Language::Unknown`.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
            Language::C => Some(tree_sitter_c::LANGUAGE.into()),
            Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Language::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
            Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
            Language::Kotlin => Some(tree_sitter_kotlin_ng::LANGUAGE.into()),
            Language::Swift => Some(tree_sitter_swift::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }
}

/// Read `rel_path` under `root` for indexing.
///
/// # Errors
///
/// Returns [`ChurnError::StructuralParse`] if the file is missing, unreadable,
/// not UTF-8, larger than 1 MB, or looks binary.
pub fn load_source(root: &Path, rel_path: &str) -> Result<SourceFile, ChurnError> {
    let fail = |message: String| ChurnError::StructuralParse {
        path: rel_path.to_string(),
        message,
    };

    let full = root.join(rel_path);
    let metadata = std::fs::metadata(&full).map_err(|e| fail(e.to_string()))?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(fail(format!("file is larger than {MAX_FILE_SIZE} bytes")));
    }

    let content = std::fs::read_to_string(&full).map_err(|e| fail(e.to_string()))?;

    // Null bytes in the first 8KB mean binary content.
    let check_len = content.len().min(BINARY_CHECK_SIZE);
    if content.as_bytes()[..check_len].contains(&0) {
        return Err(fail("binary content".into()));
    }

    Ok(SourceFile {
        path: PathBuf::from(rel_path),
        language: Language::from_path(Path::new(rel_path)),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extensions_map_to_languages() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension("jsx"), Language::JavaScript);
        assert_eq!(Language::from_extension("go"), Language::Go);
        assert_eq!(Language::from_extension("java"), Language::Java);
        assert_eq!(Language::from_extension("h"), Language::C);
        assert_eq!(Language::from_extension("hpp"), Language::Cpp);
        assert_eq!(Language::from_extension("php"), Language::Php);
        assert_eq!(Language::from_extension("kt"), Language::Kotlin);
        assert_eq!(Language::from_extension("swift"), Language::Swift);
        assert_eq!(Language::from_extension("txt"), Language::Unknown);
    }

    #[test]
    fn every_known_grammar_loads_into_a_parser() {
        for lang in [
            Language::Rust,
            Language::Python,
            Language::TypeScript,
            Language::Tsx,
            Language::JavaScript,
            Language::Go,
            Language::Java,
            Language::C,
            Language::Cpp,
            Language::Ruby,
            Language::Php,
            Language::Kotlin,
            Language::Swift,
        ] {
            let grammar = lang
                .tree_sitter_language()
                .unwrap_or_else(|| panic!("{lang:?} has no grammar"));
            let mut parser = tree_sitter::Parser::new();
            assert!(
                parser.set_language(&grammar).is_ok(),
                "{lang:?} grammar ABI {} is not loadable",
                grammar.abi_version()
            );
        }
        assert!(Language::Unknown.tree_sitter_language().is_none());
    }

    #[test]
    fn load_source_reads_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/foo.rb"), "class Foo\nend\n").unwrap();

        let file = load_source(dir.path(), "lib/foo.rb").unwrap();
        assert_eq!(file.path, PathBuf::from("lib/foo.rb"));
        assert_eq!(file.language, Language::Ruby);
        assert!(file.content.starts_with("class Foo"));
    }

    #[test]
    fn missing_file_is_a_structural_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_source(dir.path(), "gone.rb").unwrap_err();
        assert!(matches!(err, ChurnError::StructuralParse { ref path, .. } if path == "gone.rb"));
    }

    #[test]
    fn binary_and_large_files_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut binary = b"fn main() { ".to_vec();
        binary.push(0);
        binary.extend_from_slice(b" }");
        fs::write(dir.path().join("binary.rs"), &binary).unwrap();
        fs::write(dir.path().join("huge.rs"), "x".repeat(1_048_577)).unwrap();

        assert!(load_source(dir.path(), "binary.rs").is_err());
        assert!(load_source(dir.path(), "huge.rs").is_err());
    }
}
