//! Class and method line ranges via tree-sitter.
//!
//! [`TreeSitterParser`] implements [`StructuralParser`] for files in a working
//! copy: it loads the file, picks a grammar from the extension, and indexes
//! every class (struct, trait, module...) and method body in one parse.

pub mod parser;
pub mod source;

use std::path::{Path, PathBuf};

use churnlens_core::{ChurnError, StructuralIndex, StructuralParser};
use tracing::debug;

use crate::source::Language;

/// Structural parser for files under a repository root.
///
/// Files in languages without a grammar produce an empty index without
/// being read.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use churnlens_core::StructuralParser;
/// use churnlens_structure::TreeSitterParser;
///
/// let parser = TreeSitterParser::new(Path::new("."));
/// let index = parser.entity_ranges("src/lib.rs").unwrap();
/// for (name, ranges) in index.methods.iter() {
///     println!("{name}: {ranges:?}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TreeSitterParser {
    root: PathBuf,
}

impl TreeSitterParser {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl StructuralParser for TreeSitterParser {
    fn entity_ranges(&self, file_path: &str) -> Result<StructuralIndex, ChurnError> {
        if Language::from_path(Path::new(file_path)) == Language::Unknown {
            debug!(file = file_path, "no grammar, skipping");
            return Ok(StructuralIndex::default());
        }

        let file = source::load_source(&self.root, file_path)?;
        let index = parser::index_source(&file)?;
        debug!(
            file = file_path,
            classes = index.classes.len(),
            methods = index.methods.len(),
            "indexed file"
        );
        Ok(index)
    }
}
