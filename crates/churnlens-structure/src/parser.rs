use churnlens_core::{ChurnError, LineRange, StructuralIndex};
use tree_sitter::{Node, Parser};

use crate::source::{Language, SourceFile};

/// Node kinds that declare classes and methods in one grammar.
struct Grammar {
    classes: &'static [&'static str],
    methods: &'static [&'static str],
}

const RUST: Grammar = Grammar {
    classes: &["struct_item", "enum_item", "union_item", "trait_item", "impl_item"],
    methods: &["function_item", "function_signature_item"],
};

const PYTHON: Grammar = Grammar {
    classes: &["class_definition"],
    methods: &["function_definition"],
};

const RUBY: Grammar = Grammar {
    classes: &["class", "module"],
    methods: &["method", "singleton_method"],
};

const JAVASCRIPT: Grammar = Grammar {
    classes: &["class_declaration", "class"],
    methods: &[
        "method_definition",
        "function_declaration",
        "generator_function_declaration",
        "variable_declarator",
    ],
};

const TYPESCRIPT: Grammar = Grammar {
    classes: &[
        "class_declaration",
        "abstract_class_declaration",
        "class",
        "interface_declaration",
    ],
    methods: &[
        "method_definition",
        "method_signature",
        "abstract_method_signature",
        "function_declaration",
        "generator_function_declaration",
        "variable_declarator",
    ],
};

const GO: Grammar = Grammar {
    classes: &["type_spec"],
    methods: &["method_declaration", "function_declaration"],
};

const JAVA: Grammar = Grammar {
    classes: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
    ],
    methods: &["method_declaration", "constructor_declaration"],
};

const C: Grammar = Grammar {
    classes: &["struct_specifier", "union_specifier", "enum_specifier"],
    methods: &["function_definition"],
};

const CPP: Grammar = Grammar {
    classes: &["class_specifier", "struct_specifier", "union_specifier"],
    methods: &["function_definition"],
};

const PHP: Grammar = Grammar {
    classes: &[
        "class_declaration",
        "interface_declaration",
        "trait_declaration",
        "enum_declaration",
    ],
    methods: &["method_declaration", "function_definition"],
};

const KOTLIN: Grammar = Grammar {
    classes: &["class_declaration", "object_declaration"],
    methods: &["function_declaration"],
};

const SWIFT: Grammar = Grammar {
    classes: &["class_declaration", "protocol_declaration"],
    methods: &["function_declaration", "protocol_function_declaration"],
};

impl Language {
    fn grammar(&self) -> Option<&'static Grammar> {
        match self {
            Language::Rust => Some(&RUST),
            Language::Python => Some(&PYTHON),
            Language::Ruby => Some(&RUBY),
            Language::JavaScript => Some(&JAVASCRIPT),
            Language::TypeScript | Language::Tsx => Some(&TYPESCRIPT),
            Language::Go => Some(&GO),
            Language::Java => Some(&JAVA),
            Language::C => Some(&C),
            Language::Cpp => Some(&CPP),
            Language::Php => Some(&PHP),
            Language::Kotlin => Some(&KOTLIN),
            Language::Swift => Some(&SWIFT),
            Language::Unknown => None,
        }
    }
}

/// C-family type specifiers are only declarations when they carry a body.
const BODY_REQUIRED: &[&str] = &[
    "struct_specifier",
    "class_specifier",
    "union_specifier",
    "enum_specifier",
];

/// Child kinds tried, in order, when a node has no `name` field.
const NAME_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "simple_identifier",
    "constant",
    "scope_resolution",
    "property_identifier",
    "field_identifier",
    "name",
];

/// Index the class and method body ranges of a source file.
///
/// Lines are 1-based and ranges inclusive. Methods are keyed
/// `Class#method`; functions outside any class are keyed `#function`.
/// A class reopened in the same file gets one range per declaration.
///
/// # Errors
///
/// Returns [`ChurnError::StructuralParse`] if the grammar cannot be loaded or
/// the source does not parse cleanly.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use churnlens_core::LineRange;
/// use churnlens_structure::parser::index_source;
/// use churnlens_structure::source::{Language, SourceFile};
///
/// let file = SourceFile {
///     path: PathBuf::from("lib/foo.rb"),
///     language: Language::Ruby,
///     content: "class Foo\n  def bar\n  end\nend\n".to_string(),
/// };
/// let index = index_source(&file).unwrap();
/// assert_eq!(index.classes.ranges("Foo"), Some(&[LineRange::new(1, 4)][..]));
/// assert_eq!(index.methods.ranges("Foo#bar"), Some(&[LineRange::new(2, 3)][..]));
/// ```
pub fn index_source(file: &SourceFile) -> Result<StructuralIndex, ChurnError> {
    let (Some(ts_language), Some(grammar)) =
        (file.language.tree_sitter_language(), file.language.grammar())
    else {
        return Ok(StructuralIndex::default());
    };

    let fail = |message: String| ChurnError::StructuralParse {
        path: file.path.display().to_string(),
        message,
    };

    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|e| fail(format!("failed to set language: {e}")))?;

    let tree = parser
        .parse(&file.content, None)
        .ok_or_else(|| fail("parser produced no tree".into()))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(fail("source contains syntax errors".into()));
    }

    let mut index = StructuralIndex::default();
    collect(root, file.content.as_bytes(), grammar, None, &mut index);
    Ok(index)
}

fn collect(
    node: Node,
    source: &[u8],
    grammar: &Grammar,
    enclosing: Option<&str>,
    index: &mut StructuralIndex,
) {
    if !node.is_named() {
        return;
    }

    let kind = node.kind();
    let mut declared: Option<String> = None;

    if grammar.classes.contains(&kind) && declares_body(&node) {
        if let Some(name) = class_name(&node, source) {
            index.classes.insert(name.as_str(), span(&node));
            declared = Some(name);
        }
    } else if grammar.methods.contains(&kind) && is_function(&node) {
        if let Some((owner, name)) = method_owner_and_name(&node, source, enclosing) {
            index.methods.insert(format!("{owner}#{name}"), span(&node));
        }
    }

    let enclosing = declared.as_deref().or(enclosing);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, source, grammar, enclosing, index);
    }
}

fn span(node: &Node) -> LineRange {
    let start = node.start_position();
    let end = node.end_position();
    // A node ending at column 0 stops before that row.
    let last_row = if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    };
    LineRange::new(start.row as u32 + 1, last_row as u32 + 1)
}

fn declares_body(node: &Node) -> bool {
    !BODY_REQUIRED.contains(&node.kind()) || node.child_by_field_name("body").is_some()
}

/// `const f = () => {}` counts as a function; other declarators do not.
fn is_function(node: &Node) -> bool {
    if node.kind() != "variable_declarator" {
        return true;
    }
    node.child_by_field_name("value").is_some_and(|value| {
        matches!(
            value.kind(),
            "arrow_function" | "function_expression" | "function" | "generator_function"
        )
    })
}

fn class_name(node: &Node, source: &[u8]) -> Option<String> {
    if node.kind() == "impl_item" {
        // `impl<T> Display for Foo<T>` belongs to `Foo`.
        let self_type = node.child_by_field_name("type")?;
        let text = node_text(&self_type, source);
        let bare = text.split('<').next().unwrap_or(&text).trim();
        return (!bare.is_empty()).then(|| bare.to_string());
    }
    entity_name(node, source)
}

fn method_owner_and_name(
    node: &Node,
    source: &[u8],
    enclosing: Option<&str>,
) -> Option<(String, String)> {
    let name = if node.child_by_field_name("declarator").is_some() {
        declarator_name(node, source).or_else(|| find_nested_function_name(node, source))?
    } else {
        entity_name(node, source)?
    };

    if node.kind() == "method_declaration" {
        if let Some(receiver) = receiver_type(node, source) {
            return Some((receiver, name));
        }
    }

    // C++ out-of-line definitions: `void Foo::bar() {}`.
    if let Some((owner, method)) = name.rsplit_once("::") {
        if !owner.is_empty() && !method.is_empty() {
            return Some((owner.to_string(), method.to_string()));
        }
    }

    Some((enclosing.unwrap_or_default().to_string(), name))
}

fn entity_name(node: &Node, source: &[u8]) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        let text = node_text(&name, source);
        if !text.is_empty() {
            return Some(text);
        }
    }
    NAME_KINDS
        .iter()
        .find_map(|kind| find_child_text(node, kind, source))
}

/// Follow `declarator` fields down to the declared function name.
fn declarator_name(node: &Node, source: &[u8]) -> Option<String> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name"
            | "operator_name" => return Some(node_text(&current, source)),
            _ => current = current.child_by_field_name("declarator")?,
        }
    }
}

fn find_nested_function_name(node: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "function_declarator" {
            return find_child_text(&child, "identifier", source)
                .or_else(|| find_child_text(&child, "field_identifier", source));
        }
    }
    None
}

/// Go receiver type, without pointer or type parameters.
fn receiver_type(node: &Node, source: &[u8]) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    find_descendant_text(&receiver, "type_identifier", source)
}

fn find_descendant_text(node: &Node, kind: &str, source: &[u8]) -> Option<String> {
    if node.kind() == kind {
        return Some(node_text(node, source));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(text) = find_descendant_text(&child, kind, source) {
            return Some(text);
        }
    }
    None
}

fn node_text(node: &Node, source: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    if start >= source.len() || end > source.len() {
        return String::new();
    }
    String::from_utf8_lossy(&source[start..end]).to_string()
}

fn find_child_text(node: &Node, kind: &str, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            let text = node_text(&child, source);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
