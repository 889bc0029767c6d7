//! Lexers: split source text into classified tokens
//!
//! Grammar-backed lexers (Rust, Go, Python, JavaScript, Markdown) use
//! tree-sitter. Tokens always partition the
//! input: concatenating their text gives back the source exactly.

use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;
use tree_sitter::{Language, Node, Parser};

/// Syntactic category of a token. [`TokenKind::name`] is the theme key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Type,
    Function,
    Macro,
    String,
    Number,
    Constant,
    Comment,
    Attribute,
    Lifetime,
    Property,
    Operator,
    Punctuation,
    Heading,
    Text,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Type => "type",
            TokenKind::Function => "function",
            TokenKind::Macro => "macro",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Constant => "constant",
            TokenKind::Comment => "comment",
            TokenKind::Attribute => "attribute",
            TokenKind::Lifetime => "lifetime",
            TokenKind::Property => "property",
            TokenKind::Operator => "operator",
            TokenKind::Punctuation => "punctuation",
            TokenKind::Heading => "heading",
            TokenKind::Text => "text",
        }
    }
}

/// A classified span of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Tokenizes source text.
pub trait Lexer: Send + Sync {
    fn name(&self) -> &str;

    /// Splits `text` into tokens covering it completely and in order.
    fn tokenize(&self, text: &str) -> Result<Vec<Token>>;
}

/// Treats the whole input as one unclassified token.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainLexer;

impl Lexer for PlainLexer {
    fn name(&self) -> &str {
        "text"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Token::new(TokenKind::Text, text)])
    }
}

type Classify = fn(&Node, &str) -> TokenKind;

/// A lexer driven by a tree-sitter grammar.
///
/// Leaves of the syntax tree become tokens; node kinds listed as atomic
/// (comments, strings, headings, ...) are emitted whole. Bytes between
/// leaves become `text` tokens.
pub struct TreeSitterLexer {
    name: &'static str,
    language: Language,
    atomic: &'static [&'static str],
    classify: Classify,
}

impl TreeSitterLexer {
    pub fn rust() -> Self {
        Self {
            name: "rust",
            language: tree_sitter_rust::LANGUAGE.into(),
            atomic: RUST_ATOMIC,
            classify: classify_rust,
        }
    }

    pub fn markdown() -> Self {
        Self {
            name: "markdown",
            language: tree_sitter_md::LANGUAGE.into(),
            atomic: MARKDOWN_ATOMIC,
            classify: classify_markdown,
        }
    }

    pub fn go() -> Self {
        Self {
            name: "go",
            language: tree_sitter_go::LANGUAGE.into(),
            atomic: GO_ATOMIC,
            classify: classify_go,
        }
    }

    pub fn python() -> Self {
        Self {
            name: "python",
            language: tree_sitter_python::LANGUAGE.into(),
            atomic: PYTHON_ATOMIC,
            classify: classify_python,
        }
    }

    pub fn javascript() -> Self {
        Self {
            name: "javascript",
            language: tree_sitter_javascript::LANGUAGE.into(),
            atomic: JAVASCRIPT_ATOMIC,
            classify: classify_javascript,
        }
    }
}

impl Lexer for TreeSitterLexer {
    fn name(&self) -> &str {
        self.name
    }

    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| Error::Tokenize(format!("{}: {e}", self.name)))?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| Error::Tokenize(format!("{}: parser gave up", self.name)))?;

        let mut tokens = Vec::new();
        let mut pos = 0usize;
        let mut cursor = tree.walk();
        'walk: loop {
            let node = cursor.node();
            if !self.atomic.contains(&node.kind()) && cursor.goto_first_child() {
                continue;
            }
            self.emit(&node, text, &mut pos, &mut tokens);
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
        if pos < text.len() {
            tokens.push(Token::new(TokenKind::Text, &text[pos..]));
        }
        debug!(lexer = self.name, tokens = tokens.len(), "tokenized");
        Ok(tokens)
    }
}

impl TreeSitterLexer {
    fn emit(&self, node: &Node, text: &str, pos: &mut usize, tokens: &mut Vec<Token>) {
        let start = node.start_byte().max(*pos);
        let end = node.end_byte().min(text.len());
        if end <= start || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return;
        }
        if *pos < start {
            tokens.push(Token::new(TokenKind::Text, &text[*pos..start]));
        }
        let span = &text[start..end];
        tokens.push(Token::new((self.classify)(node, span), span));
        *pos = end;
    }
}

const RUST_ATOMIC: &[&str] = &[
    "line_comment",
    "block_comment",
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "boolean_literal",
    "attribute_item",
    "inner_attribute_item",
    "lifetime",
];

fn classify_rust(node: &Node, text: &str) -> TokenKind {
    match node.kind() {
        "line_comment" | "block_comment" | "shebang" => TokenKind::Comment,
        "string_literal" | "raw_string_literal" | "char_literal" => TokenKind::String,
        "integer_literal" | "float_literal" => TokenKind::Number,
        "boolean_literal" => TokenKind::Constant,
        "attribute_item" | "inner_attribute_item" => TokenKind::Attribute,
        "lifetime" => TokenKind::Lifetime,
        "type_identifier" | "primitive_type" => TokenKind::Type,
        "field_identifier" | "shorthand_field_identifier" => TokenKind::Property,
        "self" | "crate" | "super" | "mutable_specifier" => TokenKind::Keyword,
        "metavariable" => TokenKind::Macro,
        "identifier" => classify_rust_identifier(node, text),
        kind if !node.is_named() => classify_rust_symbol(node, kind),
        _ => TokenKind::Text,
    }
}

/// True when `node` is the `field` child of its parent.
fn is_field(node: &Node, field: &str) -> bool {
    node.parent()
        .and_then(|p| p.child_by_field_name(field))
        .is_some_and(|child| child == *node)
}

/// True when `node` is the callee of a call, directly or as the member of
/// a selector (`pkg.Func()`, `obj.method()`).
fn is_callee(node: &Node, call: &str, member: &str, member_field: &str) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    if parent.kind() == call {
        return is_field(node, "function");
    }
    parent.kind() == member
        && is_field(node, member_field)
        && parent.parent().is_some_and(|g| g.kind() == call)
        && is_field(&parent, "function")
}

fn classify_rust_identifier(node: &Node, text: &str) -> TokenKind {
    let Some(parent) = node.parent() else {
        return TokenKind::Text;
    };
    match parent.kind() {
        "macro_invocation" | "macro_definition" => TokenKind::Macro,
        "function_item" | "function_signature_item" | "call_expression" | "generic_function" => {
            TokenKind::Function
        }
        "scoped_identifier"
            if parent.child_by_field_name("name").as_ref() == Some(node)
                && parent.parent().is_some_and(|g| g.kind() == "call_expression") =>
        {
            TokenKind::Function
        }
        _ if is_constant_name(text) => TokenKind::Constant,
        _ => TokenKind::Text,
    }
}

fn classify_rust_symbol(node: &Node, kind: &str) -> TokenKind {
    if kind == "!" && node.parent().is_some_and(|p| p.kind() == "macro_invocation") {
        return TokenKind::Macro;
    }
    classify_symbol(kind)
}

/// Anonymous grammar nodes: words are keywords, the rest punctuation or
/// operators.
fn classify_symbol(kind: &str) -> TokenKind {
    if kind.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return TokenKind::Keyword;
    }
    match kind {
        "(" | ")" | "[" | "]" | "{" | "}" | ";" | "," | "." | ":" | "::" | "#" => {
            TokenKind::Punctuation
        }
        _ => TokenKind::Operator,
    }
}

/// `SCREAMING_CASE` names, at least two characters long.
fn is_constant_name(text: &str) -> bool {
    text.len() > 1
        && text.chars().any(|c| c.is_ascii_uppercase())
        && text
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

const MARKDOWN_ATOMIC: &[&str] = &[
    "atx_heading",
    "setext_heading",
    "fenced_code_block",
    "indented_code_block",
    "html_block",
    "thematic_break",
    "link_reference_definition",
];

fn classify_markdown(node: &Node, _text: &str) -> TokenKind {
    match node.kind() {
        "atx_heading" | "setext_heading" => TokenKind::Heading,
        "fenced_code_block" | "indented_code_block" => TokenKind::String,
        "html_block" => TokenKind::Attribute,
        "link_reference_definition" => TokenKind::Property,
        "thematic_break" | "block_continuation" => TokenKind::Punctuation,
        kind if kind.ends_with("_marker") => TokenKind::Punctuation,
        _ => TokenKind::Text,
    }
}

const GO_ATOMIC: &[&str] = &[
    "comment",
    "interpreted_string_literal",
    "raw_string_literal",
    "rune_literal",
];

fn classify_go(node: &Node, text: &str) -> TokenKind {
    match node.kind() {
        "comment" => TokenKind::Comment,
        "interpreted_string_literal" | "raw_string_literal" | "rune_literal" => TokenKind::String,
        "int_literal" | "float_literal" | "imaginary_literal" => TokenKind::Number,
        "true" | "false" | "nil" | "iota" => TokenKind::Constant,
        "type_identifier" => TokenKind::Type,
        "package_identifier" => TokenKind::Property,
        "field_identifier" => {
            if node.parent().is_some_and(|p| p.kind() == "method_declaration")
                || is_callee(node, "call_expression", "selector_expression", "field")
            {
                TokenKind::Function
            } else {
                TokenKind::Property
            }
        }
        "identifier" => {
            if node.parent().is_some_and(|p| p.kind() == "function_declaration")
                || is_callee(node, "call_expression", "selector_expression", "field")
            {
                TokenKind::Function
            } else if is_constant_name(text) {
                TokenKind::Constant
            } else {
                TokenKind::Text
            }
        }
        kind if !node.is_named() => classify_symbol(kind),
        _ => TokenKind::Text,
    }
}

const PYTHON_ATOMIC: &[&str] = &["comment", "string", "concatenated_string", "decorator"];

fn classify_python(node: &Node, text: &str) -> TokenKind {
    match node.kind() {
        "comment" => TokenKind::Comment,
        "string" | "concatenated_string" => TokenKind::String,
        "integer" | "float" => TokenKind::Number,
        "true" | "false" | "none" => TokenKind::Constant,
        "decorator" => TokenKind::Attribute,
        "identifier" => {
            let parent = node.parent().map(|p| p.kind());
            if (matches!(parent, Some("function_definition")) && is_field(node, "name"))
                || is_callee(node, "call", "attribute", "attribute")
            {
                TokenKind::Function
            } else if matches!(parent, Some("class_definition")) && is_field(node, "name") {
                TokenKind::Type
            } else if matches!(parent, Some("attribute")) && is_field(node, "attribute") {
                TokenKind::Property
            } else if matches!(parent, Some("type")) {
                TokenKind::Type
            } else if is_constant_name(text) {
                TokenKind::Constant
            } else {
                TokenKind::Text
            }
        }
        kind if !node.is_named() => classify_symbol(kind),
        _ => TokenKind::Text,
    }
}

const JAVASCRIPT_ATOMIC: &[&str] = &["comment", "string", "template_string", "regex"];

fn classify_javascript(node: &Node, text: &str) -> TokenKind {
    match node.kind() {
        "comment" => TokenKind::Comment,
        "string" | "template_string" | "regex" => TokenKind::String,
        "number" => TokenKind::Number,
        "true" | "false" | "null" | "undefined" => TokenKind::Constant,
        "this" | "super" => TokenKind::Keyword,
        "property_identifier" => {
            if node.parent().is_some_and(|p| p.kind() == "method_definition")
                || is_callee(node, "call_expression", "member_expression", "property")
            {
                TokenKind::Function
            } else {
                TokenKind::Property
            }
        }
        "shorthand_property_identifier" | "shorthand_property_identifier_pattern" => TokenKind::Property,
        "identifier" => {
            let parent = node.parent().map(|p| p.kind());
            if matches!(parent, Some("function_declaration" | "generator_function_declaration"))
                || is_callee(node, "call_expression", "member_expression", "property")
            {
                TokenKind::Function
            } else if matches!(parent, Some("class_declaration" | "class" | "new_expression")) {
                TokenKind::Type
            } else if is_constant_name(text) {
                TokenKind::Constant
            } else {
                TokenKind::Text
            }
        }
        kind if !node.is_named() => classify_symbol(kind),
        _ => TokenKind::Text,
    }
}

struct Entry {
    lexer: Box<dyn Lexer>,
    aliases: &'static [&'static str],
    extensions: &'static [&'static str],
    interpreters: &'static [&'static str],
}

/// The lexers available to a render, looked up by name, file extension, or
/// shebang line.
pub struct LexerRegistry {
    entries: Vec<Entry>,
}

impl Default for LexerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LexerRegistry {
    pub fn new() -> Self {
        Self {
            entries: vec![
                Entry {
                    lexer: Box::new(TreeSitterLexer::rust()),
                    aliases: &["rust", "rs"],
                    extensions: &["rs"],
                    interpreters: &["rust-script", "cargo"],
                },
                Entry {
                    lexer: Box::new(TreeSitterLexer::markdown()),
                    aliases: &["markdown", "md"],
                    extensions: &["md", "markdown", "mdown"],
                    interpreters: &[],
                },
                Entry {
                    lexer: Box::new(TreeSitterLexer::go()),
                    aliases: &["go", "golang"],
                    extensions: &["go"],
                    interpreters: &[],
                },
                Entry {
                    lexer: Box::new(TreeSitterLexer::python()),
                    aliases: &["python", "py", "python3"],
                    extensions: &["py", "pyw", "pyi"],
                    interpreters: &["python", "python3", "python2"],
                },
                Entry {
                    lexer: Box::new(TreeSitterLexer::javascript()),
                    aliases: &["javascript", "js", "jsx"],
                    extensions: &["js", "mjs", "cjs", "jsx"],
                    interpreters: &["node", "nodejs", "deno", "bun"],
                },
                Entry {
                    lexer: Box::new(PlainLexer),
                    aliases: &["text", "plain", "txt"],
                    extensions: &["txt", "text", "log"],
                    interpreters: &[],
                },
            ],
        }
    }

    /// Canonical names of the registered lexers.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.lexer.name())
    }

    pub fn by_name(&self, name: &str) -> Result<&dyn Lexer> {
        let wanted = name.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.aliases.contains(&wanted.as_str()))
            .map(|e| e.lexer.as_ref())
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown syntax {name:?} (available: {})",
                    self.names().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    pub fn by_extension(&self, path: &Path) -> Option<&dyn Lexer> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.extensions.contains(&ext.as_str()))
            .map(|e| e.lexer.as_ref())
    }

    /// Infers a lexer from a `#!` line.
    pub fn by_content(&self, content: &str) -> Option<&dyn Lexer> {
        let first = content.lines().next()?.strip_prefix("#!")?;
        let words: Vec<&str> = first
            .split(|c: char| c.is_whitespace() || c == '/')
            .filter(|w| !w.is_empty())
            .collect();
        self.entries
            .iter()
            .find(|e| e.interpreters.iter().any(|i| words.contains(i)))
            .map(|e| e.lexer.as_ref())
    }

    /// The file extension, then the shebang line of `content`.
    pub fn for_path(&self, path: &Path, content: &str) -> Option<&dyn Lexer> {
        self.by_extension(path).or_else(|| self.by_content(content))
    }

    /// Picks a lexer: an explicit name wins, then the file extension, then
    /// the content. No match is a configuration error.
    pub fn resolve(&self, name: Option<&str>, path: Option<&Path>, content: &str) -> Result<&dyn Lexer> {
        if let Some(name) = name {
            return self.by_name(name);
        }
        let found = match path {
            Some(p) => self.for_path(p, content),
            None => self.by_content(content),
        };
        match (found, path) {
            (Some(lexer), _) => Ok(lexer),
            (None, Some(p)) => Err(Error::Config(format!(
                "cannot infer syntax for {}; pass --syntax",
                p.display()
            ))),
            (None, None) => Err(Error::Config(
                "cannot infer syntax of standard input; pass --syntax".to_string(),
            )),
        }
    }
}
