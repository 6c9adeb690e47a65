//! Token normalization for clone detection.
//!
//! Tokenizers turn raw source text into an ordered stream of normalized
//! tokens. Identifiers and literals collapse to fixed placeholders so that
//! structurally identical but renamed code produces identical normalized
//! streams; the original lexeme is kept per token purely for Type-1 vs
//! Type-2 discrimination and snippet rendering. Comments and whitespace are
//! dropped.
//!
//! Tokenization is deterministic and total: any input, including
//! syntactically invalid code, yields some token stream. One bad file never
//! fails the pipeline.

mod c_family;
mod script;

use crate::core::Language;

pub use c_family::CFamilyTokenizer;
pub use script::ScriptTokenizer;

/// Normalized placeholder for identifiers.
pub const ID_PLACEHOLDER: &str = "<id>";
/// Normalized placeholder for literals.
pub const LIT_PLACEHOLDER: &str = "<lit>";

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Literal,
    Operator,
    Structural,
}

/// A single normalized token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Normalized value: placeholder for identifiers/literals, lexeme
    /// otherwise. Matching compares this field only.
    pub norm: Box<str>,
    /// Original lexeme. Not used for matching.
    pub text: Box<str>,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column (in characters).
    pub col: u32,
}

impl Token {
    fn new(kind: TokenKind, norm: &str, text: &str, line: u32, col: u32) -> Self {
        Self {
            kind,
            norm: norm.into(),
            text: text.into(),
            line,
            col,
        }
    }

    /// Whether two tokens match on the normalized stream.
    pub fn matches(&self, other: &Token) -> bool {
        self.norm == other.norm
    }
}

/// One tokenizer per comment-syntax family. Variants are selected by
/// language tag; adding a language means adding a variant, not editing the
/// existing ones.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

static C_FAMILY: CFamilyTokenizer = CFamilyTokenizer;
static SCRIPT: ScriptTokenizer = ScriptTokenizer;

/// Select the tokenizer for a language.
pub fn for_language(language: Language) -> &'static dyn Tokenizer {
    if language.hash_comments() {
        &SCRIPT
    } else {
        &C_FAMILY
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn is_structural(c: char) -> bool {
    matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | ';' | ',')
}

/// Multi-character operators, longest first so the scanners can munch
/// greedily.
pub(crate) const OPERATORS: &[&str] = &[
    "===", "!==", "<<=", ">>=", "**=", "...", "==", "!=", "<=", ">=", "&&", "||", "->", "=>",
    "::", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "..", "?.",
    "??", "**",
];
