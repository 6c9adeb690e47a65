//! Tokenizer for brace languages with `//` and `/* */` comments: Go, Rust,
//! Java, C, C++, C#, PHP, and the JS/TS family.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::{
    is_ident_continue, is_ident_start, is_structural, Token, TokenKind, Tokenizer,
    ID_PLACEHOLDER, LIT_PLACEHOLDER, OPERATORS,
};

/// Union of keywords across the family. A corpus is only ever compared
/// against itself, so cross-language keyword bleed is harmless; what matters
/// is that the same word normalizes the same way in every file.
static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract", "as", "async", "await", "break", "case", "catch", "chan", "class", "const",
        "continue", "default", "defer", "delete", "do", "dyn", "else", "enum", "extends", "extern",
        "final", "finally", "fn", "for", "func", "function", "go", "goto", "if", "impl",
        "implements", "import", "in", "instanceof", "interface", "let", "loop", "map", "match",
        "mod", "move", "mut", "namespace", "new", "override", "package", "private", "protected",
        "pub", "public", "range", "ref", "return", "select", "self", "static", "struct", "super",
        "switch", "this", "throw", "throws", "trait", "try", "type", "typeof", "union", "unsafe",
        "use", "using", "var", "virtual", "void", "volatile", "where", "while", "yield",
    ]
    .into_iter()
    .collect()
});

/// Tokenizer for the C comment-syntax family.
#[derive(Debug, Default)]
pub struct CFamilyTokenizer;

impl Tokenizer for CFamilyTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0usize;
        let mut line: u32 = 1;
        let mut col: u32 = 1;

        macro_rules! advance {
            () => {{
                if chars[i] == '\n' {
                    line += 1;
                    col = 1;
                } else {
                    col += 1;
                }
                i += 1;
            }};
        }

        while i < chars.len() {
            let c = chars[i];

            if c.is_whitespace() {
                advance!();
                continue;
            }

            // Line comment
            if c == '/' && chars.get(i + 1) == Some(&'/') {
                while i < chars.len() && chars[i] != '\n' {
                    advance!();
                }
                continue;
            }

            // Block comment
            if c == '/' && chars.get(i + 1) == Some(&'*') {
                advance!();
                advance!();
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        advance!();
                        advance!();
                        break;
                    }
                    advance!();
                }
                continue;
            }

            // String or char literal; backtick covers JS template literals
            if c == '"' || c == '\'' || c == '`' {
                let (start_line, start_col) = (line, col);
                let quote = c;
                let start = i;
                advance!();
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        advance!();
                        advance!();
                        continue;
                    }
                    if chars[i] == quote {
                        advance!();
                        break;
                    }
                    advance!();
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::new(
                    TokenKind::Literal,
                    LIT_PLACEHOLDER,
                    &text,
                    start_line,
                    start_col,
                ));
                continue;
            }

            if is_ident_start(c) {
                let (start_line, start_col) = (line, col);
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    advance!();
                }
                let word: String = chars[start..i].iter().collect();
                let token = if KEYWORDS.contains(word.as_str()) {
                    Token::new(TokenKind::Keyword, &word, &word, start_line, start_col)
                } else if matches!(word.as_str(), "true" | "false" | "null" | "nil" | "None") {
                    Token::new(
                        TokenKind::Literal,
                        LIT_PLACEHOLDER,
                        &word,
                        start_line,
                        start_col,
                    )
                } else {
                    Token::new(
                        TokenKind::Identifier,
                        ID_PLACEHOLDER,
                        &word,
                        start_line,
                        start_col,
                    )
                };
                tokens.push(token);
                continue;
            }

            if c.is_ascii_digit() {
                let (start_line, start_col) = (line, col);
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_')
                {
                    advance!();
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::new(
                    TokenKind::Literal,
                    LIT_PLACEHOLDER,
                    &text,
                    start_line,
                    start_col,
                ));
                continue;
            }

            if is_structural(c) {
                let text = c.to_string();
                tokens.push(Token::new(TokenKind::Structural, &text, &text, line, col));
                advance!();
                continue;
            }

            // Operator: greedy longest match against the shared table
            let (start_line, start_col) = (line, col);
            let mut matched = None;
            for op in OPERATORS {
                let len = op.chars().count();
                if i + len <= chars.len() && chars[i..i + len].iter().collect::<String>() == **op {
                    matched = Some(len);
                    break;
                }
            }
            let len = matched.unwrap_or(1);
            let text: String = chars[i..i + len].iter().collect();
            for _ in 0..len {
                advance!();
            }
            tokens.push(Token::new(
                TokenKind::Operator,
                &text,
                &text,
                start_line,
                start_col,
            ));
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norms(text: &str) -> Vec<String> {
        CFamilyTokenizer
            .tokenize(text)
            .iter()
            .map(|t| t.norm.to_string())
            .collect()
    }

    #[test]
    fn test_comments_dropped() {
        assert_eq!(
            norms("x = 1; // trailing\n/* block\n comment */ y"),
            vec!["<id>", "=", "<lit>", ";", "<id>"]
        );
    }

    #[test]
    fn test_keywords_kept_identifiers_collapsed() {
        assert_eq!(
            norms("if ready { return count }"),
            vec!["if", "<id>", "{", "return", "<id>", "}"]
        );
    }

    #[test]
    fn test_string_with_escape() {
        let tokens = CFamilyTokenizer.tokenize(r#"s = "a\"b";"#);
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[2].kind, TokenKind::Literal);
        assert_eq!(tokens[2].text.as_ref(), r#""a\"b""#);
    }

    #[test]
    fn test_multichar_operators() {
        assert_eq!(norms("a == b && c != d"), vec!["<id>", "==", "<id>", "&&", "<id>", "!=", "<id>"]);
        assert_eq!(norms("x => x"), vec!["<id>", "=>", "<id>"]);
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = CFamilyTokenizer.tokenize("a\n  b\nc");
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        let cols: Vec<u32> = tokens.iter().map(|t| t.col).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(cols, vec![1, 3, 1]);
    }

    #[test]
    fn test_unterminated_string_is_total() {
        // Invalid code still tokenizes; the open string runs to EOF.
        let tokens = CFamilyTokenizer.tokenize("x = \"never closed");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Literal);
    }

    #[test]
    fn test_multiline_string_position() {
        let tokens = CFamilyTokenizer.tokenize("`line\nbreak` x");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].text.as_ref(), "x");
    }
}
