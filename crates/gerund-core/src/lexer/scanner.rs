// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The built-in general-purpose scanner.
//!
//! [`Scanner`] converts source text into [`Token`]s. It is hand-written for
//! precise position tracking: every token carries filename, byte offset,
//! line, and column.
//!
//! Recognized classes: identifiers, integers, floats, double-quoted strings
//! (escapes resolved), backtick raw strings, single-quoted character
//! literals, and single-character punctuation. Whitespace and `//` / `/* */`
//! comments separate tokens and are skipped.

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{LexerDefinition, Position, SymbolTable, Token, TokenBuffer, TokenClass, TokenCursor};

/// A scanner that tokenizes source text.
///
/// Scanning never fails: an unrecognized character lexes as punctuation and
/// an unterminated literal yields the content scanned so far. Malformed
/// input therefore surfaces later, as a mismatch against the grammar.
pub struct Scanner<'src> {
    /// The source text being scanned.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Name of the input, carried into token positions.
    filename: EcoString,
    /// 1-based line of the next unconsumed character.
    line: u32,
    /// 1-based column of the next unconsumed character.
    column: u32,
}

impl std::fmt::Debug for Scanner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("filename", &self.filename)
            .field("line", &self.line)
            .field("column", &self.column)
            .finish()
    }
}

impl<'src> Scanner<'src> {
    /// Creates a new scanner over the given source text.
    #[must_use]
    pub fn new(filename: impl Into<EcoString>, source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            filename: filename.into(),
            line: 1,
            column: 1,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks at the character after the next one.
    fn peek_char_second(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the byte offset of the next unconsumed character.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "inputs over 4GB are not supported"
    )]
    fn offset(&mut self) -> u32 {
        self.chars
            .peek()
            .map_or(self.source.len(), |&(i, _)| i) as u32
    }

    /// Returns the position of the next unconsumed character.
    fn position(&mut self) -> Position {
        let offset = self.offset();
        Position::new(self.filename.clone(), offset, self.line, self.column)
    }

    /// Extracts the source text between two byte offsets.
    fn text_between(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }

    /// Skips whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance_while(char::is_whitespace);
                }
                Some('/') if self.peek_char_second() == Some('/') => {
                    self.advance_while(|c| c != '\n');
                }
                Some('/') if self.peek_char_second() == Some('*') => {
                    self.skip_block_comment();
                }
                _ => break,
            }
        }
    }

    /// Skips a block comment: `/* ... */`
    fn skip_block_comment(&mut self) {
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek_char() {
                None => break, // unterminated, ends at EOF
                Some('*') if self.peek_char_second() == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Scans the next token. At end of input, returns the end-of-input
    /// token, repeatedly.
    pub fn scan_token(&mut self) -> Token {
        self.skip_trivia();
        let pos = self.position();

        let Some(c) = self.peek_char() else {
            return Token::eof(pos);
        };

        match c {
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(pos),
            c if c.is_ascii_digit() => self.scan_number(pos),
            '.' if self.peek_char_second().is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(pos)
            }
            '"' => self.scan_string(pos),
            '`' => self.scan_raw_string(pos),
            '\'' => self.scan_char(pos),
            _ => {
                self.advance();
                Token::new(TokenClass::Punct(c), char_lexeme(c), pos)
            }
        }
    }

    /// Scans the whole input, including the terminal end-of-input token.
    #[must_use]
    pub fn scan(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Scans an identifier: `[A-Za-z_][A-Za-z0-9_]*` (Unicode letters
    /// included).
    fn scan_identifier(&mut self, pos: Position) -> Token {
        let start = pos.offset;
        self.advance_while(|c| c.is_alphanumeric() || c == '_');
        let end = self.offset();
        let text = self.text_between(start, end);
        Token::new(TokenClass::Ident, text, pos)
    }

    /// Scans an integer or float literal.
    fn scan_number(&mut self, pos: Position) -> Token {
        let start = pos.offset;
        self.advance_while(|c| c.is_ascii_digit());

        let mut is_float = false;
        if self.peek_char() == Some('.')
            && self.peek_char_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit());
            is_float = true;
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.advance_while(|c| c.is_ascii_digit());
            is_float = true;
        }

        let end = self.offset();
        let text = self.text_between(start, end);
        let class = if is_float {
            TokenClass::Float
        } else {
            TokenClass::Int
        };
        Token::new(class, text, pos)
    }

    /// Scans a double-quoted string literal, resolving escapes. The lexeme
    /// is the content without quotes.
    fn scan_string(&mut self, pos: Position) -> Token {
        self.advance(); // opening quote
        let mut content = EcoString::new();
        loop {
            match self.peek_char() {
                None => break, // unterminated, ends at EOF
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if let Some(c) = self.advance() {
                        content.push(unescape(c));
                    }
                }
                Some(c) => {
                    self.advance();
                    content.push(c);
                }
            }
        }
        Token::new(TokenClass::String, content, pos)
    }

    /// Scans a backtick-quoted raw string literal. No escapes.
    fn scan_raw_string(&mut self, pos: Position) -> Token {
        self.advance(); // opening backtick
        let start = self.offset();
        self.advance_while(|c| c != '`');
        let end = self.offset();
        let content = self.text_between(start, end);
        self.advance(); // closing backtick, if present
        Token::new(TokenClass::RawString, content, pos)
    }

    /// Scans a single-quoted character literal. The lexeme is the character
    /// itself.
    fn scan_char(&mut self, pos: Position) -> Token {
        self.advance(); // opening quote
        let content = match self.peek_char() {
            None => EcoString::new(),
            Some('\\') => {
                self.advance();
                self.advance()
                    .map_or_else(EcoString::new, |c| char_lexeme(unescape(c)))
            }
            Some(c) => {
                self.advance();
                char_lexeme(c)
            }
        };
        if self.peek_char() == Some('\'') {
            self.advance(); // closing quote
        }
        Token::new(TokenClass::Char, content, pos)
    }
}

/// A one-character lexeme.
fn char_lexeme(c: char) -> EcoString {
    let mut lexeme = EcoString::new();
    lexeme.push(c);
    lexeme
}

/// Resolves a character escape: `\n`, `\t`, `\r`, `\0`; anything else maps
/// to itself (`\\`, `\"`, `\'`).
fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

/// The built-in lexer definition: [`Scanner`] plus the standard symbol
/// table.
///
/// Used by [`Parser::new`](crate::Parser::new) when no custom lexer is
/// supplied.
#[derive(Debug, Clone)]
pub struct DefaultLexer {
    symbols: SymbolTable,
}

impl Default for DefaultLexer {
    fn default() -> Self {
        Self {
            symbols: SymbolTable::standard(),
        }
    }
}

impl LexerDefinition for DefaultLexer {
    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn lex(&self, filename: &str, source: &str) -> Box<dyn TokenCursor> {
        Box::new(TokenBuffer::new(Scanner::new(filename, source).scan()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to scan and extract (class, lexeme) pairs, excluding EOF.
    fn scan_pairs(source: &str) -> Vec<(TokenClass, EcoString)> {
        Scanner::new("test", source)
            .scan()
            .into_iter()
            .filter(|token| !token.is_eof())
            .map(|token| (token.class, token.lexeme))
            .collect()
    }

    #[test]
    fn scan_empty() {
        let tokens = Scanner::new("test", "").scan();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
    }

    #[test]
    fn scan_identifiers() {
        assert_eq!(
            scan_pairs("foo Bar _baz x1"),
            vec![
                (TokenClass::Ident, "foo".into()),
                (TokenClass::Ident, "Bar".into()),
                (TokenClass::Ident, "_baz".into()),
                (TokenClass::Ident, "x1".into()),
            ]
        );
    }

    #[test]
    fn scan_numbers() {
        assert_eq!(
            scan_pairs("42 0 3.14 1e10 2.5e-3"),
            vec![
                (TokenClass::Int, "42".into()),
                (TokenClass::Int, "0".into()),
                (TokenClass::Float, "3.14".into()),
                (TokenClass::Float, "1e10".into()),
                (TokenClass::Float, "2.5e-3".into()),
            ]
        );
    }

    #[test]
    fn scan_integer_then_period() {
        // A trailing period is punctuation, not part of the number.
        assert_eq!(
            scan_pairs("42."),
            vec![
                (TokenClass::Int, "42".into()),
                (TokenClass::Punct('.'), ".".into()),
            ]
        );
    }

    #[test]
    fn scan_strings_unquoted() {
        assert_eq!(
            scan_pairs(r#""hello" "" "a\nb" "q\"q""#),
            vec![
                (TokenClass::String, "hello".into()),
                (TokenClass::String, "".into()),
                (TokenClass::String, "a\nb".into()),
                (TokenClass::String, "q\"q".into()),
            ]
        );
    }

    #[test]
    fn scan_raw_strings() {
        assert_eq!(
            scan_pairs(r"`hello` `a\nb`"),
            vec![
                (TokenClass::RawString, "hello".into()),
                (TokenClass::RawString, r"a\nb".into()),
            ]
        );
    }

    #[test]
    fn scan_char_literals() {
        assert_eq!(
            scan_pairs(r"'x' '\n' '('"),
            vec![
                (TokenClass::Char, "x".into()),
                (TokenClass::Char, "\n".into()),
                (TokenClass::Char, "(".into()),
            ]
        );
    }

    #[test]
    fn scan_punctuation() {
        assert_eq!(
            scan_pairs("@ | [ ] { } ( ) ="),
            vec![
                (TokenClass::Punct('@'), "@".into()),
                (TokenClass::Punct('|'), "|".into()),
                (TokenClass::Punct('['), "[".into()),
                (TokenClass::Punct(']'), "]".into()),
                (TokenClass::Punct('{'), "{".into()),
                (TokenClass::Punct('}'), "}".into()),
                (TokenClass::Punct('('), "(".into()),
                (TokenClass::Punct(')'), ")".into()),
                (TokenClass::Punct('='), "=".into()),
            ]
        );
    }

    #[test]
    fn scan_skips_comments() {
        assert_eq!(
            scan_pairs("a // line\nb /* block */ c"),
            vec![
                (TokenClass::Ident, "a".into()),
                (TokenClass::Ident, "b".into()),
                (TokenClass::Ident, "c".into()),
            ]
        );
    }

    #[test]
    fn scan_positions() {
        let tokens = Scanner::new("test", "ab cd\n  ef").scan();
        assert_eq!(tokens[0].pos.line, 1);
        assert_eq!(tokens[0].pos.column, 1);
        assert_eq!(tokens[1].pos.line, 1);
        assert_eq!(tokens[1].pos.column, 4);
        assert_eq!(tokens[2].pos.line, 2);
        assert_eq!(tokens[2].pos.column, 3);
        assert_eq!(tokens[2].pos.offset, 8);
    }

    #[test]
    fn scan_position_filename() {
        let tokens = Scanner::new("input.ebnf", "x").scan();
        assert_eq!(tokens[0].pos.filename, "input.ebnf");
    }

    #[test]
    fn scan_unterminated_string_ends_at_eof() {
        assert_eq!(
            scan_pairs("\"abc"),
            vec![(TokenClass::String, "abc".into())]
        );
    }

    #[test]
    fn default_lexer_round_trip() {
        let lexer = DefaultLexer::default();
        let mut cursor = lexer.lex("test", "foo \"bar\"");
        assert_eq!(cursor.next().lexeme, "foo");
        assert_eq!(cursor.next().lexeme, "bar");
        assert!(cursor.peek().is_eof());
    }

    #[test]
    fn default_lexer_symbols() {
        let lexer = DefaultLexer::default();
        assert_eq!(lexer.symbols().get("Ident"), Some(TokenClass::Ident));
    }
}
