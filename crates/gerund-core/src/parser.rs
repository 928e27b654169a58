// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The public parsing facade.
//!
//! [`Parser`] pairs a compiled grammar with the lexer definition it was
//! compiled against. It is immutable after construction and may be shared
//! across threads; each parse owns its own cursor and output record.

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::error::{CompileError, ParseError, ParseErrorKind};
use crate::grammar::{Compiler, Grammar, Value};
use crate::lexer::{DefaultLexer, LexerDefinition, TokenCursor};
use crate::record::Record;

/// A parser for record type `R`.
///
/// # Examples
///
/// ```
/// use gerund_core::{grammar, Parser};
///
/// grammar! {
///     pub struct Greeting {
///         pub word: String = r#"@Ident "!""#,
///     }
/// }
///
/// let parser = Parser::<Greeting>::new().unwrap();
/// let mut greeting = Greeting::default();
/// parser.parse_str("input", "hello !", &mut greeting).unwrap();
/// assert_eq!(greeting.word, "hello");
/// ```
pub struct Parser<R: Record> {
    grammar: Grammar,
    lexer: Box<dyn LexerDefinition>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Parser<R> {
    /// Compiles `R`'s grammar with the built-in [`DefaultLexer`].
    pub fn new() -> Result<Self, CompileError> {
        Self::with_lexer(Box::new(DefaultLexer::default()))
    }

    /// Compiles `R`'s grammar against a custom lexer definition. The
    /// lexer's symbol table resolves token-class references in
    /// annotations, and the lexer tokenizes every input handed to
    /// [`parse_str`](Self::parse_str).
    pub fn with_lexer(lexer: Box<dyn LexerDefinition>) -> Result<Self, CompileError> {
        let grammar = {
            let mut compiler = Compiler::new(lexer.symbols());
            let root = compiler.compile(R::descriptor())?;
            compiler.into_grammar(root)
        };
        debug!(
            record = R::descriptor().name(),
            nodes = grammar.len(),
            "compiled grammar"
        );
        Ok(Self {
            grammar,
            lexer,
            _record: PhantomData,
        })
    }

    /// Parses `source` into `target`. A convenience over
    /// [`parse_tokens`](Self::parse_tokens); `filename` decorates
    /// positions in errors.
    pub fn parse_str(
        &self,
        filename: &str,
        source: &str,
        target: &mut R,
    ) -> Result<(), ParseError> {
        let mut tokens = self.lexer.lex(filename, source);
        self.parse_tokens(tokens.as_mut(), target)
    }

    /// Parses a token stream into `target`.
    ///
    /// The whole stream must be consumed: trailing tokens are an
    /// "unexpected token" error, and a root refusal is "invalid syntax" at
    /// the first token. On error the target is left in an unspecified,
    /// possibly partially populated state.
    pub fn parse_tokens(
        &self,
        tokens: &mut dyn TokenCursor,
        target: &mut R,
    ) -> Result<(), ParseError> {
        trace!(record = R::descriptor().name(), "parse start");
        let produced = self.grammar.run_root(tokens)?;

        let peek = tokens.peek();
        if !peek.is_eof() {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    lexeme: peek.lexeme.clone(),
                },
                peek.pos.clone(),
            ));
        }
        let Some(value) = produced else {
            let pos = tokens.peek().pos.clone();
            return Err(ParseError::new(ParseErrorKind::InvalidSyntax, pos));
        };

        match value {
            Value::Record { value, .. } => {
                *target = *value
                    .downcast::<R>()
                    .expect("root grammar node yields the root record type");
            }
            Value::Lexeme(_) => unreachable!("root grammar node is a record node"),
        }
        trace!(record = R::descriptor().name(), "parse complete");
        Ok(())
    }
}

impl<R: Record> fmt::Display for Parser<R> {
    /// Renders the compiled grammar, stopping at back-edges with `<>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.grammar.fmt(f)
    }
}

impl<R: Record> fmt::Debug for Parser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("record", &R::descriptor().name())
            .field("grammar", &self.grammar)
            .finish_non_exhaustive()
    }
}
