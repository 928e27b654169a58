// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Executing the grammar graph against a token stream.
//!
//! Every node execution returns `Result<Option<Vec<Value>>, ParseError>`:
//!
//! - `Ok(Some(values))` - the node matched, yielding zero or more values
//!   for an enclosing capture to consume.
//! - `Ok(None)` - *refusal*: the node did not match and consumed nothing.
//!   Callers may try an alternative.
//! - `Err(_)` - a committed failure. It bypasses alternation, optional,
//!   and repetition handling and aborts the parse.
//!
//! Refusal carrying no side effects is what makes ordered choice safe: a
//! branch either matches or leaves the stream untouched. Once a sequence's
//! first child has matched, the sequence is committed and any later
//! refusal is promoted to a fatal "expected ..." error.

use std::any::Any;

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenCursor;
use crate::record::ParseOutcome;

use super::{assign, Grammar, Node, NodeId, Value};

impl Grammar {
    /// Runs the root record node, yielding the parsed record on a match.
    pub(crate) fn run_root(
        &self,
        tokens: &mut dyn TokenCursor,
    ) -> Result<Option<Value>, ParseError> {
        // Captures only execute inside a record node, so the root target is
        // never touched.
        let mut unit = ();
        match self.execute(self.root(), tokens, &mut unit)? {
            None => Ok(None),
            Some(mut values) => Ok(values.pop()),
        }
    }

    /// Executes one node. `record` is the instance under construction that
    /// captures assign into.
    pub(crate) fn execute(
        &self,
        id: NodeId,
        tokens: &mut dyn TokenCursor,
        record: &mut dyn Any,
    ) -> Result<Option<Vec<Value>>, ParseError> {
        match self.node(id) {
            Node::Literal(want) => {
                if tokens.peek().lexeme == *want {
                    let token = tokens.next();
                    Ok(Some(vec![Value::Lexeme(token.lexeme)]))
                } else {
                    Ok(None)
                }
            }

            Node::Token { class, .. } => {
                if tokens.peek().class == *class {
                    let token = tokens.next();
                    Ok(Some(vec![Value::Lexeme(token.lexeme)]))
                } else {
                    Ok(None)
                }
            }

            Node::Sequence(children) => {
                let mut out = Vec::new();
                for (i, child) in children.iter().enumerate() {
                    match self.execute(*child, tokens, record)? {
                        Some(values) => out.extend(values),
                        None if i == 0 => return Ok(None),
                        None => {
                            let pos = tokens.peek().pos.clone();
                            return Err(ParseError::new(
                                ParseErrorKind::Expected {
                                    what: self.describe(*child),
                                },
                                pos,
                            ));
                        }
                    }
                }
                Ok(Some(out))
            }

            Node::Choice(branches) => {
                for branch in branches {
                    if let Some(values) = self.execute(*branch, tokens, record)? {
                        return Ok(Some(values));
                    }
                }
                Ok(None)
            }

            Node::Optional(inner) => {
                Ok(Some(self.execute(*inner, tokens, record)?.unwrap_or_default()))
            }

            Node::Repeat(inner) => {
                // Field writes from an iteration that later refuses midway
                // are kept; bodies must disambiguate on their first token.
                let mut out = Vec::new();
                loop {
                    let before = tokens.peek().pos.clone();
                    match self.execute(*inner, tokens, record)? {
                        None => break,
                        Some(values) => {
                            out.extend(values);
                            // A body that matches without consuming (all
                            // parts optional) would never refuse; stop once
                            // an iteration makes no progress.
                            if tokens.peek().pos == before {
                                break;
                            }
                        }
                    }
                }
                Ok(Some(out))
            }

            Node::Capture { field, inner } => {
                let pos = tokens.peek().pos.clone();
                match self.execute(*inner, tokens, record)? {
                    None => Ok(None),
                    Some(values) => {
                        assign(&pos, record, field, values)?;
                        // The values are spent; an enclosing capture must
                        // not assign them a second time.
                        Ok(Some(Vec::new()))
                    }
                }
            }

            Node::Record { descriptor, expr } => {
                let mut instance = descriptor.new_instance();
                descriptor.set_position(instance.as_mut(), tokens.peek().pos.clone());
                match self.execute(*expr, tokens, instance.as_mut())? {
                    None => Ok(None),
                    Some(_) => Ok(Some(vec![Value::Record {
                        value: instance,
                        name: descriptor.name(),
                    }])),
                }
            }

            Node::Custom { descriptor } => {
                let mut instance = descriptor.new_instance();
                let outcome = descriptor
                    .run_custom_parse(instance.as_mut(), tokens)
                    .expect("custom grammar node for a record without a custom parse hook")?;
                match outcome {
                    ParseOutcome::NoMatch => Ok(None),
                    ParseOutcome::Matched => Ok(Some(vec![Value::Record {
                        value: instance,
                        name: descriptor.name(),
                    }])),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::grammar::Compiler;
    use crate::lexer::{DefaultLexer, LexerDefinition, Position, SymbolTable, TokenCursor};
    use crate::record::Record;

    fn compile<R: Record>() -> Result<Grammar, CompileError> {
        let symbols = SymbolTable::standard();
        let mut compiler = Compiler::new(&symbols);
        let root = compiler.compile(R::descriptor())?;
        Ok(compiler.into_grammar(root))
    }

    fn run<R: Record>(grammar: &Grammar, source: &str) -> Result<Option<R>, ParseError> {
        let mut tokens = DefaultLexer::default().lex("test", source);
        match grammar.run_root(tokens.as_mut())? {
            None => Ok(None),
            Some(Value::Record { value, .. }) => Ok(Some(*value.downcast::<R>().unwrap())),
            Some(Value::Lexeme(_)) => unreachable!("root yields a record"),
        }
    }

    crate::grammar! {
        struct Assignment {
            pos: Position,
            key: String = r#"@Ident "=""#,
            value: String = "@String",
        }
    }

    #[test]
    fn matches_and_captures() {
        let grammar = compile::<Assignment>().unwrap();
        let parsed = run::<Assignment>(&grammar, r#"answer = "42""#)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.key, "answer");
        assert_eq!(parsed.value, "42");
    }

    #[test]
    fn position_slot_gets_first_token_position() {
        let grammar = compile::<Assignment>().unwrap();
        let parsed = run::<Assignment>(&grammar, "  x = \"1\"").unwrap().unwrap();
        assert_eq!(parsed.pos.line, 1);
        assert_eq!(parsed.pos.column, 3);
        assert_eq!(parsed.pos.filename, "test");
    }

    #[test]
    fn refusal_consumes_nothing() {
        let grammar = compile::<Assignment>().unwrap();
        let mut tokens = DefaultLexer::default().lex("test", "= x");
        assert!(grammar.run_root(tokens.as_mut()).unwrap().is_none());
        assert_eq!(tokens.peek().lexeme, "=");
    }

    #[test]
    fn committed_sequence_promotes_refusal_to_fatal() {
        let grammar = compile::<Assignment>().unwrap();
        let err = run::<Assignment>(&grammar, "answer :").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Expected { what: "\"=\"".into() }
        );
        assert_eq!(err.pos.column, 8);
    }

    crate::grammar! {
        struct Choices {
            word: String = r#"@Ident | @String | "!""#,
        }
    }

    #[test]
    fn choice_takes_first_matching_branch() {
        let grammar = compile::<Choices>().unwrap();
        assert_eq!(
            run::<Choices>(&grammar, "hello").unwrap().unwrap().word,
            "hello"
        );
        assert_eq!(
            run::<Choices>(&grammar, r#""quoted""#).unwrap().unwrap().word,
            "quoted"
        );
        // The uncaptured literal branch matches but assigns nothing.
        assert_eq!(run::<Choices>(&grammar, "!").unwrap().unwrap().word, "");
    }

    crate::grammar! {
        struct Repeated {
            words: Vec<String> = "{ @Ident }",
        }
    }

    #[test]
    fn repetition_concatenates_in_order() {
        let grammar = compile::<Repeated>().unwrap();
        let parsed = run::<Repeated>(&grammar, "a b c").unwrap().unwrap();
        assert_eq!(parsed.words, vec!["a", "b", "c"]);
    }

    #[test]
    fn repetition_at_end_of_stream_matches_empty() {
        let grammar = compile::<Repeated>().unwrap();
        let parsed = run::<Repeated>(&grammar, "").unwrap().unwrap();
        assert_eq!(parsed.words, Vec::<String>::new());
    }

    crate::grammar! {
        struct NonProgressing {
            words: Vec<String> = "{ [ @Ident ] }",
        }
    }

    #[test]
    fn repetition_of_optional_terminates() {
        let grammar = compile::<NonProgressing>().unwrap();
        let parsed = run::<NonProgressing>(&grammar, "a b").unwrap().unwrap();
        assert_eq!(parsed.words, vec!["a", "b"]);
    }

    crate::grammar! {
        struct MaybeTail {
            head: String = "@Ident",
            tail: String = r#"[ "," @Ident ]"#,
        }
    }

    #[test]
    fn optional_swallows_refusal_without_side_effects() {
        let grammar = compile::<MaybeTail>().unwrap();
        let parsed = run::<MaybeTail>(&grammar, "x").unwrap().unwrap();
        assert_eq!(parsed.head, "x");
        assert_eq!(parsed.tail, "");
    }

    crate::grammar! {
        struct Nested {
            item: Item = "@@",
        }
    }

    crate::grammar! {
        struct Item {
            name: String = "@Ident",
        }
    }

    #[test]
    fn self_capture_builds_nested_records() {
        let grammar = compile::<Nested>().unwrap();
        let parsed = run::<Nested>(&grammar, "leaf").unwrap().unwrap();
        assert_eq!(parsed.item.name, "leaf");
    }

    crate::grammar! {
        struct OuterCapture {
            words: Vec<String> = "@{ @Ident }",
        }
    }

    #[test]
    fn captures_nest() {
        // The inner capture writes each identifier; the outer capture fires
        // with the already-spent values and is a no-op for the sequence.
        let grammar = compile::<OuterCapture>().unwrap();
        let parsed = run::<OuterCapture>(&grammar, "a b").unwrap().unwrap();
        assert_eq!(parsed.words, vec!["a", "b"]);
    }

    crate::grammar! {
        custom struct Doubled {
            text: String,
        }
    }

    impl crate::record::CustomParse for Doubled {
        fn parse(
            &mut self,
            tokens: &mut dyn TokenCursor,
        ) -> Result<ParseOutcome, ParseError> {
            if tokens.peek().is_eof() {
                return Ok(ParseOutcome::NoMatch);
            }
            let lexeme = tokens.next().lexeme;
            self.text = format!("{lexeme}{lexeme}");
            Ok(ParseOutcome::Matched)
        }
    }

    crate::grammar! {
        struct HasCustom {
            doubled: Doubled = "@@",
        }
    }

    #[test]
    fn custom_parse_delegates() {
        let grammar = compile::<HasCustom>().unwrap();
        let parsed = run::<HasCustom>(&grammar, "ab").unwrap().unwrap();
        assert_eq!(parsed.doubled.text, "abab");
    }

    #[test]
    fn custom_parse_no_match_refuses() {
        let grammar = compile::<Doubled>().unwrap();
        assert!(run::<Doubled>(&grammar, "").unwrap().is_none());
    }
}
