// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the built-in scanner.

use proptest::prelude::*;

use super::{Scanner, TokenClass};

proptest! {
    /// Scanning arbitrary input never panics and always ends with exactly
    /// one end-of-input token.
    #[test]
    fn scan_is_total(source in ".{0,200}") {
        let tokens = Scanner::new("prop", &source).scan();
        prop_assert!(!tokens.is_empty());
        prop_assert!(tokens.last().is_some_and(super::Token::is_eof));
        prop_assert_eq!(tokens.iter().filter(|t| t.is_eof()).count(), 1);
    }

    /// Token byte offsets never decrease.
    #[test]
    fn offsets_are_monotonic(source in "[ -~]{0,200}") {
        let tokens = Scanner::new("prop", &source).scan();
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].pos.offset <= pair[1].pos.offset);
        }
    }

    /// An identifier scans back to itself.
    #[test]
    fn identifiers_round_trip(name in "[a-zA-Z_][a-zA-Z0-9_]{0,20}") {
        let tokens = Scanner::new("prop", &name).scan();
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].class, TokenClass::Ident);
        prop_assert_eq!(tokens[0].lexeme.as_str(), name.as_str());
    }

    /// Integers scan as a single Int token.
    #[test]
    fn integers_round_trip(n in 0u64..1_000_000_000) {
        let source = n.to_string();
        let tokens = Scanner::new("prop", &source).scan();
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].class, TokenClass::Int);
        prop_assert_eq!(tokens[0].lexeme.as_str(), source.as_str());
    }

    /// A quoted string with no escapes or quotes scans back to its content.
    #[test]
    fn plain_strings_round_trip(content in "[a-zA-Z0-9 ]{0,30}") {
        let source = format!("\"{content}\"");
        let tokens = Scanner::new("prop", &source).scan();
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].class, TokenClass::String);
        prop_assert_eq!(tokens[0].lexeme.as_str(), content.as_str());
    }
}
