//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Cross-cutting laws, checked over generated inputs: the two engines are
//! indistinguishable, and parse/print round-trips are lossless.

use std::fmt::Debug;

use proptest::prelude::*;

use biparse::prelude::*;

/// Asserts that both engines produce the same result shape for `input`.
fn assert_engines_agree<V>(syntax: &Syntax<V, String>, input: &str)
where
    V: Value + PartialEq + Debug,
{
    let stack_safe = syntax.parse_string_with(input, Implementation::StackSafe);
    let recursive = syntax.parse_string_with(input, Implementation::Recursive);
    assert_eq!(stack_safe, recursive, "engines disagree on {:?}", input);
}

fn csv() -> Syntax<Vec<String>, String> {
    digits().repeat_with_sep(char(','))
}

fn parens() -> Syntax<usize, String> {
    lazy(|| {
        char('(')
            .zip_right(parens())
            .zip_left(char(')'))
            .transform(|depth| depth + 1, |depth: usize| depth.saturating_sub(1))
            .filter(|depth| *depth > 0, "expected a positive depth".to_owned())
            .or_else(succeed(0))
    })
}

fn greedy_word() -> Syntax<Vec<char>, String> {
    letter().or_else(digit()).repeat1().zip_left(end())
}

proptest! {
    #[test]
    fn engines_agree_on_csv(input in "[0-9,x]{0,12}") {
        assert_engines_agree(&csv(), &input);
        assert_engines_agree(&csv().zip_left(end()), &input);
    }

    #[test]
    fn engines_agree_on_parens(input in "[()]{0,12}") {
        assert_engines_agree(&parens(), &input);
    }

    #[test]
    fn engines_agree_on_alternatives(input in "[abc]{0,8}") {
        let manual = char('a').zip_right(char_in("b")).or_else(char_in("a"));
        let auto = manual.clone().auto_backtracking();
        assert_engines_agree(&manual, &input);
        assert_engines_agree(&auto, &input);
        assert_engines_agree(&greedy_word(), &input);
    }

    #[test]
    fn csv_round_trips(parts in prop::collection::vec("[0-9]{1,6}", 0..6)) {
        let syntax = csv();
        let printed = syntax.print_string(&parts).expect("printing valid parts succeeds");
        prop_assert_eq!(&printed, &parts.join(","));
        prop_assert_eq!(syntax.parse_string(&printed), Ok(parts));
    }

    #[test]
    fn parens_round_trip(depth in 0usize..50) {
        let syntax = parens();
        let printed = syntax.print_string(&depth).expect("printing a depth succeeds");
        prop_assert_eq!(printed.len(), depth * 2);
        prop_assert_eq!(syntax.parse_string(&printed), Ok(depth));
    }

    #[test]
    fn parsed_values_reprint_to_reparseable_text(input in "[0-9,]{0,12}") {
        // The printed form need not equal the original text, but it must
        // parse back to the same value.
        let syntax = csv();
        if let Ok(value) = syntax.parse_string(&input) {
            let printed = syntax.print_string(&value).expect("parsed values print");
            prop_assert_eq!(syntax.parse_string(&printed), Ok(value));
        }
    }

    #[test]
    fn repeat_minimality(min in 0usize..6, have in 0usize..6) {
        let syntax = digit().at_least(min);
        let input = "7".repeat(have);
        let result = syntax.parse_string(&input);
        if have >= min {
            prop_assert_eq!(result, Ok(vec!['7'; have]));
        } else {
            prop_assert!(result.is_err());
        }
        assert_engines_agree(&syntax, &input);
    }
}

#[test]
fn end_distinguishes_prefixes() {
    let syntax = digits().zip_left(end());
    assert_eq!(syntax.parse_string("123"), Ok("123".to_owned()));
    assert_eq!(
        syntax.parse_string("123x"),
        Err(ParserError::NotConsumedAll { position: 3 })
    );
}
