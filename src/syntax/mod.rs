//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The bidirectional facade: one definition, both directions.
//!
//! A [`Syntax<V, E>`] owns a [`Parser`] producing `V` and a [`Printer`]
//! consuming `V`; every combinator in this module builds both halves at
//! once, so the two stay consistent by construction. The constructors with
//! built-in error messages fix the error type to `String`, which is what
//! grammars assembled from these helpers usually want; `Syntax::new` admits
//! any error type.
//!
//! ```
//! use biparse::prelude::*;
//!
//! let csv = digits().repeat_with_sep(char(','));
//! let values = csv.parse_string("10,20").unwrap();
//! assert_eq!(values, vec!["10".to_owned(), "20".to_owned()]);
//! assert_eq!(csv.print_string(&values).unwrap(), "10,20");
//! ```

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::either::Either;
use crate::error::ParserError;
use crate::parser::{Implementation, Parser};
use crate::printer::Printer;
use crate::regex::{Compiled, Regex};
use crate::value::Value;

/// A paired parser and printer over the same value type.
pub struct Syntax<V, E> {
    parser: Parser<V, E>,
    printer: Printer<V, E, char>,
}

impl<V, E> Clone for Syntax<V, E> {
    fn clone(&self) -> Self {
        Syntax {
            parser: self.parser.clone(),
            printer: self.printer.clone(),
        }
    }
}

impl<V, E> fmt::Debug for Syntax<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Syntax").finish_non_exhaustive()
    }
}

impl<V, E> Syntax<V, E>
where
    V: Value,
    E: Clone + Send + Sync + 'static,
{
    /// Pairs an explicit parser and printer.
    ///
    /// The caller is responsible for keeping the two consistent; the
    /// combinators below do so automatically.
    pub fn new(parser: Parser<V, E>, printer: Printer<V, E, char>) -> Self {
        Syntax { parser, printer }
    }

    /// The parsing half.
    pub fn as_parser(&self) -> &Parser<V, E> {
        &self.parser
    }

    /// The printing half.
    pub fn as_printer(&self) -> &Printer<V, E, char> {
        &self.printer
    }

    /// Parses `input` with the default (stack-safe) engine.
    pub fn parse_string(&self, input: &str) -> Result<V, ParserError<E>> {
        self.parser.parse_string(input)
    }

    /// Parses `input` with the chosen engine.
    pub fn parse_string_with(
        &self,
        input: &str,
        implementation: Implementation,
    ) -> Result<V, ParserError<E>> {
        self.parser.parse_string_with(input, implementation)
    }

    /// Prints `value` into a `String`.
    pub fn print_string(&self, value: &V) -> Result<String, E> {
        self.printer.print_string(value)
    }

    /// Maps values in both directions.
    pub fn transform<V2, F, G>(self, to: F, from: G) -> Syntax<V2, E>
    where
        V2: Value,
        F: Fn(V) -> V2 + Send + Sync + 'static,
        G: Fn(V2) -> V + Send + Sync + 'static,
    {
        Syntax {
            parser: self.parser.transform(to),
            printer: self.printer.contramap(from),
        }
    }

    /// Maps values in both directions through fallible functions.
    pub fn transform_either<V2, F, G>(self, to: F, from: G) -> Syntax<V2, E>
    where
        V2: Value,
        F: Fn(V) -> Result<V2, E> + Send + Sync + 'static,
        G: Fn(V2) -> Result<V, E> + Send + Sync + 'static,
    {
        Syntax {
            parser: self.parser.transform_either(to),
            printer: self.printer.contramap_either(from),
        }
    }

    /// Rejects values, parsed or printed, that fail the predicate.
    pub fn filter<F>(self, predicate: F, error: E) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        let shared = Arc::new(predicate);
        let for_printer = Arc::clone(&shared);
        Syntax {
            parser: self
                .parser
                .filter(move |value| shared(value), error.clone()),
            printer: self
                .printer
                .filter_input(move |value| for_printer(value), error),
        }
    }

    /// Rewrites user errors on both halves.
    pub fn map_error<F>(self, f: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        let shared = Arc::new(f);
        let for_printer = Arc::clone(&shared);
        Syntax {
            parser: self.parser.map_error(move |error| shared(error)),
            printer: self.printer.map_error(move |error| for_printer(error)),
        }
    }

    /// Opens a named scope around the parsing half; failures inside record
    /// the chain of enclosing names.
    pub fn named(self, name: impl Into<String>) -> Self {
        Syntax {
            parser: self.parser.named(name),
            printer: self.printer,
        }
    }

    /// Restores the input position when the parsing half fails.
    pub fn backtrack(self) -> Self {
        Syntax {
            parser: self.parser.backtrack(),
            printer: self.printer,
        }
    }

    /// Enables or disables automatic backtracking inside this syntax.
    pub fn set_auto_backtracking(self, enabled: bool) -> Self {
        Syntax {
            parser: self.parser.set_auto_backtracking(enabled),
            printer: self.printer,
        }
    }

    /// Shorthand for [`set_auto_backtracking(true)`](Self::set_auto_backtracking).
    pub fn auto_backtracking(self) -> Self {
        self.set_auto_backtracking(true)
    }

    /// Shorthand for [`set_auto_backtracking(false)`](Self::set_auto_backtracking).
    pub fn manual_backtracking(self) -> Self {
        self.set_auto_backtracking(false)
    }

    /// Sequences two syntaxes, pairing their values.
    pub fn zip<V2: Value>(self, that: Syntax<V2, E>) -> Syntax<(V, V2), E> {
        Syntax {
            parser: self.parser.zip(that.parser),
            printer: self.printer.zip(that.printer),
        }
    }

    /// Sequences with a unit syntax, keeping only this value.
    pub fn zip_left(self, that: Syntax<(), E>) -> Syntax<V, E> {
        Syntax {
            parser: self.parser.zip_left(that.parser),
            printer: self.printer.zip_left(that.printer),
        }
    }

    /// Tries this syntax, then `that` from the same position.
    ///
    /// Parsing retries the alternative under the backtracking rules;
    /// printing rolls partial output back before trying the alternative.
    pub fn or_else(self, that: Syntax<V, E>) -> Self {
        Syntax {
            parser: self.parser.or_else(that.parser),
            printer: self.printer.or_else(that.printer),
        }
    }

    /// Like [`or_else`](Self::or_else), remembering which branch was taken.
    pub fn or_else_either<V2: Value>(self, that: Syntax<V2, E>) -> Syntax<Either<V, V2>, E> {
        Syntax {
            parser: self.parser.or_else_either(that.parser),
            printer: self.printer.or_else_either(that.printer),
        }
    }

    /// Makes this syntax optional.
    pub fn optional(self) -> Syntax<Option<V>, E> {
        Syntax {
            parser: self.parser.optional(),
            printer: self.printer.optional(),
        }
    }

    /// Zero or more repetitions.
    pub fn repeat0(self) -> Syntax<Vec<V>, E> {
        Syntax {
            parser: self.parser.repeat0(),
            printer: self.printer.repeated(),
        }
    }

    /// One or more repetitions.
    pub fn repeat1(self) -> Syntax<Vec<V>, E> {
        Syntax {
            parser: self.parser.repeat1(),
            printer: self.printer.repeated(),
        }
    }

    /// At least `min` repetitions.
    pub fn at_least(self, min: usize) -> Syntax<Vec<V>, E> {
        Syntax {
            parser: self.parser.at_least(min),
            printer: self.printer.repeated(),
        }
    }

    /// Repetitions until `stop` matches; `stop`'s input is consumed when
    /// parsing and printed once after the elements when printing.
    pub fn repeat_until(self, stop: Syntax<(), E>) -> Syntax<Vec<V>, E> {
        Syntax {
            parser: self.parser.repeat_until(stop.parser),
            printer: self.printer.repeat_until(stop.printer),
        }
    }

    /// Repetitions separated by `sep`, allowing the empty sequence.
    pub fn repeat_with_sep(self, sep: Syntax<(), E>) -> Syntax<Vec<V>, E> {
        Syntax {
            parser: self.parser.repeat_with_sep(sep.parser),
            printer: self.printer.repeat_with_sep(sep.printer),
        }
    }

    /// Repetitions separated by `sep`, requiring at least one element.
    pub fn repeat_with_sep1(self, sep: Syntax<(), E>) -> Syntax<Vec<V>, E> {
        Syntax {
            parser: self.parser.repeat_with_sep1(sep.parser),
            printer: self.printer.repeat_with_sep(sep.printer),
        }
    }

    /// Negative lookahead; consumes nothing and prints nothing.
    pub fn not(self, error: E) -> Syntax<(), E> {
        Syntax {
            parser: self.parser.not(error),
            printer: Printer::succeed(),
        }
    }

    /// Wraps this syntax between two unit syntaxes.
    pub fn between(self, left: Syntax<(), E>, right: Syntax<(), E>) -> Syntax<V, E> {
        left.zip_right(self).zip_left(right)
    }

    /// Discards the parsed value in favour of the exact text consumed;
    /// printing re-emits the text verbatim.
    pub fn capture_string(self) -> Syntax<String, E> {
        Syntax {
            parser: self.parser.capture_string(),
            printer: Printer::from_input(|text: String| Printer::regex_discard(text.chars())),
        }
    }
}

impl<E: Clone + Send + Sync + 'static> Syntax<(), E> {
    /// Sequences a unit syntax with `that`, keeping only `that`'s value.
    pub fn zip_right<V2: Value>(self, that: Syntax<V2, E>) -> Syntax<V2, E> {
        Syntax {
            parser: self.parser.zip_right(that.parser),
            printer: self.printer.zip_right(that.printer),
        }
    }
}

impl Syntax<(), String> {
    /// Parses to the fixed `value`; printing accepts only that value and
    /// prints the underlying unit syntax.
    pub fn to<V>(self, value: V) -> Syntax<V, String>
    where
        V: Value + PartialEq + fmt::Debug,
    {
        let error = format!("expected {:?}", value);
        let parsed = value.clone();
        Syntax {
            parser: self.parser.transform(move |()| parsed.clone()),
            printer: self.printer.exactly(value, error),
        }
    }
}

// Shared compiled matchers for the character-class helpers. Compilation is
// cheap but there is no reason to repeat it per call site.
lazy_static! {
    static ref ANY_DIGIT: Compiled = Regex::any_digit().compile();
    static ref ANY_LETTER: Compiled = Regex::any_letter().compile();
    static ref ANY_ALPHA_NUMERIC: Compiled = Regex::any_alpha_numeric().compile();
    static ref ANY_WHITESPACE: Compiled = Regex::any_whitespace().compile();
    static ref DIGITS: Compiled = Regex::digits().compile();
    static ref LETTERS: Compiled = Regex::letters().compile();
    static ref ALPHA_NUMERICS: Compiled = Regex::alpha_numerics().compile();
    static ref WHITESPACE: Compiled = Regex::whitespace().compile();
    static ref ANY_STRING: Compiled = Regex::any_char().at_least(0).compile();
}

fn char_class(compiled: &Compiled, error: &str) -> Syntax<char, String> {
    Syntax {
        parser: Parser::regex_char_compiled(compiled.clone(), Some(error.to_owned())),
        printer: Printer::regex_char_compiled(compiled.clone(), error.to_owned()),
    }
}

fn string_class(compiled: &Compiled, error: &str) -> Syntax<String, String> {
    Syntax {
        parser: Parser::regex_compiled(compiled.clone(), Some(error.to_owned())),
        printer: Printer::regex_compiled(compiled.clone(), error.to_owned()),
    }
}

/// Succeeds with `value` without consuming input; prints nothing.
pub fn succeed<V, E>(value: V) -> Syntax<V, E>
where
    V: Value,
    E: Clone + Send + Sync + 'static,
{
    Syntax {
        parser: Parser::succeed(value),
        printer: Printer::succeed(),
    }
}

/// Fails with `error` in both directions.
pub fn fail<V, E>(error: E) -> Syntax<V, E>
where
    V: Value,
    E: Clone + Send + Sync + 'static,
{
    Syntax {
        parser: Parser::fail(error.clone()),
        printer: Printer::fail(error),
    }
}

/// The unit syntax: consumes nothing, prints nothing.
pub fn unit<E: Clone + Send + Sync + 'static>() -> Syntax<(), E> {
    succeed(())
}

/// Succeeds only at the end of the input; prints nothing.
pub fn end<E: Clone + Send + Sync + 'static>() -> Syntax<(), E> {
    Syntax {
        parser: Parser::end(),
        printer: Printer::succeed(),
    }
}

/// Yields the current input position; prints nothing.
pub fn index<E: Clone + Send + Sync + 'static>() -> Syntax<usize, E> {
    Syntax {
        parser: Parser::index(),
        printer: Printer::succeed(),
    }
}

/// Defers construction of a syntax; required for recursive grammars.
pub fn lazy<V, E, F>(f: F) -> Syntax<V, E>
where
    V: Value,
    E: Clone + Send + Sync + 'static,
    F: Fn() -> Syntax<V, E> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let for_printer = Arc::clone(&f);
    Syntax {
        parser: Parser::lazy(move || f().parser),
        printer: Printer::lazy(move || for_printer().printer),
    }
}

/// Consumes and prints exactly the character `ch`.
pub fn char(ch: char) -> Syntax<(), String> {
    let error = format!("expected {:?}", ch);
    Syntax {
        parser: Parser::regex_discard(&Regex::char(ch), error),
        printer: Printer::regex_discard(Some(ch)),
    }
}

/// Consumes and prints exactly the text `s`.
pub fn string(s: &str) -> Syntax<(), String> {
    let error = format!("expected {:?}", s);
    Syntax {
        parser: Parser::regex_discard(&Regex::string(s), error),
        printer: Printer::regex_discard(s.chars()),
    }
}

/// One character out of `chars`.
pub fn char_in(chars: &str) -> Syntax<char, String> {
    let error = format!("expected one of {:?}", chars);
    Syntax {
        parser: Parser::char_in(chars.chars(), error.clone()),
        printer: Printer::regex_char(&Regex::char_in(chars.chars()), error),
    }
}

/// One character not in `chars`.
pub fn char_not_in(chars: &str) -> Syntax<char, String> {
    let error = format!("expected a character not in {:?}", chars);
    Syntax {
        parser: Parser::char_not_in(chars.chars(), error.clone()),
        printer: Printer::regex_char(&Regex::char_not_in(chars.chars()), error),
    }
}

/// Any single character, printed back verbatim.
pub fn any_char() -> Syntax<char, String> {
    Syntax {
        parser: Parser::any_char(),
        printer: Printer::from_input(|ch: char| Printer::regex_discard(Some(ch))),
    }
}

/// One ASCII digit.
pub fn digit() -> Syntax<char, String> {
    char_class(&ANY_DIGIT, "expected a digit")
}

/// One ASCII letter.
pub fn letter() -> Syntax<char, String> {
    char_class(&ANY_LETTER, "expected a letter")
}

/// One ASCII letter or digit.
pub fn alpha_numeric() -> Syntax<char, String> {
    char_class(&ANY_ALPHA_NUMERIC, "expected a letter or digit")
}

/// One whitespace character (space, tab, CR, LF, VT, FF).
pub fn whitespace_char() -> Syntax<char, String> {
    char_class(&ANY_WHITESPACE, "expected whitespace")
}

/// One or more ASCII digits, as a `String`.
pub fn digits() -> Syntax<String, String> {
    string_class(&DIGITS, "expected digits")
}

/// One or more ASCII letters, as a `String`.
pub fn letters() -> Syntax<String, String> {
    string_class(&LETTERS, "expected letters")
}

/// One or more ASCII letters or digits, as a `String`.
pub fn alpha_numerics() -> Syntax<String, String> {
    string_class(&ALPHA_NUMERICS, "expected letters or digits")
}

/// Zero or more whitespace characters, discarded; prints nothing.
pub fn whitespaces() -> Syntax<(), String> {
    Syntax {
        parser: Parser::regex_discard_compiled(
            WHITESPACE.clone(),
            Some("expected whitespace".to_owned()),
        ),
        printer: Printer::regex_discard(None::<char>),
    }
}

/// The rest of the input, as a `String`; printed back verbatim.
pub fn any_string() -> Syntax<String, String> {
    Syntax {
        parser: Parser::regex_compiled(ANY_STRING.clone(), None),
        printer: Printer::from_input(|text: String| Printer::regex_discard(text.chars())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Parses with both engines, asserts they agree on the full result
    /// shape, and returns it.
    fn parse_both<V>(syntax: &Syntax<V, String>, input: &str) -> Result<V, ParserError<String>>
    where
        V: Value + PartialEq + fmt::Debug,
    {
        let stack_safe = syntax.parse_string_with(input, Implementation::StackSafe);
        let recursive = syntax.parse_string_with(input, Implementation::Recursive);
        assert_eq!(stack_safe, recursive, "engines disagree on {:?}", input);
        stack_safe
    }

    #[test]
    fn char_in_yields_the_character() {
        let syntax = char_in("A");
        assert_eq!(parse_both(&syntax, "A"), Ok('A'));
        assert_matches!(
            parse_both(&syntax, "B"),
            Err(ParserError::Failure { position: 0, .. })
        );
        assert_eq!(
            parse_both(&syntax, ""),
            Err(ParserError::UnexpectedEndOfInput)
        );
    }

    #[test]
    fn end_reports_the_unconsumed_position() {
        let syntax = digit().repeat1().zip_left(end());
        assert_eq!(parse_both(&syntax, "123"), Ok(vec!['1', '2', '3']));
        assert_eq!(
            parse_both(&syntax, "123x"),
            Err(ParserError::NotConsumedAll { position: 3 })
        );
    }

    #[test]
    fn boolean_alternatives() {
        let boolean = string("true").to(true).or_else(string("false").to(false));
        assert_eq!(parse_both(&boolean, "false"), Ok(false));
        assert_eq!(parse_both(&boolean, "true"), Ok(true));
        assert_eq!(boolean.print_string(&true), Ok("true".to_owned()));
        assert_eq!(boolean.print_string(&false), Ok("false".to_owned()));
    }

    #[test]
    fn separated_digits_round_trip() {
        let csv = digit().repeat_with_sep(char(','));
        assert_eq!(parse_both(&csv, "1,2,3"), Ok(vec!['1', '2', '3']));
        assert_eq!(parse_both(&csv, ""), Ok(vec![]));
        assert_eq!(csv.print_string(&vec!['1', '2', '3']), Ok("1,2,3".to_owned()));
        assert_eq!(csv.print_string(&vec![]), Ok(String::new()));
    }

    #[test]
    fn named_scopes_reach_the_failure() {
        let ip = digits().repeat_with_sep1(char('.')).named("ip");
        assert_eq!(
            parse_both(&ip, "1.2.x"),
            Err(ParserError::Failure {
                names: vec!["ip".to_owned()],
                position: 4,
                error: "expected digits".to_owned(),
            })
        );
        assert_eq!(
            parse_both(&ip, "1.22.333"),
            Ok(vec!["1".to_owned(), "22".to_owned(), "333".to_owned()])
        );
    }

    #[test]
    fn nested_names_are_outermost_first() {
        let syntax = digit().named("inner").named("outer");
        assert_eq!(
            parse_both(&syntax, "x"),
            Err(ParserError::Failure {
                names: vec!["outer".to_owned(), "inner".to_owned()],
                position: 0,
                error: "expected a digit".to_owned(),
            })
        );
    }

    #[test]
    fn consumed_failure_does_not_retry_by_default() {
        let left = char('a').zip_right(char_in("b"));
        let syntax = left.or_else(char_in("a"));
        assert_matches!(
            parse_both(&syntax, "ac"),
            Err(ParserError::Failure { position: 1, .. })
        );
    }

    #[test]
    fn auto_backtracking_retries_the_alternative() {
        let left = char('a').zip_right(char_in("b"));
        let syntax = left.or_else(char_in("a")).auto_backtracking();
        assert_eq!(parse_both(&syntax, "ac"), Ok('a'));
    }

    #[test]
    fn explicit_backtrack_retries_the_alternative() {
        let left = char('a').zip_right(char_in("b")).backtrack();
        let syntax = left.or_else(char_in("a"));
        assert_eq!(parse_both(&syntax, "ac"), Ok('a'));
    }

    #[test]
    fn manual_backtracking_wins_over_an_outer_auto_scope() {
        let left = char('a').zip_right(char_in("b"));
        let syntax = left
            .or_else(char_in("a"))
            .manual_backtracking()
            .auto_backtracking();
        assert_matches!(
            parse_both(&syntax, "ac"),
            Err(ParserError::Failure { position: 1, .. })
        );
    }

    #[test]
    fn both_branches_failing_keeps_both_errors() {
        let syntax = char_in("x").or_else(char_in("y"));
        assert_matches!(
            parse_both(&syntax, "z"),
            Err(ParserError::AllBranchesFailed(left, right)) => {
                assert_matches!(*left, ParserError::Failure { position: 0, .. });
                assert_matches!(*right, ParserError::Failure { position: 0, .. });
            }
        );
    }

    #[test]
    fn repeat_requires_the_minimum() {
        let syntax = digit().at_least(2);
        assert_eq!(parse_both(&syntax, "123"), Ok(vec!['1', '2', '3']));
        assert_eq!(parse_both(&syntax, "12"), Ok(vec!['1', '2']));
        assert_eq!(
            parse_both(&syntax, "1"),
            Err(ParserError::UnexpectedEndOfInput)
        );
        assert_matches!(
            parse_both(&syntax, "1x"),
            Err(ParserError::Failure { position: 1, .. })
        );
    }

    #[test]
    fn optional_swallows_only_unconsumed_failures() {
        let syntax = digit().optional();
        assert_eq!(parse_both(&syntax, "1"), Ok(Some('1')));
        assert_eq!(parse_both(&syntax, "x"), Ok(None));

        let consuming = char('a').zip_right(digit()).optional();
        assert_matches!(
            parse_both(&consuming, "ax"),
            Err(ParserError::Failure { position: 1, .. })
        );
        assert_eq!(parse_both(&consuming.clone().auto_backtracking(), "ax"), Ok(None));
    }

    #[test]
    fn or_else_either_tags_the_branch() {
        let syntax = digit().or_else_either(letter());
        assert_eq!(parse_both(&syntax, "1"), Ok(Either::Left('1')));
        assert_eq!(parse_both(&syntax, "a"), Ok(Either::Right('a')));
        assert_eq!(syntax.print_string(&Either::Left('1')), Ok("1".to_owned()));
        assert_eq!(syntax.print_string(&Either::Right('a')), Ok("a".to_owned()));
    }

    #[test]
    fn repeat_until_consumes_the_stop() {
        let syntax = letter().repeat_until(char(';'));
        assert_eq!(parse_both(&syntax, "ab;"), Ok(vec!['a', 'b']));
        assert_eq!(syntax.print_string(&vec!['a', 'b']), Ok("ab;".to_owned()));
        // The stop never matching surfaces the stop failure.
        assert_matches!(parse_both(&syntax, "ab"), Err(_));
    }

    #[test]
    fn not_is_a_pure_lookahead() {
        let syntax = digit().not("unexpected digit".to_owned()).zip_right(letter());
        assert_eq!(parse_both(&syntax, "a"), Ok('a'));
        assert_matches!(
            parse_both(&syntax, "1"),
            Err(ParserError::Failure { position: 0, ref error, .. }) => {
                assert_eq!(error, "unexpected digit");
            }
        );
    }

    #[test]
    fn capture_string_round_trips_verbatim() {
        let word = letter().repeat1().capture_string();
        assert_eq!(parse_both(&word, "abc"), Ok("abc".to_owned()));
        assert_eq!(word.print_string(&"abc".to_owned()), Ok("abc".to_owned()));
    }

    #[test]
    fn transform_either_reports_at_the_entry_position() {
        let number = digits().transform_either(
            |text| text.parse::<u32>().map_err(|error| error.to_string()),
            |value: u32| Ok(value.to_string()),
        );
        assert_eq!(parse_both(&number, "42"), Ok(42));
        assert_eq!(number.print_string(&7), Ok("7".to_owned()));
        assert_matches!(
            parse_both(&number, "99999999999999999999"),
            Err(ParserError::Failure { position: 0, .. })
        );
    }

    #[test]
    fn filter_rejects_in_both_directions() {
        let even = digits().filter(
            |text: &String| text.len() % 2 == 0,
            "expected an even length".to_owned(),
        );
        assert_eq!(parse_both(&even, "12"), Ok("12".to_owned()));
        assert_matches!(
            parse_both(&even, "123"),
            Err(ParserError::Failure { position: 0, .. })
        );
        assert_eq!(
            even.print_string(&"123".to_owned()),
            Err("expected an even length".to_owned())
        );
    }

    #[test]
    fn index_and_between() {
        let syntax = digit().between(char('['), char(']'));
        assert_eq!(parse_both(&syntax, "[5]"), Ok('5'));
        assert_eq!(syntax.print_string(&'5'), Ok("[5]".to_owned()));

        let offset = char('a').zip_right(index());
        assert_eq!(parse_both(&offset, "a"), Ok(1));
    }

    #[test]
    fn whitespace_helpers() {
        let spaced = letters().zip_left(whitespaces()).repeat1();
        assert_eq!(
            parse_both(&spaced, "ab  cd"),
            Ok(vec!["ab".to_owned(), "cd".to_owned()])
        );
        assert_eq!(parse_both(&whitespace_char(), "\t"), Ok('\t'));
    }

    #[test]
    fn any_helpers_round_trip() {
        assert_eq!(parse_both(&any_char(), "枝"), Ok('枝'));
        assert_eq!(any_char().print_string(&'枝'), Ok("枝".to_owned()));
        assert_eq!(parse_both(&any_string(), "a b"), Ok("a b".to_owned()));
        assert_eq!(any_string().print_string(&"a b".to_owned()), Ok("a b".to_owned()));
    }

    #[test]
    fn regex_without_an_error_reports_unknown_failure() {
        let parser: Parser<String, String> = Parser::regex_compiled(DIGITS.clone(), None);
        assert_eq!(
            parser.parse_string("x"),
            Err(ParserError::UnknownFailure {
                names: vec![],
                position: 0,
            })
        );
        assert_eq!(
            parser.parse_string_with("x", Implementation::Recursive),
            Err(ParserError::UnknownFailure {
                names: vec![],
                position: 0,
            })
        );
    }

    #[test]
    fn map_error_rewrites_failures() {
        let syntax = digit().map_error(|error| format!("digit: {}", error));
        assert_eq!(
            parse_both(&syntax, "x"),
            Err(ParserError::Failure {
                names: vec![],
                position: 0,
                error: "digit: expected a digit".to_owned(),
            })
        );
    }

    #[test]
    fn succeed_fail_and_unit() {
        assert_eq!(parse_both(&succeed(9u8), ""), Ok(9));
        assert_matches!(
            parse_both(&fail::<u8, String>("boom".to_owned()), ""),
            Err(ParserError::Failure { position: 0, ref error, .. }) => {
                assert_eq!(error, "boom");
            }
        );
        assert_eq!(parse_both(&unit(), ""), Ok(()));
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

    #[test]
    fn recursive_grammars_agree_between_engines() {
        assert_eq!(parse_both(&parens(), ""), Ok(0));
        assert_eq!(parse_both(&parens(), "((()))"), Ok(3));
        assert_eq!(parens().print_string(&3), Ok("((()))".to_owned()));
    }

    #[test]
    fn deep_recursion_is_stack_safe() {
        // The engine keeps its stacks on the heap; the generous thread
        // stack here is for building and dropping the 10k-level grammar
        // value itself, whose destructor recurses through the tree.
        std::thread::Builder::new()
            .stack_size(32 << 20)
            .spawn(|| {
                let depth = 10_000;
                let input: String = "(".repeat(depth) + &")".repeat(depth);
                let parsed = parens().parse_string_with(&input, Implementation::StackSafe);
                assert_eq!(parsed, Ok(depth));
            })
            .expect("spawning the test thread succeeds")
            .join()
            .expect("the deep parse completes");
    }

    #[test]
    fn repeat_with_sep1_requires_a_leading_element() {
        let syntax = digit().repeat_with_sep1(char(','));
        assert_eq!(parse_both(&syntax, "1"), Ok(vec!['1']));
        assert_matches!(parse_both(&syntax, ","), Err(_));
        // Without backtracking, a consumed trailing separator poisons the
        // parse; with it, the separator is handed back.
        assert_eq!(
            parse_both(&syntax, "1,2,"),
            Err(ParserError::UnexpectedEndOfInput)
        );
        assert_eq!(
            parse_both(&syntax.clone().auto_backtracking(), "1,2,"),
            Ok(vec!['1', '2'])
        );
    }

    #[test]
    fn zip_pairs_values() {
        let pair = digit().zip(letter());
        assert_eq!(parse_both(&pair, "1a"), Ok(('1', 'a')));
        assert_eq!(pair.print_string(&('1', 'a')), Ok("1a".to_owned()));
        assert_matches!(
            parse_both(&pair, "12"),
            Err(ParserError::Failure { position: 1, .. })
        );
    }
}
