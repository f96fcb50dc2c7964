//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The regex sub-language used to accelerate character-class and literal
//! matching.
//!
//! A [`Regex`] is a small, cycle-free algebra built from character classes,
//! intersection, union, concatenation and greedy repetition. It has no
//! textual syntax: regexes are built with the constructors below and
//! [compiled](Regex::compile) into an immutable, shareable table-driven
//! matcher. The surface deliberately stops at ASCII classes; characters
//! above `'\u{ff}'` never match a class (see [`ByteSet`]).
//!
//! ```
//! use biparse::regex::Regex;
//!
//! let identifier = Regex::any_letter().sequence(Regex::any_alpha_numeric().at_least(0));
//! let compiled = identifier.compile();
//! assert!(compiled.matches("x1"));
//! assert!(!compiled.matches("1x"));
//! ```

mod compile;

pub use self::compile::{Compiled, Test};

use crate::bits::ByteSet;

/// The whitespace class: space, tab, CR, LF, VT and FF.
const WHITESPACE: &[char] = &[' ', '\t', '\r', '\n', '\x0b', '\x0c'];

/// A regular expression over code units `0..=255`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Regex {
    /// Matches the empty prefix; always consumes nothing.
    Succeed,
    /// Matches one character whose code unit is in the set.
    OneOf(ByteSet),
    /// Intersection: both sides must match the same prefix.
    And(Box<Regex>, Box<Regex>),
    /// Union: the longer match wins, ties go to the left.
    Or(Box<Regex>, Box<Regex>),
    /// Concatenation.
    Sequence(Box<Regex>, Box<Regex>),
    /// Greedy repetition. `min` defaults to zero, `max` to unbounded.
    Repeat {
        /// The repeated expression.
        inner: Box<Regex>,
        /// The minimum number of repetitions, if bounded below.
        min: Option<usize>,
        /// The maximum number of repetitions, if bounded above.
        max: Option<usize>,
    },
}

impl Regex {
    /// Matches exactly the character `ch`.
    pub fn char(ch: char) -> Regex {
        Regex::OneOf(ByteSet::from_chars(Some(ch)))
    }

    /// Matches one character out of `chars`.
    pub fn char_in<I: IntoIterator<Item = char>>(chars: I) -> Regex {
        Regex::OneOf(ByteSet::from_chars(chars))
    }

    /// Matches one character not in `chars`.
    pub fn char_not_in<I: IntoIterator<Item = char>>(chars: I) -> Regex {
        Regex::OneOf(ByteSet::from_chars(chars).complement())
    }

    /// Matches one character satisfying `predicate`.
    pub fn filter<F: Fn(char) -> bool>(predicate: F) -> Regex {
        Regex::OneOf(ByteSet::from_predicate(predicate))
    }

    /// Matches any single character.
    pub fn any_char() -> Regex {
        Regex::OneOf(ByteSet::full())
    }

    /// Matches one ASCII digit.
    pub fn any_digit() -> Regex {
        Regex::filter(|c| c.is_ascii_digit())
    }

    /// Matches one ASCII letter.
    pub fn any_letter() -> Regex {
        Regex::filter(|c| c.is_ascii_alphabetic())
    }

    /// Matches one ASCII letter or digit.
    pub fn any_alpha_numeric() -> Regex {
        Regex::filter(|c| c.is_ascii_alphanumeric())
    }

    /// Matches one whitespace character (space, tab, CR, LF, VT, FF).
    pub fn any_whitespace() -> Regex {
        Regex::char_in(WHITESPACE.iter().copied())
    }

    /// Matches one or more ASCII digits.
    pub fn digits() -> Regex {
        Regex::any_digit().at_least(1)
    }

    /// Matches one or more ASCII letters.
    pub fn letters() -> Regex {
        Regex::any_letter().at_least(1)
    }

    /// Matches one or more ASCII letters or digits.
    pub fn alpha_numerics() -> Regex {
        Regex::any_alpha_numeric().at_least(1)
    }

    /// Matches any run of whitespace, including the empty one.
    pub fn whitespace() -> Regex {
        Regex::any_whitespace().at_least(0)
    }

    /// Matches exactly the characters of `s`, in order.
    pub fn string(s: &str) -> Regex {
        s.chars()
            .rev()
            .fold(Regex::Succeed, |rest, ch| Regex::char(ch).sequence(rest))
    }

    /// Intersection with `that`: both must match the same prefix.
    pub fn and(self, that: Regex) -> Regex {
        Regex::And(Box::new(self), Box::new(that))
    }

    /// Union with `that`: the longer match wins, ties go to `self`.
    pub fn or(self, that: Regex) -> Regex {
        Regex::Or(Box::new(self), Box::new(that))
    }

    /// Matches `self` followed by `that`.
    pub fn sequence(self, that: Regex) -> Regex {
        Regex::Sequence(Box::new(self), Box::new(that))
    }

    /// Matches `self` repeated at least `min` times, greedily.
    pub fn at_least(self, min: usize) -> Regex {
        Regex::Repeat {
            inner: Box::new(self),
            min: Some(min),
            max: None,
        }
    }

    /// Matches `self` repeated at most `max` times, greedily.
    pub fn at_most(self, max: usize) -> Regex {
        Regex::Repeat {
            inner: Box::new(self),
            min: None,
            max: Some(max),
        }
    }

    /// Matches `self` repeated between `min` and `max` times, greedily.
    pub fn between(self, min: usize, max: usize) -> Regex {
        Regex::Repeat {
            inner: Box::new(self),
            min: Some(min),
            max: Some(max),
        }
    }

    /// If this regex is a plain concatenation of single-character classes,
    /// returns the characters it matches.
    pub fn to_literal(&self) -> Option<Vec<char>> {
        match self {
            Regex::Succeed => Some(Vec::new()),
            Regex::OneOf(set) => set.as_singleton().map(|byte| vec![byte as char]),
            Regex::Sequence(left, right) => {
                let mut chars = left.to_literal()?;
                chars.extend(right.to_literal()?);
                Some(chars)
            }
            _ => None,
        }
    }

    /// Compiles this regex into an immutable matcher.
    ///
    /// Compilation is deterministic: structurally equal regexes compile to
    /// behaviourally indistinguishable matchers.
    pub fn compile(&self) -> Compiled {
        compile::compile(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_builds_singleton_sequences() {
        assert_eq!(Regex::string("ab").to_literal(), Some(vec!['a', 'b']));
        assert_eq!(Regex::string("").to_literal(), Some(vec![]));
    }

    #[test]
    fn to_literal_rejects_wide_classes() {
        assert_eq!(Regex::any_digit().to_literal(), None);
        assert_eq!(Regex::char('a').or(Regex::char('b')).to_literal(), None);
        assert_eq!(Regex::char('a').at_least(1).to_literal(), None);
    }

    #[test]
    fn char_not_in_is_a_complement() {
        let set = match Regex::char_not_in("ab".chars()) {
            Regex::OneOf(set) => set,
            other => panic!("unexpected shape: {:?}", other),
        };
        assert!(!set.has(b'a'));
        assert!(set.has(b'c'));
        assert_eq!(set.len(), 254);
    }

    #[test]
    fn derived_constructors_expand_to_repeats() {
        match Regex::digits() {
            Regex::Repeat { min, max, .. } => {
                assert_eq!(min, Some(1));
                assert_eq!(max, None);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
        match Regex::any_letter().between(2, 4) {
            Regex::Repeat { min, max, .. } => {
                assert_eq!(min, Some(2));
                assert_eq!(max, Some(4));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }
}
