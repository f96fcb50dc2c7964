//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsers: declarative descriptions of how to turn text into values.
//!
//! A [`Parser`] is an immutable tree of combinator nodes. Nothing happens
//! until it is handed to one of the two execution engines:
//!
//! * [`Implementation::StackSafe`] (the default) runs a trampoline over
//!   explicit operand and continuation stacks and handles arbitrarily deep
//!   grammars;
//! * [`Implementation::Recursive`] walks the tree with host recursion and
//!   serves as the reference semantics.
//!
//! Both engines produce identical values and identical error shapes; the
//! test suite holds them to that.

pub(crate) mod recursive;
pub(crate) mod stack;

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::bits::ByteSet;
use crate::either::Either;
use crate::error::ParserError;
use crate::regex::{Compiled, Regex, Test};
use crate::value::{
    pack, unpack, DynValue, Map1, Map2, MapErrFn, MapSeq, Predicate, TryMap1, Value,
};

/// Selects which execution engine runs a parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Implementation {
    /// The trampoline engine with explicit stacks; the production default.
    StackSafe,
    /// The tree-walking reference engine. Deep grammars can exhaust the
    /// host stack; use it for differential testing, not production.
    Recursive,
}

impl Default for Implementation {
    fn default() -> Self {
        Implementation::StackSafe
    }
}

/// The erased combinator tree. `E` is the user's error type; values travel
/// as [`DynValue`].
pub(crate) enum Node<E> {
    Succeed(DynValue),
    Fail(E),
    Named(Arc<Node<E>>, String),
    Lazy(LazyNode<E>),
    Backtrack(Arc<Node<E>>),
    SetAutoBacktracking(Arc<Node<E>>, bool),
    Transform(Arc<Node<E>>, Map1),
    TransformEither(Arc<Node<E>>, TryMap1<E>),
    MapError(Arc<Node<E>>, MapErrFn<E>),
    Filter {
        inner: Arc<Node<E>>,
        predicate: Predicate,
        error: E,
    },
    Zip {
        left: Arc<Node<E>>,
        right: Arc<Node<E>>,
        combine: Map2,
    },
    ZipLeft(Arc<Node<E>>, Arc<Node<E>>),
    ZipRight(Arc<Node<E>>, Arc<Node<E>>),
    OrElse {
        left: Arc<Node<E>>,
        right: Arc<Node<E>>,
    },
    OrElseEither {
        left: Arc<Node<E>>,
        right: Arc<Node<E>>,
        left_into: Map1,
        right_into: Map1,
    },
    Optional {
        inner: Arc<Node<E>>,
        some_into: Map1,
        none: DynValue,
    },
    Repeat {
        inner: Arc<Node<E>>,
        min: usize,
        max: Option<usize>,
        collect: MapSeq,
    },
    RepeatUntil {
        inner: Arc<Node<E>>,
        stop: Arc<Node<E>>,
        collect: MapSeq,
    },
    RepeatWithSep {
        inner: Arc<Node<E>>,
        sep: Arc<Node<E>>,
        at_least_one: bool,
        collect: MapSeq,
    },
    Not {
        inner: Arc<Node<E>>,
        error: E,
    },
    End,
    Index,
    CaptureString(Arc<Node<E>>),
    ParseRegex {
        regex: Compiled,
        error: Option<E>,
    },
    ParseRegexLastChar {
        regex: Compiled,
        error: Option<E>,
    },
    ParseRegexDiscard {
        regex: Compiled,
        error: Option<E>,
    },
    CharIn {
        set: ByteSet,
        error: E,
    },
    CharNotIn {
        set: ByteSet,
        error: E,
    },
    AnyChar,
}

/// A suspended subtree; the only way to close a cycle in a grammar.
///
/// The thunk is forced at most once and the result is memoised, so each
/// traversal of a recursive grammar pays for the expansion once.
pub(crate) struct LazyNode<E> {
    cell: Arc<OnceLock<Arc<Node<E>>>>,
    thunk: Arc<dyn Fn() -> Arc<Node<E>> + Send + Sync>,
}

impl<E> LazyNode<E> {
    pub(crate) fn force(&self) -> Arc<Node<E>> {
        self.cell.get_or_init(|| (self.thunk)()).clone()
    }
}

// --- shared leaf semantics -------------------------------------------------
//
// Both engines delegate every input-inspecting leaf to these helpers, so
// the two cannot drift apart on values, positions or error shapes.

pub(crate) fn class_char<E: Clone>(
    set: &ByteSet,
    negate: bool,
    error: &E,
    input: &[char],
    pos: usize,
    names: &[String],
) -> Result<(char, usize), ParserError<E>> {
    match input.get(pos) {
        None => Err(ParserError::UnexpectedEndOfInput),
        Some(&ch) => {
            if set.has_char(ch) != negate {
                Ok((ch, pos + 1))
            } else {
                Err(ParserError::failure(names.to_vec(), pos, error.clone()))
            }
        }
    }
}

fn regex_mismatch<E: Clone>(error: &Option<E>, pos: usize, names: &[String]) -> ParserError<E> {
    match error {
        Some(error) => ParserError::failure(names.to_vec(), pos, error.clone()),
        None => ParserError::unknown(names.to_vec(), pos),
    }
}

/// Runs a compiled regex at `pos`, returning the index just past the match.
pub(crate) fn run_compiled<E: Clone>(
    regex: &Compiled,
    error: &Option<E>,
    input: &[char],
    pos: usize,
    names: &[String],
) -> Result<usize, ParserError<E>> {
    match regex.test(pos, input) {
        Test::Matched(next) => Ok(next),
        Test::NeedMoreInput => Err(ParserError::UnexpectedEndOfInput),
        Test::NotMatched => Err(regex_mismatch(error, pos, names)),
    }
}

/// Like [`run_compiled`], but also yields the last matched character.
/// A zero-width match has no last character and counts as a mismatch.
pub(crate) fn run_compiled_char<E: Clone>(
    regex: &Compiled,
    error: &Option<E>,
    input: &[char],
    pos: usize,
    names: &[String],
) -> Result<(char, usize), ParserError<E>> {
    let next = run_compiled(regex, error, input, pos, names)?;
    if next == pos {
        return Err(regex_mismatch(error, pos, names));
    }
    Ok((input[next - 1], next))
}

pub(crate) fn any_char_at<E>(
    input: &[char],
    pos: usize,
) -> Result<(char, usize), ParserError<E>> {
    match input.get(pos) {
        Some(&ch) => Ok((ch, pos + 1)),
        None => Err(ParserError::UnexpectedEndOfInput),
    }
}

fn collect_vec<V: Value>() -> MapSeq {
    Arc::new(|items: Vec<DynValue>| {
        pack(
            items
                .iter()
                .map(|item| unpack::<V>(item))
                .collect::<Vec<V>>(),
        )
    })
}

// --- typed facade ----------------------------------------------------------

/// A declarative parser producing values of type `V` with user errors `E`.
///
/// Parsers are cheap to clone and safe to share across threads; each parse
/// owns its own working state.
pub struct Parser<V, E> {
    pub(crate) node: Arc<Node<E>>,
    marker: PhantomData<fn() -> V>,
}

impl<V, E> Clone for Parser<V, E> {
    fn clone(&self) -> Self {
        Parser {
            node: Arc::clone(&self.node),
            marker: PhantomData,
        }
    }
}

impl<V, E> fmt::Debug for Parser<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser").finish_non_exhaustive()
    }
}

impl<V, E> Parser<V, E> {
    pub(crate) fn from_node(node: Node<E>) -> Self {
        Parser {
            node: Arc::new(node),
            marker: PhantomData,
        }
    }
}

impl<V: Value, E: Clone + Send + Sync + 'static> Parser<V, E> {
    /// Succeeds with `value` without consuming input.
    pub fn succeed(value: V) -> Self {
        Parser::from_node(Node::Succeed(pack(value)))
    }

    /// Fails with `error` without consuming input.
    pub fn fail(error: E) -> Self {
        Parser::from_node(Node::Fail(error))
    }

    /// Defers construction of a parser; required for recursive grammars.
    ///
    /// The closure runs at most once per `lazy` node, when the parser is
    /// first reached during a parse.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Parser<V, E> + Send + Sync + 'static,
    {
        Parser::from_node(Node::Lazy(LazyNode {
            cell: Arc::new(OnceLock::new()),
            thunk: Arc::new(move || f().node),
        }))
    }

    /// Maps the parsed value.
    pub fn transform<V2, F>(self, f: F) -> Parser<V2, E>
    where
        V2: Value,
        F: Fn(V) -> V2 + Send + Sync + 'static,
    {
        let f: Map1 = Arc::new(move |value| pack(f(unpack::<V>(&value))));
        Parser::from_node(Node::Transform(self.node, f))
    }

    /// Maps the parsed value through a fallible function; an `Err` becomes
    /// a failure at the position where this parser started.
    pub fn transform_either<V2, F>(self, f: F) -> Parser<V2, E>
    where
        V2: Value,
        F: Fn(V) -> Result<V2, E> + Send + Sync + 'static,
    {
        let f: TryMap1<E> = Arc::new(move |value| f(unpack::<V>(&value)).map(pack));
        Parser::from_node(Node::TransformEither(self.node, f))
    }

    /// Rewrites the user error values produced by this parser.
    pub fn map_error<F>(self, f: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        Parser::from_node(Node::MapError(self.node, Arc::new(f)))
    }

    /// Fails with `error` when the parsed value does not satisfy the
    /// predicate; the failure is recorded at the entry position.
    pub fn filter<F>(self, predicate: F, error: E) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(move |value| predicate(&unpack::<V>(value)));
        Parser::from_node(Node::Filter {
            inner: self.node,
            predicate,
            error,
        })
    }

    /// Opens a named scope; failures inside record the chain of enclosing
    /// names, outermost first.
    pub fn named(self, name: impl Into<String>) -> Self {
        Parser::from_node(Node::Named(self.node, name.into()))
    }

    /// Restores the input position when this parser fails, so that an
    /// enclosing alternative can try its next branch.
    pub fn backtrack(self) -> Self {
        Parser::from_node(Node::Backtrack(self.node))
    }

    /// Enables or disables automatic backtracking inside this parser.
    pub fn set_auto_backtracking(self, enabled: bool) -> Self {
        Parser::from_node(Node::SetAutoBacktracking(self.node, enabled))
    }

    /// Shorthand for [`set_auto_backtracking(true)`](Self::set_auto_backtracking).
    pub fn auto_backtracking(self) -> Self {
        self.set_auto_backtracking(true)
    }

    /// Shorthand for [`set_auto_backtracking(false)`](Self::set_auto_backtracking).
    pub fn manual_backtracking(self) -> Self {
        self.set_auto_backtracking(false)
    }

    /// Parses `self`, then `that`, producing both values.
    pub fn zip<V2: Value>(self, that: Parser<V2, E>) -> Parser<(V, V2), E> {
        let combine: Map2 =
            Arc::new(|left, right| pack((unpack::<V>(&left), unpack::<V2>(&right))));
        Parser::from_node(Node::Zip {
            left: self.node,
            right: that.node,
            combine,
        })
    }

    /// Parses `self`, then `that`, keeping only `self`'s value.
    pub fn zip_left<V2: Value>(self, that: Parser<V2, E>) -> Parser<V, E> {
        Parser::from_node(Node::ZipLeft(self.node, that.node))
    }

    /// Parses `self`, then `that`, keeping only `that`'s value.
    pub fn zip_right<V2: Value>(self, that: Parser<V2, E>) -> Parser<V2, E> {
        Parser::from_node(Node::ZipRight(self.node, that.node))
    }

    /// Tries `self`; on failure tries `that` from the same position.
    ///
    /// When `self` fails after consuming input, `that` is attempted only if
    /// backtracking applies: either automatic backtracking is enabled in the
    /// current scope or the failing branch is wrapped in
    /// [`backtrack`](Self::backtrack). If both branches fail the error keeps
    /// both sub-errors.
    pub fn or_else(self, that: Parser<V, E>) -> Self {
        Parser::from_node(Node::OrElse {
            left: self.node,
            right: that.node,
        })
    }

    /// Like [`or_else`](Self::or_else), but keeps track of which branch
    /// succeeded.
    pub fn or_else_either<V2: Value>(self, that: Parser<V2, E>) -> Parser<Either<V, V2>, E> {
        let left_into: Map1 =
            Arc::new(|value| pack(Either::<V, V2>::Left(unpack::<V>(&value))));
        let right_into: Map1 =
            Arc::new(|value| pack(Either::<V, V2>::Right(unpack::<V2>(&value))));
        Parser::from_node(Node::OrElseEither {
            left: self.node,
            right: that.node,
            left_into,
            right_into,
        })
    }

    /// Makes this parser optional; a swallowable failure yields `None`.
    pub fn optional(self) -> Parser<Option<V>, E> {
        let some_into: Map1 = Arc::new(|value| pack(Some(unpack::<V>(&value))));
        Parser::from_node(Node::Optional {
            inner: self.node,
            some_into,
            none: pack(None::<V>),
        })
    }

    fn repeated(self, min: usize, max: Option<usize>) -> Parser<Vec<V>, E> {
        Parser::from_node(Node::Repeat {
            inner: self.node,
            min,
            max,
            collect: collect_vec::<V>(),
        })
    }

    /// Parses `self` zero or more times, greedily.
    pub fn repeat0(self) -> Parser<Vec<V>, E> {
        self.repeated(0, None)
    }

    /// Parses `self` one or more times, greedily.
    pub fn repeat1(self) -> Parser<Vec<V>, E> {
        self.repeated(1, None)
    }

    /// Parses `self` at least `min` times, greedily.
    pub fn at_least(self, min: usize) -> Parser<Vec<V>, E> {
        self.repeated(min, None)
    }

    /// Parses `self` repeatedly until `stop` succeeds; `stop`'s input is
    /// consumed. `stop` is attempted after each successful element.
    pub fn repeat_until<S: Value>(self, stop: Parser<S, E>) -> Parser<Vec<V>, E> {
        Parser::from_node(Node::RepeatUntil {
            inner: self.node,
            stop: stop.node,
            collect: collect_vec::<V>(),
        })
    }

    /// Parses `self` separated by `sep`, allowing the empty sequence.
    pub fn repeat_with_sep<S: Value>(self, sep: Parser<S, E>) -> Parser<Vec<V>, E> {
        Parser::from_node(Node::RepeatWithSep {
            inner: self.node,
            sep: sep.node,
            at_least_one: false,
            collect: collect_vec::<V>(),
        })
    }

    /// Parses `self` separated by `sep`, requiring at least one element.
    pub fn repeat_with_sep1<S: Value>(self, sep: Parser<S, E>) -> Parser<Vec<V>, E> {
        Parser::from_node(Node::RepeatWithSep {
            inner: self.node,
            sep: sep.node,
            at_least_one: true,
            collect: collect_vec::<V>(),
        })
    }

    /// Negative lookahead: succeeds with unit when `self` fails, fails with
    /// `error` when `self` succeeds. Never consumes input.
    pub fn not(self, error: E) -> Parser<(), E> {
        Parser::from_node(Node::Not {
            inner: self.node,
            error,
        })
    }

    /// Discards the value and yields the exact substring this parser
    /// consumed.
    pub fn capture_string(self) -> Parser<String, E> {
        Parser::from_node(Node::CaptureString(self.node))
    }

    /// Parses `input` with the default (stack-safe) engine.
    pub fn parse_string(&self, input: &str) -> Result<V, ParserError<E>> {
        self.parse_string_with(input, Implementation::default())
    }

    /// Parses `input` with the chosen engine. Both engines produce the same
    /// values and the same error shapes.
    pub fn parse_string_with(
        &self,
        input: &str,
        implementation: Implementation,
    ) -> Result<V, ParserError<E>> {
        let chars: Vec<char> = input.chars().collect();
        let value = match implementation {
            Implementation::StackSafe => stack::parse(&self.node, &chars)?,
            Implementation::Recursive => recursive::parse(&self.node, &chars)?,
        };
        Ok(unpack::<V>(&value))
    }
}

impl<E: Clone + Send + Sync + 'static> Parser<String, E> {
    /// Matches `pattern` and yields the matched substring.
    pub fn regex(pattern: &Regex, error: E) -> Self {
        Parser::from_node(Node::ParseRegex {
            regex: pattern.compile(),
            error: Some(error),
        })
    }

    pub(crate) fn regex_compiled(regex: Compiled, error: Option<E>) -> Self {
        Parser::from_node(Node::ParseRegex { regex, error })
    }
}

impl<E: Clone + Send + Sync + 'static> Parser<char, E> {
    /// Consumes any single character.
    pub fn any_char() -> Self {
        Parser::from_node(Node::AnyChar)
    }

    /// Consumes one character out of `chars`.
    pub fn char_in<I: IntoIterator<Item = char>>(chars: I, error: E) -> Self {
        Parser::from_node(Node::CharIn {
            set: ByteSet::from_chars(chars),
            error,
        })
    }

    /// Consumes one character not in `chars`.
    pub fn char_not_in<I: IntoIterator<Item = char>>(chars: I, error: E) -> Self {
        Parser::from_node(Node::CharNotIn {
            set: ByteSet::from_chars(chars),
            error,
        })
    }

    /// Matches `pattern` and yields the last matched character.
    pub fn regex_char(pattern: &Regex, error: E) -> Self {
        Parser::from_node(Node::ParseRegexLastChar {
            regex: pattern.compile(),
            error: Some(error),
        })
    }

    pub(crate) fn regex_char_compiled(regex: Compiled, error: Option<E>) -> Self {
        Parser::from_node(Node::ParseRegexLastChar { regex, error })
    }
}

impl<E: Clone + Send + Sync + 'static> Parser<(), E> {
    /// Succeeds only at the end of the input.
    pub fn end() -> Self {
        Parser::from_node(Node::End)
    }

    /// Matches `pattern` and discards the match.
    pub fn regex_discard(pattern: &Regex, error: E) -> Self {
        Parser::from_node(Node::ParseRegexDiscard {
            regex: pattern.compile(),
            error: Some(error),
        })
    }

    pub(crate) fn regex_discard_compiled(regex: Compiled, error: Option<E>) -> Self {
        Parser::from_node(Node::ParseRegexDiscard { regex, error })
    }
}

impl<E: Clone + Send + Sync + 'static> Parser<usize, E> {
    /// Yields the current input position without consuming anything.
    pub fn index() -> Self {
        Parser::from_node(Node::Index)
    }
}
