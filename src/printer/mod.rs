//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Printers: declarative descriptions of how to turn values back into
//! output.
//!
//! A [`Printer`] consumes a value of type `V` and writes elements of type
//! `O` (characters, for printers built through [`Syntax`]) into a
//! [`Target`]. Printer trees are shallow in practice, so they are
//! interpreted with a straightforward tree walk; the interesting part is
//! `or_else`, which writes speculatively and relies on the target's
//! checkpoint/rollback support.
//!
//! [`Syntax`]: crate::syntax::Syntax
//! [`Target`]: crate::target::Target

pub(crate) mod run;

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::either::Either;
use crate::regex::{Compiled, Regex};
use crate::target::{ChunkTarget, StringTarget, Target};
use crate::value::{
    pack, unpack, DynValue, Map1, MapErrFn, Predicate, SplitEither, SplitOption, SplitPair,
    SplitSeq, TryMap1, Value,
};

/// The erased printer tree.
pub(crate) enum Node<E, O> {
    /// Accepts any input and writes nothing.
    Succeed,
    Fail(E),
    MapError(Arc<Node<E, O>>, MapErrFn<E>),
    Contramap(Arc<Node<E, O>>, Map1),
    ContramapEither(Arc<Node<E, O>>, TryMap1<E>),
    Zip {
        left: Arc<Node<E, O>>,
        right: Arc<Node<E, O>>,
        split: SplitPair,
    },
    /// Left prints the input, right prints unit.
    ZipLeft(Arc<Node<E, O>>, Arc<Node<E, O>>),
    /// Left prints unit, right prints the input.
    ZipRight(Arc<Node<E, O>>, Arc<Node<E, O>>),
    OrElse(Arc<Node<E, O>>, Arc<Node<E, O>>),
    OrElseEither {
        left: Arc<Node<E, O>>,
        right: Arc<Node<E, O>>,
        split: SplitEither,
    },
    Optional {
        inner: Arc<Node<E, O>>,
        split: SplitOption,
    },
    Repeat {
        inner: Arc<Node<E, O>>,
        split: SplitSeq,
    },
    RepeatWithSep {
        inner: Arc<Node<E, O>>,
        sep: Arc<Node<E, O>>,
        split: SplitSeq,
    },
    RepeatUntil {
        inner: Arc<Node<E, O>>,
        stop: Arc<Node<E, O>>,
        split: SplitSeq,
    },
    /// Writes one fixed element, ignoring the input.
    Emit(O),
    /// Fails unless the input equals the expected value, then runs the
    /// inner printer with unit input.
    ExactlyEqual {
        inner: Arc<Node<E, O>>,
        equals: Predicate,
        error: E,
    },
    /// Fails when the input equals the excluded value, otherwise passes the
    /// input to the inner printer.
    ExceptEqual {
        inner: Arc<Node<E, O>>,
        equals: Predicate,
        error: E,
    },
    FilterInput {
        inner: Arc<Node<E, O>>,
        predicate: Predicate,
        error: E,
    },
    /// Computes a printer from the input and runs it with unit input.
    FromInput(Arc<dyn Fn(&DynValue) -> Arc<Node<E, O>> + Send + Sync>),
    Lazy(LazyNode<E, O>),
    /// Writes the flattened elements of a nested input sequence.
    Flatten(Arc<dyn Fn(&DynValue) -> Vec<O> + Send + Sync>),
    /// Verifies a string input against the regex, then writes it.
    PrintRegex {
        regex: Compiled,
        error: E,
        embed: Arc<dyn Fn(char) -> O + Send + Sync>,
    },
    /// Verifies a character input against the regex, then writes it.
    PrintRegexChar {
        regex: Compiled,
        error: E,
        embed: Arc<dyn Fn(char) -> O + Send + Sync>,
    },
    /// Writes a fixed sequence of elements, ignoring the input.
    PrintRegexDiscard { outs: Vec<O> },
}

/// A suspended printer subtree, memoised on first use.
pub(crate) struct LazyNode<E, O> {
    cell: Arc<OnceLock<Arc<Node<E, O>>>>,
    thunk: Arc<dyn Fn() -> Arc<Node<E, O>> + Send + Sync>,
}

impl<E, O> LazyNode<E, O> {
    pub(crate) fn force(&self) -> Arc<Node<E, O>> {
        self.cell.get_or_init(|| (self.thunk)()).clone()
    }
}

/// A declarative printer consuming values of type `V`, failing with `E`,
/// and writing output elements of type `O`.
pub struct Printer<V, E, O = char> {
    pub(crate) node: Arc<Node<E, O>>,
    marker: PhantomData<fn() -> V>,
}

impl<V, E, O> Clone for Printer<V, E, O> {
    fn clone(&self) -> Self {
        Printer {
            node: Arc::clone(&self.node),
            marker: PhantomData,
        }
    }
}

impl<V, E, O> fmt::Debug for Printer<V, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Printer").finish_non_exhaustive()
    }
}

impl<V, E, O> Printer<V, E, O> {
    pub(crate) fn from_node(node: Node<E, O>) -> Self {
        Printer {
            node: Arc::new(node),
            marker: PhantomData,
        }
    }
}

impl<V, E, O> Printer<V, E, O>
where
    V: Value,
    E: Clone + Send + Sync + 'static,
    O: Value,
{
    /// Accepts any input and writes nothing.
    pub fn succeed() -> Self {
        Printer::from_node(Node::Succeed)
    }

    /// Always fails with `error`.
    pub fn fail(error: E) -> Self {
        Printer::from_node(Node::Fail(error))
    }

    /// Defers construction of a printer; required for recursive syntaxes.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Printer<V, E, O> + Send + Sync + 'static,
    {
        Printer::from_node(Node::Lazy(LazyNode {
            cell: Arc::new(OnceLock::new()),
            thunk: Arc::new(move || f().node),
        }))
    }

    /// Rewrites the errors produced by this printer.
    pub fn map_error<F>(self, f: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        Printer::from_node(Node::MapError(self.node, Arc::new(f)))
    }

    /// Adapts this printer to another input type.
    pub fn contramap<V2, F>(self, f: F) -> Printer<V2, E, O>
    where
        V2: Value,
        F: Fn(V2) -> V + Send + Sync + 'static,
    {
        let f: Map1 = Arc::new(move |value| pack(f(unpack::<V2>(&value))));
        Printer::from_node(Node::Contramap(self.node, f))
    }

    /// Adapts this printer to another input type through a fallible
    /// function.
    pub fn contramap_either<V2, F>(self, f: F) -> Printer<V2, E, O>
    where
        V2: Value,
        F: Fn(V2) -> Result<V, E> + Send + Sync + 'static,
    {
        let f: TryMap1<E> = Arc::new(move |value| f(unpack::<V2>(&value)).map(pack));
        Printer::from_node(Node::ContramapEither(self.node, f))
    }

    /// Prints a pair: `self` takes the first half, `that` the second.
    pub fn zip<V2: Value>(self, that: Printer<V2, E, O>) -> Printer<(V, V2), E, O> {
        let split: SplitPair = Arc::new(|value| {
            let (left, right) = unpack::<(V, V2)>(value);
            (pack(left), pack(right))
        });
        Printer::from_node(Node::Zip {
            left: self.node,
            right: that.node,
            split,
        })
    }

    /// Prints the input with `self`, then runs the unit printer `that`.
    pub fn zip_left(self, that: Printer<(), E, O>) -> Printer<V, E, O> {
        Printer::from_node(Node::ZipLeft(self.node, that.node))
    }

    /// Tries `self`; on failure discards any partial output and prints with
    /// `that` instead.
    pub fn or_else(self, that: Printer<V, E, O>) -> Self {
        Printer::from_node(Node::OrElse(self.node, that.node))
    }

    /// Routes `Either` input to `self` (left) or `that` (right).
    pub fn or_else_either<V2: Value>(
        self,
        that: Printer<V2, E, O>,
    ) -> Printer<Either<V, V2>, E, O> {
        let split: SplitEither = Arc::new(|value| match unpack::<Either<V, V2>>(value) {
            Either::Left(left) => Either::Left(pack(left)),
            Either::Right(right) => Either::Right(pack(right)),
        });
        Printer::from_node(Node::OrElseEither {
            left: self.node,
            right: that.node,
            split,
        })
    }

    /// Prints `Some` input with `self` and writes nothing for `None`.
    pub fn optional(self) -> Printer<Option<V>, E, O> {
        let split: SplitOption = Arc::new(|value| unpack::<Option<V>>(value).map(pack));
        Printer::from_node(Node::Optional {
            inner: self.node,
            split,
        })
    }

    /// Prints every element of the input sequence.
    pub fn repeated(self) -> Printer<Vec<V>, E, O> {
        Printer::from_node(Node::Repeat {
            inner: self.node,
            split: split_vec::<V>(),
        })
    }

    /// Prints the input sequence with `sep` between elements.
    pub fn repeat_with_sep(self, sep: Printer<(), E, O>) -> Printer<Vec<V>, E, O> {
        Printer::from_node(Node::RepeatWithSep {
            inner: self.node,
            sep: sep.node,
            split: split_vec::<V>(),
        })
    }

    /// Prints the input sequence, then the stop printer once.
    pub fn repeat_until(self, stop: Printer<(), E, O>) -> Printer<Vec<V>, E, O> {
        Printer::from_node(Node::RepeatUntil {
            inner: self.node,
            stop: stop.node,
            split: split_vec::<V>(),
        })
    }

    /// Fails with `error` when the input equals `value`.
    pub fn except(self, value: V, error: E) -> Self
    where
        V: PartialEq,
    {
        let equals: Predicate = Arc::new(move |input| unpack::<V>(input) == value);
        Printer::from_node(Node::ExceptEqual {
            inner: self.node,
            equals,
            error,
        })
    }

    /// Fails with `error` when the input does not satisfy `predicate`.
    pub fn filter_input<F>(self, predicate: F, error: E) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(move |value| predicate(&unpack::<V>(value)));
        Printer::from_node(Node::FilterInput {
            inner: self.node,
            predicate,
            error,
        })
    }

    /// Computes a printer from the input value and runs it with unit input.
    pub fn from_input<F>(f: F) -> Self
    where
        F: Fn(V) -> Printer<(), E, O> + Send + Sync + 'static,
    {
        Printer::from_node(Node::FromInput(Arc::new(move |value| {
            f(unpack::<V>(value)).node
        })))
    }

    /// Prints `value` into `target`.
    pub fn print_to_target<T: Target<Output = O>>(
        &self,
        value: &V,
        target: &mut T,
    ) -> Result<(), E> {
        run::run(&self.node, &pack(value.clone()), target)
    }

    /// Prints `value` into a fresh chunk.
    pub fn print_to_chunk(&self, value: &V) -> Result<Vec<O>, E> {
        let mut target = ChunkTarget::new();
        self.print_to_target(value, &mut target)?;
        Ok(target.finish())
    }
}

fn split_vec<V: Value>() -> SplitSeq {
    Arc::new(|value| unpack::<Vec<V>>(value).into_iter().map(pack).collect())
}

impl<E, O> Printer<(), E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Value,
{
    /// Writes the single element `out`, ignoring the input.
    pub fn emit(out: O) -> Self {
        Printer::from_node(Node::Emit(out))
    }

    /// Runs the unit printer `self`, then prints the input with `that`.
    pub fn zip_right<V2: Value>(self, that: Printer<V2, E, O>) -> Printer<V2, E, O> {
        Printer::from_node(Node::ZipRight(self.node, that.node))
    }

    /// Checks the input against `value`, then prints with the unit printer
    /// `self`.
    pub fn exactly<V2>(self, value: V2, error: E) -> Printer<V2, E, O>
    where
        V2: Value + PartialEq,
    {
        let equals: Predicate = Arc::new(move |input| unpack::<V2>(input) == value);
        Printer::from_node(Node::ExactlyEqual {
            inner: self.node,
            equals,
            error,
        })
    }
}

impl<E, O> Printer<Vec<Vec<O>>, E, O>
where
    E: Clone + Send + Sync + 'static,
    O: Value,
{
    /// Writes every element of every chunk of the input.
    pub fn flatten() -> Self {
        Printer::from_node(Node::Flatten(Arc::new(|value| {
            unpack::<Vec<Vec<O>>>(value).into_iter().flatten().collect()
        })))
    }
}

impl<E> Printer<Vec<String>, E, char>
where
    E: Clone + Send + Sync + 'static,
{
    /// Writes the characters of every string of the input.
    pub fn flatten_strings() -> Self {
        Printer::from_node(Node::Flatten(Arc::new(|value| {
            unpack::<Vec<String>>(value)
                .iter()
                .flat_map(|s| s.chars())
                .collect()
        })))
    }
}

impl<E: Clone + Send + Sync + 'static> Printer<String, E, char> {
    /// Verifies that the input string matches `pattern`, then writes it.
    pub fn regex(pattern: &Regex, error: E) -> Self {
        Self::regex_compiled(pattern.compile(), error)
    }

    pub(crate) fn regex_compiled(regex: Compiled, error: E) -> Self {
        Printer::from_node(Node::PrintRegex {
            regex,
            error,
            embed: Arc::new(|ch| ch),
        })
    }
}

impl<E: Clone + Send + Sync + 'static> Printer<char, E, char> {
    /// Verifies that the input character matches `pattern`, then writes it.
    pub fn regex_char(pattern: &Regex, error: E) -> Self {
        Self::regex_char_compiled(pattern.compile(), error)
    }

    pub(crate) fn regex_char_compiled(regex: Compiled, error: E) -> Self {
        Printer::from_node(Node::PrintRegexChar {
            regex,
            error,
            embed: Arc::new(|ch| ch),
        })
    }
}

impl<E: Clone + Send + Sync + 'static> Printer<(), E, char> {
    /// Writes a fixed run of characters, ignoring the input.
    pub fn regex_discard<I: IntoIterator<Item = char>>(chars: I) -> Self {
        Printer::from_node(Node::PrintRegexDiscard {
            outs: chars.into_iter().collect(),
        })
    }
}

impl<V, E> Printer<V, E, char>
where
    V: Value,
    E: Clone + Send + Sync + 'static,
{
    /// Prints `value` into a `String`.
    pub fn print_string(&self, value: &V) -> Result<String, E> {
        let mut target = StringTarget::new();
        self.print_to_target(value, &mut target)?;
        Ok(target.finish())
    }
}
