//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime representation of the values flowing through the engines.
//!
//! The engines are value-agnostic: a parsed value travels as a cheaply
//! cloneable `Arc<dyn Any>` and the typed facades ([`Parser`], [`Printer`],
//! [`Syntax`]) insert small adapter closures wherever a value is built,
//! combined or taken apart. Those closures are constructed where the
//! concrete types are statically known, so a failed downcast can only mean
//! the facade itself is broken, never user error.
//!
//! [`Parser`]: crate::parser::Parser
//! [`Printer`]: crate::printer::Printer
//! [`Syntax`]: crate::syntax::Syntax

use std::any::Any;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::either::Either;

/// Types that can flow through a parser or printer.
///
/// Blanket-implemented for every `Any + Clone + Send + Sync` type; you never
/// implement it yourself.
pub trait Value: Any + Clone + Send + Sync {}

impl<T: Any + Clone + Send + Sync> Value for T {}

/// The erased runtime form of a value.
pub(crate) type DynValue = Arc<dyn Any + Send + Sync>;

/// Erases a typed value.
pub(crate) fn pack<V: Value>(value: V) -> DynValue {
    Arc::new(value)
}

/// Recovers a typed value.
///
/// Panics when the runtime value does not hold a `V`; the typed facades make
/// this unreachable through the public API.
pub(crate) fn unpack<V: Value>(value: &DynValue) -> V {
    value
        .downcast_ref::<V>()
        .expect("parser pipeline produced a value of an unexpected type")
        .clone()
}

lazy_static! {
    static ref UNIT: DynValue = Arc::new(());
}

/// The shared erased unit value.
pub(crate) fn unit_value() -> DynValue {
    UNIT.clone()
}

/// Infallible value rewrite.
pub(crate) type Map1 = Arc<dyn Fn(DynValue) -> DynValue + Send + Sync>;

/// Combination of two child values into one (e.g. pair construction).
pub(crate) type Map2 = Arc<dyn Fn(DynValue, DynValue) -> DynValue + Send + Sync>;

/// Collection of an iteration's values into one sequence value.
pub(crate) type MapSeq = Arc<dyn Fn(Vec<DynValue>) -> DynValue + Send + Sync>;

/// Fallible value rewrite; the error is the user's error type.
pub(crate) type TryMap1<E> = Arc<dyn Fn(DynValue) -> Result<DynValue, E> + Send + Sync>;

/// Predicate over a value.
pub(crate) type Predicate = Arc<dyn Fn(&DynValue) -> bool + Send + Sync>;

/// Rewrite of the user error type.
pub(crate) type MapErrFn<E> = Arc<dyn Fn(E) -> E + Send + Sync>;

/// Destructuring of a pair value into its halves.
pub(crate) type SplitPair = Arc<dyn Fn(&DynValue) -> (DynValue, DynValue) + Send + Sync>;

/// Destructuring of a sequence value into its elements.
pub(crate) type SplitSeq = Arc<dyn Fn(&DynValue) -> Vec<DynValue> + Send + Sync>;

/// Destructuring of an optional value.
pub(crate) type SplitOption = Arc<dyn Fn(&DynValue) -> Option<DynValue> + Send + Sync>;

/// Destructuring of an either value.
pub(crate) type SplitEither = Arc<dyn Fn(&DynValue) -> Either<DynValue, DynValue> + Send + Sync>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let packed = pack(vec![1u32, 2, 3]);
        assert_eq!(unpack::<Vec<u32>>(&packed), vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "unexpected type")]
    fn unpack_of_wrong_type_panics() {
        let packed = pack(42u32);
        let _ = unpack::<String>(&packed);
    }
}
