//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tree-walking reference engine.
//!
//! This is the semantics the stack-safe engine is measured against: every
//! node is evaluated with ordinary host recursion, which keeps the code an
//! almost literal transcription of the combinator rules. Deep grammars can
//! exhaust the host stack here; that is by construction the other engine's
//! job to avoid.

use crate::error::ParserError;
use crate::parser::{any_char_at, class_char, run_compiled, run_compiled_char, Node};
use crate::value::{pack, unit_value, DynValue};

struct State {
    pos: usize,
    names: Vec<String>,
    auto_backtrack: bool,
}

impl State {
    /// Whether a child failure may be consumed by the enclosing frame:
    /// either nothing was consumed since `entry`, or automatic backtracking
    /// permits rewinding to it.
    fn swallows(&self, entry: usize) -> bool {
        self.pos == entry || self.auto_backtrack
    }
}

pub(crate) fn parse<E: Clone>(
    node: &Node<E>,
    input: &[char],
) -> Result<DynValue, ParserError<E>> {
    let mut state = State {
        pos: 0,
        names: Vec::new(),
        auto_backtrack: false,
    };
    eval(node, input, &mut state)
}

fn eval<E: Clone>(
    node: &Node<E>,
    input: &[char],
    st: &mut State,
) -> Result<DynValue, ParserError<E>> {
    match node {
        Node::Succeed(value) => Ok(value.clone()),
        Node::Fail(error) => Err(ParserError::failure(
            st.names.clone(),
            st.pos,
            error.clone(),
        )),
        Node::Named(inner, name) => {
            st.names.push(name.clone());
            let result = eval(inner, input, st);
            st.names.pop();
            result
        }
        Node::Lazy(lazy) => {
            let inner = lazy.force();
            eval(&inner, input, st)
        }
        Node::Backtrack(inner) => {
            let entry = st.pos;
            let result = eval(inner, input, st);
            if result.is_err() {
                st.pos = entry;
            }
            result
        }
        Node::SetAutoBacktracking(inner, enabled) => {
            let previous = st.auto_backtrack;
            st.auto_backtrack = *enabled;
            let result = eval(inner, input, st);
            st.auto_backtrack = previous;
            result
        }
        Node::Transform(inner, f) => eval(inner, input, st).map(|value| f(value)),
        Node::TransformEither(inner, f) => {
            let entry = st.pos;
            let value = eval(inner, input, st)?;
            f(value).map_err(|error| ParserError::failure(st.names.clone(), entry, error))
        }
        Node::MapError(inner, f) => {
            eval(inner, input, st).map_err(|error| error.map(&**f))
        }
        Node::Filter {
            inner,
            predicate,
            error,
        } => {
            let entry = st.pos;
            let value = eval(inner, input, st)?;
            if predicate(&value) {
                Ok(value)
            } else {
                Err(ParserError::failure(
                    st.names.clone(),
                    entry,
                    error.clone(),
                ))
            }
        }
        Node::Zip {
            left,
            right,
            combine,
        } => {
            let l = eval(left, input, st)?;
            let r = eval(right, input, st)?;
            Ok(combine(l, r))
        }
        Node::ZipLeft(left, right) => {
            let l = eval(left, input, st)?;
            eval(right, input, st)?;
            Ok(l)
        }
        Node::ZipRight(left, right) => {
            eval(left, input, st)?;
            eval(right, input, st)
        }
        Node::OrElse { left, right } => {
            let entry = st.pos;
            match eval(left, input, st) {
                Ok(value) => Ok(value),
                Err(left_error) => {
                    if st.swallows(entry) {
                        st.pos = entry;
                        match eval(right, input, st) {
                            Ok(value) => Ok(value),
                            Err(right_error) => {
                                Err(ParserError::both_failed(left_error, right_error))
                            }
                        }
                    } else {
                        Err(left_error)
                    }
                }
            }
        }
        Node::OrElseEither {
            left,
            right,
            left_into,
            right_into,
        } => {
            let entry = st.pos;
            match eval(left, input, st) {
                Ok(value) => Ok(left_into(value)),
                Err(left_error) => {
                    if st.swallows(entry) {
                        st.pos = entry;
                        match eval(right, input, st) {
                            Ok(value) => Ok(right_into(value)),
                            Err(right_error) => {
                                Err(ParserError::both_failed(left_error, right_error))
                            }
                        }
                    } else {
                        Err(left_error)
                    }
                }
            }
        }
        Node::Optional {
            inner,
            some_into,
            none,
        } => {
            let entry = st.pos;
            match eval(inner, input, st) {
                Ok(value) => Ok(some_into(value)),
                Err(error) => {
                    if st.swallows(entry) {
                        st.pos = entry;
                        Ok(none.clone())
                    } else {
                        Err(error)
                    }
                }
            }
        }
        Node::Repeat {
            inner,
            min,
            max,
            collect,
        } => {
            let mut items = Vec::new();
            let mut baseline = st.pos;
            loop {
                if Some(items.len()) == *max {
                    break;
                }
                match eval(inner, input, st) {
                    Ok(value) => {
                        items.push(value);
                        // A zero-width success would repeat forever.
                        if st.pos == baseline {
                            break;
                        }
                        baseline = st.pos;
                    }
                    Err(error) => {
                        if items.len() >= *min && st.swallows(baseline) {
                            st.pos = baseline;
                            break;
                        }
                        return Err(error);
                    }
                }
            }
            Ok(collect(items))
        }
        Node::RepeatUntil {
            inner,
            stop,
            collect,
        } => {
            let mut items = Vec::new();
            loop {
                let before = st.pos;
                items.push(eval(inner, input, st)?);
                let after = st.pos;
                match eval(stop, input, st) {
                    Ok(_) => break,
                    Err(error) => {
                        if !st.swallows(after) {
                            return Err(error);
                        }
                        st.pos = after;
                        // A zero-width element with an unmatched stop would
                        // repeat forever.
                        if st.pos == before {
                            return Err(error);
                        }
                    }
                }
            }
            Ok(collect(items))
        }
        Node::RepeatWithSep {
            inner,
            sep,
            at_least_one,
            collect,
        } => {
            let start = st.pos;
            let mut items = Vec::new();
            match eval(inner, input, st) {
                Ok(value) => items.push(value),
                Err(error) => {
                    if !*at_least_one && st.swallows(start) {
                        st.pos = start;
                        return Ok(collect(items));
                    }
                    return Err(error);
                }
            }
            loop {
                let at = st.pos;
                if let Err(error) = eval(sep, input, st) {
                    if st.swallows(at) {
                        st.pos = at;
                        break;
                    }
                    return Err(error);
                }
                match eval(inner, input, st) {
                    Ok(value) => {
                        items.push(value);
                        // A zero-width (separator, element) round would
                        // repeat forever.
                        if st.pos == at {
                            break;
                        }
                    }
                    Err(error) => {
                        if st.swallows(at) {
                            st.pos = at;
                            break;
                        }
                        return Err(error);
                    }
                }
            }
            Ok(collect(items))
        }
        Node::Not { inner, error } => {
            let entry = st.pos;
            let result = eval(inner, input, st);
            st.pos = entry;
            match result {
                Ok(_) => Err(ParserError::failure(
                    st.names.clone(),
                    entry,
                    error.clone(),
                )),
                Err(_) => Ok(unit_value()),
            }
        }
        Node::End => {
            if st.pos == input.len() {
                Ok(unit_value())
            } else {
                Err(ParserError::NotConsumedAll { position: st.pos })
            }
        }
        Node::Index => Ok(pack(st.pos)),
        Node::CaptureString(inner) => {
            let entry = st.pos;
            eval(inner, input, st)?;
            Ok(pack(input[entry..st.pos].iter().collect::<String>()))
        }
        Node::ParseRegex { regex, error } => {
            let entry = st.pos;
            let next = run_compiled(regex, error, input, st.pos, &st.names)?;
            st.pos = next;
            Ok(pack(input[entry..next].iter().collect::<String>()))
        }
        Node::ParseRegexLastChar { regex, error } => {
            let (ch, next) = run_compiled_char(regex, error, input, st.pos, &st.names)?;
            st.pos = next;
            Ok(pack(ch))
        }
        Node::ParseRegexDiscard { regex, error } => {
            let next = run_compiled(regex, error, input, st.pos, &st.names)?;
            st.pos = next;
            Ok(unit_value())
        }
        Node::CharIn { set, error } => {
            let (ch, next) = class_char(set, false, error, input, st.pos, &st.names)?;
            st.pos = next;
            Ok(pack(ch))
        }
        Node::CharNotIn { set, error } => {
            let (ch, next) = class_char(set, true, error, input, st.pos, &st.names)?;
            st.pos = next;
            Ok(pack(ch))
        }
        Node::AnyChar => {
            let (ch, next) = any_char_at(input, st.pos)?;
            st.pos = next;
            Ok(pack(ch))
        }
    }
}
