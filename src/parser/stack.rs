//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The stack-safe execution engine.
//!
//! Host recursion is replaced by a trampoline over two explicit stacks: an
//! operand stack of intermediate values and a continuation stack of frames
//! describing the work left in each still-open combinator. One loop
//! iteration either dispatches the next node to evaluate or feeds the most
//! recent outcome to the top frame. Frames that scope state (`Named`,
//! `SetAutoBacktracking`, `Backtrack`) restore it on the success *and*
//! failure paths, so name chains and flags stay balanced no matter how a
//! subtree exits.
//!
//! Both stacks are plain vectors that grow geometrically and are reused for
//! the whole parse; the hot loop performs no per-frame heap allocation
//! beyond that.

use std::sync::Arc;

use crate::error::ParserError;
use crate::parser::{any_char_at, class_char, run_compiled, run_compiled_char, Node};
use crate::value::{pack, unit_value, DynValue, Map1, Map2, MapErrFn, MapSeq, Predicate, TryMap1};

/// A continuation: what to do when the child below it completes.
enum Frame<E> {
    /// Closes a `Named` scope.
    PopName,
    /// Restores the auto-backtracking flag.
    RestoreAuto { prev: bool },
    /// Restores the position if the child failed (`Backtrack`).
    RestoreOnFail { at: usize },
    /// Applies an infallible value rewrite (`Transform`).
    Map { f: Map1 },
    /// Applies a fallible value rewrite (`TransformEither`).
    TryMap { f: TryMap1<E>, at: usize },
    /// Rewrites user errors on the failure path (`MapError`).
    WrapErr { f: MapErrFn<E> },
    /// Checks the child's value against a predicate (`Filter`).
    Check {
        predicate: Predicate,
        error: E,
        at: usize,
    },
    /// `Zip`: left value done, evaluate the right side next.
    ZipRightNext { right: Arc<Node<E>>, combine: Map2 },
    /// `Zip`: combine the stashed left operand with the right value.
    ZipCombine { combine: Map2 },
    /// `ZipLeft`: left value done, run the right side for effect only.
    KeepLeftThen { right: Arc<Node<E>> },
    /// `ZipLeft`: replace the right value with the stashed left operand.
    RestoreLeft,
    /// `ZipRight`: drop the left value, the right one is the result.
    DiscardThen { right: Arc<Node<E>> },
    /// First stage of `OrElse`/`OrElseEither`.
    Alt {
        right: Arc<Node<E>>,
        at: usize,
        operands: usize,
        left_into: Option<Map1>,
        right_into: Option<Map1>,
    },
    /// Second stage of `OrElse`/`OrElseEither`: the right branch ran.
    AltRight {
        left_error: ParserError<E>,
        right_into: Option<Map1>,
    },
    /// `Optional`.
    Opt {
        at: usize,
        some_into: Map1,
        none: DynValue,
    },
    /// `Repeat`: one iteration finished.
    Rep {
        inner: Arc<Node<E>>,
        min: usize,
        max: Option<usize>,
        collect: MapSeq,
        items: Vec<DynValue>,
        baseline: usize,
    },
    /// `RepeatUntil`: an element finished.
    UntilElem {
        inner: Arc<Node<E>>,
        stop: Arc<Node<E>>,
        collect: MapSeq,
        items: Vec<DynValue>,
        before: usize,
    },
    /// `RepeatUntil`: the stop parser ran.
    UntilStop {
        inner: Arc<Node<E>>,
        stop: Arc<Node<E>>,
        collect: MapSeq,
        items: Vec<DynValue>,
        after: usize,
        before: usize,
    },
    /// `RepeatWithSep`: the leading element ran.
    SepFirst {
        inner: Arc<Node<E>>,
        sep: Arc<Node<E>>,
        collect: MapSeq,
        at_least_one: bool,
        start: usize,
    },
    /// `RepeatWithSep`: a separator ran.
    SepSep {
        inner: Arc<Node<E>>,
        sep: Arc<Node<E>>,
        collect: MapSeq,
        items: Vec<DynValue>,
        at: usize,
    },
    /// `RepeatWithSep`: an element after a separator ran.
    SepElem {
        inner: Arc<Node<E>>,
        sep: Arc<Node<E>>,
        collect: MapSeq,
        items: Vec<DynValue>,
        at: usize,
    },
    /// `CaptureString`.
    Capture { at: usize },
    /// `Not`.
    Invert { at: usize, error: E },
}

pub(crate) fn parse<E: Clone>(
    root: &Arc<Node<E>>,
    input: &[char],
) -> Result<DynValue, ParserError<E>> {
    let mut frames: Vec<Frame<E>> = Vec::with_capacity(16);
    let mut operands: Vec<DynValue> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    let mut pos = 0usize;
    let mut auto_backtrack = false;

    let mut next: Option<Arc<Node<E>>> = Some(Arc::clone(root));
    let mut done: Option<Result<DynValue, ParserError<E>>> = None;

    macro_rules! swallows {
        ($at:expr) => {
            pos == $at || auto_backtrack
        };
    }

    loop {
        if let Some(node) = next.take() {
            match &*node {
                Node::Succeed(value) => done = Some(Ok(value.clone())),
                Node::Fail(error) => {
                    done = Some(Err(ParserError::failure(names.clone(), pos, error.clone())))
                }
                Node::Named(inner, name) => {
                    names.push(name.clone());
                    frames.push(Frame::PopName);
                    next = Some(Arc::clone(inner));
                }
                Node::Lazy(lazy) => next = Some(lazy.force()),
                Node::Backtrack(inner) => {
                    frames.push(Frame::RestoreOnFail { at: pos });
                    next = Some(Arc::clone(inner));
                }
                Node::SetAutoBacktracking(inner, enabled) => {
                    frames.push(Frame::RestoreAuto {
                        prev: auto_backtrack,
                    });
                    auto_backtrack = *enabled;
                    next = Some(Arc::clone(inner));
                }
                Node::Transform(inner, f) => {
                    frames.push(Frame::Map { f: Arc::clone(f) });
                    next = Some(Arc::clone(inner));
                }
                Node::TransformEither(inner, f) => {
                    frames.push(Frame::TryMap {
                        f: Arc::clone(f),
                        at: pos,
                    });
                    next = Some(Arc::clone(inner));
                }
                Node::MapError(inner, f) => {
                    frames.push(Frame::WrapErr { f: Arc::clone(f) });
                    next = Some(Arc::clone(inner));
                }
                Node::Filter {
                    inner,
                    predicate,
                    error,
                } => {
                    frames.push(Frame::Check {
                        predicate: Arc::clone(predicate),
                        error: error.clone(),
                        at: pos,
                    });
                    next = Some(Arc::clone(inner));
                }
                Node::Zip {
                    left,
                    right,
                    combine,
                } => {
                    frames.push(Frame::ZipRightNext {
                        right: Arc::clone(right),
                        combine: Arc::clone(combine),
                    });
                    next = Some(Arc::clone(left));
                }
                Node::ZipLeft(left, right) => {
                    frames.push(Frame::KeepLeftThen {
                        right: Arc::clone(right),
                    });
                    next = Some(Arc::clone(left));
                }
                Node::ZipRight(left, right) => {
                    frames.push(Frame::DiscardThen {
                        right: Arc::clone(right),
                    });
                    next = Some(Arc::clone(left));
                }
                Node::OrElse { left, right } => {
                    frames.push(Frame::Alt {
                        right: Arc::clone(right),
                        at: pos,
                        operands: operands.len(),
                        left_into: None,
                        right_into: None,
                    });
                    next = Some(Arc::clone(left));
                }
                Node::OrElseEither {
                    left,
                    right,
                    left_into,
                    right_into,
                } => {
                    frames.push(Frame::Alt {
                        right: Arc::clone(right),
                        at: pos,
                        operands: operands.len(),
                        left_into: Some(Arc::clone(left_into)),
                        right_into: Some(Arc::clone(right_into)),
                    });
                    next = Some(Arc::clone(left));
                }
                Node::Optional {
                    inner,
                    some_into,
                    none,
                } => {
                    frames.push(Frame::Opt {
                        at: pos,
                        some_into: Arc::clone(some_into),
                        none: none.clone(),
                    });
                    next = Some(Arc::clone(inner));
                }
                Node::Repeat {
                    inner,
                    min,
                    max,
                    collect,
                } => {
                    if *max == Some(0) {
                        done = Some(Ok(collect(Vec::new())));
                    } else {
                        frames.push(Frame::Rep {
                            inner: Arc::clone(inner),
                            min: *min,
                            max: *max,
                            collect: Arc::clone(collect),
                            items: Vec::new(),
                            baseline: pos,
                        });
                        next = Some(Arc::clone(inner));
                    }
                }
                Node::RepeatUntil {
                    inner,
                    stop,
                    collect,
                } => {
                    frames.push(Frame::UntilElem {
                        inner: Arc::clone(inner),
                        stop: Arc::clone(stop),
                        collect: Arc::clone(collect),
                        items: Vec::new(),
                        before: pos,
                    });
                    next = Some(Arc::clone(inner));
                }
                Node::RepeatWithSep {
                    inner,
                    sep,
                    at_least_one,
                    collect,
                } => {
                    frames.push(Frame::SepFirst {
                        inner: Arc::clone(inner),
                        sep: Arc::clone(sep),
                        collect: Arc::clone(collect),
                        at_least_one: *at_least_one,
                        start: pos,
                    });
                    next = Some(Arc::clone(inner));
                }
                Node::Not { inner, error } => {
                    frames.push(Frame::Invert {
                        at: pos,
                        error: error.clone(),
                    });
                    next = Some(Arc::clone(inner));
                }
                Node::End => {
                    done = Some(if pos == input.len() {
                        Ok(unit_value())
                    } else {
                        Err(ParserError::NotConsumedAll { position: pos })
                    });
                }
                Node::Index => done = Some(Ok(pack(pos))),
                Node::CaptureString(inner) => {
                    frames.push(Frame::Capture { at: pos });
                    next = Some(Arc::clone(inner));
                }
                Node::ParseRegex { regex, error } => {
                    done = Some(
                        run_compiled(regex, error, input, pos, &names).map(|end| {
                            let text: String = input[pos..end].iter().collect();
                            pos = end;
                            pack(text)
                        }),
                    );
                }
                Node::ParseRegexLastChar { regex, error } => {
                    done = Some(
                        run_compiled_char(regex, error, input, pos, &names).map(|(ch, end)| {
                            pos = end;
                            pack(ch)
                        }),
                    );
                }
                Node::ParseRegexDiscard { regex, error } => {
                    done = Some(run_compiled(regex, error, input, pos, &names).map(|end| {
                        pos = end;
                        unit_value()
                    }));
                }
                Node::CharIn { set, error } => {
                    done = Some(
                        class_char(set, false, error, input, pos, &names).map(|(ch, end)| {
                            pos = end;
                            pack(ch)
                        }),
                    );
                }
                Node::CharNotIn { set, error } => {
                    done = Some(
                        class_char(set, true, error, input, pos, &names).map(|(ch, end)| {
                            pos = end;
                            pack(ch)
                        }),
                    );
                }
                Node::AnyChar => {
                    done = Some(any_char_at(input, pos).map(|(ch, end)| {
                        pos = end;
                        pack(ch)
                    }));
                }
            }
            continue;
        }

        let outcome = done.take().expect("trampoline has neither node nor outcome");
        let frame = match frames.pop() {
            Some(frame) => frame,
            None => return outcome,
        };

        match frame {
            Frame::PopName => {
                names.pop();
                done = Some(outcome);
            }
            Frame::RestoreAuto { prev } => {
                auto_backtrack = prev;
                done = Some(outcome);
            }
            Frame::RestoreOnFail { at } => {
                if outcome.is_err() {
                    pos = at;
                }
                done = Some(outcome);
            }
            Frame::Map { f } => done = Some(outcome.map(|value| f(value))),
            Frame::TryMap { f, at } => {
                done = Some(outcome.and_then(|value| {
                    f(value).map_err(|error| ParserError::failure(names.clone(), at, error))
                }));
            }
            Frame::WrapErr { f } => done = Some(outcome.map_err(|error| error.map(&*f))),
            Frame::Check {
                predicate,
                error,
                at,
            } => {
                done = Some(outcome.and_then(|value| {
                    if predicate(&value) {
                        Ok(value)
                    } else {
                        Err(ParserError::failure(names.clone(), at, error))
                    }
                }));
            }
            Frame::ZipRightNext { right, combine } => match outcome {
                Ok(left_value) => {
                    operands.push(left_value);
                    frames.push(Frame::ZipCombine { combine });
                    next = Some(right);
                }
                Err(error) => done = Some(Err(error)),
            },
            Frame::ZipCombine { combine } => {
                let left_value = operands.pop().expect("zip left operand is present");
                done = Some(outcome.map(|right_value| combine(left_value, right_value)));
            }
            Frame::KeepLeftThen { right } => match outcome {
                Ok(left_value) => {
                    operands.push(left_value);
                    frames.push(Frame::RestoreLeft);
                    next = Some(right);
                }
                Err(error) => done = Some(Err(error)),
            },
            Frame::RestoreLeft => {
                let left_value = operands.pop().expect("zip left operand is present");
                done = Some(outcome.map(|_| left_value));
            }
            Frame::DiscardThen { right } => match outcome {
                Ok(_) => next = Some(right),
                Err(error) => done = Some(Err(error)),
            },
            Frame::Alt {
                right,
                at,
                operands: depth,
                left_into,
                right_into,
            } => match outcome {
                Ok(value) => {
                    done = Some(Ok(match left_into {
                        Some(f) => f(value),
                        None => value,
                    }));
                }
                Err(left_error) => {
                    if swallows!(at) {
                        pos = at;
                        operands.truncate(depth);
                        frames.push(Frame::AltRight {
                            left_error,
                            right_into,
                        });
                        next = Some(right);
                    } else {
                        done = Some(Err(left_error));
                    }
                }
            },
            Frame::AltRight {
                left_error,
                right_into,
            } => match outcome {
                Ok(value) => {
                    done = Some(Ok(match right_into {
                        Some(f) => f(value),
                        None => value,
                    }));
                }
                Err(right_error) => {
                    done = Some(Err(ParserError::both_failed(left_error, right_error)));
                }
            },
            Frame::Opt {
                at,
                some_into,
                none,
            } => match outcome {
                Ok(value) => done = Some(Ok(some_into(value))),
                Err(error) => {
                    if swallows!(at) {
                        pos = at;
                        done = Some(Ok(none));
                    } else {
                        done = Some(Err(error));
                    }
                }
            },
            Frame::Rep {
                inner,
                min,
                max,
                collect,
                mut items,
                baseline,
            } => match outcome {
                Ok(value) => {
                    items.push(value);
                    if pos == baseline || Some(items.len()) == max {
                        done = Some(Ok(collect(items)));
                    } else {
                        let baseline = pos;
                        frames.push(Frame::Rep {
                            inner: Arc::clone(&inner),
                            min,
                            max,
                            collect,
                            items,
                            baseline,
                        });
                        next = Some(inner);
                    }
                }
                Err(error) => {
                    if items.len() >= min && swallows!(baseline) {
                        pos = baseline;
                        done = Some(Ok(collect(items)));
                    } else {
                        done = Some(Err(error));
                    }
                }
            },
            Frame::UntilElem {
                inner,
                stop,
                collect,
                mut items,
                before,
            } => match outcome {
                Ok(value) => {
                    items.push(value);
                    frames.push(Frame::UntilStop {
                        inner,
                        stop: Arc::clone(&stop),
                        collect,
                        items,
                        after: pos,
                        before,
                    });
                    next = Some(stop);
                }
                Err(error) => done = Some(Err(error)),
            },
            Frame::UntilStop {
                inner,
                stop,
                collect,
                items,
                after,
                before,
            } => match outcome {
                Ok(_) => done = Some(Ok(collect(items))),
                Err(error) => {
                    if !swallows!(after) {
                        done = Some(Err(error));
                    } else {
                        pos = after;
                        if pos == before {
                            done = Some(Err(error));
                        } else {
                            frames.push(Frame::UntilElem {
                                inner: Arc::clone(&inner),
                                stop,
                                collect,
                                items,
                                before: pos,
                            });
                            next = Some(inner);
                        }
                    }
                }
            },
            Frame::SepFirst {
                inner,
                sep,
                collect,
                at_least_one,
                start,
            } => match outcome {
                Ok(value) => {
                    frames.push(Frame::SepSep {
                        inner,
                        sep: Arc::clone(&sep),
                        collect,
                        items: vec![value],
                        at: pos,
                    });
                    next = Some(sep);
                }
                Err(error) => {
                    if !at_least_one && swallows!(start) {
                        pos = start;
                        done = Some(Ok(collect(Vec::new())));
                    } else {
                        done = Some(Err(error));
                    }
                }
            },
            Frame::SepSep {
                inner,
                sep,
                collect,
                items,
                at,
            } => match outcome {
                Ok(_) => {
                    frames.push(Frame::SepElem {
                        inner: Arc::clone(&inner),
                        sep,
                        collect,
                        items,
                        at,
                    });
                    next = Some(inner);
                }
                Err(error) => {
                    if swallows!(at) {
                        pos = at;
                        done = Some(Ok(collect(items)));
                    } else {
                        done = Some(Err(error));
                    }
                }
            },
            Frame::SepElem {
                inner,
                sep,
                collect,
                mut items,
                at,
            } => match outcome {
                Ok(value) => {
                    items.push(value);
                    if pos == at {
                        done = Some(Ok(collect(items)));
                    } else {
                        let at = pos;
                        frames.push(Frame::SepSep {
                            inner,
                            sep: Arc::clone(&sep),
                            collect,
                            items,
                            at,
                        });
                        next = Some(sep);
                    }
                }
                Err(error) => {
                    if swallows!(at) {
                        pos = at;
                        done = Some(Ok(collect(items)));
                    } else {
                        done = Some(Err(error));
                    }
                }
            },
            Frame::Capture { at } => {
                done = Some(
                    outcome.map(|_| pack(input[at..pos].iter().collect::<String>())),
                );
            }
            Frame::Invert { at, error } => {
                pos = at;
                done = Some(match outcome {
                    Ok(_) => Err(ParserError::failure(names.clone(), at, error)),
                    Err(_) => Ok(unit_value()),
                });
            }
        }
    }
}
