//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The structured error tree produced by failed parses.

use std::fmt;

/// A parse failure.
///
/// `E` is the user's error type, attached to failures raised by `fail`,
/// `filter`, character classes and the other error-carrying combinators.
/// Positions are indices into the sequence of input characters. Name chains
/// record the `named` scopes that were open when the error was created,
/// outermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParserError<E> {
    /// A user-visible failure, with the enclosing `named` scopes and the
    /// position at which it was raised.
    Failure {
        /// The open `named` scopes, outermost first.
        names: Vec<String>,
        /// The input position of the failure.
        position: usize,
        /// The user's error value.
        error: E,
    },
    /// The parser needed more characters than the input holds.
    UnexpectedEndOfInput,
    /// A failure with no user-supplied error value attached.
    UnknownFailure {
        /// The open `named` scopes, outermost first.
        names: Vec<String>,
        /// The input position of the failure.
        position: usize,
    },
    /// The `end` combinator found remaining input.
    NotConsumedAll {
        /// The position at which unconsumed input begins.
        position: usize,
    },
    /// Both alternatives of an `or_else` failed; both errors are retained
    /// verbatim for diagnostics.
    AllBranchesFailed(Box<ParserError<E>>, Box<ParserError<E>>),
}

impl<E> ParserError<E> {
    pub(crate) fn failure(names: Vec<String>, position: usize, error: E) -> Self {
        ParserError::Failure {
            names,
            position,
            error,
        }
    }

    pub(crate) fn unknown(names: Vec<String>, position: usize) -> Self {
        ParserError::UnknownFailure { names, position }
    }

    pub(crate) fn both_failed(left: Self, right: Self) -> Self {
        ParserError::AllBranchesFailed(Box::new(left), Box::new(right))
    }

    /// Rewrites every user error value in the tree, preserving structure.
    pub fn map<F>(self, f: &F) -> Self
    where
        F: Fn(E) -> E + ?Sized,
    {
        match self {
            ParserError::Failure {
                names,
                position,
                error,
            } => ParserError::Failure {
                names,
                position,
                error: f(error),
            },
            ParserError::AllBranchesFailed(left, right) => ParserError::AllBranchesFailed(
                Box::new(left.map(f)),
                Box::new(right.map(f)),
            ),
            other => other,
        }
    }

    /// The position of the failure, when one applies.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParserError::Failure { position, .. }
            | ParserError::UnknownFailure { position, .. }
            | ParserError::NotConsumedAll { position } => Some(*position),
            ParserError::UnexpectedEndOfInput | ParserError::AllBranchesFailed(..) => None,
        }
    }
}

fn write_names(f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
    if !names.is_empty() {
        write!(f, " (in {})", names.join("."))?;
    }
    Ok(())
}

impl<E: fmt::Display> fmt::Display for ParserError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::Failure {
                names,
                position,
                error,
            } => {
                write!(f, "parse error at {}", position)?;
                write_names(f, names)?;
                write!(f, ": {}", error)
            }
            ParserError::UnexpectedEndOfInput => write!(f, "unexpected end of input"),
            ParserError::UnknownFailure { names, position } => {
                write!(f, "parse error at {}", position)?;
                write_names(f, names)
            }
            ParserError::NotConsumedAll { position } => {
                write!(f, "unconsumed input remains at {}", position)
            }
            ParserError::AllBranchesFailed(left, right) => {
                write!(f, "all alternatives failed: {}; {}", left, right)
            }
        }
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for ParserError<E> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_failure_with_names() {
        let error: ParserError<String> = ParserError::failure(
            vec!["ip".to_owned(), "octet".to_owned()],
            4,
            "expected digit".to_owned(),
        );
        assert_eq!(
            error.to_string(),
            "parse error at 4 (in ip.octet): expected digit"
        );
    }

    #[test]
    fn display_plain_kinds() {
        assert_eq!(
            ParserError::<String>::UnexpectedEndOfInput.to_string(),
            "unexpected end of input"
        );
        assert_eq!(
            ParserError::<String>::NotConsumedAll { position: 3 }.to_string(),
            "unconsumed input remains at 3"
        );
        assert_eq!(
            ParserError::<String>::unknown(vec![], 7).to_string(),
            "parse error at 7"
        );
    }

    #[test]
    fn map_rewrites_every_branch() {
        let error = ParserError::both_failed(
            ParserError::failure(vec![], 0, 1),
            ParserError::failure(vec![], 2, 2),
        );
        let doubled = error.map(&|e| e * 10);
        assert_eq!(
            doubled,
            ParserError::both_failed(
                ParserError::failure(vec![], 0, 10),
                ParserError::failure(vec![], 2, 20),
            )
        );
    }
}
