//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Declarative parser/printer combinators.
//!
//! A single [`Syntax`](syntax::Syntax) value describes a piece of textual
//! structure once and gives you both directions: parsing text into typed
//! values and printing those values back into text.
//!
//! ```
//! use biparse::prelude::*;
//!
//! let boolean = string("true").to(true).or_else(string("false").to(false));
//! assert_eq!(boolean.parse_string("false"), Ok(false));
//! assert_eq!(boolean.print_string(&true), Ok("true".to_owned()));
//!
//! let csv = digits().repeat_with_sep(char(','));
//! assert_eq!(
//!     csv.parse_string("1,2,3"),
//!     Ok(vec!["1".to_owned(), "2".to_owned(), "3".to_owned()])
//! );
//! ```
//!
//! # Engines
//!
//! Parsing runs on one of two engines over the same combinator tree. The
//! default is a stack-safe trampoline with explicit operand and
//! continuation stacks, which handles arbitrarily deep (recursive)
//! grammars. A plain tree-walking engine provides the reference semantics;
//! [`parse_string_with`](syntax::Syntax::parse_string_with) selects between
//! them and the two are held to produce identical results, errors
//! included.
//!
//! # Errors
//!
//! Failures surface as [`ParserError`](error::ParserError) values carrying
//! the input position and the chain of [`named`](syntax::Syntax::named)
//! scopes that were open; printing failures surface as the user error type
//! directly. Nothing panics on malformed input.
//!
//! # Backtracking
//!
//! Alternatives do not backtrack over consumed input by default: a branch
//! that fails after consuming propagates its error. Wrap a branch in
//! [`backtrack`](syntax::Syntax::backtrack) or enable
//! [`auto_backtracking`](syntax::Syntax::auto_backtracking) for a scope to
//! restore the position and try the next branch.

#![forbid(future_incompatible)]
#![deny(missing_docs, bare_trait_objects)]

pub mod bits;
pub mod either;
pub mod error;
pub mod parser;
pub mod printer;
pub mod regex;
pub mod syntax;
pub mod target;

mod value;

pub use crate::value::Value;

/// Commonly used types and constructors.
pub mod prelude {
    pub use crate::either::Either;
    pub use crate::error::ParserError;
    pub use crate::parser::{Implementation, Parser};
    pub use crate::printer::Printer;
    pub use crate::regex::Regex;
    pub use crate::syntax::{
        alpha_numeric, alpha_numerics, any_char, any_string, char, char_in, char_not_in, digit,
        digits, end, fail, index, lazy, letter, letters, string, succeed, unit, whitespace_char,
        whitespaces, Syntax,
    };
    pub use crate::target::{ChunkTarget, StringTarget, Target};
    pub use crate::value::Value;
}
