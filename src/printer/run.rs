//-
// Copyright 2026 The biparse developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The printer interpreter.
//!
//! Printers are walked with host recursion; their trees mirror the syntax
//! that built them and stay shallow. The only stateful concern is
//! speculative output: `or_else` brackets its left branch in a checkpoint
//! and rolls the target back before trying the right branch, so a failed
//! alternative leaves no trace in the output.

use crate::either::Either;
use crate::printer::Node;
use crate::regex::Test;
use crate::target::Target;
use crate::value::{unit_value, unpack, DynValue};

pub(crate) fn run<E, O, T>(
    node: &Node<E, O>,
    input: &DynValue,
    target: &mut T,
) -> Result<(), E>
where
    E: Clone,
    O: Clone,
    T: Target<Output = O>,
{
    match node {
        Node::Succeed => Ok(()),
        Node::Fail(error) => Err(error.clone()),
        Node::MapError(inner, f) => run(inner, input, target).map_err(|error| f(error)),
        Node::Contramap(inner, f) => {
            let value = f(input.clone());
            run(inner, &value, target)
        }
        Node::ContramapEither(inner, f) => {
            let value = f(input.clone())?;
            run(inner, &value, target)
        }
        Node::Zip { left, right, split } => {
            let (a, b) = split(input);
            run(left, &a, target)?;
            run(right, &b, target)
        }
        Node::ZipLeft(left, right) => {
            run(left, input, target)?;
            run(right, &unit_value(), target)
        }
        Node::ZipRight(left, right) => {
            run(left, &unit_value(), target)?;
            run(right, input, target)
        }
        Node::OrElse(left, right) => {
            let checkpoint = target.checkpoint();
            match run(left, input, target) {
                Ok(()) => {
                    target.commit(checkpoint);
                    Ok(())
                }
                Err(_) => {
                    target.rollback(checkpoint);
                    run(right, input, target)
                }
            }
        }
        Node::OrElseEither { left, right, split } => match split(input) {
            Either::Left(value) => run(left, &value, target),
            Either::Right(value) => run(right, &value, target),
        },
        Node::Optional { inner, split } => match split(input) {
            Some(value) => run(inner, &value, target),
            None => Ok(()),
        },
        Node::Repeat { inner, split } => {
            for value in split(input) {
                run(inner, &value, target)?;
            }
            Ok(())
        }
        Node::RepeatWithSep { inner, sep, split } => {
            let mut first = true;
            for value in split(input) {
                if !first {
                    run(sep, &unit_value(), target)?;
                }
                first = false;
                run(inner, &value, target)?;
            }
            Ok(())
        }
        Node::RepeatUntil { inner, stop, split } => {
            for value in split(input) {
                run(inner, &value, target)?;
            }
            run(stop, &unit_value(), target)
        }
        Node::Emit(out) => {
            target.write(out.clone());
            Ok(())
        }
        Node::ExactlyEqual {
            inner,
            equals,
            error,
        } => {
            if equals(input) {
                run(inner, &unit_value(), target)
            } else {
                Err(error.clone())
            }
        }
        Node::ExceptEqual {
            inner,
            equals,
            error,
        } => {
            if equals(input) {
                Err(error.clone())
            } else {
                run(inner, input, target)
            }
        }
        Node::FilterInput {
            inner,
            predicate,
            error,
        } => {
            if predicate(input) {
                run(inner, input, target)
            } else {
                Err(error.clone())
            }
        }
        Node::FromInput(f) => {
            let printer = f(input);
            run(&printer, &unit_value(), target)
        }
        Node::Lazy(lazy) => run(&lazy.force(), input, target),
        Node::Flatten(split) => {
            for out in split(input) {
                target.write(out);
            }
            Ok(())
        }
        Node::PrintRegex {
            regex,
            error,
            embed,
        } => {
            let text = unpack::<String>(input);
            let chars: Vec<char> = text.chars().collect();
            if regex.test(0, &chars) == Test::Matched(chars.len()) {
                for ch in chars {
                    target.write(embed(ch));
                }
                Ok(())
            } else {
                Err(error.clone())
            }
        }
        Node::PrintRegexChar {
            regex,
            error,
            embed,
        } => {
            let ch = unpack::<char>(input);
            if regex.test(0, &[ch]) == Test::Matched(1) {
                target.write(embed(ch));
                Ok(())
            } else {
                Err(error.clone())
            }
        }
        Node::PrintRegexDiscard { outs } => {
            for out in outs {
                target.write(out.clone());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use crate::printer::Printer;
    use crate::regex::Regex;
    use crate::target::ChunkTarget;

    type P<V> = Printer<V, String>;

    #[test]
    fn or_else_rolls_back_partial_output() {
        let left = Printer::<(), String, char>::emit('a')
            .zip_right(Printer::emit('b'))
            .zip_right(Printer::fail("nope".to_owned()));
        let printer = left.or_else(Printer::emit('z'));
        assert_eq!(printer.print_string(&()), Ok("z".to_owned()));
    }

    #[test]
    fn or_else_commits_successful_output() {
        let printer = Printer::<(), String, char>::emit('a')
            .or_else(Printer::emit('b'));
        assert_eq!(printer.print_string(&()), Ok("a".to_owned()));
    }

    #[test]
    fn regex_printers_verify_their_input() {
        let digits = P::<String>::regex(&Regex::digits(), "not digits".to_owned());
        assert_eq!(digits.print_string(&"123".to_owned()), Ok("123".to_owned()));
        assert_eq!(
            digits.print_string(&"12a".to_owned()),
            Err("not digits".to_owned())
        );

        let digit = P::<char>::regex_char(&Regex::any_digit(), "not a digit".to_owned());
        assert_eq!(digit.print_string(&'7'), Ok("7".to_owned()));
        assert_eq!(digit.print_string(&'x'), Err("not a digit".to_owned()));
    }

    #[test]
    fn repeat_with_sep_interleaves() {
        let printer = P::<char>::regex_char(&Regex::any_digit(), "digit".to_owned())
            .repeat_with_sep(Printer::regex_discard(",".chars()));
        assert_eq!(
            printer.print_string(&vec!['1', '2', '3']),
            Ok("1,2,3".to_owned())
        );
        assert_eq!(printer.print_string(&vec![]), Ok(String::new()));
    }

    #[test]
    fn exactly_checks_the_input_value() {
        let printer = Printer::<(), String, char>::regex_discard("true".chars())
            .exactly(true, "expected true".to_owned());
        assert_eq!(printer.print_string(&true), Ok("true".to_owned()));
        assert_eq!(printer.print_string(&false), Err("expected true".to_owned()));
    }

    #[test]
    fn except_rejects_the_excluded_value() {
        let printer = P::<char>::regex_char(&Regex::any_letter(), "letter".to_owned())
            .except('q', "q is reserved".to_owned());
        assert_eq!(printer.print_string(&'a'), Ok("a".to_owned()));
        assert_eq!(printer.print_string(&'q'), Err("q is reserved".to_owned()));
    }

    #[test]
    fn from_input_reemits_captured_text() {
        let printer = P::<String>::from_input(|text: String| {
            Printer::regex_discard(text.chars())
        });
        assert_eq!(printer.print_string(&"ab".to_owned()), Ok("ab".to_owned()));
    }

    #[test]
    fn flatten_writes_nested_chunks() {
        let printer = Printer::<Vec<Vec<u8>>, String, u8>::flatten();
        let mut target = ChunkTarget::new();
        printer
            .print_to_target(&vec![vec![1, 2], vec![], vec![3]], &mut target)
            .expect("flatten is infallible");
        assert_eq!(target.finish(), vec![1, 2, 3]);

        let strings = Printer::<Vec<String>, String, char>::flatten_strings();
        assert_eq!(
            strings.print_string(&vec!["ab".to_owned(), "c".to_owned()]),
            Ok("abc".to_owned())
        );
    }

    #[test]
    fn optional_prints_only_some() {
        let printer = P::<char>::regex_char(&Regex::any_digit(), "digit".to_owned()).optional();
        assert_eq!(printer.print_string(&Some('1')), Ok("1".to_owned()));
        assert_eq!(printer.print_string(&None), Ok(String::new()));
    }

    #[test]
    fn repeat_until_prints_the_stop_once() {
        let printer = P::<char>::regex_char(&Regex::any_letter(), "letter".to_owned())
            .repeat_until(Printer::regex_discard(";".chars()));
        assert_eq!(printer.print_string(&vec!['a', 'b']), Ok("ab;".to_owned()));
    }

    #[test]
    fn chunk_targets_collect_arbitrary_elements() {
        let printer = Printer::<(), String, u8>::emit(7);
        assert_eq!(printer.print_to_chunk(&()), Ok(vec![7]));
    }
}
