//! Runtime support for parse tables produced by `bnfkit`.

pub mod definition;
pub mod parser;

pub use crate::{
    definition::{Assoc, ParseAction, ParseActionError, ParseTable, Precedence},
    parser::{ParseError, ParseEvent, ParseItem, Parser, Token},
};
