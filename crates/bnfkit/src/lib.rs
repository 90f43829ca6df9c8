//! An LALR(1) grammar analysis engine.
//!
//! Grammars are declared with [`Grammar::define`] and compiled into a
//! parse automaton with [`build`]. The resulting [`GrammarData`] implements
//! [`bnfkit_runtime::ParseTable`], so it can drive [`runtime::Parser`].

pub mod automaton;
pub mod build;
pub mod data;
pub mod grammar;
pub mod scan;
pub mod types;

mod util;

pub use crate::{
    build::{build, BuildError},
    data::GrammarData,
    grammar::{Config, Grammar, GrammarDef, GrammarDefError},
};
pub use bnfkit_runtime as runtime;
