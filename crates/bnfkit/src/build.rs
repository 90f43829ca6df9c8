//! The grammar data builder.
//!
//! Stages run in a fixed order, each one annotating the shared
//! [`GrammarData`] in place:
//!
//! 1. collect the terms reachable from the root,
//! 2. normalize keys,
//! 3. build the scanner lookup,
//! 4. materialize productions and their LR(0) items,
//! 5. compute nullability,
//! 6. compute FIRST sets,
//! 7. compute tail-FIRST sets per LR(0) item,
//! 8. build the states with spontaneous lookaheads,
//! 9. propagate lookaheads,
//! 10. attach reduce actions,
//! 11. resolve conflicts,
//! 12. initialize matchers.

mod collect;
mod first_sets;
mod lalr;
mod lr0;
mod productions;
mod table;

use crate::{
    automaton::StateID,
    data::{ErrorLog, GrammarData, GrammarErrorLevel},
    grammar::Grammar,
    scan::{self, ScannerLookup},
};
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("grammar build canceled:\n{}", log)]
    Fatal { log: ErrorLog },
}

impl BuildError {
    pub fn log(&self) -> &ErrorLog {
        match self {
            Self::Fatal { log } => log,
        }
    }
}

/// Failures that stop the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Rule for NonTerminal `{}' is not defined", name)]
    MissingRule { name: String },

    #[error("Root property of the grammar is not set")]
    NoRoot,

    #[error("internal error: item `{}' is missing from state {:?}", item, state)]
    MissingItem { item: String, state: StateID },
}

/// Build the LALR(1) automaton for the specified grammar.
///
/// Conflicts and warnings do not fail the build; they are recorded in
/// [`GrammarData::log`]. Fatal problems cancel the build and return the log.
#[tracing::instrument(skip_all)]
pub fn build(grammar: Grammar) -> Result<GrammarData, BuildError> {
    let started = Instant::now();
    let mut data = GrammarData::new(grammar);

    if let Err(err) = run(&mut data) {
        data.log.add(GrammarErrorLevel::Error, None, err.to_string());
    }
    if data.log.has_errors() {
        tracing::debug!(elapsed = ?started.elapsed(), "build canceled");
        return Err(BuildError::Fatal { log: data.log });
    }

    tracing::debug!(
        terminals = data.terminals.len(),
        nonterminals = data.nonterminals.len(),
        productions = data.productions.len(),
        states = data.states.len(),
        conflicts = data.log.conflicts().count(),
        elapsed = ?started.elapsed(),
        "build completed"
    );
    Ok(data)
}

fn run(data: &mut GrammarData) -> Result<(), StageError> {
    collect::collect_terms(data)?;
    if data.log.has_errors() {
        return Ok(());
    }
    collect::normalize_keys(data);
    data.scanner_lookup = ScannerLookup::build(data);

    productions::create_productions(data);
    first_sets::compute_nullability(data);
    first_sets::compute_firsts(data);
    first_sets::compute_tail_firsts(data);

    lr0::create_states(data)?;
    lalr::propagate_lookaheads(data);

    table::create_reduce_actions(data);
    table::resolve_conflicts(data);

    scan::init_matchers(data);
    Ok(())
}
