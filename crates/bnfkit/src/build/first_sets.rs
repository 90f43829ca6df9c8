//! Nullability, FIRST sets and tail-FIRST sets.

use crate::{
    data::GrammarData,
    grammar::TermID,
    types::{Map, Set, TerminalSet},
};

/// Decide which nonterminals derive the empty string.
#[tracing::instrument(skip_all)]
pub(super) fn compute_nullability(data: &mut GrammarData) {
    let mut undecided = data.nonterminals.clone();
    let mut passes = 0;
    loop {
        passes += 1;
        let before = undecided.len();
        let mut remaining = Vec::with_capacity(before);
        for nonterminal in undecided {
            match decide_nullable(data, nonterminal) {
                Some(nullable) => data.terms[nonterminal.index()].nullable = nullable,
                None => remaining.push(nonterminal),
            }
        }
        undecided = remaining;
        if undecided.is_empty() || undecided.len() == before {
            break;
        }
    }

    tracing::debug!(
        passes,
        nullable = data.nonterminals().filter(|t| t.nullable()).count(),
        "computed nullability"
    );
}

/// `Some(true)` once some production is all-nullable, `Some(false)` if every
/// production contains a terminal, `None` while it cannot be told yet.
fn decide_nullable(data: &GrammarData, nonterminal: TermID) -> Option<bool> {
    let mut all_have_terminals = true;
    for production in data.term(nonterminal).productions() {
        let production = data.production(*production);
        if production.has_terminals {
            continue;
        }
        all_have_terminals = false;
        if production.rhs.iter().all(|t| data.term(*t).nullable) {
            return Some(true);
        }
    }
    all_have_terminals.then_some(false)
}

/// Compute the FIRST set of every collected term.
#[tracing::instrument(skip_all)]
pub(super) fn compute_firsts(data: &mut GrammarData) {
    for &terminal in &data.terminals {
        data.terms[terminal.index()].firsts.insert(terminal);
    }

    // source nonterminal -> nonterminals whose FIRST sets include it
    let mut propagate_to = Map::<TermID, Set<TermID>>::default();
    for production in &data.productions {
        for &term in &production.rhs {
            if data.terms[term.index()].is_terminal() {
                data.terms[production.lhs.index()].firsts.insert(term);
                break;
            }
            propagate_to.entry(term).or_default().insert(production.lhs);
            if !data.terms[term.index()].nullable {
                break;
            }
        }
    }

    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for (source, targets) in &propagate_to {
            let firsts = data.terms[source.index()].firsts.clone();
            for target in targets {
                let target = &mut data.terms[target.index()].firsts;
                let before = target.len();
                target.union_with(&firsts);
                if target.len() > before {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    tracing::debug!(passes, edges = propagate_to.len(), "computed FIRST sets");
}

/// Compute, for every LR(0) item, the FIRST set of the symbols that follow
/// its next term, and whether they are all nullable.
#[tracing::instrument(skip_all)]
pub(super) fn compute_tail_firsts(data: &mut GrammarData) {
    for production in &data.productions {
        let count = production.items.len();
        let mut accumulated = TerminalSet::default();
        let mut all_nullable = true;

        for position in (0..count).rev() {
            let item = &mut data.lr0_items[production.items[position].index()];
            if position + 2 >= count {
                item.tail_firsts.clear();
                item.tail_nullable = true;
                continue;
            }

            let term = &data.terms[production.rhs[position + 1].index()];
            if term.is_terminal() || !term.nullable {
                accumulated = term.firsts.clone();
                all_nullable = false;
            } else {
                accumulated.union_with(&term.firsts);
            }
            item.tail_firsts = accumulated.clone();
            item.tail_nullable = all_nullable;
        }
    }
    tracing::trace!(items = data.lr0_items.len(), "computed tail-FIRST sets");
}
