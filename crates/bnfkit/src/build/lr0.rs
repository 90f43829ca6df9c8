//! Canonical LR(0) states with closure-time lookaheads.

use super::StageError;
use crate::{
    automaton::{ActionRecord, LrItem, LrItemID, ParserState, StateID},
    data::{GrammarData, LR0ItemID, ProductionID},
    grammar::TermID,
    types::{Map, TerminalSet},
};

/// Build every state reachable from the initial one.
///
/// States are keyed by their sorted kernel item IDs, so reaching an
/// existing kernel again reuses its state.
#[tracing::instrument(skip_all)]
pub(super) fn create_states(data: &mut GrammarData) -> Result<(), StageError> {
    let root = data.production(ProductionID::ROOT);
    let (start, accept) = (root.items[0], root.items[1]);

    let mut kernels = Map::<Vec<LR0ItemID>, StateID>::default();
    data.initial_state = new_state(data, &mut kernels, vec![start]);
    // With a left-recursive root, goto over the root reaches a larger kernel
    // and this state keeps no incoming edge. Accept is recorded wherever the
    // root item completes.
    data.final_state = new_state(data, &mut kernels, vec![accept]);
    for state in [data.initial_state, data.final_state] {
        let item = data.states[state.index()].items[0];
        data.lr_items[item.index()].lookaheads.insert(TermID::EOF);
    }

    let mut current = 0;
    while current < data.states.len() {
        let state = StateID::from_index(current);
        closure(data, state);
        goto(data, &mut kernels, state)?;
        current += 1;
    }

    tracing::debug!(
        states = data.states.len(),
        items = data.lr_items.len(),
        propagation_edges = data.propagation.edge_count(),
        "created states"
    );
    Ok(())
}

fn new_state(
    data: &mut GrammarData,
    kernels: &mut Map<Vec<LR0ItemID>, StateID>,
    kernel: Vec<LR0ItemID>,
) -> StateID {
    let id = StateID::from_index(data.states.len());
    let items = kernel.iter().map(|core| new_item(data, id, *core)).collect();
    kernels.insert(kernel.clone(), id);
    data.states.push(ParserState {
        id,
        kernel,
        items,
        actions: Map::default(),
    });
    tracing::trace!(state = ?id, "new state");
    id
}

fn new_item(data: &mut GrammarData, state: StateID, core: LR0ItemID) -> LrItemID {
    let id = LrItemID::from_index(data.lr_items.len());
    data.lr_items.push(LrItem {
        id,
        state,
        core,
        lookaheads: TerminalSet::default(),
    });
    id
}

/// Expand the state with the start items of every nonterminal after a dot.
///
/// Each added item receives the tail-FIRSTs of the item that introduced it,
/// and a propagation edge from that item when the tail is nullable.
fn closure(data: &mut GrammarData, state: StateID) {
    let mut by_core: Map<LR0ItemID, LrItemID> = data.states[state.index()]
        .items
        .iter()
        .map(|item| (data.lr_items[item.index()].core, *item))
        .collect();

    let mut index = 0;
    while index < data.states[state.index()].items.len() {
        let origin = data.states[state.index()].items[index];
        index += 1;

        let core = &data.lr0_items[data.lr_items[origin.index()].core.index()];
        let next = match core.next {
            Some(next) if !data.terms[next.index()].is_terminal() => next,
            _ => continue,
        };
        let tail_firsts = core.tail_firsts.clone();
        let tail_nullable = core.tail_nullable;

        for production in data.terms[next.index()].productions.clone() {
            let start = data.productions[production.index()].items[0];
            let item = match by_core.get(&start) {
                Some(item) => *item,
                None => {
                    let item = new_item(data, state, start);
                    data.states[state.index()].items.push(item);
                    by_core.insert(start, item);
                    item
                }
            };
            data.lr_items[item.index()].lookaheads.union_with(&tail_firsts);
            if tail_nullable {
                data.propagation.add(origin, item);
            }
        }
    }
}

/// Add a shift (or goto) for every term after a dot, creating target states
/// as needed and linking each item to its shifted counterpart.
fn goto(
    data: &mut GrammarData,
    kernels: &mut Map<Vec<LR0ItemID>, StateID>,
    state: StateID,
) -> Result<(), StageError> {
    let mut moves = Map::<TermID, Vec<(LrItemID, LR0ItemID)>>::default();
    for &item in &data.states[state.index()].items {
        let core = &data.lr0_items[data.lr_items[item.index()].core.index()];
        if let Some(next) = core.next {
            let shifted = data.productions[core.production.index()].items[core.position + 1];
            moves.entry(next).or_default().push((item, shifted));
        }
    }

    for (key, moves) in moves {
        let mut kernel: Vec<LR0ItemID> = moves.iter().map(|(_, shifted)| *shifted).collect();
        kernel.sort();
        kernel.dedup();

        let target = match kernels.get(&kernel) {
            Some(target) => *target,
            None => new_state(data, kernels, kernel),
        };
        data.states[state.index()]
            .actions
            .insert(key, ActionRecord::shift(target));

        for (origin, shifted) in moves {
            let shifted_item = data.states[target.index()]
                .items
                .iter()
                .copied()
                .find(|item| data.lr_items[item.index()].core == shifted)
                .ok_or_else(|| StageError::MissingItem {
                    item: data.lr0_item(shifted).display(&*data).to_string(),
                    state: target,
                })?;
            data.propagation.add(origin, shifted_item);
        }
    }
    Ok(())
}
