//! Reduce actions and conflict resolution.

use crate::{
    automaton::{ActionKind, ActionRecord, StateID},
    data::{GrammarData, GrammarErrorLevel, ProductionID},
    grammar::{Hint, TermID},
    types::Map,
};

/// Attach a reduce candidate for every lookahead of every completed item.
///
/// Existing shift records are kept; the production is appended to them as
/// an additional candidate.
#[tracing::instrument(skip_all)]
pub(super) fn create_reduce_actions(data: &mut GrammarData) {
    let mut count = 0usize;
    for state in &mut data.states {
        for item in &state.items {
            let item = &data.lr_items[item.index()];
            let core = &data.lr0_items[item.core.index()];
            if !core.is_completed() {
                continue;
            }
            for key in item.lookaheads.iter() {
                let record = state
                    .actions
                    .entry(key)
                    .or_insert_with(ActionRecord::reduce);
                if !record.reduces.contains(&core.production) {
                    record.reduces.push(core.production);
                    count += 1;
                }
            }
        }
    }
    tracing::debug!(reduces = count, "created reduce actions");
}

type Reports = Map<(StateID, String), Vec<TermID>>;

/// Decide the final kind of every action record and log unresolved conflicts.
///
/// Reports with the same text are merged into one log entry listing all
/// affected input keys.
#[tracing::instrument(skip_all)]
pub(super) fn resolve_conflicts(data: &mut GrammarData) {
    let mut reports = Reports::default();
    for index in 0..data.states.len() {
        let state = StateID::from_index(index);
        let keys: Vec<TermID> = data.states[index].actions.keys().copied().collect();
        for key in keys {
            resolve(data, state, key, &mut reports);
        }
    }

    for ((state, message), keys) in reports {
        let keys: Vec<&str> = keys.iter().map(|key| data.term(*key).key()).collect();
        let message = format!("{} on inputs: {}", message, keys.join(" "));
        data.log
            .add(GrammarErrorLevel::Conflict, Some(state), message);
    }
}

fn resolve(data: &mut GrammarData, state: StateID, key: TermID, reports: &mut Reports) {
    let record = &data.states[state.index()].actions[&key];
    if record.reduces.is_empty() {
        return;
    }
    let target = record.target;
    let mut reduces = record.reduces.clone();

    if target.is_none() && key == TermID::EOF && reduces == [ProductionID::ROOT] {
        set_action(data, state, key, ActionKind::Accept, reduces);
        return;
    }

    if reduces.len() >= 2 {
        match reduces.iter().position(|p| prefers_reduce(data, *p)) {
            Some(preferred) => {
                let production = reduces.remove(preferred);
                reduces.insert(0, production);
            }
            None => {
                let message = format!(
                    "Reduce-reduce conflict in state {:?} for productions: {}; {}",
                    state,
                    data.production(reduces[0]).display(data),
                    data.production(reduces[1]).display(data),
                );
                reports.entry((state, message)).or_default().push(key);
            }
        }
    }

    let kind = match target {
        None => ActionKind::Reduce,
        Some(_) if data.term(key).is_operator() => ActionKind::Operator,
        Some(_) if prefers_shift(data, state, key) => ActionKind::Shift,
        Some(_) if prefers_reduce(data, reduces[0]) => ActionKind::Reduce,
        Some(_) => {
            let message = format!(
                "Shift-reduce conflict in state {:?}, reduce production: {}",
                state,
                data.production(reduces[0]).display(data),
            );
            reports.entry((state, message)).or_default().push(key);
            ActionKind::Shift
        }
    };
    tracing::trace!(state = ?state, key = data.term(key).key(), ?kind, "resolved");
    set_action(data, state, key, kind, reduces);
}

fn set_action(
    data: &mut GrammarData,
    state: StateID,
    key: TermID,
    kind: ActionKind,
    reduces: Vec<ProductionID>,
) {
    if let Some(record) = data.states[state.index()].actions.get_mut(&key) {
        record.kind = kind;
        record.reduces = reduces;
    }
}

fn prefers_reduce(data: &GrammarData, production: ProductionID) -> bool {
    data.production(production)
        .items
        .last()
        .map_or(false, |item| data.lr0_item(*item).has_hint(Hint::PreferReduce))
}

fn prefers_shift(data: &GrammarData, state: StateID, key: TermID) -> bool {
    data.state(state).items.iter().any(|item| {
        let core = data.lr0_item(data.lr_item(*item).core);
        core.next == Some(key) && core.has_hint(Hint::PreferShift)
    })
}
