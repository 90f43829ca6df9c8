//! LALR(1) lookahead propagation.

use crate::{automaton::LrItemID, data::GrammarData, types::Queue};

/// Copy lookaheads along the propagation edges until nothing grows.
///
/// Every item starts in the queue; an item is queued again whenever its
/// lookahead set grows.
#[tracing::instrument(skip_all)]
pub(crate) fn propagate_lookaheads(data: &mut GrammarData) {
    let mut queue: Queue<LrItemID> = data.lr_items.iter().map(|item| item.id).collect();
    let mut steps = 0usize;
    while let Some(item) = queue.pop() {
        steps += 1;
        let lookaheads = data.lr_items[item.index()].lookaheads.clone();
        for &target in data.propagation.targets(item) {
            let target_lookaheads = &mut data.lr_items[target.index()].lookaheads;
            let before = target_lookaheads.len();
            target_lookaheads.union_with(&lookaheads);
            if target_lookaheads.len() > before {
                queue.push(target);
            }
        }
    }
    tracing::debug!(steps, "propagated lookaheads");
}
