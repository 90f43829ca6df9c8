//! Productions and their LR(0) item families.

use crate::{
    data::{GrammarData, LR0Item, LR0ItemID, Production, ProductionID},
    grammar::{Hint, Operand, TermID},
    types::TerminalSet,
};

/// Turn every alternative of every collected rule into a production.
///
/// `$empty` operands are dropped. A hint attaches to the item whose dot
/// sits where the hint was written.
#[tracing::instrument(skip_all)]
pub(super) fn create_productions(data: &mut GrammarData) {
    for index in 0..data.nonterminals.len() {
        let lhs = data.nonterminals[index];
        let alternatives = match &data.terms[lhs.index()].rule {
            Some(rule) => rule.alternatives.clone(),
            None => continue,
        };

        for alternative in alternatives {
            let mut rhs = vec![];
            let mut hints: Vec<(usize, Hint)> = vec![];
            for operand in alternative {
                match operand {
                    Operand::Term(TermID::EMPTY) => (),
                    Operand::Term(term) => rhs.push(term),
                    Operand::Hint(hint) => hints.push((rhs.len(), hint)),
                    // lifted during collection
                    Operand::Expr(..) => (),
                }
            }
            add_production(data, lhs, rhs, &hints);
        }
    }

    tracing::debug!(
        productions = data.productions.len(),
        items = data.lr0_items.len(),
        "created productions"
    );
}

fn add_production(data: &mut GrammarData, lhs: TermID, rhs: Vec<TermID>, hints: &[(usize, Hint)]) {
    let id = ProductionID::from_index(data.productions.len());
    let has_terminals = rhs.iter().any(|t| data.terms[t.index()].is_terminal());

    let mut items = Vec::with_capacity(rhs.len() + 1);
    for position in 0..=rhs.len() {
        let item = LR0ItemID::from_index(data.lr0_items.len());
        data.lr0_items.push(LR0Item {
            id: item,
            production: id,
            position,
            next: rhs.get(position).copied(),
            hints: hints
                .iter()
                .filter(|(at, _)| *at == position)
                .map(|(_, hint)| *hint)
                .collect(),
            tail_firsts: TerminalSet::default(),
            tail_nullable: false,
        });
        items.push(item);
    }

    data.productions.push(Production {
        id,
        lhs,
        rhs,
        has_terminals,
        items,
    });
    data.terms[lhs.index()].productions.push(id);
}
