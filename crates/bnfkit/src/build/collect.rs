//! Term collection and key normalization.

use super::StageError;
use crate::{
    data::{GrammarData, GrammarErrorLevel},
    grammar::{Expr, Operand, Term, TermID, TermKind},
    types::Set,
};
use std::{collections::VecDeque, mem};

/// Walk the rules from the root and record every reachable term.
///
/// Nested expressions are lifted into anonymous nonterminals on the way.
/// Nonterminals without a rule are logged as errors.
#[tracing::instrument(skip_all)]
pub(super) fn collect_terms(data: &mut GrammarData) -> Result<(), StageError> {
    let root = data.root.ok_or(StageError::NoRoot)?;
    let name = format!("{}'", data.terms[root.index()].name);
    let augmented = &mut data.terms[TermID::ROOT.index()];
    augmented.rule = Some(Expr::from(root));
    augmented.name = name;

    let mut visited = Set::<TermID>::default();
    let mut pending = VecDeque::new();
    visited.insert(TermID::EOF);
    data.terminals.push(TermID::EOF);
    visited.insert(TermID::ROOT);
    pending.push_back(TermID::ROOT);

    let mut next_unnamed = 0;
    while let Some(id) = pending.pop_front() {
        if data.terms[id.index()].is_terminal() {
            data.terminals.push(id);
            continue;
        }
        data.nonterminals.push(id);

        let mut rule = match data.terms[id.index()].rule.take() {
            Some(rule) => rule,
            None => {
                let name = data.terms[id.index()].name.clone();
                data.log.add(
                    GrammarErrorLevel::Error,
                    None,
                    StageError::MissingRule { name }.to_string(),
                );
                continue;
            }
        };

        for operand in rule.alternatives.iter_mut().flatten() {
            if let Operand::Expr(expr) = operand {
                let expr = mem::take(&mut **expr);
                *operand = Operand::Term(unnamed(data, &mut next_unnamed, expr));
            }
            if let Operand::Term(term) = operand {
                if *term != TermID::EMPTY && visited.insert(*term) {
                    pending.push_back(*term);
                }
            }
        }
        data.terms[id.index()].rule = Some(rule);
    }

    for term in &data.terms {
        if term.is_terminal() && term.id != TermID::EMPTY && !visited.contains(&term.id) {
            data.log.add(
                GrammarErrorLevel::Warning,
                None,
                format!("Terminal {} is declared but not reachable from the root", term),
            );
        }
    }

    tracing::debug!(
        terminals = data.terminals.len(),
        nonterminals = data.nonterminals.len(),
        unnamed = next_unnamed,
        "collected terms"
    );
    Ok(())
}

fn unnamed(data: &mut GrammarData, counter: &mut usize, rule: Expr) -> TermID {
    let name = loop {
        let name = format!("unnamed{}", counter);
        *counter += 1;
        if !data.terms.iter().any(|t| t.kind != TermKind::Literal && t.key == name) {
            break name;
        }
    };
    let id = TermID::from_index(data.terms.len());
    let mut term = Term::new(id, TermKind::Nonterminal, name.clone(), name);
    term.rule = Some(rule);
    data.terms.push(term);
    id
}

/// Fold literal keys when matching is case-insensitive, then index names
/// and literal texts separately.
#[tracing::instrument(skip_all)]
pub(super) fn normalize_keys(data: &mut GrammarData) {
    if data.case_insensitive {
        for term in &mut data.terms {
            if term.kind == TermKind::Literal {
                term.key = term.key.to_lowercase();
            }
        }
    }
    data.keys = data
        .terms
        .iter()
        .filter(|t| t.kind != TermKind::Literal)
        .map(|t| (t.key.clone(), t.id))
        .collect();
    data.literals = data
        .terms
        .iter()
        .filter(|t| t.kind == TermKind::Literal)
        .map(|t| (t.key.clone(), t.id))
        .collect();
}

#[cfg(test)]
mod tests {
    use crate::{
        build::{build, BuildError},
        data::GrammarErrorLevel,
        grammar::{Config, Grammar},
    };

    #[test]
    fn nested_expressions_become_unnamed_nonterminals() {
        let data = build(
            Grammar::define(|g| {
                let a = g.literal("a")?;
                let b = g.literal("b")?;
                let c = g.literal("c")?;
                let s = g.nonterminal("s")?;
                g.rule(s, a.then(b.or(c)).then(a))?;
                g.root(s)?;
                Ok(())
            })
            .unwrap(),
        )
        .unwrap();

        let unnamed = data.term_by_key("unnamed0").unwrap();
        assert!(!unnamed.is_terminal());
        assert_eq!(unnamed.productions().len(), 2);
        let s = data.term_by_key("s").unwrap();
        let rhs: Vec<_> = data
            .production(s.productions()[0])
            .rhs()
            .iter()
            .map(|t| data.term(*t).key())
            .collect();
        assert_eq!(rhs, ["a", "unnamed0", "a"]);
    }

    #[test]
    fn unnamed_skips_taken_names() {
        let data = build(
            Grammar::define(|g| {
                let a = g.literal("a")?;
                let b = g.literal("b")?;
                let s = g.nonterminal("unnamed0")?;
                g.rule(s, a.then(a.or(b)))?;
                g.root(s)?;
                Ok(())
            })
            .unwrap(),
        )
        .unwrap();
        assert!(data.term_by_key("unnamed1").is_some());
        assert_eq!(data.term(data.augmented_root()).name(), "unnamed0'");
    }

    #[test]
    fn missing_rule_is_fatal() {
        let err = build(
            Grammar::define(|g| {
                let a = g.literal("a")?;
                let s = g.nonterminal("s")?;
                let t = g.nonterminal("t")?;
                let u = g.nonterminal("u")?;
                g.rule(s, a.then(t).or(u))?;
                g.root(s)?;
                Ok(())
            })
            .unwrap(),
        )
        .unwrap_err();

        let BuildError::Fatal { log } = err;
        let messages: Vec<_> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Rule for NonTerminal `t' is not defined",
                "Rule for NonTerminal `u' is not defined",
            ]
        );
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = build(
            Grammar::define(|g| {
                let a = g.literal("a")?;
                let s = g.nonterminal("s")?;
                g.rule(s, a)?;
                Ok(())
            })
            .unwrap(),
        )
        .unwrap_err();
        assert!(err.log().has_errors());
        assert!(err
            .log()
            .iter()
            .any(|e| e.message == "Root property of the grammar is not set"));
    }

    #[test]
    fn unreachable_terminals_are_warnings() {
        let data = build(
            Grammar::define(|g| {
                let a = g.literal("a")?;
                g.literal("unused")?;
                let s = g.nonterminal("s")?;
                g.rule(s, a)?;
                g.root(s)?;
                Ok(())
            })
            .unwrap(),
        )
        .unwrap();
        let warnings: Vec<_> = data.log().warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, GrammarErrorLevel::Warning);
        assert!(warnings[0].message.contains("'unused'"));
        assert!(data.terminals().all(|t| t.key() != "unused"));
    }

    #[test]
    fn warnings_use_aliases() {
        let data = build(
            Grammar::define(|g| {
                let a = g.literal("a")?;
                let semi = g.literal(";")?;
                g.alias(semi, "semicolon")?;
                let s = g.nonterminal("s")?;
                g.rule(s, a)?;
                g.root(s)?;
                Ok(())
            })
            .unwrap(),
        )
        .unwrap();
        let warnings: Vec<_> = data.log().warnings().map(|e| e.message.as_str()).collect();
        assert_eq!(
            warnings,
            ["Terminal semicolon is declared but not reachable from the root"]
        );
    }

    #[test]
    fn case_insensitive_keys_are_folded() {
        let data = build(
            Config::new()
                .case_insensitive()
                .define(|g| {
                    let begin = g.literal("BEGIN")?;
                    let s = g.nonterminal("Block")?;
                    g.rule(s, begin)?;
                    g.root(s)?;
                    Ok(())
                })
                .unwrap(),
        )
        .unwrap();
        assert_eq!(data.term_by_key("begin").unwrap().name(), "'BEGIN'");
        assert!(data.term_by_key("BEGIN").is_none());
        assert!(data.term_by_key("Block").is_some());
        assert_eq!(data.literal("Begin").unwrap().name(), "'BEGIN'");
    }
}
