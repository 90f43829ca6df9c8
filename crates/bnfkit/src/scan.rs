//! The boundary to the lexical scanner.
//!
//! The builder never scans text itself. Terminals carry a [`Matcher`], and
//! the build produces a [`ScannerLookup`] that tells a scanner which
//! terminals to try for a given leading character.

use crate::{
    data::GrammarData,
    grammar::{is_ident_continue, is_ident_start, TermID, TermKind},
    types::{Map, Set},
};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Content,
    Comment,
    Error,
}

/// A piece of input recognized by a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub lexeme: String,
    pub value: Option<String>,
    pub category: TokenCategory,
}

impl Token {
    pub fn new(lexeme: impl Into<String>) -> Self {
        Self {
            lexeme: lexeme.into(),
            value: None,
            category: TokenCategory::Content,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_category(mut self, category: TokenCategory) -> Self {
        self.category = category;
        self
    }
}

/// Recognizes one terminal in the input.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// Try to match at the byte offset `position` of `input`.
    fn try_match(&self, input: &str, position: usize) -> Option<Token>;

    /// The strings a match may start with, or `None` if it may start anywhere.
    fn start_symbols(&self) -> Option<Vec<String>> {
        None
    }

    /// Called once the grammar has been fully built.
    fn init(&mut self, _data: &GrammarData) {}
}

/// Matches a fixed piece of text.
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    text: String,
    word: bool,
    case_insensitive: bool,
}

impl LiteralMatcher {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            word: is_word(text),
            case_insensitive: false,
        }
    }
}

impl Matcher for LiteralMatcher {
    fn try_match(&self, input: &str, position: usize) -> Option<Token> {
        let rest = input.get(position..)?;
        let mut chars = rest.char_indices();
        let mut end = 0;
        for expected in self.text.chars() {
            let (i, actual) = chars.next()?;
            if !same_char(expected, actual, self.case_insensitive) {
                return None;
            }
            end = i + actual.len_utf8();
        }

        // `if` must not match the head of `iffy`.
        if self.word && rest[end..].chars().next().map_or(false, is_ident_continue) {
            return None;
        }

        Some(Token::new(&rest[..end]))
    }

    fn start_symbols(&self) -> Option<Vec<String>> {
        let first = self.text.chars().next()?;
        Some(vec![first.to_string()])
    }

    fn init(&mut self, data: &GrammarData) {
        self.case_insensitive = data.case_insensitive();
    }
}

/// Matches identifiers, refusing the grammar's keywords.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMatcher {
    keywords: Set<String>,
    case_insensitive: bool,
}

impl IdentifierMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        if self.case_insensitive {
            self.keywords.contains(&word.to_lowercase())
        } else {
            self.keywords.contains(word)
        }
    }
}

impl Matcher for IdentifierMatcher {
    fn try_match(&self, input: &str, position: usize) -> Option<Token> {
        let rest = input.get(position..)?;
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, ch)) if is_ident_start(ch) => (),
            _ => return None,
        }
        let end = chars
            .find(|(_, ch)| !is_ident_continue(*ch))
            .map_or(rest.len(), |(i, _)| i);

        let lexeme = &rest[..end];
        if self.is_keyword(lexeme) {
            return None;
        }
        Some(Token::new(lexeme).with_value(lexeme))
    }

    fn init(&mut self, data: &GrammarData) {
        self.case_insensitive = data.case_insensitive();
        self.keywords = data
            .terminals()
            .filter(|t| t.kind() == TermKind::Literal && is_word(t.key()))
            .map(|t| t.key().to_owned())
            .collect();
    }
}

fn is_word(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(ch) if is_ident_start(ch)) && chars.all(is_ident_continue)
}

fn same_char(expected: char, actual: char, case_insensitive: bool) -> bool {
    expected == actual
        || (case_insensitive && expected.to_lowercase().eq(actual.to_lowercase()))
}

/// Terminals to try for each leading input character, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct ScannerLookup {
    by_char: Map<char, Vec<TermID>>,
    fallback: Vec<TermID>,
}

impl ScannerLookup {
    /// Collect the reachable terminals' start symbols into per-character buckets.
    ///
    /// Terminals without start symbols are appended to every bucket and
    /// also form the fallback list used for characters without a bucket.
    pub(crate) fn build(data: &GrammarData) -> Self {
        let mut by_char = Map::<char, Vec<TermID>>::default();
        let mut fallback = vec![];

        for term in data.terminals() {
            let matcher = match term.matcher() {
                Some(matcher) => matcher,
                None => continue,
            };
            let symbols = match matcher.start_symbols() {
                Some(symbols) => symbols,
                None => {
                    fallback.push(term.id());
                    continue;
                }
            };
            for ch in symbols.iter().filter_map(|s| s.chars().next()) {
                let mut variants = vec![ch];
                if data.case_insensitive() {
                    variants.extend(ch.to_lowercase());
                    variants.extend(ch.to_uppercase());
                }
                for variant in variants {
                    let bucket = by_char.entry(variant).or_default();
                    if !bucket.contains(&term.id()) {
                        bucket.push(term.id());
                    }
                }
            }
        }

        let by_priority = |a: &TermID, b: &TermID| {
            Ord::cmp(&data.term(*b).priority(), &data.term(*a).priority())
        };
        fallback.sort_by(by_priority);
        for bucket in by_char.values_mut() {
            bucket.sort_by(by_priority);
            bucket.extend_from_slice(&fallback);
        }

        tracing::trace!(
            buckets = by_char.len(),
            fallback = fallback.len(),
            "scanner lookup"
        );
        Self { by_char, fallback }
    }

    /// The terminals to try, in order, when the input starts with `ch`.
    pub fn candidates(&self, ch: char) -> &[TermID] {
        self.by_char
            .get(&ch)
            .map(Vec::as_slice)
            .unwrap_or(&self.fallback[..])
    }

    pub fn fallback(&self) -> &[TermID] {
        &self.fallback[..]
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.by_char.keys().copied()
    }
}

/// Give every matcher a chance to finish its setup against the built grammar.
pub(crate) fn init_matchers(data: &mut GrammarData) {
    let mut matchers: Vec<_> = data
        .terms
        .iter_mut()
        .filter_map(|term| term.matcher.take().map(|m| (term.id, m)))
        .collect();
    for (_, matcher) in &mut matchers {
        matcher.init(data);
    }
    for (id, matcher) in matchers {
        data.terms[id.index()].matcher = Some(matcher);
    }
}
