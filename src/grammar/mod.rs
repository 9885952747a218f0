/*
    This module is for storing and inspecting grammars
*/

pub mod tokenizer;

use std::fmt::Display;

use indexmap::IndexMap;
use serde::Serialize;

pub use tokenizer::{symbols_to_string, tokenize, Granularity, TokenizeError};

// The base unit in a grammar rule, a sentential form or a tokenized input.
// Nonterminal names keep their angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
}

impl Symbol {
    pub fn text(&self) -> &str {
        match self {
            Symbol::Terminal(text) | Symbol::Nonterminal(text) => text,
        }
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::Nonterminal(_))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// One right-hand-side alternative of a rule.
///
/// The symbols are stored run-granular (maximal terminal runs); the
/// char-granular view the bottom-up matcher needs is derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    text: String,
    symbols: Vec<Symbol>,
}

impl Production {
    pub fn parse(text: &str) -> Result<Self, TokenizeError> {
        Ok(Production {
            text: text.to_string(),
            symbols: tokenize(text, Granularity::Run)?,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn symbols(&self, granularity: Granularity) -> Vec<Symbol> {
        match granularity {
            Granularity::Run => self.symbols.clone(),
            Granularity::Char => self.symbols.iter()
                .flat_map(|symbol| match symbol {
                    Symbol::Terminal(run) => run.chars().map(|c| Symbol::Terminal(c.to_string())).collect(),
                    nonterminal => vec![nonterminal.clone()],
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn is_terminal_only(&self) -> bool {
        !self.symbols.iter().any(Symbol::is_nonterminal)
    }

    pub fn nonterminal_count(&self) -> usize {
        self.symbols.iter().filter(|symbol| symbol.is_nonterminal()).count()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().filter(|symbol| symbol.is_nonterminal()).map(Symbol::text)
    }
}

// The alternatives of a rewrite rule, in declaration order
pub type Rewrite = Vec<Production>;

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub start_symbol: String,
    pub rules: IndexMap<String, Rewrite>,
}

impl Grammar {
    /// Builds a grammar whose start symbol is the first rule inserted.
    pub fn new(rules: IndexMap<String, Rewrite>) -> Self {
        let start_symbol = rules.keys().next().cloned().unwrap_or_default();
        Grammar { start_symbol, rules }
    }

    pub fn with_start(mut self, start_symbol: impl Into<String>) -> Self {
        self.start_symbol = start_symbol.into();
        self
    }

    pub fn start(&self) -> Symbol {
        Symbol::Nonterminal(self.start_symbol.clone())
    }

    pub fn rewrite(&self, nonterminal: &str) -> Option<&Rewrite> {
        self.rules.get(nonterminal)
    }

    // A rule whose alternatives are all plain terminals, e.g. a digit class
    pub fn is_lexical_class(&self, nonterminal: &str) -> bool {
        self.rewrite(nonterminal)
            .is_some_and(|rewrite| !rewrite.is_empty() && rewrite.iter().all(Production::is_terminal_only))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(rules: &[(&str, &[&str])]) -> Grammar {
        Grammar::new(rules.iter()
            .map(|(name, alternatives)| (
                name.to_string(),
                alternatives.iter().map(|a| Production::parse(a).unwrap()).collect()
            ))
            .collect())
    }

    #[test]
    fn start_symbol_is_first_rule() {
        let g = grammar(&[("<S>", &["<A>"]), ("<A>", &["a"])]);
        assert_eq!(g.start_symbol, "<S>");
        assert_eq!(g.start(), Symbol::Nonterminal("<S>".to_string()));
        assert_eq!(g.with_start("<A>").start_symbol, "<A>");
    }

    #[test]
    fn empty_grammar_has_empty_start() {
        assert_eq!(Grammar::new(IndexMap::new()).start_symbol, "");
    }

    #[test]
    fn production_granularity() {
        let production = Production::parse("ab<X>c").unwrap();
        assert_eq!(production.symbols(Granularity::Run), vec![
            Symbol::Terminal("ab".to_string()),
            Symbol::Nonterminal("<X>".to_string()),
            Symbol::Terminal("c".to_string()),
        ]);
        assert_eq!(production.symbols(Granularity::Char), vec![
            Symbol::Terminal("a".to_string()),
            Symbol::Terminal("b".to_string()),
            Symbol::Nonterminal("<X>".to_string()),
            Symbol::Terminal("c".to_string()),
        ]);
        assert_eq!(production.nonterminal_count(), 1);
        assert!(!production.is_terminal_only());
    }

    #[test]
    fn lexical_classes() {
        let g = grammar(&[
            ("<N>", &["<D><N>", "<D>"]),
            ("<D>", &["0", "1"]),
            ("<A>", &["a<A>", "a"]),
        ]);
        assert!(g.is_lexical_class("<D>"));
        assert!(!g.is_lexical_class("<N>"));
        assert!(!g.is_lexical_class("<A>"));
        assert!(!g.is_lexical_class("<Missing>"));
    }
}
