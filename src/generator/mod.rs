/*
    This module generates sentences that belong to a grammar
*/

use itertools::Itertools;
use rand::prelude::*;
use std::fmt::Display;
use std::path::PathBuf;

use crate::grammar::*;
use crate::error_handling::*;

#[derive(Debug, PartialEq)]
pub enum GenerateErrorType {
    // An undefined nonterminal was used
    UndefinedNonterminal(String),
    // A nonterminal has no alternatives at all
    EmptyRewrite(String),
    // Expansion kept recursing past the hard depth bound
    RecursionLimit(usize),
}

impl ErrorType for GenerateErrorType {}

impl Display for GenerateErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateErrorType::UndefinedNonterminal(nonterminal) => write!(f, "No definition for nonterminal `{}`", nonterminal),
            GenerateErrorType::EmptyRewrite(nonterminal) => write!(f, "Nonterminal `{}` has no alternatives", nonterminal),
            GenerateErrorType::RecursionLimit(depth) => write!(f, "Generation did not terminate within {} nested expansions", depth),
        }
    }
}

pub type GenerateError = Error<GenerateErrorType>;
pub type GenResult = Result<String, GenerateError>;

pub const DEFAULT_MAX_DEPTH: usize = 8;

pub struct Generator<'g, R: Rng> {
    grammar: &'g Grammar,
    rng: R,
    // Past this depth the alternative with the fewest nonterminals is taken
    max_depth: usize,
    location: Location,
}

impl<'g> Generator<'g, ThreadRng> {
    pub fn new(grammar: &'g Grammar, file: PathBuf) -> Self {
        Generator::with_rng(grammar, thread_rng(), file)
    }
}

impl<'g, R: Rng> Generator<'g, R> {
    pub fn with_rng(grammar: &'g Grammar, rng: R, file: PathBuf) -> Self {
        Generator {
            grammar,
            rng,
            max_depth: DEFAULT_MAX_DEPTH,
            location: Location::file(file),
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    // Generates a sentence starting from the grammar's start symbol
    pub fn generate(&mut self) -> GenResult {
        let start = self.grammar.start_symbol.clone();
        self.generate_nonterminal(&start, 0)
    }

    fn error(&self, error: GenerateErrorType) -> GenerateError {
        GenerateError {
            location: self.location.clone(),
            error
        }
    }

    fn generate_nonterminal(&mut self, nonterminal: &str, depth: usize) -> GenResult {
        let hard_limit = self.max_depth * 4;
        if depth > hard_limit {
            return Err(self.error(GenerateErrorType::RecursionLimit(hard_limit)));
        }

        let grammar = self.grammar;
        let rewrite = grammar
            .rewrite(nonterminal)
            .ok_or_else(|| self.error(GenerateErrorType::UndefinedNonterminal(nonterminal.to_string())))?;

        let alternative = if depth < self.max_depth {
            rewrite.choose(&mut self.rng)
        } else {
            rewrite.iter().min_by_key(|production| production.nonterminal_count())
        };
        let alternative = alternative.ok_or_else(|| self.error(GenerateErrorType::EmptyRewrite(nonterminal.to_string())))?;

        return self.generate_production(alternative, depth);
    }

    fn generate_production(&mut self, production: &Production, depth: usize) -> GenResult {
        production.symbols(Granularity::Run)
            .iter()
            .map(|symbol| self.generate_symbol(symbol, depth))
            .fold_ok(String::new(), |mut result, text| {
                result.push_str(&text);
                result
            })
    }

    fn generate_symbol(&mut self, symbol: &Symbol, depth: usize) -> GenResult {
        match symbol {
            Symbol::Nonterminal(name) => self.generate_nonterminal(name, depth + 1),
            Symbol::Terminal(text) => Ok(text.clone()),
        }
    }
}
