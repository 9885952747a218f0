use indexmap::IndexMap;
use itertools::Itertools;

use super::CompileErrorType::UndefinedNonterminal;
use super::{CompileError, CompileErrors, Location, Rewrite};

pub type IntermediateRuleset = IndexMap<String, (Rewrite, Location)>;

fn get_rewrite_undefined_symbols(rewrite: &Rewrite, location: &Location, rules: &IntermediateRuleset) -> CompileErrors {
    // Collect the nonterminals of every alternative, once each, and keep the
    // ones without a rule of their own
    rewrite.iter()
        .flat_map(|production| production.nonterminals())
        .unique()
        .filter(|symbol| !rules.contains_key(*symbol))
        .map(|symbol| CompileError {
            location: location.to_owned(),
            error: UndefinedNonterminal(symbol.to_owned())
        })
        .collect()
}

fn get_undefined_symbols(rules: &IntermediateRuleset) -> CompileErrors {
    // Rules are visited in declaration order so reports follow the file
    rules.values()
        .flat_map(|(rewrite, location)| get_rewrite_undefined_symbols(rewrite, location, rules))
        .collect()
}

// Undefined nonterminals are not fatal to matching, the caller decides
// whether to treat these as warnings or errors
pub fn verify_rules(rules: &IntermediateRuleset) -> CompileErrors {
    get_undefined_symbols(rules)
}
