/*
    This module decides membership of a string in a grammar, recording
    every decision as a trace
*/

pub mod backtrack;
mod bottom_up;
mod top_down;

use clap::ValueEnum;
use serde::Serialize;

use crate::grammar::Grammar;
use crate::trace::Trace;

pub use bottom_up::BottomUpMatcher;
pub use top_down::TopDownMatcher;

pub const TOP_DOWN_MAX_STEPS: usize = 100;
pub const BOTTOM_UP_MAX_STEPS: usize = 10_000;

/// Exploration bound for a match run. When the trace reaches `max_steps`
/// the run stops with an unresolved verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    pub max_steps: usize,
}

impl MatchConfig {
    pub fn top_down() -> Self {
        MatchConfig { max_steps: TOP_DOWN_MAX_STEPS }
    }

    pub fn bottom_up() -> Self {
        MatchConfig { max_steps: BOTTOM_UP_MAX_STEPS }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Leftmost derivation from the start symbol
    TopDown,
    /// Leftmost reduction towards the start symbol
    BottomUp,
}

impl Strategy {
    pub fn default_config(self) -> MatchConfig {
        match self {
            Strategy::TopDown => MatchConfig::top_down(),
            Strategy::BottomUp => MatchConfig::bottom_up(),
        }
    }

    pub fn run(self, grammar: &Grammar, input: &str, config: MatchConfig) -> Trace {
        match self {
            Strategy::TopDown => TopDownMatcher::with_config(grammar, config).run(input),
            Strategy::BottomUp => BottomUpMatcher::with_config(grammar, config).run(input),
        }
    }
}

pub fn match_top_down(grammar: &Grammar, input: &str) -> Trace {
    TopDownMatcher::new(grammar).run(input)
}

pub fn match_bottom_up(grammar: &Grammar, input: &str) -> Trace {
    BottomUpMatcher::new(grammar).run(input)
}
