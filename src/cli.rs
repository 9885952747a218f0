use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::matcher::{MatchConfig, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Numbered step blocks
    Text,
    /// The full step sequence as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// File containing the grammar
    pub file: PathBuf,

    /// Strings to match (default: one per line from stdin)
    pub inputs: Vec<String>,

    /// Matching strategy
    #[arg(short = 'm', long, value_enum, default_value_t = Strategy::TopDown)]
    pub strategy: Strategy,

    /// Step bound per run (default: 100 top-down, 10000 bottom-up)
    #[arg(long, value_name = "STEPS")]
    pub max_steps: Option<usize>,

    /// Start symbol, `S` or `<S>` (default: first in the file)
    #[arg(short, long, value_name = "SYMBOL")]
    pub start: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Treat undefined nonterminals as errors
    #[arg(long)]
    pub strict: bool,

    /// Generate sentences from the grammar instead of matching
    #[arg(short = 'n', long, value_name = "AMOUNT")]
    pub generate: Option<u32>,

    /// Seed for generating sentences
    #[arg(long, value_name = "SEED", requires = "generate")]
    pub seed: Option<u64>,
}

impl Cli {
    // The start symbol as the grammar names it, brackets included
    pub fn start_symbol(&self) -> Option<String> {
        self.start.as_ref().map(|start| {
            if start.starts_with('<') && start.ends_with('>') {
                start.clone()
            } else {
                format!("<{}>", start)
            }
        })
    }

    pub fn config(&self) -> MatchConfig {
        match self.max_steps {
            Some(max_steps) => MatchConfig { max_steps },
            None => self.strategy.default_config(),
        }
    }
}
