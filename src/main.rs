use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use derivator::cli::{Cli, Format};
use derivator::error_handling::report;
use derivator::generator::Generator;
use derivator::parser::parse_file;
use derivator::render::{render_json, render_text};
use derivator::{Grammar, Verdict};

fn load_grammar(cli: &Cli) -> Option<Grammar> {
    let parsed = match parse_file(&cli.file) {
        Ok(parsed) => parsed,
        Err(errors) => {
            report(&errors);
            return None;
        }
    };

    let grammar = if cli.strict {
        match parsed.strict() {
            Ok(grammar) => grammar,
            Err(errors) => {
                report(&errors);
                return None;
            }
        }
    } else {
        for warning in &parsed.warnings {
            eprintln!("{}", warning.as_warning());
        }
        parsed.grammar
    };

    Some(match cli.start_symbol() {
        Some(start) => grammar.with_start(start),
        None => grammar,
    })
}

fn generate<R: Rng>(mut generator: Generator<'_, R>, amount: u32) -> ExitCode {
    for _ in 0..amount {
        match generator.generate() {
            Ok(sentence) => println!("{}", sentence),
            Err(error) => {
                eprintln!("{}", error);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn read_inputs(cli: &Cli) -> io::Result<Vec<String>> {
    if !cli.inputs.is_empty() {
        return Ok(cli.inputs.clone());
    }

    io::stdin().lock().lines().collect()
}

// Returns whether every input was accepted
fn match_inputs(cli: &Cli, grammar: &Grammar, inputs: &[String]) -> io::Result<bool> {
    let mut out = io::stdout().lock();
    let mut all_accepted = true;

    for input in inputs {
        let trace = cli.strategy.run(grammar, input, cli.config());
        all_accepted &= trace.verdict() == Verdict::Accepted;

        match cli.format {
            Format::Text => render_text(&mut out, input, &trace)?,
            Format::Json => render_json(&mut out, input, cli.strategy, &trace)?,
        }
    }

    out.flush()?;
    Ok(all_accepted)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(grammar) = load_grammar(&cli) else {
        return ExitCode::from(2);
    };

    if let Some(amount) = cli.generate {
        return match cli.seed {
            Some(seed) => generate(Generator::with_rng(&grammar, StdRng::seed_from_u64(seed), cli.file.clone()), amount),
            None => generate(Generator::new(&grammar, cli.file.clone()), amount),
        };
    }

    let result = read_inputs(&cli).and_then(|inputs| match_inputs(&cli, &grammar, &inputs));

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
