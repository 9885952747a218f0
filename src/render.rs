use std::io::{self, Write};

use serde::Serialize;

use crate::matcher::Strategy;
use crate::trace::{Candidate, Step, Trace, Verdict};

fn or_empty(text: &str) -> &str {
    if text.is_empty() { "[empty]" } else { text }
}

fn write_candidate(out: &mut impl Write, candidate: &Candidate, selected: bool) -> io::Result<()> {
    let mark = if selected { '*' } else { ' ' };

    match &candidate.span {
        Some(span) if span.is_empty() => writeln!(
            out,
            "      {} [empty] -> {} (before position {})",
            mark, candidate.nonterminal, span.start + 1
        ),
        Some(span) => writeln!(
            out,
            "      {} {} -> {} (positions {}-{})",
            mark, or_empty(&candidate.production), candidate.nonterminal, span.start + 1, span.end
        ),
        None => writeln!(out, "      {} {} -> {}", mark, candidate.nonterminal, or_empty(&candidate.production)),
    }
}

fn write_step(out: &mut impl Write, step: &Step) -> io::Result<()> {
    writeln!(out, "Step {}: {}", step.id + 1, step.action)?;

    if let Some(target) = step.backtrack_to {
        writeln!(out, "    back to step {}", target + 1)?;
    }

    writeln!(out, "    form:  {}", or_empty(&step.display))?;
    if let Some(remaining) = &step.remaining_input {
        writeln!(out, "    input: {}", or_empty(remaining))?;
    }

    if !step.candidates.is_empty() {
        writeln!(out, "    candidates:")?;
        for candidate in &step.candidates {
            write_candidate(out, candidate, step.selected.as_ref() == Some(candidate))?;
        }
    }

    Ok(())
}

/// Writes a trace as numbered step blocks followed by the verdict.
pub fn render_text(out: &mut impl Write, input: &str, trace: &Trace) -> io::Result<()> {
    writeln!(out, "== {} ==", input)?;
    for step in trace {
        write_step(out, step)?;
    }
    writeln!(
        out,
        "Result: {} after {} steps ({} backtracking)",
        trace.verdict(), trace.len(), trace.backtrack_count()
    )
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a str,
    strategy: Strategy,
    verdict: Verdict,
    steps: &'a Trace,
}

pub fn render_json(out: &mut impl Write, input: &str, strategy: Strategy, trace: &Trace) -> io::Result<()> {
    let report = Report {
        input,
        strategy,
        verdict: trace.verdict(),
        steps: trace,
    };

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{match_bottom_up, match_top_down};
    use crate::parser::parse_str;

    fn text(input: &str, trace: &Trace) -> String {
        let mut out = Vec::new();
        render_text(&mut out, input, trace).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn text_shows_backtracking() {
        let grammar = parse_str("<S> := a | b").unwrap();
        let rendered = text("c", &match_top_down(&grammar, "c"));

        assert!(rendered.starts_with("== c ==\nStep 1: Replace <S> with \"a\"\n"));
        assert!(rendered.contains("Step 2: Backtrack: try \"b\" for <S>\n    back to step 1\n"));
        assert!(rendered.contains("      * <S> -> b\n"));
        assert!(rendered.ends_with("Result: rejected after 3 steps (1 backtracking)\n"));
    }

    #[test]
    fn text_shows_reduction_spans() {
        let grammar = parse_str("<S> := <A><A>\n<A> := x | y").unwrap();
        let rendered = text("xy", &match_bottom_up(&grammar, "xy"));

        assert!(rendered.contains("    form:  <A><A>\n"));
        assert!(rendered.contains("      * <A><A> -> <S> (positions 1-2)\n"));
        assert!(rendered.ends_with("Result: accepted after 5 steps (0 backtracking)\n"));
    }

    #[test]
    fn text_shows_empty_reductions() {
        let grammar = parse_str("<S> := <A>\n<A> :=").unwrap();
        let rendered = text("", &match_bottom_up(&grammar, ""));

        assert!(rendered.starts_with("==  ==\n"));
        assert!(rendered.contains("Step 2: Reduce \"\" to <A>\n"));
        assert!(rendered.contains("      * [empty] -> <A> (before position 1)\n"));
        assert!(rendered.ends_with("Result: accepted after 4 steps (0 backtracking)\n"));
    }

    #[test]
    fn json_report() {
        let grammar = parse_str("<S> := ab | a").unwrap();
        let trace = match_top_down(&grammar, "ab");

        let mut out = Vec::new();
        render_json(&mut out, "ab", Strategy::TopDown, &trace).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["strategy"], "top-down");
        assert_eq!(json["verdict"], "accepted");
        assert_eq!(json["steps"].as_array().unwrap().len(), 3);
        assert_eq!(json["steps"][0]["action"]["kind"], "expand");
        assert_eq!(json["steps"][0]["form"][0]["type"], "terminal");
        assert_eq!(json["steps"][2]["success"], true);
    }
}
