//! Rendering of command results as styled console lines.

use std::io::{self, Write};

use crossterm::style::{Attribute, Color, Stylize};
use flowsh_types::CommandOutcome;

/// Sink for rendered shell output.
///
/// The dispatcher renders through this trait so tests can capture lines and
/// their style class instead of scraping ANSI escapes.
pub trait ShellOutput {
    /// A success line (bold yellow on a terminal).
    fn success(&mut self, line: &str);

    /// A failure line (bold red on a terminal).
    fn failure(&mut self, line: &str);

    /// An unstyled line (listings, progress steps, entry echoes).
    fn line(&mut self, line: &str);
}

/// ANSI terminal sink. Write failures are swallowed: rendering never fails
/// for well-formed results, and a broken pipe mid-session has no better
/// handling than dropping the line.
pub struct AnsiOutput<W: Write> {
    out: W,
}

impl AnsiOutput<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> AnsiOutput<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ShellOutput for AnsiOutput<W> {
    fn success(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line.with(Color::Yellow).attribute(Attribute::Bold));
    }

    fn failure(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line.with(Color::Red).attribute(Attribute::Bold));
    }

    fn line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
    }
}

/// Style class of a recorded line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Success,
    Failure,
    Plain,
}

/// Recording sink for tests and previews; keeps every line with its style
/// class in emission order.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub lines: Vec<(LineStyle, String)>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShellOutput for RecordingOutput {
    fn success(&mut self, line: &str) {
        self.lines.push((LineStyle::Success, line.to_string()));
    }

    fn failure(&mut self, line: &str) {
        self.lines.push((LineStyle::Failure, line.to_string()));
    }

    fn line(&mut self, line: &str) {
        self.lines.push((LineStyle::Plain, line.to_string()));
    }
}

/// Render one command outcome against a success/failure template pair.
///
/// A boolean outcome emits exactly one line: the success template for
/// `true`, the failure template for `false`. A non-empty mapping emits the
/// success header plus one literal dump of every entry in gateway order. An
/// empty mapping emits only the failure line, even though it may merely
/// mean nothing needed recovery; that ambiguity is documented behavior
/// carried over from the node shell this mirrors, not an accident.
pub fn render(out: &mut dyn ShellOutput, outcome: &CommandOutcome, success: &str, failure: &str) {
    match outcome {
        CommandOutcome::Flag(true) => out.success(success),
        CommandOutcome::Flag(false) => out.failure(failure),
        CommandOutcome::Bulk(results) if results.is_empty() => out.failure(failure),
        CommandOutcome::Bulk(results) => {
            out.success(success);
            let entries: Vec<String> = results.iter().map(|(id, ok)| format!("{}={}", id, ok)).collect();
            out.success(&format!("Results: [{}]", entries.join(", ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use flowsh_types::FlowRunId;
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn flag_true_is_one_success_line() {
        let mut out = RecordingOutput::new();
        render(&mut out, &CommandOutcome::Flag(true), "Paused flow x", "Failed to pause flow x");
        assert_eq!(out.lines, vec![(LineStyle::Success, "Paused flow x".to_string())]);
    }

    #[test]
    fn flag_false_is_one_failure_line() {
        let mut out = RecordingOutput::new();
        render(&mut out, &CommandOutcome::Flag(false), "Paused flow x", "Failed to pause flow x");
        assert_eq!(out.lines, vec![(LineStyle::Failure, "Failed to pause flow x".to_string())]);
    }

    #[test]
    fn bulk_dump_lists_every_entry_in_order() {
        let first: FlowRunId = "00000000-0000-0000-0000-000000000001".parse().expect("uuid");
        let second: FlowRunId = "00000000-0000-0000-0000-000000000002".parse().expect("uuid");
        let mut results = IndexMap::new();
        results.insert(first, true);
        results.insert(second, false);

        let mut out = RecordingOutput::new();
        render(
            &mut out,
            &CommandOutcome::Bulk(results),
            "Recovered finality flow(s) ",
            "Failed to recover finality flow(s) ",
        );

        assert_eq!(out.lines.len(), 2);
        assert_eq!(out.lines[0], (LineStyle::Success, "Recovered finality flow(s) ".to_string()));
        assert_eq!(
            out.lines[1].1,
            "Results: [00000000-0000-0000-0000-000000000001=true, 00000000-0000-0000-0000-000000000002=false]"
        );
    }

    #[test]
    fn empty_bulk_is_only_the_failure_line() {
        let mut out = RecordingOutput::new();
        render(
            &mut out,
            &CommandOutcome::Bulk(IndexMap::new()),
            "Recovered finality flow(s) ",
            "Failed to recover finality flow(s) ",
        );
        assert_eq!(out.lines, vec![(LineStyle::Failure, "Failed to recover finality flow(s) ".to_string())]);
    }

    #[test]
    fn ansi_output_writes_plain_lines_verbatim() {
        let mut buffer = Vec::new();
        {
            let mut out = AnsiOutput::new(&mut buffer);
            out.line("MyFlow");
        }
        assert_eq!(String::from_utf8(buffer).expect("utf8"), "MyFlow\n");
    }
}
