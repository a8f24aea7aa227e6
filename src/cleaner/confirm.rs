use colored::*;
use serde::Serialize;
use std::io::{BufRead, Write};

use crate::common::format;

/// What the operator is asked about
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    /// e.g. "Dependencies" or "node_modules"
    pub subject: String,
    pub description: String,
    /// A few member paths, already formatted
    pub preview: Vec<String>,
    /// How many members there are in total
    pub member_count: usize,
    pub size_kb: u64,
}

/// The gate's answer for one subject
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CleanupDecision {
    pub subject: String,
    pub approved: bool,
}

/// Anything that can approve or decline a cleanup step
pub trait Confirm {
    fn confirm(&mut self, request: &ConfirmRequest) -> CleanupDecision;
}

/// Interactive yes/no prompt. Permissive when exploring (dry run defaults to
/// yes), conservative when deleting (defaults to no). With `assume_yes` it
/// approves everything without reading input.
pub struct ConfirmationGate<R, W> {
    input: R,
    output: W,
    dry_run: bool,
    assume_yes: bool,
}

impl ConfirmationGate<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Gate on the process's stdin/stdout
    pub fn stdio(dry_run: bool, assume_yes: bool) -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout(), dry_run, assume_yes)
    }
}

impl<R: BufRead, W: Write> ConfirmationGate<R, W> {
    pub fn new(input: R, output: W, dry_run: bool, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            dry_run,
            assume_yes,
        }
    }

    fn default_answer(&self) -> bool {
        self.dry_run
    }

    fn present(&mut self, request: &ConfirmRequest) -> std::io::Result<()> {
        let out = &mut self.output;
        writeln!(out)?;
        writeln!(
            out,
            "  {} {}  {}",
            "❓",
            request.subject.bold(),
            request.description.dimmed()
        )?;
        writeln!(
            out,
            "     {}, {}",
            format::format_count(request.member_count),
            format::format_kb_colored(request.size_kb)
        )?;
        for item in &request.preview {
            writeln!(out, "       {} {}", "•".dimmed(), item.dimmed())?;
        }
        if request.member_count > request.preview.len() {
            writeln!(
                out,
                "       {} ... and {} more",
                "•".dimmed(),
                request.member_count - request.preview.len()
            )?;
        }

        let prompt = if self.dry_run {
            "Show what would be freed? [Y/n] "
        } else {
            "Delete these? [y/N] "
        };
        write!(out, "     {}", prompt)?;
        out.flush()
    }

    fn read_answer(&mut self) -> bool {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => self.default_answer(),
            Ok(_) => match line.trim().to_ascii_lowercase().as_str() {
                "" => self.default_answer(),
                "y" | "yes" => true,
                "n" | "no" => false,
                _ => false,
            },
        }
    }
}

impl<R: BufRead, W: Write> Confirm for ConfirmationGate<R, W> {
    fn confirm(&mut self, request: &ConfirmRequest) -> CleanupDecision {
        let approved = if self.assume_yes {
            true
        } else {
            if let Err(e) = self.present(request) {
                tracing::debug!(error = %e, "could not write confirmation prompt");
            }
            self.read_answer()
        };

        tracing::info!(
            target: "spacesweep::audit",
            subject = %request.subject,
            approved,
            size_kb = request.size_kb,
            "confirmation"
        );

        CleanupDecision {
            subject: request.subject.clone(),
            approved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn request() -> ConfirmRequest {
        ConfirmRequest {
            subject: "node_modules".into(),
            description: "deps".into(),
            preview: vec!["/a/node_modules".into(), "/b/node_modules".into()],
            member_count: 3,
            size_kb: 2048,
        }
    }

    fn ask(input: &str, dry_run: bool) -> (bool, String) {
        let mut out = Vec::new();
        let approved = {
            let mut gate = ConfirmationGate::new(Cursor::new(input.to_string()), &mut out, dry_run, false);
            gate.confirm(&request()).approved
        };
        (approved, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_destructive_defaults_to_no() {
        assert!(!ask("\n", false).0);
        assert!(!ask("", false).0);
    }

    #[test]
    fn test_dry_run_defaults_to_yes() {
        assert!(ask("\n", true).0);
        assert!(ask("", true).0);
    }

    #[test]
    fn test_explicit_answers() {
        assert!(ask("y\n", false).0);
        assert!(ask("YES\n", false).0);
        assert!(!ask("n\n", true).0);
        assert!(!ask("maybe\n", false).0);
    }

    #[test]
    fn test_prompt_shows_preview_and_remaining_count() {
        colored::control::set_override(false);
        let (_, shown) = ask("n\n", false);
        assert!(shown.contains("node_modules"));
        assert!(shown.contains("/a/node_modules"));
        assert!(shown.contains("and 1 more"));
        assert!(shown.contains("[y/N]"));
    }

    #[test]
    fn test_assume_yes_never_reads_or_prints() {
        let mut out = Vec::new();
        let mut gate = ConfirmationGate::new(Cursor::new("n\n"), &mut out, false, true);
        assert!(gate.confirm(&request()).approved);
        drop(gate);
        assert!(out.is_empty());
    }
}
