// src/exec/classify.rs

//! Turning a finished invocation into a success/failure verdict.
//!
//! The exit code is the primary signal. Many Windows maintenance tools exit
//! with 0 and report problems only in their text, so two explicitly named
//! fallbacks exist on top of it:
//! - [`FailurePhrases`]: plain substring matches against the output.
//! - regex patterns from `[updates].failure_patterns`.

use std::fmt;

use regex::Regex;

use crate::errors::{RepairKitError, Result};
use crate::exec::output::{CommandResult, CommandStatus};

/// Phrases `winget upgrade` prints when an upgrade did not happen.
pub const WINGET_FAILURE_PHRASES: &[&str] = &[
    "The package cannot be upgraded",
    "This package's version number cannot be determined",
    "Installer hash does not match",
    "No available upgrade found",
];

/// Why a command was classified as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Spawn(String),
    ExitCode(i32),
    Terminated,
    Phrase(String),
    Pattern(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Spawn(msg) => write!(f, "process error: {msg}"),
            FailureReason::ExitCode(code) => write!(f, "exit code {code}"),
            FailureReason::Terminated => write!(f, "terminated without exit code"),
            FailureReason::Phrase(p) => write!(f, "output contained \"{p}\""),
            FailureReason::Pattern(p) => write!(f, "output matched /{p}/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Succeeded,
    Failed(FailureReason),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Succeeded)
    }
}

/// Substring fallback classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePhrases(Vec<String>);

impl FailurePhrases {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(phrases.into_iter().map(Into::into).collect())
    }

    pub fn winget() -> Self {
        Self::new(WINGET_FAILURE_PHRASES.iter().copied())
    }

    pub fn extend<I, S>(&mut self, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(phrases.into_iter().map(Into::into));
    }

    /// First phrase contained in any line of `result`'s output.
    pub fn find(&self, result: &CommandResult) -> Option<&str> {
        self.0
            .iter()
            .find(|p| result.output.contains(p))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct OutputClassifier {
    check_exit_code: bool,
    phrases: FailurePhrases,
    patterns: Vec<Regex>,
}

impl Default for OutputClassifier {
    fn default() -> Self {
        Self {
            check_exit_code: true,
            phrases: FailurePhrases::default(),
            patterns: Vec::new(),
        }
    }
}

impl OutputClassifier {
    /// Exit code only, no text fallbacks.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit_code_check(mut self, check: bool) -> Self {
        self.check_exit_code = check;
        self
    }

    pub fn with_phrases(mut self, phrases: FailurePhrases) -> Self {
        self.phrases = phrases;
        self
    }

    pub fn with_patterns(mut self, patterns: &[String]) -> Result<Self> {
        for pat in patterns {
            let re = Regex::new(pat).map_err(|e| {
                RepairKitError::InvalidPattern(format!("failure pattern '{pat}': {e}"))
            })?;
            self.patterns.push(re);
        }
        Ok(self)
    }

    pub fn classify(&self, result: &CommandResult) -> Verdict {
        match &result.status {
            CommandStatus::SpawnFailed(msg) | CommandStatus::Io(msg) => {
                return Verdict::Failed(FailureReason::Spawn(msg.clone()));
            }
            CommandStatus::Terminated if self.check_exit_code => {
                return Verdict::Failed(FailureReason::Terminated);
            }
            CommandStatus::Exited(code) if self.check_exit_code && *code != 0 => {
                return Verdict::Failed(FailureReason::ExitCode(*code));
            }
            _ => {}
        }

        if let Some(phrase) = self.phrases.find(result) {
            return Verdict::Failed(FailureReason::Phrase(phrase.to_string()));
        }

        for re in &self.patterns {
            if result.output.lines().iter().any(|l| re.is_match(l)) {
                return Verdict::Failed(FailureReason::Pattern(re.as_str().to_string()));
            }
        }

        Verdict::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::output::CommandOutput;

    fn result(code: i32, lines: &[&str]) -> CommandResult {
        CommandResult {
            status: CommandStatus::Exited(code),
            output: CommandOutput::from_lines(lines.iter().copied()),
        }
    }

    #[test]
    fn non_zero_exit_fails_when_checked() {
        let c = OutputClassifier::new();
        assert_eq!(
            c.classify(&result(1, &["ok"])),
            Verdict::Failed(FailureReason::ExitCode(1))
        );

        let c = OutputClassifier::new().with_exit_code_check(false);
        assert_eq!(c.classify(&result(1, &["ok"])), Verdict::Succeeded);
    }

    #[test]
    fn phrase_fallback_catches_zero_exit_failures() {
        let c = OutputClassifier::new().with_phrases(FailurePhrases::winget());
        let verdict = c.classify(&result(0, &["Found Foo", "No available upgrade found."]));
        assert_eq!(
            verdict,
            Verdict::Failed(FailureReason::Phrase("No available upgrade found".into()))
        );
        assert!(c.classify(&result(0, &["Successfully installed"])).is_success());
    }

    #[test]
    fn patterns_are_checked_per_line() {
        let c = OutputClassifier::new()
            .with_patterns(&["^error \\d+$".to_string()])
            .unwrap();
        assert!(!c.classify(&result(0, &["warming up", "error 42"])).is_success());
        assert!(c.classify(&result(0, &["no error 42 here"])).is_success());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = OutputClassifier::new().with_patterns(&["(".to_string()]);
        assert!(matches!(err, Err(RepairKitError::InvalidPattern(_))));
    }

    #[test]
    fn spawn_failure_always_fails() {
        let c = OutputClassifier::new().with_exit_code_check(false);
        let r = CommandResult {
            status: CommandStatus::SpawnFailed("not found".into()),
            output: CommandOutput::empty(),
        };
        assert_eq!(
            c.classify(&r),
            Verdict::Failed(FailureReason::Spawn("not found".into()))
        );
    }
}
