// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;
use crate::exec::{FailurePhrases, OutputClassifier};
use crate::tasks::TaskExecutor;
use crate::types::Shell;
use crate::update::{ExclusionSet, UpdateOptions};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// max_parallel = 4
/// pause_between_updates = "3s"
///
/// [updates]
/// exclude = ["Mozilla.*", "Discord.Discord"]
///
/// [step.restore_point]
/// run = ["wmic.exe /Namespace:\\\\root\\default Path SystemRestore Call CreateRestorePoint \"RepairKit\", 100, 7"]
///
/// [step.flush_dns]
/// run = ["ipconfig /flushdns"]
/// after = ["restore_point"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub updates: UpdatesSection,

    /// All maintenance steps from `[step.<name>]`, keyed by step name.
    #[serde(default)]
    pub step: BTreeMap<String, StepConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Upper bound on tasks running at once; `0` means unbounded.
    #[serde(default)]
    pub max_parallel: usize,

    /// Duration string such as `"3s"` or `"500ms"`.
    #[serde(default = "default_pause_between_updates")]
    pub pause_between_updates: String,
}

fn default_pause_between_updates() -> String {
    "3s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_parallel: 0,
            pause_between_updates: default_pause_between_updates(),
        }
    }
}

/// `[updates]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatesSection {
    /// Package id globs to skip (see `ExclusionSet`).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Extra substrings that mark an upgrade as failed.
    #[serde(default)]
    pub failure_phrases: Vec<String>,

    /// Regexes that mark an upgrade as failed when any output line matches.
    #[serde(default)]
    pub failure_patterns: Vec<String>,

    /// Treat a non-zero exit code as failure.
    #[serde(default = "default_true")]
    pub check_exit_code: bool,

    /// Include the built-in winget failure phrases.
    #[serde(default = "default_true")]
    pub winget_phrases: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UpdatesSection {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            failure_phrases: Vec::new(),
            failure_patterns: Vec::new(),
            check_exit_code: true,
            winget_phrases: true,
        }
    }
}

/// `[step.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Commands run one after another, in order.
    pub run: Vec<String>,

    /// Steps that must have finished before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub shell: Shell,

    /// Start the commands without waiting for them.
    #[serde(default)]
    pub detach: bool,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (or `Default`), so
/// the durations, patterns and step graph inside are known to be valid.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    updates: UpdatesSection,
    step: BTreeMap<String, StepConfig>,
    pause_between_updates: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, pause_between_updates: Duration) -> Self {
        Self {
            config: raw.config,
            updates: raw.updates,
            step: raw.step,
            pause_between_updates,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn updates(&self) -> &UpdatesSection {
        &self.updates
    }

    pub fn steps(&self) -> &BTreeMap<String, StepConfig> {
        &self.step
    }

    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            pause_between_updates: self.pause_between_updates,
        }
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor::bounded(self.config.max_parallel)
    }

    /// Snapshot of `[updates].exclude` for one update run.
    pub fn exclusion_set(&self) -> Result<ExclusionSet> {
        ExclusionSet::new(&self.updates.exclude)
    }

    /// Classifier for `winget upgrade` results.
    pub fn classifier(&self) -> Result<OutputClassifier> {
        let mut phrases = if self.updates.winget_phrases {
            FailurePhrases::winget()
        } else {
            FailurePhrases::default()
        };
        phrases.extend(self.updates.failure_phrases.iter().cloned());

        OutputClassifier::new()
            .with_exit_code_check(self.updates.check_exit_code)
            .with_phrases(phrases)
            .with_patterns(&self.updates.failure_patterns)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default(), UpdateOptions::default().pause_between_updates)
    }
}
