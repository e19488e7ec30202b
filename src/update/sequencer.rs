// src/update/sequencer.rs

//! The "update all programs" workflow.
//!
//! Phases, in order:
//! 1. DISCOVER: install prerequisites, list outdated ids (blank lines dropped).
//! 2. FILTER: split off ids matched by the run's [`ExclusionSet`].
//! 3. UPDATE_EACH: upgrade the remaining ids one at a time, pausing between
//!    them so per-package notifications stay readable.
//! 4. REPORT: one summary notification.
//!
//! Every discovered id ends up in the [`UpdateLedger`] exactly once, as
//! updated, failed or excluded. No phase is fatal: a failed upgrade is
//! recorded and the run moves on.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::exec::{FailureReason, Verdict};
use crate::notify::Notifier;
use crate::types::NoticeLevel;
use crate::update::exclusion::{ExclusionSet, Partition};
use crate::update::manager::PackageManager;

pub const NOTHING_OUTDATED: &str = "No outdated programs found.";
pub const ALL_UP_TO_DATE: &str = "All programs are up to date.";
const CLOSE_PROGRAMS_HEADER: &str = "Make sure to close the following programs before proceeding:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Pause between two consecutive upgrades.
    pub pause_between_updates: Duration,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            pause_between_updates: Duration::from_secs(3),
        }
    }
}

/// How a discovered package was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Updated,
    Failed(FailureReason),
    Excluded,
}

/// Append-only record of the packages handled in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateLedger {
    entries: Vec<(String, PackageOutcome)>,
}

impl UpdateLedger {
    pub fn record(&mut self, id: impl Into<String>, outcome: PackageOutcome) {
        self.entries.push((id.into(), outcome));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, PackageOutcome)] {
        &self.entries
    }

    pub fn outcome_of(&self, id: &str) -> Option<&PackageOutcome> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&PackageOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| pred(o)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSummary {
    NothingOutdated,
    AllExcluded,
    Completed { updated: usize, failed: usize },
}

impl RunSummary {
    pub fn message(&self) -> String {
        match self {
            RunSummary::NothingOutdated | RunSummary::AllExcluded => NOTHING_OUTDATED.to_string(),
            RunSummary::Completed { failed: 0, .. } => ALL_UP_TO_DATE.to_string(),
            RunSummary::Completed { updated, failed } => {
                format!("Updated {updated} program(s); {failed} failed.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub discovered: Vec<String>,
    pub ledger: UpdateLedger,
    pub summary: RunSummary,
}

impl UpdateReport {
    pub fn excluded_count(&self) -> usize {
        self.ledger.count(|o| *o == PackageOutcome::Excluded)
    }

    pub fn updated_count(&self) -> usize {
        self.ledger.count(|o| *o == PackageOutcome::Updated)
    }

    pub fn failed_count(&self) -> usize {
        self.ledger.count(|o| matches!(o, PackageOutcome::Failed(_)))
    }

    pub fn is_complete(&self) -> bool {
        self.ledger.len() == self.discovered.len()
    }
}

/// Result of DISCOVER + FILTER without upgrading anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePreview {
    pub discovered: Vec<String>,
    pub partition: Partition,
}

pub struct UpdateSequencer<M, N> {
    manager: M,
    notifier: N,
    options: UpdateOptions,
}

impl<M: PackageManager, N: Notifier> UpdateSequencer<M, N> {
    pub fn new(manager: M, notifier: N, options: UpdateOptions) -> Self {
        Self {
            manager,
            notifier,
            options,
        }
    }

    /// Run DISCOVER and FILTER only.
    pub async fn preview(&self, exclusions: &ExclusionSet) -> UpdatePreview {
        let discovered = self.discover().await;
        let partition = exclusions.partition(&discovered);
        UpdatePreview {
            discovered,
            partition,
        }
    }

    /// Run the full workflow against an exclusion snapshot.
    pub async fn run(&self, exclusions: &ExclusionSet) -> UpdateReport {
        let discovered = self.discover().await;
        let mut ledger = UpdateLedger::default();

        if discovered.is_empty() {
            return self.finish(discovered, ledger, RunSummary::NothingOutdated);
        }

        // FILTER
        let partition = exclusions.partition(&discovered);
        for id in &partition.excluded {
            debug!(package = %id, "Skipping excluded program");
            ledger.record(id.as_str(), PackageOutcome::Excluded);
        }

        if partition.remaining.is_empty() {
            return self.finish(discovered, ledger, RunSummary::AllExcluded);
        }

        self.warn_about_running_programs(&partition.remaining);

        // UPDATE_EACH
        let mut updated = 0;
        let mut failed = 0;
        let last = partition.remaining.len() - 1;

        for (i, id) in partition.remaining.iter().enumerate() {
            self.notifier
                .notify(NoticeLevel::Info, &format!("Updating program: {id}"));

            match self.manager.upgrade(id).await {
                Verdict::Succeeded => {
                    updated += 1;
                    self.notifier
                        .notify(NoticeLevel::Info, &format!("Updated program: {id}"));
                    ledger.record(id.as_str(), PackageOutcome::Updated);
                }
                Verdict::Failed(reason) => {
                    failed += 1;
                    warn!(package = %id, %reason, "program update failed");
                    self.notifier
                        .notify(NoticeLevel::Warning, &format!("Failed to update program: {id}"));
                    ledger.record(id.as_str(), PackageOutcome::Failed(reason));
                }
            }

            if i < last && !self.options.pause_between_updates.is_zero() {
                sleep(self.options.pause_between_updates).await;
            }
        }

        // Every id has been awaited above, so the ledger is complete here.
        debug_assert_eq!(ledger.len(), discovered.len());

        self.finish(discovered, ledger, RunSummary::Completed { updated, failed })
    }

    async fn discover(&self) -> Vec<String> {
        self.notifier
            .notify(NoticeLevel::Info, "Checking for outdated programs...");

        self.manager.install_prerequisites().await;

        let programs: Vec<String> = self
            .manager
            .list_outdated()
            .await
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        info!(count = programs.len(), ?programs, "found outdated programs");
        programs
    }

    fn warn_about_running_programs(&self, remaining: &[String]) {
        let mut message = format!("{CLOSE_PROGRAMS_HEADER}\n");
        for id in remaining {
            message.push_str("\n- ");
            message.push_str(id);
        }
        self.notifier.notify(NoticeLevel::Warning, &message);
    }

    fn finish(
        &self,
        discovered: Vec<String>,
        ledger: UpdateLedger,
        summary: RunSummary,
    ) -> UpdateReport {
        let message = summary.message();
        info!(?summary, "update run finished");
        self.notifier.notify(NoticeLevel::Info, &message);

        UpdateReport {
            discovered,
            ledger,
            summary,
        }
    }
}
