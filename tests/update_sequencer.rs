// tests/update_sequencer.rs

mod common;
use crate::common::fakes::{FakePackageManager, RecordingNotifier};
use crate::common::{init_tracing, with_timeout};

use std::time::Duration;

use repairkit::exec::FailureReason;
use repairkit::types::NoticeLevel;
use repairkit::update::{
    ExclusionSet, PackageOutcome, RunSummary, UpdateOptions, UpdateSequencer,
};

fn no_pause() -> UpdateOptions {
    UpdateOptions {
        pause_between_updates: Duration::ZERO,
    }
}

#[tokio::test]
async fn excluded_packages_are_recorded_but_not_upgraded() {
    init_tracing();

    let manager = FakePackageManager::new(["A", "B", "", "C"]);
    let notifier = RecordingNotifier::new();
    let seq = UpdateSequencer::new(manager.clone(), notifier.clone(), no_pause());

    let exclusions = ExclusionSet::new(["b"]).unwrap();
    let report = with_timeout(seq.run(&exclusions)).await;

    assert_eq!(report.discovered, ["A", "B", "C"]);
    assert_eq!(manager.upgrades(), ["A", "C"]);
    assert_eq!(report.ledger.len(), 3);
    assert_eq!(report.excluded_count(), 1);
    assert_eq!(report.updated_count(), 2);
    assert_eq!(report.ledger.outcome_of("B"), Some(&PackageOutcome::Excluded));
    assert!(report.is_complete());
    assert_eq!(report.summary, RunSummary::Completed { updated: 2, failed: 0 });
    assert_eq!(manager.prerequisite_runs(), 1);

    let messages = notifier.messages();
    assert_eq!(messages.first().map(String::as_str), Some("Checking for outdated programs..."));
    assert!(messages.iter().any(|m| m.contains("close the following programs") && m.contains("- A")));
    assert_eq!(notifier.last_message().as_deref(), Some("All programs are up to date."));
}

#[tokio::test]
async fn empty_exclusion_set_upgrades_everything() {
    init_tracing();

    let manager = FakePackageManager::new(["Git.Git", "Mozilla.Firefox"]);
    let seq = UpdateSequencer::new(manager.clone(), RecordingNotifier::new(), no_pause());

    let report = with_timeout(seq.run(&ExclusionSet::empty())).await;

    assert_eq!(manager.upgrades(), ["Git.Git", "Mozilla.Firefox"]);
    assert_eq!(report.excluded_count(), 0);
}

#[tokio::test]
async fn nothing_outdated_skips_upgrades() {
    init_tracing();

    let manager = FakePackageManager::new(["", "   "]);
    let notifier = RecordingNotifier::new();
    let seq = UpdateSequencer::new(manager.clone(), notifier.clone(), no_pause());

    let report = with_timeout(seq.run(&ExclusionSet::empty())).await;

    assert!(manager.upgrades().is_empty());
    assert!(report.ledger.is_empty());
    assert_eq!(report.summary, RunSummary::NothingOutdated);
    assert_eq!(notifier.last_message().as_deref(), Some("No outdated programs found."));
}

#[tokio::test]
async fn everything_excluded_reports_nothing_to_do() {
    init_tracing();

    let manager = FakePackageManager::new(["Mozilla.Firefox", "Mozilla.Thunderbird"]);
    let notifier = RecordingNotifier::new();
    let seq = UpdateSequencer::new(manager.clone(), notifier.clone(), no_pause());

    let exclusions = ExclusionSet::new(["Mozilla.*"]).unwrap();
    let report = with_timeout(seq.run(&exclusions)).await;

    assert!(manager.upgrades().is_empty());
    assert_eq!(report.excluded_count(), 2);
    assert_eq!(report.summary, RunSummary::AllExcluded);
    assert!(!notifier.notices().iter().any(|(level, _)| *level == NoticeLevel::Warning));
}

#[tokio::test]
async fn failure_phrase_and_exit_code_are_recorded_as_failed() {
    init_tracing();

    let manager = FakePackageManager::new(["A", "B", "C"])
        .with_upgrade_output("A", 0, &["No available upgrade found."])
        .with_upgrade_output("B", 2, &["Installer failed"]);
    let notifier = RecordingNotifier::new();
    let seq = UpdateSequencer::new(manager.clone(), notifier.clone(), no_pause());

    let report = with_timeout(seq.run(&ExclusionSet::empty())).await;

    assert_eq!(manager.upgrades(), ["A", "B", "C"]);
    assert_eq!(
        report.ledger.outcome_of("A"),
        Some(&PackageOutcome::Failed(FailureReason::Phrase(
            "No available upgrade found".into()
        )))
    );
    assert_eq!(
        report.ledger.outcome_of("B"),
        Some(&PackageOutcome::Failed(FailureReason::ExitCode(2)))
    );
    assert_eq!(report.ledger.outcome_of("C"), Some(&PackageOutcome::Updated));
    assert_eq!(report.failed_count(), 2);
    assert!(notifier.messages().contains(&"Failed to update program: A".to_string()));
}

#[tokio::test(start_paused = true)]
async fn pauses_only_between_upgrades() {
    init_tracing();

    let manager = FakePackageManager::new(["A", "B", "C"]);
    let options = UpdateOptions {
        pause_between_updates: Duration::from_secs(3),
    };
    let seq = UpdateSequencer::new(manager, RecordingNotifier::new(), options);

    let started = tokio::time::Instant::now();
    seq.run(&ExclusionSet::empty()).await;

    // Two pauses for three packages, none after the last one. The clock is
    // paused, so only the sleeps move it.
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}

#[tokio::test]
async fn preview_does_not_upgrade() {
    init_tracing();

    let manager = FakePackageManager::new(["A", "B"]);
    let seq = UpdateSequencer::new(manager.clone(), RecordingNotifier::new(), no_pause());

    let exclusions = ExclusionSet::new(["A"]).unwrap();
    let preview = with_timeout(seq.preview(&exclusions)).await;

    assert_eq!(preview.partition.excluded, ["A"]);
    assert_eq!(preview.partition.remaining, ["B"]);
    assert!(manager.upgrades().is_empty());
}
