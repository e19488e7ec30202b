use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use repairkit::exec::{
    CommandOutput, CommandResult, CommandStatus, FailurePhrases, OutputClassifier, Verdict,
};
use repairkit::notify::{Notifier, ProgressSink};
use repairkit::types::NoticeLevel;
use repairkit::update::{BoxFuture, PackageManager};

/// A fake package manager that:
/// - returns a fixed "outdated" listing (raw lines, blanks allowed)
/// - answers each upgrade with scripted output, classified by exit code and
///   the winget failure phrases unless another classifier is given
/// - records every upgraded id, in call order.
#[derive(Clone)]
pub struct FakePackageManager {
    listing: Vec<String>,
    scripted: HashMap<String, CommandResult>,
    classifier: OutputClassifier,
    upgrades: Arc<Mutex<Vec<String>>>,
    prerequisite_runs: Arc<AtomicUsize>,
}

impl FakePackageManager {
    pub fn new<I, S>(listing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            listing: listing.into_iter().map(Into::into).collect(),
            scripted: HashMap::new(),
            classifier: OutputClassifier::new().with_phrases(FailurePhrases::winget()),
            upgrades: Arc::new(Mutex::new(Vec::new())),
            prerequisite_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_classifier(mut self, classifier: OutputClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Script the exit code and output of `winget upgrade` for `id`.
    pub fn with_upgrade_output(mut self, id: &str, code: i32, lines: &[&str]) -> Self {
        self.scripted.insert(
            id.to_string(),
            CommandResult {
                status: CommandStatus::Exited(code),
                output: CommandOutput::from_lines(lines.iter().copied()),
            },
        );
        self
    }

    pub fn upgrades(&self) -> Vec<String> {
        self.upgrades.lock().unwrap().clone()
    }

    pub fn prerequisite_runs(&self) -> usize {
        self.prerequisite_runs.load(Ordering::SeqCst)
    }
}

impl PackageManager for FakePackageManager {
    fn install_prerequisites(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.prerequisite_runs.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn list_outdated(&self) -> BoxFuture<'_, Vec<String>> {
        Box::pin(async move { self.listing.clone() })
    }

    fn upgrade<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Verdict> {
        Box::pin(async move {
            self.upgrades.lock().unwrap().push(id.to_string());
            let result = self.scripted.get(id).cloned().unwrap_or_else(|| CommandResult {
                status: CommandStatus::Exited(0),
                output: CommandOutput::from_lines(["Successfully installed"]),
            });
            self.classifier.classify(&result)
        })
    }
}

/// Notifier that keeps every notice for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<(NoticeLevel, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|(_, m)| m).collect()
    }

    pub fn last_message(&self) -> Option<String> {
        self.notices().pop().map(|(_, m)| m)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

/// Progress sink recording completed step names in completion order.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    completed: Arc<Mutex<Vec<String>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn step_completed(&self, step: &str) {
        self.completed.lock().unwrap().push(step.to_string());
    }
}
