// src/update/manager.rs

//! Pluggable package manager abstraction.
//!
//! The sequencer talks to a `PackageManager` instead of building command
//! lines itself, which keeps it testable with a fake implementation.
//! [`WinGetManager`] is the production implementation: PowerShell's
//! `Microsoft.WinGet.Client` module for discovery and `winget upgrade` for
//! each package.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::exec::{self, OutputClassifier, ProcessInvocation, Verdict};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait PackageManager: Send + Sync {
    /// Make sure the tooling needed by the other calls is installed.
    /// Must be idempotent.
    fn install_prerequisites(&self) -> BoxFuture<'_, ()>;

    /// Raw listing of outdated package ids, one per line. Blank lines are
    /// allowed and dropped by the caller.
    fn list_outdated(&self) -> BoxFuture<'_, Vec<String>>;

    /// Upgrade a single package and classify the result.
    fn upgrade<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Verdict>;
}

const PREREQUISITES: &[&str] = &[
    "Install-PackageProvider -Name NuGet -Force | Out-Null",
    "Install-Module -Name Microsoft.WinGet.Client -Force -Repository PSGallery | Out-Null",
];

const LIST_OUTDATED: &str = "Get-WinGetPackage -Source winget \
     | Where-Object IsUpdateAvailable | Select-Object -ExpandProperty Id";

#[derive(Debug, Clone)]
pub struct WinGetManager {
    classifier: OutputClassifier,
}

impl WinGetManager {
    pub fn new(classifier: OutputClassifier) -> Self {
        Self { classifier }
    }

    pub fn upgrade_command(id: &str) -> String {
        format!(
            "winget upgrade --id {id} --disable-interactivity --silent \
             --accept-package-agreements --accept-source-agreements"
        )
    }
}

impl PackageManager for WinGetManager {
    fn install_prerequisites(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            for cmd in PREREQUISITES {
                let status = exec::run_command(&ProcessInvocation::powershell(*cmd)).await;
                debug!(cmd, %status, "prerequisite installer finished");
            }
        })
    }

    fn list_outdated(&self) -> BoxFuture<'_, Vec<String>> {
        Box::pin(async move {
            let result = exec::command_output(&ProcessInvocation::powershell(LIST_OUTDATED)).await;
            if !result.success() {
                // Error text is not a package listing.
                warn!(status = %result.status, output = %result.output, "listing outdated packages failed");
                return Vec::new();
            }
            result.output.into_lines()
        })
    }

    fn upgrade<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Verdict> {
        Box::pin(async move {
            let cmd = Self::upgrade_command(id);
            let result = exec::command_output(&ProcessInvocation::powershell(cmd)).await;
            debug!(package = id, output = %result.output, "winget upgrade output");
            self.classifier.classify(&result)
        })
    }
}
