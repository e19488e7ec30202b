#![allow(dead_code)]

use repairkit::config::{ConfigFile, RawConfigFile, StepConfig};
use repairkit::types::Shell;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        // Tests should not sit through the production pause.
        config.config.pause_between_updates = "0".to_string();
        Self { config }
    }

    pub fn with_step(mut self, name: &str, step: StepConfig) -> Self {
        self.config.step.insert(name.to_string(), step);
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.config.max_parallel = n;
        self
    }

    pub fn pause_between_updates(mut self, duration: &str) -> Self {
        self.config.config.pause_between_updates = duration.to_string();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.updates.exclude.push(pattern.to_string());
        self
    }

    pub fn failure_phrase(mut self, phrase: &str) -> Self {
        self.config.updates.failure_phrases.push(phrase.to_string());
        self
    }

    pub fn failure_pattern(mut self, pattern: &str) -> Self {
        self.config.updates.failure_patterns.push(pattern.to_string());
        self
    }

    pub fn check_exit_code(mut self, val: bool) -> Self {
        self.config.updates.check_exit_code = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            step: StepConfig {
                run: vec![cmd.to_string()],
                after: vec![],
                shell: Shell::Default,
                detach: false,
            },
        }
    }

    pub fn then(mut self, cmd: &str) -> Self {
        self.step.run.push(cmd.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.step.after.push(dep.to_string());
        self
    }

    pub fn shell(mut self, shell: Shell) -> Self {
        self.step.shell = shell;
        self
    }

    pub fn detach(mut self, val: bool) -> Self {
        self.step.detach = val;
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}
