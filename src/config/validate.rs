// src/config/validate.rs

use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RepairKitError, Result};
use crate::exec::OutputClassifier;
use crate::update::ExclusionSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RepairKitError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let pause = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, pause))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<Duration> {
    let pause = validate_global_config(cfg)?;
    validate_update_patterns(cfg)?;
    validate_steps(cfg)?;
    validate_step_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(pause)
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<Duration> {
    parse_duration(&cfg.config.pause_between_updates).map_err(|e| {
        RepairKitError::ConfigError(format!("[config].pause_between_updates: {e}"))
    })
}

fn validate_update_patterns(cfg: &RawConfigFile) -> Result<()> {
    ExclusionSet::new(&cfg.updates.exclude)?;
    OutputClassifier::new().with_patterns(&cfg.updates.failure_patterns)?;
    Ok(())
}

fn validate_steps(cfg: &RawConfigFile) -> Result<()> {
    for (name, step) in cfg.step.iter() {
        if step.run.is_empty() {
            return Err(RepairKitError::ConfigError(format!(
                "step '{}' must have at least one command in `run`",
                name
            )));
        }
        if step.run.iter().any(|c| c.trim().is_empty()) {
            return Err(RepairKitError::ConfigError(format!(
                "step '{}' has a blank command in `run`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_step_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, step) in cfg.step.iter() {
        for dep in step.after.iter() {
            if dep == name {
                return Err(RepairKitError::ConfigError(format!(
                    "step '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.step.contains_key(dep) {
                return Err(RepairKitError::ConfigError(format!(
                    "step '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> step.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.step.keys() {
        graph.add_node(name.as_str());
    }

    for (name, step) in cfg.step.iter() {
        for dep in step.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(RepairKitError::DagCycle(format!(
            "cycle detected in step graph involving step '{}'",
            cycle.node_id()
        ))),
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
/// `"0"` is accepted without a unit.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration(" 250ms "), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("3d").is_err());
    }

    #[test]
    fn huge_durations_are_rejected_not_overflowed() {
        let err = parse_duration("18446744073709551615h").unwrap_err();
        assert!(err.contains("too large"));
        assert!(parse_duration("307445734561825861m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn huge_pause_is_a_config_error() {
        let mut raw = RawConfigFile::default();
        raw.config.pause_between_updates = "18446744073709551615h".to_string();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(RepairKitError::ConfigError(msg)) if msg.contains("too large")
        ));
    }

    #[test]
    fn default_raw_config_is_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(
            cfg.update_options().pause_between_updates,
            Duration::from_secs(3)
        );
        assert!(cfg.steps().is_empty());
    }
}
