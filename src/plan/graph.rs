// src/plan/graph.rs

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::ConfigFile;
use crate::errors::{RepairKitError, Result};
use crate::exec::ProcessInvocation;
use crate::types::{InvocationMode, Shell};

/// One maintenance step: commands run in order, after its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub name: String,
    pub commands: Vec<String>,
    pub after: Vec<String>,
    pub shell: Shell,
    pub detach: bool,
}

impl PlanStep {
    pub fn invocations(&self) -> impl Iterator<Item = ProcessInvocation> + '_ {
        let mode = if self.detach {
            InvocationMode::Detached
        } else {
            InvocationMode::Blocking
        };
        self.commands.iter().map(move |cmd| {
            ProcessInvocation::new(cmd.as_str())
                .with_shell(self.shell)
                .with_mode(mode)
        })
    }
}

/// Steps plus the order they run in.
///
/// Steps are grouped into waves: a step's wave is one past the deepest wave
/// among its dependencies. Waves run one after another; the steps of a wave
/// run in parallel. Within a wave, steps are sorted by name.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    steps: BTreeMap<String, PlanStep>,
    waves: Vec<Vec<String>>,
}

impl Plan {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let steps = cfg
            .steps()
            .iter()
            .map(|(name, sc)| {
                let step = PlanStep {
                    name: name.clone(),
                    commands: sc.run.clone(),
                    after: sc.after.clone(),
                    shell: sc.shell,
                    detach: sc.detach,
                };
                (name.clone(), step)
            })
            .collect();
        Self::from_steps(steps)
    }

    pub fn from_steps(steps: BTreeMap<String, PlanStep>) -> Result<Self> {
        let waves = compute_waves(&steps)?;
        Ok(Self { steps, waves })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, name: &str) -> Option<&PlanStep> {
        self.steps.get(name)
    }

    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }
}

fn compute_waves(steps: &BTreeMap<String, PlanStep>) -> Result<Vec<Vec<String>>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for name in steps.keys() {
        graph.add_node(name.as_str());
    }
    for (name, step) in steps {
        for dep in &step.after {
            if !steps.contains_key(dep) {
                return Err(RepairKitError::ConfigError(format!(
                    "step '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        RepairKitError::DagCycle(format!(
            "cycle detected in step graph involving step '{}'",
            cycle.node_id()
        ))
    })?;

    let mut depth: HashMap<&str, usize> = HashMap::new();
    for name in order {
        let d = steps[name]
            .after
            .iter()
            .filter_map(|dep| depth.get(dep.as_str()))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depth.insert(name, d);
    }

    let mut waves: Vec<Vec<String>> = Vec::new();
    for (name, d) in depth {
        if waves.len() <= d {
            waves.resize_with(d + 1, Vec::new);
        }
        waves[d].push(name.to_string());
    }
    for wave in &mut waves {
        wave.sort();
    }

    Ok(waves)
}
