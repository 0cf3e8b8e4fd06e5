//! Stage dependency graph.
//!
//! Stages declare their dependencies by name; the graph validates every
//! reference and computes a topological order at construction time. This is
//! where the source system's runtime `{step_name_output}` lookups become
//! build-time errors.

use std::collections::BTreeMap;

use docintel_shared::{DocIntelError, Result};

/// Declaration of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Unique stage name.
    pub name: String,
    /// Names of stages whose results this stage consumes.
    pub depends_on: Vec<String>,
    /// Run even when a dependency failed, substituting documented defaults
    /// for the missing inputs.
    pub best_effort: bool,
}

impl StageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            best_effort: false,
        }
    }

    /// Add a dependency edge.
    pub fn depends_on(mut self, dep: impl Into<String>) -> Self {
        self.depends_on.push(dep.into());
        self
    }

    /// Mark this stage best-effort.
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }
}

/// A validated set of stages with a fixed topological execution order.
#[derive(Debug, Clone)]
pub struct StageGraph {
    stages: Vec<StageSpec>,
}

impl StageGraph {
    /// Validate stage declarations and compute a topological order.
    ///
    /// Fails fast with [`DocIntelError::UnresolvedDependency`] for unknown
    /// dependency names, and with a validation error for duplicate stage
    /// names or dependency cycles.
    pub fn new(stages: Vec<StageSpec>) -> Result<Self> {
        if stages.is_empty() {
            return Err(DocIntelError::validation("stage graph is empty"));
        }

        let mut indices: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, spec) in stages.iter().enumerate() {
            if indices.insert(spec.name.as_str(), i).is_some() {
                return Err(DocIntelError::validation(format!(
                    "duplicate stage name '{}'",
                    spec.name
                )));
            }
        }

        for spec in &stages {
            for dep in &spec.depends_on {
                if !indices.contains_key(dep.as_str()) {
                    return Err(DocIntelError::unresolved(&spec.name, dep));
                }
                if dep == &spec.name {
                    return Err(DocIntelError::validation(format!(
                        "stage '{}' depends on itself",
                        spec.name
                    )));
                }
            }
        }

        // Kahn's algorithm; any leftover nodes indicate a cycle.
        let mut in_degree: Vec<usize> = stages.iter().map(|s| s.depends_on.len()).collect();
        let mut order: Vec<usize> = Vec::with_capacity(stages.len());
        let mut ready: Vec<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();

        while let Some(i) = ready.pop() {
            order.push(i);
            for (j, spec) in stages.iter().enumerate() {
                if spec.depends_on.iter().any(|d| d == &stages[i].name) {
                    in_degree[j] -= 1;
                    if in_degree[j] == 0 {
                        ready.push(j);
                    }
                }
            }
        }

        if order.len() != stages.len() {
            let stuck: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, d)| **d > 0)
                .map(|(i, _)| stages[i].name.as_str())
                .collect();
            return Err(DocIntelError::validation(format!(
                "dependency cycle involving: {}",
                stuck.join(", ")
            )));
        }

        Ok(Self { stages })
    }

    /// All stage declarations.
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Look up a stage by name.
    pub fn get(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_graph_builds() {
        let graph = StageGraph::new(vec![
            StageSpec::new("a"),
            StageSpec::new("b").depends_on("a"),
            StageSpec::new("c").depends_on("a").depends_on("b"),
        ])
        .expect("valid graph");
        assert_eq!(graph.len(), 3);
        assert!(graph.get("b").is_some());
    }

    #[test]
    fn unknown_dependency_fails_fast() {
        let err = StageGraph::new(vec![StageSpec::new("a").depends_on("ghost")]).unwrap_err();
        assert!(matches!(
            err,
            DocIntelError::UnresolvedDependency { .. }
        ));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err =
            StageGraph::new(vec![StageSpec::new("a"), StageSpec::new("a")]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn cycle_rejected() {
        let err = StageGraph::new(vec![
            StageSpec::new("a").depends_on("b"),
            StageSpec::new("b").depends_on("a"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn self_dependency_rejected() {
        let err = StageGraph::new(vec![StageSpec::new("a").depends_on("a")]).unwrap_err();
        assert!(err.to_string().contains("depends on itself"));
    }

    #[test]
    fn empty_graph_rejected() {
        assert!(StageGraph::new(vec![]).is_err());
    }
}
