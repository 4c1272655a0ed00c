use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use thiserror::Error;

use super::definition::FilterDefinition;
use crate::types::FilterId;

/// Misuse of filter identifiers or an invalid dependency graph.
///
/// Always a programming or configuration bug, never a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unknown filter: {0}")]
    UnknownFilter(FilterId),
    #[error("Duplicate filter definition: {0}")]
    DuplicateFilter(FilterId),
    #[error("Filter {filter} depends on unknown filter {ancestor}")]
    UnknownAncestor { filter: FilterId, ancestor: FilterId },
    #[error("Filter {0} depends on itself")]
    SelfDependency(FilterId),
    #[error("Dependency cycle among filters: {involved:?}")]
    DependencyCycle { involved: Vec<FilterId> },
}

/// Every filter known to an engine, with its dependency DAG resolved.
///
/// Read-only after construction.
#[derive(Debug, Clone)]
pub struct FilterDefinitionSet {
    definitions: Vec<FilterDefinition>,
    index: HashMap<FilterId, usize>,
    children: Vec<Vec<usize>>,
    topo: Vec<usize>,
    rank: Vec<usize>,
}

impl FilterDefinitionSet {
    pub fn new(definitions: Vec<FilterDefinition>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateFilter(def.id.clone()));
            }
        }

        // parent index -> dependent indices, one edge per distinct ancestor
        let mut children = vec![Vec::new(); definitions.len()];
        let mut in_degree = vec![0usize; definitions.len()];
        for (i, def) in definitions.iter().enumerate() {
            for ancestor in &def.depends_on {
                if *ancestor == def.id {
                    return Err(ConfigError::SelfDependency(def.id.clone()));
                }
                let parent = *index.get(ancestor).ok_or_else(|| ConfigError::UnknownAncestor {
                    filter: def.id.clone(),
                    ancestor: ancestor.clone(),
                })?;
                if !children[parent].contains(&i) {
                    children[parent].push(i);
                    in_degree[i] += 1;
                }
            }
        }

        // Kahn's algorithm, always taking the earliest-declared ready filter so
        // the order is stable with respect to declaration order.
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        let mut topo = Vec::with_capacity(definitions.len());
        while let Some(Reverse(node)) = ready.pop() {
            topo.push(node);
            for &child in &children[node] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    ready.push(Reverse(child));
                }
            }
        }

        if topo.len() != definitions.len() {
            let involved = in_degree
                .iter()
                .enumerate()
                .filter(|(_, degree)| **degree > 0)
                .map(|(i, _)| definitions[i].id.clone())
                .collect();
            return Err(ConfigError::DependencyCycle { involved });
        }

        let mut rank = vec![0usize; definitions.len()];
        for (position, &node) in topo.iter().enumerate() {
            rank[node] = position;
        }

        Ok(Self {
            definitions,
            index,
            children,
            topo,
            rank,
        })
    }

    pub fn get(&self, id: &str) -> Result<&FilterDefinition, ConfigError> {
        self.index
            .get(id)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| ConfigError::UnknownFilter(FilterId::new(id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Every filter that transitively depends on `id`, in topological order,
    /// each exactly once. `id` itself is not included.
    pub fn descendants_of(&self, id: &str) -> Result<Vec<&FilterDefinition>, ConfigError> {
        let start = self.position(id)?;

        // Breadth expansion from the changed filter; the visited mark keeps
        // diamond-shaped graphs from yielding a filter twice.
        let mut visited = vec![false; self.definitions.len()];
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        let mut found = Vec::new();
        while let Some(node) = queue.pop_front() {
            for &child in &self.children[node] {
                if !visited[child] {
                    visited[child] = true;
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }

        found.sort_by_key(|&i| self.rank[i]);
        Ok(found.into_iter().map(|i| &self.definitions[i]).collect())
    }

    /// Every filter `id` transitively depends on, in topological order.
    pub fn ancestors_of(&self, id: &str) -> Result<Vec<&FilterDefinition>, ConfigError> {
        let start = self.position(id)?;

        let mut visited = vec![false; self.definitions.len()];
        let mut stack = vec![start];
        let mut found = Vec::new();
        while let Some(node) = stack.pop() {
            for ancestor in &self.definitions[node].depends_on {
                let parent = self.index[ancestor];
                if !visited[parent] {
                    visited[parent] = true;
                    found.push(parent);
                    stack.push(parent);
                }
            }
        }

        found.sort_by_key(|&i| self.rank[i]);
        Ok(found.into_iter().map(|i| &self.definitions[i]).collect())
    }

    /// Filters with no ancestors, in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.definitions.iter().filter(|d| d.depends_on.is_empty())
    }

    /// All filters, ancestors before descendants.
    pub fn topological_order(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.topo.iter().map(|&i| &self.definitions[i])
    }

    /// All filters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize, ConfigError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ConfigError::UnknownFilter(FilterId::new(id)))
    }
}
