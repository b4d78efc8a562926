//! Named build tasks, their prerequisites and their execution.
//!
//! Tasks live in a directed graph where an edge points from a task to one of
//! its prerequisites. Defining a task that already exists merges the new
//! prerequisites into it, and an edge is never added twice, so registering the
//! same relationship repeatedly has no further effect.

use crate::cache::DownloadCache;
use crate::core::PrefetchError;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Work a task performs once its prerequisites are done.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskAction {
    /// Nothing; the task only groups its prerequisites
    #[default]
    None,
    /// Fetch `uri` through the download cache
    CacheFill {
        /// URI to cache
        uri: String,
    },
}

/// A named task in a [`TaskGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    name: String,
    action: TaskAction,
    multitask: bool,
    defined: bool,
}

impl Task {
    fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            action: TaskAction::None,
            multitask: false,
            defined: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &TaskAction {
        &self.action
    }

    /// Whether the prerequisites of this task run concurrently.
    pub fn is_multitask(&self) -> bool {
        self.multitask
    }

    /// Whether the task was defined, rather than only named as a prerequisite.
    pub fn is_defined(&self) -> bool {
        self.defined
    }
}

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// What an invocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Tasks whose action completed, in completion order
    pub completed: Vec<String>,
    /// URIs fetched by cache-fill actions
    pub cached_uris: Vec<String>,
    /// Total size of the fetched content
    pub cached_bytes: u64,
}

/// Graph of named tasks.
#[derive(Debug, Default)]
pub struct TaskGraph {
    graph: DiGraph<Task, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(Task::placeholder(name));
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    fn define(
        &mut self,
        name: &str,
        prerequisites: &[&str],
        action: TaskAction,
        multitask: bool,
    ) -> NodeIndex {
        let index = self.ensure_node(name);

        let task = &mut self.graph[index];
        task.defined = true;
        task.multitask |= multitask;
        if action != TaskAction::None {
            task.action = action;
        }

        for prerequisite in prerequisites {
            self.add_prerequisite(name, prerequisite);
        }

        index
    }

    /// Define (or extend) a task whose prerequisites run one at a time.
    pub fn task(&mut self, name: &str, prerequisites: &[&str], action: TaskAction) {
        self.define(name, prerequisites, action, false);
    }

    /// Define (or extend) a task whose prerequisites run concurrently.
    pub fn multitask(&mut self, name: &str, prerequisites: &[&str]) {
        self.define(name, prerequisites, TaskAction::None, true);
    }

    /// Make `prerequisite` a prerequisite of `task`.
    ///
    /// Returns `false` when the edge already existed.
    pub fn add_prerequisite(&mut self, task: &str, prerequisite: &str) -> bool {
        let from = self.ensure_node(task);
        let to = self.ensure_node(prerequisite);

        if self.graph.contains_edge(from, to) {
            false
        } else {
            self.graph.add_edge(from, to, ());
            true
        }
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.node_map.get(name).map(|&index| &self.graph[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Total number of prerequisite edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // petgraph yields the most recently added edge first
    fn prerequisite_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.neighbors(index).collect();
        indices.reverse();
        indices
    }

    /// Direct prerequisites of `name`, in the order they were added.
    pub fn prerequisites(&self, name: &str) -> Vec<String> {
        self.node_map
            .get(name)
            .map(|&index| {
                self.prerequisite_indices(index)
                    .into_iter()
                    .map(|idx| self.graph[idx].name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every task `name` depends on, directly or indirectly.
    pub fn transitive_prerequisites(&self, name: &str) -> HashSet<String> {
        let mut found = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(&index) = self.node_map.get(name) {
            queue.push_back(index);

            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors(current) {
                    if found.insert(self.graph[neighbor].name.clone()) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        found
    }

    /// Fail with [`PrefetchError::CircularTask`] if any task depends on itself.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|index| (index, Color::White)).collect();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Err(PrefetchError::CircularTask {
                    chain: cycle.join(" → "),
                }
                .into());
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        path.push(self.graph[node].name.clone());

        for neighbor in self.prerequisite_indices(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let name = &self.graph[neighbor].name;
                    let start = path.iter().position(|n| n == name).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(name.clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// All task names, every prerequisite before the tasks depending on it.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        self.detect_cycles()?;

        let indices = toposort(&self.graph, None).map_err(|cycle| PrefetchError::CircularTask {
            chain: self.graph[cycle.node_id()].name.clone(),
        })?;

        Ok(indices.into_iter().rev().map(|index| self.graph[index].name.clone()).collect())
    }

    /// Run `name` after all of its prerequisites.
    ///
    /// Every task reachable from `name` runs at most once. Tasks run in waves:
    /// a task starts only after every one of its prerequisites has finished.
    /// When `name` is a multitask, the tasks of one wave run concurrently, at
    /// most `max_parallel` at a time; otherwise one after another in the order
    /// their prerequisites were declared. A wave with failures ends the invocation with
    /// [`PrefetchError::TaskFailed`] after all of its tasks have finished.
    pub async fn invoke<C>(
        &self,
        name: &str,
        cache: &C,
        max_parallel: usize,
    ) -> Result<TaskReport>
    where
        C: DownloadCache + Sync,
    {
        let root = *self.node_map.get(name).ok_or_else(|| PrefetchError::TaskNotFound {
            name: name.to_string(),
        })?;
        self.detect_cycles()?;

        let order = self.execution_order(root);
        if let Some(undefined) = order.iter().find(|&&index| !self.graph[index].defined) {
            return Err(PrefetchError::TaskNotFound {
                name: self.graph[*undefined].name.clone(),
            }
            .into());
        }

        let concurrency = if self.graph[root].multitask {
            max_parallel.max(1)
        } else {
            1
        };

        tracing::debug!(
            "Invoking task '{}' with {} task(s) to run, concurrency {}",
            name,
            order.len(),
            concurrency
        );

        let mut report = TaskReport::default();
        for wave in self.waves(&order) {
            let results: Vec<(NodeIndex, Result<u64>)> = stream::iter(wave)
                .map(|index| async move { (index, self.run_action(index, cache).await) })
                .buffer_unordered(concurrency)
                .collect()
                .await;

            let mut failures = 0;
            for (index, result) in results {
                let task = &self.graph[index];
                match result {
                    Ok(bytes) => {
                        if let TaskAction::CacheFill {
                            uri,
                        } = &task.action
                        {
                            report.cached_uris.push(uri.clone());
                            report.cached_bytes += bytes;
                        }
                        report.completed.push(task.name.clone());
                    }
                    Err(e) => {
                        tracing::error!("Task '{}' failed: {:#}", task.name, e);
                        failures += 1;
                    }
                }
            }

            if failures > 0 {
                return Err(PrefetchError::TaskFailed {
                    task: name.to_string(),
                    failures,
                }
                .into());
            }
        }

        Ok(report)
    }

    async fn run_action<C>(&self, index: NodeIndex, cache: &C) -> Result<u64>
    where
        C: DownloadCache + Sync,
    {
        match &self.graph[index].action {
            TaskAction::None => Ok(0),
            TaskAction::CacheFill {
                uri,
            } => {
                tracing::info!("Caching {}", uri);
                let content = cache.get(uri).await?;
                Ok(content.len() as u64)
            }
        }
    }

    // Post-order from `root`: prerequisites first, each task once.
    fn execution_order(&self, root: NodeIndex) -> Vec<NodeIndex> {
        fn visit(
            graph: &TaskGraph,
            index: NodeIndex,
            seen: &mut HashSet<NodeIndex>,
            order: &mut Vec<NodeIndex>,
        ) {
            if !seen.insert(index) {
                return;
            }
            for prerequisite in graph.prerequisite_indices(index) {
                visit(graph, prerequisite, seen, order);
            }
            order.push(index);
        }

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        visit(self, root, &mut seen, &mut order);
        order
    }

    // Groups `order` by the length of the longest prerequisite chain below each
    // task; every wave only depends on earlier waves.
    fn waves(&self, order: &[NodeIndex]) -> Vec<Vec<NodeIndex>> {
        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        let mut waves: Vec<Vec<NodeIndex>> = Vec::new();

        for &index in order {
            let level = self
                .graph
                .neighbors(index)
                .filter_map(|prerequisite| depth.get(&prerequisite))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(index, level);

            if waves.len() <= level {
                waves.resize_with(level + 1, Vec::new);
            }
            waves[level].push(index);
        }

        waves
    }
}
