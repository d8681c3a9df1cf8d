//! TaskGraphBuilder: dependency graph over a user's tasks.
//!
//! Design:
//! - Arena of task ids sorted lexicographically; edges are stored as index lists.
//!   Sorting the arena makes every traversal order (and therefore every error and
//!   every ranking built on top) deterministic.
//! - `depends_on[i]` holds the direct blockers of task i; `blocks[i]` the inverse.
//! - Cycles are rejected outright. Dropping an edge to "fix" a cycle would change
//!   which work gates which deadline, so the caller has to repair the data.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::task::{BlockingEdge, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    ids: Vec<String>,
    index: BTreeMap<String, usize>,
    depends_on: Vec<Vec<usize>>,
    blocks: Vec<Vec<usize>>,
}

/// Serializable view of one node, for debugging and visualisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub depends_on: Vec<String>,
    pub blocks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

pub struct TaskGraphBuilder;

impl TaskGraphBuilder {
    /// Build and validate the graph. Pure function of its inputs.
    pub fn build(tasks: &[Task], edges: &[BlockingEdge]) -> Result<DependencyGraph> {
        let mut by_id: BTreeMap<&str, &Task> = BTreeMap::new();
        for t in tasks {
            if by_id.insert(t.id.as_str(), t).is_some() {
                return Err(EngineError::DuplicateTask { task_id: t.id.clone() });
            }
        }

        let ids: Vec<String> = by_id.keys().map(|id| id.to_string()).collect();
        let index: BTreeMap<String, usize> =
            ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();

        let mut depends_on: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); ids.len()];
        let mut blocks: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); ids.len()];

        for edge in edges {
            let dependent = by_id.get(edge.task_id.as_str()).ok_or_else(|| {
                EngineError::unknown_task(
                    edge.task_id.clone(),
                    format!("edge blocked by '{}'", edge.blocked_by_task_id),
                )
            })?;
            let blocker = by_id.get(edge.blocked_by_task_id.as_str()).ok_or_else(|| {
                EngineError::unknown_task(
                    edge.blocked_by_task_id.clone(),
                    format!("blocker of '{}'", edge.task_id),
                )
            })?;
            if blocker.owner_id != dependent.owner_id {
                return Err(EngineError::ForeignTask {
                    task_id: blocker.id.clone(),
                    owner_id: blocker.owner_id.clone(),
                    expected_owner: dependent.owner_id.clone(),
                });
            }

            let d = index[dependent.id.as_str()];
            let b = index[blocker.id.as_str()];
            depends_on[d].insert(b);
            blocks[b].insert(d);
        }

        let graph = DependencyGraph {
            ids,
            index,
            depends_on: depends_on.into_iter().map(|s| s.into_iter().collect()).collect(),
            blocks: blocks.into_iter().map(|s| s.into_iter().collect()).collect(),
        };

        graph.check_acyclic()?;

        debug!(
            tasks = graph.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        Ok(graph)
    }
}

impl DependencyGraph {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.depends_on.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    fn idx(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::unknown_task(id, "not in dependency graph"))
    }

    /// Direct blockers of `id`, sorted.
    pub fn depends_on(&self, id: &str) -> Result<Vec<&str>> {
        let i = self.idx(id)?;
        Ok(self.depends_on[i].iter().map(|&j| self.ids[j].as_str()).collect())
    }

    /// Tasks directly blocked by `id`, sorted.
    pub fn blocks(&self, id: &str) -> Result<Vec<&str>> {
        let i = self.idx(id)?;
        Ok(self.blocks[i].iter().map(|&j| self.ids[j].as_str()).collect())
    }

    /// The given tasks plus everything that transitively blocks them. Sorted.
    pub fn with_transitive_blockers<'a, I>(&self, roots: I) -> Result<Vec<&str>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.reachable_blockers(roots, |_| true)
    }

    /// Like `with_transitive_blockers`, but only nodes accepted by `include` are
    /// collected or walked through. Used to stop at settled work.
    pub fn reachable_blockers<'a, I, F>(&self, roots: I, include: F) -> Result<Vec<&str>>
    where
        I: IntoIterator<Item = &'a str>,
        F: Fn(&str) -> bool,
    {
        let mut seen: BTreeSet<usize> = BTreeSet::new();
        let mut stack: Vec<usize> = Vec::new();
        for id in roots {
            let i = self.idx(id)?;
            if include(self.ids[i].as_str()) && seen.insert(i) {
                stack.push(i);
            }
        }
        while let Some(i) = stack.pop() {
            for &b in &self.depends_on[i] {
                if include(self.ids[b].as_str()) && seen.insert(b) {
                    stack.push(b);
                }
            }
        }
        Ok(seen.into_iter().map(|i| self.ids[i].as_str()).collect())
    }

    /// Blockers before the tasks they block; ties broken by id.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut indegree: Vec<usize> = self.depends_on.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = (0..self.len()).filter(|&i| indegree[i] == 0).collect();
        let mut out = Vec::with_capacity(self.len());

        while let Some(i) = ready.pop_first() {
            out.push(self.ids[i].as_str());
            for &d in &self.blocks[i] {
                indegree[d] -= 1;
                if indegree[d] == 0 {
                    ready.insert(d);
                }
            }
        }
        out
    }

    pub fn nodes(&self) -> Vec<GraphNode> {
        (0..self.len())
            .map(|i| GraphNode {
                id: self.ids[i].clone(),
                depends_on: self.depends_on[i].iter().map(|&j| self.ids[j].clone()).collect(),
                blocks: self.blocks[i].iter().map(|&j| self.ids[j].clone()).collect(),
            })
            .collect()
    }

    /// Iterative depth-first search along `blocks` edges with an explicit stack.
    /// A back edge to a node still on the stack is a cycle; the reported path
    /// reads in blocking order and repeats its first id at the end.
    fn check_acyclic(&self) -> Result<()> {
        let mut mark = vec![Mark::Unvisited; self.len()];

        for start in 0..self.len() {
            if mark[start] != Mark::Unvisited {
                continue;
            }
            mark[start] = Mark::OnStack;
            // (node, next child offset)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let Some(&child) = self.blocks[node].get(frame.1) else {
                    mark[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                match mark[child] {
                    Mark::Unvisited => {
                        mark[child] = Mark::OnStack;
                        stack.push((child, 0));
                    }
                    Mark::OnStack => {
                        let from = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                        let mut task_ids: Vec<String> =
                            stack[from..].iter().map(|&(n, _)| self.ids[n].clone()).collect();
                        task_ids.push(self.ids[child].clone());
                        return Err(EngineError::CyclicDependency { task_ids });
                    }
                    Mark::Done => {}
                }
            }
        }
        Ok(())
    }
}
