//! Arena-backed forest for bulk work over the whole hierarchy
//!
//! Built once from all rows: every node keeps its parent index and child
//! indices. Single-person checks do not need this; they use the walker's
//! per-level queries instead of loading everything.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::aggregator::SubtreeMetrics;
use crate::types::{Person, PersonId};

#[derive(Debug, Clone)]
pub struct Node {
    pub person: Person,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Structural problems found while building or auditing the forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestIssue {
    /// `parent_id` names a person that does not exist; treated as a root
    DanglingParent { id: PersonId, parent: PersonId },
    /// The same id appears on more than one row; the earliest row wins
    DuplicateId { id: PersonId },
    /// These people are each other's ancestors
    Cycle { members: Vec<PersonId> },
}

impl fmt::Display for ForestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestIssue::DanglingParent { id, parent } => {
                write!(f, "{} points to missing parent {}", id, parent)
            }
            ForestIssue::DuplicateId { id } => write!(f, "{} appears more than once", id),
            ForestIssue::Cycle { members } => {
                let ids: Vec<&str> = members.iter().map(|m| m.as_str()).collect();
                write!(f, "cycle through {}", ids.join(" -> "))
            }
        }
    }
}

pub struct Forest {
    nodes: Vec<Node>,
    index: HashMap<PersonId, usize>,
    build_issues: Vec<ForestIssue>,
}

impl Forest {
    pub fn build(mut people: Vec<Person>) -> Self {
        people.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut nodes: Vec<Node> = Vec::with_capacity(people.len());
        let mut index = HashMap::with_capacity(people.len());
        let mut build_issues = Vec::new();

        for person in people {
            if index.contains_key(&person.id) {
                build_issues.push(ForestIssue::DuplicateId {
                    id: person.id.clone(),
                });
                continue;
            }
            index.insert(person.id.clone(), nodes.len());
            nodes.push(Node {
                person,
                parent: None,
                children: Vec::new(),
            });
        }

        for i in 0..nodes.len() {
            let Some(parent_id) = nodes[i].person.parent_id.clone() else {
                continue;
            };
            match index.get(&parent_id) {
                Some(&p) => {
                    nodes[i].parent = Some(p);
                    nodes[p].children.push(i);
                }
                None => build_issues.push(ForestIssue::DanglingParent {
                    id: nodes[i].person.id.clone(),
                    parent: parent_id,
                }),
            }
        }

        Self {
            nodes,
            index,
            build_issues,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &PersonId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// People with no (existing) parent, oldest registration first
    pub fn roots(&self) -> Vec<&Person> {
        self.nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| &n.person)
            .collect()
    }

    /// Descendants of `id` with their levels, breadth-first
    pub fn descendants(&self, id: &PersonId) -> Vec<(&Person, u32)> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };

        let mut seen = vec![false; self.nodes.len()];
        seen[start] = true;
        let mut queue: VecDeque<(usize, u32)> = VecDeque::from([(start, 0)]);
        let mut out = Vec::new();

        while let Some((i, level)) = queue.pop_front() {
            for &child in &self.nodes[i].children {
                if seen[child] {
                    continue;
                }
                seen[child] = true;
                out.push((&self.nodes[child].person, level + 1));
                queue.push_back((child, level + 1));
            }
        }

        out
    }

    pub fn metrics(&self, id: &PersonId) -> SubtreeMetrics {
        let mut metrics = SubtreeMetrics::default();
        for (person, level) in self.descendants(id) {
            metrics.record(person.rank, level);
        }
        metrics
    }

    /// Parent-pointer cycles; each person has one parent, so every cycle is
    /// found by following parents until a node repeats.
    pub fn find_cycles(&self) -> Vec<Vec<PersonId>> {
        // 0 = unvisited, 1 = on current path, 2 = resolved
        let mut state = vec![0u8; self.nodes.len()];
        let mut cycles = Vec::new();

        for start in 0..self.nodes.len() {
            let mut path = Vec::new();
            let mut current = Some(start);

            while let Some(i) = current {
                match state[i] {
                    2 => break,
                    1 => {
                        if let Some(pos) = path.iter().position(|&p| p == i) {
                            cycles.push(
                                path[pos..]
                                    .iter()
                                    .map(|&n: &usize| self.nodes[n].person.id.clone())
                                    .collect(),
                            );
                        }
                        break;
                    }
                    _ => {
                        state[i] = 1;
                        path.push(i);
                        current = self.nodes[i].parent;
                    }
                }
            }

            for i in path {
                state[i] = 2;
            }
        }

        cycles
    }

    /// All structural problems: build-time findings plus cycles
    pub fn audit(&self) -> Vec<ForestIssue> {
        let mut issues = self.build_issues.clone();
        issues.extend(
            self.find_cycles()
                .into_iter()
                .map(|members| ForestIssue::Cycle { members }),
        );
        issues
    }
}
