//! Dependency graph over `requires` edges.

use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Directed graph whose nodes keep insertion order.
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph<'a> {
    nodes: Vec<&'a str>,
    edges: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> DependencyGraph<'a> {
    /// Adds a node; repeated ids keep their first position.
    pub(crate) fn add_node(&mut self, id: &'a str) {
        if !self.edges.contains_key(id) {
            self.nodes.push(id);
            self.edges.insert(id, Vec::new());
        }
    }

    /// Adds `from -> to`; edges to unknown nodes are ignored during traversal.
    pub(crate) fn add_edge(&mut self, from: &'a str, to: &'a str) {
        self.add_node(from);
        if let Some(targets) = self.edges.get_mut(from) {
            if !targets.contains(&to) {
                targets.push(to);
            }
        }
    }

    /// Depth-first search with a recursion stack. Every back edge closes one
    /// cycle, returned as the path from the edge's target down to the node
    /// that points back at it, in discovery order. A self-requirement is a
    /// one-node path.
    pub(crate) fn cycles(&self) -> Vec<Vec<&'a str>> {
        let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
        let mut found = Vec::new();

        for &root in &self.nodes {
            if marks.contains_key(root) {
                continue;
            }
            marks.insert(root, Mark::OnStack);
            let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];

            while let Some((node, next)) = stack.pop() {
                let targets = self.edges.get(node).map_or(&[][..], Vec::as_slice);
                let Some(&target) = targets.get(next) else {
                    marks.insert(node, Mark::Done);
                    continue;
                };
                stack.push((node, next + 1));

                if !self.edges.contains_key(target) {
                    continue;
                }
                match marks.get(target) {
                    Some(Mark::OnStack) => {
                        let start = stack
                            .iter()
                            .position(|&(id, _)| id == target)
                            .unwrap_or(stack.len() - 1);
                        found.push(stack[start..].iter().map(|&(id, _)| id).collect());
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(target, Mark::OnStack);
                        stack.push((target, 0));
                    }
                }
            }
        }

        found
    }
}
