//! Link graph analysis.
//!
//! Builds an undirected adjacency view of a [`Topology`] and answers the
//! structural questions the builder and emulator need: is the graph a tree,
//! which path joins two nodes, how many simple paths exist between them.

use super::types::{Link, Topology};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Undirected adjacency view of a topology's link set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
    link_count: usize,
}

impl LinkGraph {
    /// Build a graph from node names and links.
    ///
    /// Nodes without links are kept so that isolated nodes show up as a
    /// disconnected graph instead of disappearing.
    pub fn new<'a, N, L>(nodes: N, links: L) -> Self
    where
        N: IntoIterator<Item = &'a str>,
        L: IntoIterator<Item = &'a Link>,
    {
        let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for node in nodes {
            adjacency.entry(node.to_string()).or_default();
        }

        let mut seen = BTreeSet::new();
        for link in links {
            let (a, b) = link.key();
            if !seen.insert((a.to_string(), b.to_string())) {
                continue;
            }
            adjacency.entry(a.to_string()).or_default().insert(b.to_string());
            adjacency.entry(b.to_string()).or_default().insert(a.to_string());
        }

        Self { adjacency, link_count: seen.len() }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_count
    }

    pub fn contains(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn neighbors(&self, node: &str) -> impl Iterator<Item = &str> {
        self.adjacency.get(node).into_iter().flatten().map(String::as_str)
    }

    /// All nodes reachable from the first node (in name order) form the whole graph
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.adjacency.keys().next() else {
            return true;
        };
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([start.as_str()]);
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            queue.extend(self.neighbors(node).filter(|n| !visited.contains(n)));
        }
        visited.len() == self.adjacency.len()
    }

    /// Connected with exactly `nodes - 1` links
    pub fn is_tree(&self) -> bool {
        !self.adjacency.is_empty()
            && self.link_count == self.adjacency.len() - 1
            && self.is_connected()
    }

    /// Shortest path from `from` to `to`, both ends included.
    ///
    /// In a tree this is the only simple path.
    pub fn path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        let mut parent: BTreeMap<&str, &str> = BTreeMap::new();
        let mut visited = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![to.to_string()];
                let mut current = to;
                while let Some(prev) = parent.get(current) {
                    path.push(prev.to_string());
                    current = *prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.neighbors(node) {
                if visited.insert(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Count simple paths between two distinct nodes by exhaustive search
    pub fn simple_path_count(&self, from: &str, to: &str) -> usize {
        if !self.contains(from) || !self.contains(to) || from == to {
            return 0;
        }
        let mut on_path = BTreeSet::new();
        self.count_paths(from, to, &mut on_path)
    }

    fn count_paths<'a>(
        &'a self,
        node: &'a str,
        to: &str,
        on_path: &mut BTreeSet<&'a str>,
    ) -> usize {
        if node == to {
            return 1;
        }
        on_path.insert(node);
        let mut total = 0;
        for next in self.neighbors(node) {
            if !on_path.contains(next) {
                total += self.count_paths(next, to, on_path);
            }
        }
        on_path.remove(node);
        total
    }
}

impl From<&Topology> for LinkGraph {
    fn from(topology: &Topology) -> Self {
        let nodes = topology
            .switches
            .iter()
            .map(|s| s.name.as_str())
            .chain(topology.hosts.iter().map(|h| h.name.as_str()));
        LinkGraph::new(nodes, &topology.links)
    }
}
