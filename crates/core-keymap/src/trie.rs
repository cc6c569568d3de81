//! Edge-list trie over symbol sequences.
//!
//! Nodes live in a flat arena with small inline edge lists, so walking a short
//! key sequence touches a handful of contiguous nodes. Terminal values are
//! stored out of line and referenced by index. Inserting over an existing
//! terminal replaces its value (last registration wins).

use smallvec::SmallVec;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone)]
struct Edge<S> {
    sym: S,
    next: usize,
}

#[derive(Debug, Clone)]
struct Node<S> {
    terminal: Option<usize>,
    edges: SmallVec<[Edge<S>; 4]>,
}

impl<S> Node<S> {
    fn new() -> Self {
        Self {
            terminal: None,
            edges: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingTrie<S, T> {
    nodes: Vec<Node<S>>,
    values: Vec<T>,
}

impl<S, T> Default for MappingTrie<S, T> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::new()],
            values: Vec::new(),
        }
    }
}

impl<S: Clone + PartialEq + fmt::Debug, T> MappingTrie<S, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of terminal values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn walk(&self, seq: &[S]) -> Option<usize> {
        let mut cur = 0usize;
        for (step, sym) in seq.iter().enumerate() {
            let edge = self.nodes[cur].edges.iter().find(|e| e.sym == *sym)?;
            cur = edge.next;
            trace!(target: "input.map", step, sym = ?sym, node = cur, "advance");
        }
        Some(cur)
    }

    fn walk_or_create(&mut self, seq: &[S]) -> usize {
        let mut cur = 0usize;
        for sym in seq {
            cur = match self.nodes[cur].edges.iter().find(|e| e.sym == *sym) {
                Some(e) => e.next,
                None => {
                    let idx = self.nodes.len();
                    self.nodes.push(Node::new());
                    self.nodes[cur].edges.push(Edge {
                        sym: sym.clone(),
                        next: idx,
                    });
                    idx
                }
            };
        }
        cur
    }

    /// Insert `value` at `seq`, returning the value it replaced.
    pub fn insert(&mut self, seq: &[S], value: T) -> Option<T> {
        let node = self.walk_or_create(seq);
        match self.nodes[node].terminal {
            Some(idx) => {
                trace!(target: "input.map", node, "terminal_override");
                Some(std::mem::replace(&mut self.values[idx], value))
            }
            None => {
                self.nodes[node].terminal = Some(self.values.len());
                self.values.push(value);
                None
            }
        }
    }

    /// Value at `seq`, inserting one produced by `make` when absent.
    pub fn get_or_insert_with(&mut self, seq: &[S], make: impl FnOnce() -> T) -> &mut T {
        let node = self.walk_or_create(seq);
        let idx = match self.nodes[node].terminal {
            Some(idx) => idx,
            None => {
                let idx = self.values.len();
                self.nodes[node].terminal = Some(idx);
                self.values.push(make());
                idx
            }
        };
        &mut self.values[idx]
    }

    /// Exact lookup.
    pub fn get(&self, seq: &[S]) -> Option<&T> {
        let node = self.walk(seq)?;
        self.nodes[node].terminal.map(|idx| &self.values[idx])
    }

    /// Whether some terminal strictly extends `seq` and satisfies `pred`.
    pub fn has_extension(&self, seq: &[S], pred: impl Fn(&T) -> bool) -> bool {
        let Some(start) = self.walk(seq) else {
            return false;
        };
        let mut stack: Vec<usize> = self.nodes[start].edges.iter().map(|e| e.next).collect();
        while let Some(node) = stack.pop() {
            if let Some(idx) = self.nodes[node].terminal
                && pred(&self.values[idx])
            {
                return true;
            }
            stack.extend(self.nodes[node].edges.iter().map(|e| e.next));
        }
        false
    }

    /// Every terminal strictly extending `seq`, with its full sequence, in
    /// depth-first insertion order.
    pub fn extensions(&self, seq: &[S]) -> Vec<(Vec<S>, &T)> {
        let mut out = Vec::new();
        if let Some(start) = self.walk(seq) {
            let mut path = seq.to_vec();
            self.collect(start, &mut path, &mut out);
        }
        out
    }

    fn collect<'a>(&'a self, node: usize, path: &mut Vec<S>, out: &mut Vec<(Vec<S>, &'a T)>) {
        for edge in &self.nodes[node].edges {
            path.push(edge.sym.clone());
            if let Some(idx) = self.nodes[edge.next].terminal {
                out.push((path.clone(), &self.values[idx]));
            }
            self.collect(edge.next, path, out);
            path.pop();
        }
    }

    /// Give every non-root node that has children but no value of its own the
    /// value produced by `make`. Returns how many nodes were filled.
    pub fn fill_prefixes(&mut self, mut make: impl FnMut() -> T) -> usize {
        let mut filled = 0;
        for node in 1..self.nodes.len() {
            if self.nodes[node].terminal.is_none() && !self.nodes[node].edges.is_empty() {
                self.nodes[node].terminal = Some(self.values.len());
                self.values.push(make());
                filled += 1;
            }
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn sample() -> MappingTrie<char, &'static str> {
        let mut trie = MappingTrie::new();
        trie.insert(&chars("d"), "delete");
        trie.insert(&chars("dd"), "delete_line");
        trie.insert(&chars("gg"), "first_line");
        trie.insert(&chars("gu"), "lowercase");
        trie
    }

    #[test]
    fn exact_lookup() {
        let trie = sample();
        assert_eq!(trie.get(&chars("dd")), Some(&"delete_line"));
        assert_eq!(trie.get(&chars("g")), None);
        assert_eq!(trie.get(&chars("x")), None);
        assert_eq!(trie.len(), 4);
    }

    #[test]
    fn later_insert_overrides() {
        let mut trie = sample();
        assert_eq!(trie.insert(&chars("d"), "cut"), Some("delete"));
        assert_eq!(trie.get(&chars("d")), Some(&"cut"));
        assert_eq!(trie.len(), 4);
    }

    #[test]
    fn extension_probe_respects_predicate() {
        let trie = sample();
        assert!(trie.has_extension(&chars("d"), |_| true));
        assert!(!trie.has_extension(&chars("dd"), |_| true));
        assert!(trie.has_extension(&chars("g"), |v| *v == "lowercase"));
        assert!(!trie.has_extension(&chars("g"), |v| *v == "delete"));
        assert!(!trie.has_extension(&chars("z"), |_| true));
    }

    #[test]
    fn extensions_in_insertion_order() {
        let trie = sample();
        let found: Vec<_> = trie
            .extensions(&chars("g"))
            .into_iter()
            .map(|(seq, v)| (seq.into_iter().collect::<String>(), *v))
            .collect();
        assert_eq!(
            found,
            vec![
                ("gg".to_string(), "first_line"),
                ("gu".to_string(), "lowercase")
            ]
        );
    }

    #[test]
    fn fill_prefixes_skips_root_and_terminals() {
        let mut trie = sample();
        let filled = trie.fill_prefixes(|| "namespace");
        assert_eq!(filled, 1);
        assert_eq!(trie.get(&chars("g")), Some(&"namespace"));
        assert_eq!(trie.get(&chars("d")), Some(&"delete"));
        assert_eq!(trie.get(&[]), None);
    }

    #[test]
    fn get_or_insert_with_reuses_slot() {
        let mut trie: MappingTrie<char, Vec<u8>> = MappingTrie::new();
        trie.get_or_insert_with(&chars("ab"), Vec::new).push(1);
        trie.get_or_insert_with(&chars("ab"), Vec::new).push(2);
        assert_eq!(trie.get(&chars("ab")), Some(&vec![1, 2]));
        assert_eq!(trie.len(), 1);
    }
}
