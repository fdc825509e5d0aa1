#![allow(clippy::len_without_is_empty)]
use std::collections::HashMap;

use crate::{env::Action, util::argmax_first};

/// A simulated world state in the search tree
#[derive(Debug, Clone)]
pub struct Node<W> {
    /// Index of the parent node, `None` at the root
    pub parent: Option<usize>,
    /// Action that produced this node from its parent, `None` at the root
    pub action: Option<Action>,
    pub world: W,
    pub children: Vec<usize>,
    pub visits: u32,
    /// Sum of every reward backpropagated through this node
    pub value: f64,
}

impl<W> Node<W> {
    fn new(parent: Option<usize>, action: Option<Action>, world: W) -> Self {
        Self {
            parent,
            action,
            world,
            children: Vec::new(),
            visits: 0,
            value: 0.0,
        }
    }

    /// UCB score `value/visits + c * sqrt(ln(parent_visits) / visits)`
    ///
    /// Unvisited nodes score `+∞` so they are always tried first. With `c = √2` this is UCB1.
    pub fn ucb(&self, parent_visits: u32, c: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let n = self.visits as f64;
        self.value / n + c * ((parent_visits as f64).ln() / n).sqrt()
    }
}

/// Arena-allocated search tree; node `0` is the root
#[derive(Debug, Clone)]
pub struct Tree<W> {
    nodes: Vec<Node<W>>,
}

impl<W> Tree<W> {
    pub fn new(world: W) -> Self {
        Self {
            nodes: vec![Node::new(None, None, world)],
        }
    }

    pub fn root(&self) -> &Node<W> {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> &Node<W> {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Attach a new child to `parent`
    ///
    /// **Returns** the index of the child
    pub fn add_child(&mut self, parent: usize, action: Action, world: W) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::new(Some(parent), Some(action), world));
        self.nodes[parent].children.push(index);
        index
    }

    /// Child of `index` with the highest UCB score, the first one on ties
    pub fn best_child(&self, index: usize, c: f64) -> Option<usize> {
        let node = &self.nodes[index];
        let best = argmax_first(
            node.children
                .iter()
                .map(|&child| self.nodes[child].ucb(node.visits, c)),
        )?;
        Some(node.children[best])
    }

    /// Descend from the root by UCB score until reaching a node without children
    pub fn select(&self, c: f64) -> usize {
        let mut index = 0;
        while let Some(child) = self.best_child(index, c) {
            index = child;
        }
        index
    }

    /// Add one visit and `reward` to `index` and every ancestor up to the root
    pub fn backpropagate(&mut self, index: usize, reward: f64) {
        let mut current = Some(index);
        while let Some(i) = current {
            let node = &mut self.nodes[i];
            node.visits += 1;
            node.value += reward;
            current = node.parent;
        }
    }

    /// Root child reached through `action`
    pub fn root_child(&self, action: Action) -> Option<usize> {
        self.root()
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].action == Some(action))
    }

    /// Action of the most visited root child, the first one on ties
    pub fn most_visited_action(&self) -> Option<Action> {
        let children = &self.root().children;
        let best = argmax_first(children.iter().map(|&c| self.nodes[c].visits as f64))?;
        self.nodes[children[best]].action
    }

    /// Make `index` the new root, keeping its subtree and dropping everything else
    ///
    /// Nodes are renumbered breadth-first from the new root.
    pub fn promote(self, index: usize) -> Self {
        let mut slots: Vec<Option<Node<W>>> = self.nodes.into_iter().map(Some).collect();

        let mut order = vec![index];
        let mut i = 0;
        while i < order.len() {
            if let Some(node) = &slots[order[i]] {
                order.extend_from_slice(&node.children);
            }
            i += 1;
        }
        let remap: HashMap<usize, usize> = order
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new))
            .collect();

        let mut nodes: Vec<Node<W>> = order
            .iter()
            .filter_map(|&old| slots[old].take())
            .map(|mut node| {
                node.parent = node.parent.and_then(|p| remap.get(&p).copied());
                node.children = node.children.iter().map(|c| remap[c]).collect();
                node
            })
            .collect();
        nodes[0].action = None;

        Self { nodes }
    }
}
