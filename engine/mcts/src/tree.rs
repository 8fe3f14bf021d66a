//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices. Re-rooting compacts the arena so
//! only the kept subtree survives.

use games_ultimate::{Action, GameError, GameState, NUM_ACTIONS};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::node::{Edges, MctsNode, NodeId, Proof};

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree {
    /// Arena storing all nodes
    nodes: Vec<MctsNode>,

    /// Root node index (always 0 after construction or re-rooting)
    root: NodeId,
}

impl MctsTree {
    /// Create a new tree with the given root state.
    pub fn new(root_state: GameState) -> Self {
        Self {
            nodes: vec![MctsNode::new_root(root_state)],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn root_node(&self) -> &MctsNode {
        self.get(self.root)
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.index()]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: MctsNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[MctsNode] {
        &self.nodes
    }

    /// Select the child of a node with the highest PUCT score.
    ///
    /// Exact ties (including several proven wins) are broken uniformly at
    /// random. Returns `None` if the node has no children.
    pub fn select_child(&self, node_id: NodeId, c_puct: f32, rng: &mut ChaCha20Rng) -> Option<NodeId> {
        let node = self.get(node_id);
        // Pre-compute sqrt once instead of per-child comparison
        let parent_visits_sqrt = (node.visit_count as f32).sqrt();

        let mut best: Option<NodeId> = None;
        let mut best_score = f32::NEG_INFINITY;
        let mut ties = 0u32;

        for (_, child_id) in node.children() {
            let score = self.get(child_id).puct_score(parent_visits_sqrt, c_puct);
            if best.is_none() || score > best_score {
                best = Some(child_id);
                best_score = score;
                ties = 1;
            } else if score == best_score {
                // Reservoir sampling over equal scores.
                ties += 1;
                if rng.gen_range(0..ties) == 0 {
                    best = Some(child_id);
                }
            }
        }

        best
    }

    /// Expand a node: create one child per legal action and store `priors`
    /// (entries for illegal actions are zeroed).
    ///
    /// Children that end the game with a win are marked proven and the proof
    /// is propagated towards the root.
    pub fn expand(&mut self, node_id: NodeId, mut priors: [f32; NUM_ACTIONS]) -> Result<(), GameError> {
        let (state, legal_mask) = {
            let node = self.get(node_id);
            (node.state, node.legal_mask)
        };

        for (a, p) in priors.iter_mut().enumerate() {
            if legal_mask & (1u128 << a) == 0 {
                *p = 0.0;
            }
        }

        let mut edges = Edges::new(priors);
        let mut winning_child = None;
        for action in Action::all() {
            if legal_mask & (1u128 << action.index()) == 0 {
                continue;
            }
            let child_state = state.apply_move(action)?;
            let child = MctsNode::new_child(node_id, Some(action), priors[action.index()], child_state);
            let proven = child.proof == Proof::Win;
            let child_id = self.allocate(child);
            edges.children[action.index()] = child_id;
            if proven && winning_child.is_none() {
                winning_child = Some(child_id);
            }
        }
        self.get_mut(node_id).edges = Some(Box::new(edges));

        if let Some(child_id) = winning_child {
            self.propagate_proof(child_id);
        }
        Ok(())
    }

    /// Walk up from a freshly proven node, updating ancestors.
    ///
    /// A node with a proven-win child is a proven loss; a node whose
    /// children are all proven losses is a proven win.
    fn propagate_proof(&mut self, proven: NodeId) {
        let mut current = proven;
        loop {
            let parent = self.get(current).parent;
            if parent.is_none() || self.get(parent).proof != Proof::Unknown {
                return;
            }
            let new_proof = match self.get(current).proof {
                Proof::Win => Proof::Loss,
                Proof::Loss => {
                    let all_lost = self
                        .get(parent)
                        .children()
                        .all(|(_, id)| self.get(id).proof == Proof::Loss);
                    if !all_lost {
                        return;
                    }
                    Proof::Win
                }
                Proof::Unknown => return,
            };
            self.get_mut(parent).proof = new_proof;
            current = parent;
        }
    }

    /// Backpropagate a value from a leaf to the root.
    /// `value` is from the leaf's side to move and is negated at each level.
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f32) {
        let mut current_id = leaf_id;
        let mut current_value = value;

        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.record(current_value);

            // Negate for opponent's perspective
            current_value = -current_value;

            current_id = node.parent;
        }
    }

    /// Make `new_root` the root, discarding everything outside its subtree.
    ///
    /// Surviving nodes are renumbered in breadth-first order so the new root
    /// is `NodeId(0)`; any previously held handles are invalidated.
    pub fn reroot(&mut self, new_root: NodeId) {
        let mut remap = vec![NodeId::NONE; self.nodes.len()];
        let mut order = vec![new_root];
        remap[new_root.index()] = NodeId(0);

        let mut next = 0;
        while next < order.len() {
            let id = order[next];
            for (_, child) in self.get(id).children() {
                remap[child.index()] = NodeId(order.len() as u32);
                order.push(child);
            }
            next += 1;
        }

        let mut old: Vec<Option<MctsNode>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        let mut nodes = Vec::with_capacity(order.len());

        for id in order {
            if let Some(mut node) = old[id.index()].take() {
                node.parent = if id == new_root {
                    NodeId::NONE
                } else {
                    remap[node.parent.index()]
                };
                if let Some(edges) = node.edges.as_mut() {
                    for child in edges.children.iter_mut().filter(|c| c.is_some()) {
                        *child = remap[child.index()];
                    }
                }
                nodes.push(node);
            }
        }

        self.nodes = nodes;
        self.root = NodeId(0);
    }

    /// Visit counts of the root's children, indexed by action.
    pub fn root_visits(&self) -> [u32; NUM_ACTIONS] {
        let mut visits = [0u32; NUM_ACTIONS];
        for (a, id) in self.root_node().children() {
            visits[a] = self.get(id).visit_count;
        }
        visits
    }

    /// Get the best action from root based on visit counts.
    /// Returns (action, visit_count) or None if root has no children.
    pub fn best_action(&self) -> Option<(Action, u32)> {
        self.root_node()
            .children()
            .filter_map(|(a, id)| Action::new(a).ok().map(|action| (action, self.get(id).visit_count)))
            .max_by_key(|(_, visits)| *visits)
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.root_node();
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        self.get(node_id)
            .children()
            .map(|(_, id)| self.compute_max_depth(id, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn uniform_priors() -> [f32; NUM_ACTIONS] {
        [1.0 / NUM_ACTIONS as f32; NUM_ACTIONS]
    }

    fn act(index: usize) -> Action {
        Action::new(index).unwrap()
    }

    #[test]
    fn test_new_tree() {
        let tree = MctsTree::new(GameState::new());

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeId(0));

        let root = tree.root_node();
        assert!(root.parent.is_none());
        assert_eq!(root.state, GameState::new());
        assert!(!root.is_expanded());
    }

    #[test]
    fn test_expand_creates_legal_children() {
        let state = GameState::new().apply_move(act(0)).unwrap();
        let mut tree = MctsTree::new(state);
        tree.expand(tree.root(), uniform_priors()).unwrap();

        // O must answer in board 0: cells 1..9.
        assert_eq!(tree.len(), 9);
        let root = tree.root_node();
        let actions: Vec<usize> = root.children().map(|(a, _)| a).collect();
        assert_eq!(actions, (1..9).collect::<Vec<_>>());

        let edges = root.edges.as_ref().unwrap();
        assert_eq!(edges.priors[0], 0.0);
        assert_eq!(edges.priors[40], 0.0);
        assert!(edges.priors[1] > 0.0);

        let child = tree.get(root.child(act(5)).unwrap());
        assert_eq!(child.parent, tree.root());
        assert_eq!(child.action, Some(act(5)));
        assert_eq!(child.state, state.apply_move(act(5)).unwrap());
    }

    #[test]
    fn test_backpropagate() {
        let mut tree = MctsTree::new(GameState::new());
        tree.expand(tree.root(), uniform_priors()).unwrap();
        let child_id = tree.root_node().child(act(40)).unwrap();
        tree.expand(child_id, uniform_priors()).unwrap();
        let grandchild_id = tree.get(child_id).child(act(36)).unwrap();

        tree.backpropagate(grandchild_id, 1.0);
        tree.backpropagate(grandchild_id, 0.0);

        // Check visits
        assert_eq!(tree.get(grandchild_id).visit_count, 2);
        assert_eq!(tree.get(child_id).visit_count, 2);
        assert_eq!(tree.root_node().visit_count, 2);

        // Check values (negated at each level)
        assert!((tree.get(grandchild_id).mean_value() - 0.5).abs() < 1e-6);
        assert!((tree.get(child_id).mean_value() - (-0.5)).abs() < 1e-6);
        assert!((tree.root_node().mean_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_select_child_prefers_prior() {
        let mut tree = MctsTree::new(GameState::new());
        let mut priors = [0.01; NUM_ACTIONS];
        priors[40] = 0.9;
        tree.expand(tree.root(), priors).unwrap();
        tree.backpropagate(tree.root(), 0.0);

        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let best = tree.select_child(tree.root(), 1.0, &mut rng).unwrap();
        assert_eq!(tree.get(best).action, Some(act(40)));
    }

    #[test]
    fn test_select_child_breaks_ties_randomly() {
        let mut tree = MctsTree::new(GameState::new());
        tree.expand(tree.root(), uniform_priors()).unwrap();
        tree.backpropagate(tree.root(), 0.0);

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let id = tree.select_child(tree.root(), 1.0, &mut rng).unwrap();
            seen.insert(id);
        }
        // All 81 children score equally; sampling should spread widely.
        assert!(seen.len() > 40, "only {} distinct children chosen", seen.len());
    }

    /// X to move with three game-winning replies: 9, 11 and 14.
    const X_TO_WIN: [usize; 24] = [
        34, 64, 13, 37, 15, 54, 0, 1, 12, 29, 22, 38, 25, 63, 8, 72, 4, 40, 39, 31, 36, 65, 19, 10,
    ];

    #[test]
    fn test_winning_child_proves_parent() {
        let state = GameState::from_actions(X_TO_WIN).unwrap();
        let mut tree = MctsTree::new(state);
        tree.expand(tree.root(), uniform_priors()).unwrap();

        let winning: Vec<NodeId> = [9, 11, 14]
            .iter()
            .map(|&a| tree.root_node().child(act(a)).unwrap())
            .collect();
        for &id in &winning {
            assert_eq!(tree.get(id).proof, Proof::Win);
            assert!(tree.get(id).is_terminal());
            assert!((tree.get(id).terminal_value() - (-1.0)).abs() < 1e-6);
        }
        let other = tree.root_node().child(act(16)).unwrap();
        assert_eq!(tree.get(other).proof, Proof::Unknown);

        // The player who moved into the root (O) is lost.
        assert_eq!(tree.root_node().proof, Proof::Loss);

        tree.backpropagate(tree.root(), 0.0);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..20 {
            let chosen = tree.select_child(tree.root(), 1.0, &mut rng).unwrap();
            assert!(winning.contains(&chosen));
        }
    }

    #[test]
    fn test_all_losing_children_prove_win() {
        let state = GameState::from_actions([0, 1]).unwrap();
        let mut tree = MctsTree::new(state);
        tree.expand(tree.root(), uniform_priors()).unwrap();

        let children: Vec<NodeId> = tree.root_node().children().map(|(_, id)| id).collect();
        let (last, rest) = children.split_last().unwrap();
        for &id in rest {
            tree.get_mut(id).proof = Proof::Loss;
        }
        tree.propagate_proof(rest[0]);
        assert_eq!(tree.root_node().proof, Proof::Unknown);

        tree.get_mut(*last).proof = Proof::Loss;
        tree.propagate_proof(*last);
        assert_eq!(tree.root_node().proof, Proof::Win);
    }

    #[test]
    fn test_reroot_compacts_arena() {
        let mut tree = MctsTree::new(GameState::new());
        tree.expand(tree.root(), uniform_priors()).unwrap();
        let keep = tree.root_node().child(act(0)).unwrap();
        tree.expand(keep, uniform_priors()).unwrap();
        let grandchild = tree.get(keep).child(act(4)).unwrap();
        tree.backpropagate(grandchild, 1.0);
        assert_eq!(tree.len(), 1 + 81 + 8);

        let kept_state = tree.get(keep).state;
        tree.reroot(keep);

        assert_eq!(tree.len(), 1 + 8);
        assert_eq!(tree.root(), NodeId(0));
        let root = tree.root_node();
        assert!(root.parent.is_none());
        assert_eq!(root.state, kept_state);
        assert_eq!(root.visit_count, 1);

        for (_, child) in root.children() {
            assert_eq!(tree.get(child).parent, NodeId(0));
            assert!((child.0 as usize) < tree.len());
        }
        let moved = tree.root_node().child(act(4)).unwrap();
        assert_eq!(tree.get(moved).visit_count, 1);
    }

    #[test]
    fn test_root_visits_and_best_action() {
        let mut tree = MctsTree::new(GameState::new());
        tree.expand(tree.root(), uniform_priors()).unwrap();
        let a = tree.root_node().child(act(10)).unwrap();
        let b = tree.root_node().child(act(20)).unwrap();
        tree.backpropagate(a, 0.0);
        tree.backpropagate(b, 0.0);
        tree.backpropagate(b, 0.0);

        let visits = tree.root_visits();
        assert_eq!(visits[10], 1);
        assert_eq!(visits[20], 2);
        assert_eq!(visits.iter().sum::<u32>(), 3);
        assert_eq!(tree.best_action(), Some((act(20), 2)));
    }

    #[test]
    fn test_tree_stats() {
        let mut tree = MctsTree::new(GameState::new());
        tree.expand(tree.root(), uniform_priors()).unwrap();

        let stats = tree.stats();
        assert_eq!(stats.total_nodes, 82);
        assert_eq!(stats.max_depth, 1);
    }
}
