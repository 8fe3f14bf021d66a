//! MCTS tree node representation.
//!
//! Each node owns the game state reached by taking an action from the parent.
//! Nodes store visit statistics used for PUCT selection and policy targets.

use games_ultimate::{Action, GameState, Outcome, NUM_ACTIONS};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Solved status of a node, from the perspective of the player who moved
/// into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Proof {
    #[default]
    Unknown,
    /// The player who moved here wins with correct play.
    Win,
    /// The player who moved here loses with correct play.
    Loss,
}

/// Per-action data of an expanded node, indexed by action.
#[derive(Debug, Clone)]
pub struct Edges {
    pub children: [NodeId; NUM_ACTIONS],
    /// Evaluator prior at expansion time, zero for illegal actions.
    pub priors: [f32; NUM_ACTIONS],
}

impl Edges {
    pub(crate) fn new(priors: [f32; NUM_ACTIONS]) -> Self {
        Self {
            children: [NodeId::NONE; NUM_ACTIONS],
            priors,
        }
    }

    /// Iterate over `(action index, child)` for every existing child.
    pub fn iter(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, id)| id.is_some())
            .map(|(a, id)| (a, *id))
    }
}

/// A node in the MCTS tree.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Action that led to this node from parent (None for the initial root)
    pub action: Option<Action>,

    pub state: GameState,

    /// Legal actions at `state`, one bit per action.
    pub legal_mask: u128,

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Running mean of backed-up values, from the perspective of the player
    /// to move at `state`.
    pub mean: f32,

    /// Prior of the edge leading here, as given to the parent.
    pub prior: f32,

    pub proof: Proof,

    /// Children and priors. `None` until the node is expanded.
    pub edges: Option<Box<Edges>>,
}

impl MctsNode {
    /// Create a new root node.
    pub fn new_root(state: GameState) -> Self {
        Self::new_child(NodeId::NONE, None, 1.0, state)
    }

    /// Create a new child node.
    pub fn new_child(parent: NodeId, action: Option<Action>, prior: f32, state: GameState) -> Self {
        let proof = match state.outcome() {
            // Only the player who just moved can have won.
            Outcome::Win(_) => Proof::Win,
            Outcome::Draw | Outcome::InProgress => Proof::Unknown,
        };
        Self {
            parent,
            action,
            legal_mask: state.legal_mask(),
            state,
            visit_count: 0,
            mean: 0.0,
            prior,
            proof,
            edges: None,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Value of a terminal node for the player to move there: -1 after a
    /// win by the previous mover, 0 after a draw.
    #[inline]
    pub fn terminal_value(&self) -> f32 {
        match self.state.outcome() {
            Outcome::Win(_) => -1.0,
            Outcome::Draw | Outcome::InProgress => 0.0,
        }
    }

    /// Mean backed-up value. Returns 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        self.mean
    }

    /// Fold one backed-up value into the running mean.
    #[inline]
    pub fn record(&mut self, value: f32) {
        self.visit_count += 1;
        self.mean += (value - self.mean) / self.visit_count as f32;
    }

    /// PUCT score of this node seen from its parent:
    /// `-Q + c_puct * P * sqrt(N_parent) / (1 + N)`.
    ///
    /// Q is negated because the node stores values for the opponent of the
    /// player choosing between children. Proven nodes score +/- infinity.
    ///
    /// Takes pre-computed sqrt(parent_visits) to avoid redundant sqrt calls
    /// when comparing multiple children.
    #[inline]
    pub fn puct_score(&self, parent_visits_sqrt: f32, c_puct: f32) -> f32 {
        match self.proof {
            Proof::Win => f32::INFINITY,
            Proof::Loss => f32::NEG_INFINITY,
            Proof::Unknown => {
                let u = c_puct * self.prior * parent_visits_sqrt / (1.0 + self.visit_count as f32);
                -self.mean + u
            }
        }
    }

    /// Check if this node has been expanded.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.edges.is_some()
    }

    /// Child reached by `action`, if it exists.
    #[inline]
    pub fn child(&self, action: Action) -> Option<NodeId> {
        self.edges
            .as_ref()
            .map(|e| e.children[action.index()])
            .filter(|id| id.is_some())
    }

    /// Iterate over `(action index, child)` pairs; empty if unexpanded.
    pub fn children(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.edges.iter().flat_map(|e| e.iter())
    }
}
