//! MCTS configuration parameters.

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Number of simulations to run per move.
    pub num_simulations: u32,

    /// Exploration constant for the PUCT formula.
    /// Higher values weight the prior more heavily against the observed mean.
    pub c_puct: f32,

    /// Temperature applied to visit counts when choosing a move.
    /// Visits are raised to `1 / temperature`; small values approach argmax.
    pub temperature: f32,

    /// Dirichlet noise alpha for the root priors.
    /// 0.0 disables noise, which keeps the recorded prior equal to the
    /// evaluator's output.
    pub dirichlet_alpha: f32,

    /// Fraction of each root prior replaced by Dirichlet noise.
    pub dirichlet_epsilon: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 200,
            c_puct: 1.0,
            temperature: 0.1,
            dirichlet_alpha: 0.0,
            dirichlet_epsilon: 0.0,
        }
    }
}

impl MctsConfig {
    /// Config for self-play data generation.
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            num_simulations: 50,
            c_puct: 1.0,
            temperature: 1.0,
            dirichlet_alpha: 0.0,
            dirichlet_epsilon: 0.0,
        }
    }

    /// Builder pattern: set number of simulations.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    /// Builder pattern: set c_puct exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set temperature.
    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    /// Builder pattern: enable root Dirichlet noise.
    pub fn with_dirichlet(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    #[inline]
    pub fn noise_enabled(&self) -> bool {
        self.dirichlet_alpha > 0.0 && self.dirichlet_epsilon > 0.0
    }
}
