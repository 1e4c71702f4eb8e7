//! Analysis settings

use crate::corpus::UnitType;

/// Which governor states license an adjacency relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjacencyPolicy {
    /// Governor must be in absolute state
    #[default]
    Absolute,
    /// Absolute, not applicable, or undefined state
    AbsoluteOrUnmarked,
}

/// How coordination chains record lexeme pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairPolicy {
    /// Every ordered pair of distinct chain members, both directions
    #[default]
    Both,
    /// Only earlier member to later member
    Forward,
}

/// Settings for one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Bounding unit for relation rules
    pub context: UnitType,
    /// Bounding unit while climbing coordination chains
    pub chain_context: UnitType,
    pub adjacency: AdjacencyPolicy,
    pub pairs: PairPolicy,
    /// Only start coordination chains on nominal tokens
    pub nominal_chain_starts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            context: UnitType::PhraseAtom,
            chain_context: UnitType::PhraseAtom,
            adjacency: AdjacencyPolicy::default(),
            pairs: PairPolicy::default(),
            nominal_chain_starts: true,
        }
    }
}

impl AnalysisConfig {
    pub fn with_context(mut self, context: UnitType) -> Self {
        self.context = context;
        self
    }

    pub fn with_chain_context(mut self, context: UnitType) -> Self {
        self.chain_context = context;
        self
    }

    pub fn with_adjacency(mut self, adjacency: AdjacencyPolicy) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn with_pairs(mut self, pairs: PairPolicy) -> Self {
        self.pairs = pairs;
        self
    }

    pub fn with_nominal_chain_starts(mut self, nominal_only: bool) -> Self {
        self.nominal_chain_starts = nominal_only;
        self
    }
}
