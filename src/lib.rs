//! Wordgrammar: word-level annotation for sequential annotated corpora
//!
//! Labels accents, resolves governor/governed relations between words inside
//! phrase atoms, and collects attested lexeme pairs from coordination chains
//! and construct chains.

// Core modules (leaves first)
pub mod corpus; // Corpus trait and in-memory corpus
pub mod positions; // Relative addressing inside a bounding unit
pub mod wordsets; // Quantifier, preposition and nominal sets
pub mod accents; // Disjunctive/conjunctive accent labels
pub mod relations; // Relation rule cascade
pub mod chains; // Coordination chain climbing
pub mod pairs; // Attested lexeme pairs
pub mod analysis; // Corpus-wide orchestration

pub mod config;
pub mod error;
pub mod reader; // Tab-separated corpus files

// Re-exports for convenience
pub use accents::{AccentClassifier, AccentKind, AccentLabel, Partition};
pub use analysis::{Analysis, Analyzer, Anomaly, Conflict};
pub use chains::{Chain, ChainBreak, ChainClimber, climb};
pub use config::{AdjacencyPolicy, AnalysisConfig, PairPolicy};
pub use corpus::{Corpus, CorpusBuilder, Feature, TextCorpus, TokenId, UnitType, WordSpec};
pub use error::AnalysisError;
pub use pairs::PairEvidence;
pub use positions::{Positions, ScopeError, Walker};
pub use reader::{CorpusReader, ParseError};
pub use relations::{Cascade, Cond, Found, Relation, RelationMap, Resolver, Rule, RuleSet, SetKind};
pub use wordsets::{WordSet, WordSets};
