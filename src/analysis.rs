//! Corpus-wide analysis
//!
//! [`Analyzer::run`] makes one pass over every token, labelling accents and
//! resolving relations, then sweeps the corpus for coordination chains and
//! construct pairs. The result is an immutable [`Analysis`].

use crate::accents::{AccentClassifier, AccentLabel};
use crate::chains::{Chain, ChainBreak, ChainClimber};
use crate::config::AnalysisConfig;
use crate::corpus::{Corpus, Feature, TokenId};
use crate::error::AnalysisError;
use crate::pairs::PairEvidence;
use crate::relations::{Cascade, Found, Relation, RelationMap, Resolver, SetKind};
use crate::wordsets::WordSets;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// A relation that could not be recorded because its kid already had a
/// mother for the same relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub relation: Relation,
    pub kid: TokenId,
    /// Governor already linked to `kid`
    pub kept: TokenId,
    /// Governor whose link was dropped
    pub rejected: TokenId,
}

/// Rule configuration defects observed during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    SelfReference {
        token: TokenId,
        relation: Relation,
        rule: usize,
    },
    BrokenChain(ChainBreak),
}

/// Results of one analysis run
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    accents: FxHashMap<TokenId, AccentLabel>,
    kids: FxHashMap<TokenId, RelationMap>,
    mothers: FxHashMap<TokenId, RelationMap>,
    coordination: PairEvidence,
    construct: PairEvidence,
    chains: Vec<Chain>,
    anomalies: Vec<Anomaly>,
    conflicts: Vec<Conflict>,
}

impl Analysis {
    pub fn accent_label_of(&self, token: TokenId) -> Option<&AccentLabel> {
        self.accents.get(&token)
    }

    /// Governors of `token`, by relation
    pub fn mother_relations_of(&self, token: TokenId) -> RelationMap {
        self.mothers.get(&token).copied().unwrap_or_default()
    }

    /// Tokens governed by `token`, by relation
    pub fn kid_relations_of(&self, token: TokenId) -> RelationMap {
        self.kids.get(&token).copied().unwrap_or_default()
    }

    /// Lexeme pairs attested in coordination chains
    pub fn pair_evidence(&self) -> &PairEvidence {
        &self.coordination
    }

    /// Lexeme pairs attested in construct relations
    pub fn construct_evidence(&self) -> &PairEvidence {
        &self.construct
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Number of recorded mother/kid links
    pub fn link_count(&self) -> usize {
        self.kids.values().map(|map| map.iter().count()).sum()
    }

    /// Record `mother -relation-> kid`
    ///
    /// If `kid` already has a mother for `relation`, a nominal governor
    /// displaces a non-nominal one; otherwise the earlier link stays.
    fn link(&mut self, mother: TokenId, relation: Relation, kid: TokenId, sets: &WordSets) {
        let mothers = self.mothers.entry(kid).or_default();
        let Some(previous) = mothers.get(relation) else {
            mothers.set(relation, mother);
            self.kids.entry(mother).or_default().set(relation, kid);
            return;
        };

        let displace = sets.contains(SetKind::Nominals, mother)
            && !sets.contains(SetKind::Nominals, previous);
        let (kept, rejected) = if displace {
            (mother, previous)
        } else {
            (previous, mother)
        };
        debug!(kid, %relation, kept, rejected, "kid already governed");
        self.conflicts.push(Conflict {
            relation,
            kid,
            kept,
            rejected,
        });

        if displace {
            mothers.set(relation, mother);
            self.kids.entry(previous).or_default().clear(relation);
            self.kids.entry(mother).or_default().set(relation, kid);
        }
    }
}

/// Runs the full analysis over one corpus
#[derive(Debug)]
pub struct Analyzer<'a, C: Corpus + ?Sized> {
    corpus: &'a C,
    sets: &'a WordSets,
    config: AnalysisConfig,
    cascade: Cascade,
    accents: AccentClassifier,
}

impl<'a, C: Corpus + ?Sized> Analyzer<'a, C> {
    pub fn new(corpus: &'a C, sets: &'a WordSets, config: AnalysisConfig) -> Self {
        Self {
            corpus,
            sets,
            config,
            cascade: Cascade::standard(config.adjacency),
            accents: AccentClassifier::new(),
        }
    }

    /// Replace the standard rule tables
    pub fn with_cascade(mut self, cascade: Cascade) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self) -> Result<Analysis, AnalysisError> {
        let corpus = self.corpus;
        let resolver = Resolver::new(corpus, &self.cascade, self.sets, self.config.context)?;
        // chain starts and construct pairs are restricted to nominals
        if self.sets.get(SetKind::Nominals).is_none() {
            let relation = if self.config.nominal_chain_starts {
                Relation::Coordination
            } else {
                Relation::Construct
            };
            return Err(AnalysisError::UndefinedSet {
                relation,
                set: SetKind::Nominals,
            });
        }
        let mut analysis = Analysis::default();

        for &token in corpus.tokens() {
            let label = self.accents.classify(corpus, token)?;
            analysis.accents.insert(token, label);

            let kids = resolver.kids(token)?;
            for (relation, rule) in kids.self_references {
                analysis.anomalies.push(Anomaly::SelfReference {
                    token,
                    relation,
                    rule,
                });
            }
            for (relation, kid) in kids.kids.iter() {
                analysis.link(token, relation, kid, self.sets);
            }
        }
        info!(
            tokens = corpus.tokens().len(),
            links = analysis.link_count(),
            conflicts = analysis.conflicts.len(),
            "accents and relations resolved"
        );

        let chain_resolver = resolver.with_context(self.config.chain_context)?;
        let mut climber = ChainClimber::new(chain_resolver, self.config.pairs);
        let nominal_only = self.config.nominal_chain_starts;
        climber.sweep(corpus.tokens().iter().copied(), |token| {
            !nominal_only || self.sets.contains(SetKind::Nominals, token)
        })?;
        let (coordination, chains) = climber.finish();
        analysis.anomalies.extend(
            chains
                .iter()
                .filter_map(|chain| chain.broken.map(Anomaly::BrokenChain)),
        );
        info!(
            chains = chains.len(),
            pairs = coordination.occurrence_count(),
            "coordination chains collected"
        );
        analysis.coordination = coordination;
        analysis.chains = chains;

        for &token in corpus.tokens() {
            if corpus.feature_or_empty(token, Feature::St) != "c"
                || !self.sets.contains(SetKind::Nominals, token)
            {
                continue;
            }
            if let Found::Kid { token: kid, .. } = resolver.find(token, Relation::Construct)? {
                analysis.construct.record_tokens(corpus, token, kid);
            }
        }
        info!(
            pairs = analysis.construct.occurrence_count(),
            "construct pairs collected"
        );

        Ok(analysis)
    }
}
