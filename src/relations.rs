//! Relation rule cascade
//!
//! For a governing token ("mother"), each relation is found by walking an
//! ordered table of rules. A rule names a candidate offset and the conditions
//! that must all hold; the first rule whose candidate exists and whose
//! conditions hold wins, and later rules are never consulted.
//!
//! Conditions are plain data evaluated against a [`Positions`] view and the
//! classification sets, so each one can be inspected and tested on its own.

use crate::config::AdjacencyPolicy;
use crate::corpus::{Corpus, Feature, TokenId, UnitType};
use crate::error::AnalysisError;
use crate::positions::{Positions, ScopeError};
use crate::wordsets::WordSets;
use std::fmt;
use tracing::warn;

/// Kinds of governor/governed relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    Construct,
    Adjacency,
    PrepMod,
    Coordination,
    Quantification,
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::Construct,
        Relation::Adjacency,
        Relation::PrepMod,
        Relation::Coordination,
        Relation::Quantification,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Relation::Construct => "const",
            Relation::Adjacency => "adja",
            Relation::PrepMod => "prep",
            Relation::Coordination => "coord",
            Relation::Quantification => "quant",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification sets a condition may test membership in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    Quantifiers,
    Prepositions,
    Nominals,
}

impl SetKind {
    pub fn name(self) -> &'static str {
        match self {
            SetKind::Quantifiers => "quants",
            SetKind::Prepositions => "preps",
            SetKind::Nominals => "noms",
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One boolean test on the token at an offset from the governor
///
/// Every condition is false when its offset falls outside the bounding unit,
/// negative conditions included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Is(isize, Feature, &'static str),
    IsNot(isize, Feature, &'static str),
    OneOf(isize, Feature, &'static [&'static str]),
    In(isize, SetKind),
    NotIn(isize, SetKind),
}

impl Cond {
    pub fn offset(&self) -> isize {
        match *self {
            Cond::Is(offset, ..)
            | Cond::IsNot(offset, ..)
            | Cond::OneOf(offset, ..)
            | Cond::In(offset, _)
            | Cond::NotIn(offset, _) => offset,
        }
    }

    /// The classification set this condition consults, if any
    pub fn set(&self) -> Option<SetKind> {
        match *self {
            Cond::In(_, set) | Cond::NotIn(_, set) => Some(set),
            _ => None,
        }
    }

    pub fn eval<C: Corpus + ?Sized>(&self, p: &Positions<'_, C>, sets: &WordSets) -> bool {
        let Some(token) = p.get(self.offset()) else {
            return false;
        };
        match *self {
            Cond::Is(offset, feature, value) => p.feature(offset, feature) == value,
            Cond::IsNot(offset, feature, value) => p.feature(offset, feature) != value,
            Cond::OneOf(offset, feature, values) => {
                let actual = p.feature(offset, feature);
                values.iter().any(|&value| value == actual)
            }
            Cond::In(_, set) => sets.contains(set, token),
            Cond::NotIn(_, set) => !sets.contains(set, token),
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cond::Is(offset, feature, value) => write!(f, "P({offset}).{feature} == {value}"),
            Cond::IsNot(offset, feature, value) => write!(f, "P({offset}).{feature} != {value}"),
            Cond::OneOf(offset, feature, values) => {
                write!(f, "P({offset}).{feature} in {{{}}}", values.join(", "))
            }
            Cond::In(offset, set) => write!(f, "P({offset}) in {set}"),
            Cond::NotIn(offset, set) => write!(f, "P({offset}) not in {set}"),
        }
    }
}

/// Candidate offset plus the conditions that license it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub target: isize,
    pub conds: &'static [Cond],
}

impl Rule {
    pub const fn new(target: isize, conds: &'static [Cond]) -> Self {
        Self { target, conds }
    }
}

/// Outcome of walking one rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    /// Rule `rule` accepted `token`
    Kid { token: TokenId, rule: usize },
    /// Rule `rule` accepted the governor itself
    SelfReference { rule: usize },
    Nothing,
}

impl Found {
    pub fn kid(self) -> Option<TokenId> {
        match self {
            Found::Kid { token, .. } => Some(token),
            _ => None,
        }
    }
}

/// Per-rule diagnosis of a rule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub rule: usize,
    pub candidate: Option<TokenId>,
    pub outcomes: Vec<(Cond, bool)>,
}

impl Explanation {
    pub fn accepted(&self) -> bool {
        self.candidate.is_some() && self.outcomes.iter().all(|(_, ok)| *ok)
    }
}

/// Ordered rule table for one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub relation: Relation,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(relation: Relation, rules: &[Rule]) -> Self {
        Self {
            relation,
            rules: rules.to_vec(),
        }
    }

    /// First rule, in table order, whose candidate exists and whose
    /// conditions all hold
    pub fn first_match<C: Corpus + ?Sized>(&self, p: &Positions<'_, C>, sets: &WordSets) -> Found {
        for (index, rule) in self.rules.iter().enumerate() {
            let Some(candidate) = p.get(rule.target) else {
                continue;
            };
            if rule.conds.iter().all(|cond| cond.eval(p, sets)) {
                return if Some(candidate) == p.origin() {
                    Found::SelfReference { rule: index }
                } else {
                    Found::Kid {
                        token: candidate,
                        rule: index,
                    }
                };
            }
        }
        Found::Nothing
    }

    /// Evaluate every rule and condition without short-circuiting
    pub fn explain<C: Corpus + ?Sized>(
        &self,
        p: &Positions<'_, C>,
        sets: &WordSets,
    ) -> Vec<Explanation> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| Explanation {
                rule: index,
                candidate: p.get(rule.target),
                outcomes: rule
                    .conds
                    .iter()
                    .map(|cond| (*cond, cond.eval(p, sets)))
                    .collect(),
            })
            .collect()
    }

    /// Classification sets referenced by any rule
    pub fn sets(&self) -> impl Iterator<Item = SetKind> + '_ {
        self.rules
            .iter()
            .flat_map(|rule| rule.conds.iter())
            .filter_map(Cond::set)
    }
}

mod tables {
    use super::Cond::*;
    use super::Rule;
    use super::SetKind::*;
    use crate::corpus::Feature::*;

    pub const CONSTRUCT: &[Rule] = &[
        Rule::new(1, &[Is(0, St, "c"), IsNot(1, Sp, "art")]),
        Rule::new(2, &[Is(0, St, "c"), Is(1, Sp, "art")]),
    ];

    pub const ADJACENCY_ABSOLUTE: &[Rule] = &[
        Rule::new(1, &[In(1, Nominals), Is(0, St, "a")]),
        Rule::new(2, &[Is(1, Sp, "art"), In(2, Nominals), Is(0, St, "a")]),
    ];

    const UNMARKED: &[&str] = &["a", "NA", ""];

    pub const ADJACENCY_UNMARKED: &[Rule] = &[
        Rule::new(1, &[In(1, Nominals), OneOf(0, St, UNMARKED)]),
        Rule::new(2, &[Is(1, Sp, "art"), In(2, Nominals), OneOf(0, St, UNMARKED)]),
    ];

    // noun + prep, not prep + noun
    pub const PREP_MOD: &[Rule] = &[Rule::new(1, &[In(1, Prepositions)])];

    pub const COORDINATION: &[Rule] = &[
        Rule::new(
            2,
            &[
                NotIn(0, Prepositions),
                Is(1, Sp, "conj"),
                In(2, Nominals),
                NotIn(2, Prepositions),
            ],
        ),
        Rule::new(
            3,
            &[
                NotIn(0, Prepositions),
                Is(1, Sp, "conj"),
                Is(2, Sp, "art"),
                In(3, Nominals),
                NotIn(3, Prepositions),
            ],
        ),
        // prep + noun + conj + prep + noun
        Rule::new(
            3,
            &[
                Is(1, Sp, "conj"),
                In(2, Prepositions),
                In(3, Nominals),
                NotIn(3, Prepositions),
                In(-1, Prepositions),
            ],
        ),
        // prep + art + noun + conj + prep + art + noun
        Rule::new(
            4,
            &[
                Is(1, Sp, "conj"),
                In(2, Prepositions),
                Is(3, Sp, "art"),
                In(4, Nominals),
                NotIn(4, Prepositions),
                Is(-1, Sp, "art"),
                In(-2, Prepositions),
            ],
        ),
    ];

    pub const QUANTIFICATION: &[Rule] = &[
        Rule::new(1, &[NotIn(0, Quantifiers), In(1, Quantifiers)]),
        Rule::new(
            2,
            &[NotIn(0, Quantifiers), Is(1, Sp, "art"), In(2, Quantifiers)],
        ),
        Rule::new(-1, &[NotIn(0, Quantifiers), In(-1, Quantifiers)]),
        Rule::new(
            -2,
            &[NotIn(0, Quantifiers), Is(-1, Sp, "art"), In(-2, Quantifiers)],
        ),
    ];
}

/// Rule tables for all relations, indexed by [`Relation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade {
    rule_sets: Vec<RuleSet>,
}

impl Cascade {
    pub fn standard(adjacency: AdjacencyPolicy) -> Self {
        let adjacency = match adjacency {
            AdjacencyPolicy::Absolute => tables::ADJACENCY_ABSOLUTE,
            AdjacencyPolicy::AbsoluteOrUnmarked => tables::ADJACENCY_UNMARKED,
        };
        Self {
            rule_sets: vec![
                RuleSet::new(Relation::Construct, tables::CONSTRUCT),
                RuleSet::new(Relation::Adjacency, adjacency),
                RuleSet::new(Relation::PrepMod, tables::PREP_MOD),
                RuleSet::new(Relation::Coordination, tables::COORDINATION),
                RuleSet::new(Relation::Quantification, tables::QUANTIFICATION),
            ],
        }
    }

    /// Replace the table for `rule_set.relation`
    pub fn with_rule_set(mut self, rule_set: RuleSet) -> Self {
        let index = rule_set.relation.index();
        self.rule_sets[index] = rule_set;
        self
    }

    pub fn rule_set(&self, relation: Relation) -> &RuleSet {
        &self.rule_sets[relation.index()]
    }

    /// Fail if any rule consults a set that was never populated
    pub fn validate(&self, sets: &WordSets) -> Result<(), AnalysisError> {
        for rule_set in &self.rule_sets {
            if let Some(set) = rule_set.sets().find(|&set| sets.get(set).is_none()) {
                return Err(AnalysisError::UndefinedSet {
                    relation: rule_set.relation,
                    set,
                });
            }
        }
        Ok(())
    }
}

impl Default for Cascade {
    fn default() -> Self {
        Self::standard(AdjacencyPolicy::default())
    }
}

/// At most one related token per relation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationMap {
    slots: [Option<TokenId>; 5],
}

impl RelationMap {
    pub fn get(&self, relation: Relation) -> Option<TokenId> {
        self.slots[relation.index()]
    }

    pub fn set(&mut self, relation: Relation, token: TokenId) {
        self.slots[relation.index()] = Some(token);
    }

    pub fn clear(&mut self, relation: Relation) {
        self.slots[relation.index()] = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Filled relations in [`Relation::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Relation, TokenId)> + '_ {
        Relation::ALL
            .into_iter()
            .filter_map(|relation| self.get(relation).map(|token| (relation, token)))
    }
}

/// Kids of one governor, plus the relations whose rules pointed back at it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kids {
    pub kids: RelationMap,
    pub self_references: Vec<(Relation, usize)>,
}

/// Resolves relations for tokens of one corpus
///
/// Construction checks that every set the cascade consults exists, so
/// membership tests never silently default to false.
#[derive(Debug)]
pub struct Resolver<'a, C: Corpus + ?Sized> {
    corpus: &'a C,
    cascade: &'a Cascade,
    sets: &'a WordSets,
    context: UnitType,
}

impl<'a, C: Corpus + ?Sized> Clone for Resolver<'a, C> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, C: Corpus + ?Sized> Resolver<'a, C> {
    pub fn new(
        corpus: &'a C,
        cascade: &'a Cascade,
        sets: &'a WordSets,
        context: UnitType,
    ) -> Result<Self, AnalysisError> {
        cascade.validate(sets)?;
        if !context.contains(UnitType::Word) {
            return Err(ScopeError {
                origin: None,
                origin_type: UnitType::Word,
                context,
            }
            .into());
        }
        Ok(Self {
            corpus,
            cascade,
            sets,
            context,
        })
    }

    /// Same tables and sets, different bounding unit
    pub fn with_context(&self, context: UnitType) -> Result<Self, ScopeError> {
        if !context.contains(UnitType::Word) {
            return Err(ScopeError {
                origin: None,
                origin_type: UnitType::Word,
                context,
            });
        }
        Ok(Self {
            context,
            ..self.clone()
        })
    }

    pub fn corpus(&self) -> &'a C {
        self.corpus
    }

    pub fn context(&self) -> UnitType {
        self.context
    }

    pub fn positions(&self, token: TokenId) -> Result<Positions<'a, C>, ScopeError> {
        Positions::new(self.corpus, token, self.context)
    }

    pub fn find(&self, token: TokenId, relation: Relation) -> Result<Found, ScopeError> {
        let p = self.positions(token)?;
        Ok(self.cascade.rule_set(relation).first_match(&p, self.sets))
    }

    /// Governed token for one relation; self references are logged and dropped
    pub fn kid(&self, token: TokenId, relation: Relation) -> Result<Option<TokenId>, ScopeError> {
        Ok(match self.find(token, relation)? {
            Found::SelfReference { rule } => {
                warn!(token, %relation, rule, "relation rule resolved a token to itself");
                None
            }
            found => found.kid(),
        })
    }

    /// All relations for one governor
    pub fn kids(&self, token: TokenId) -> Result<Kids, ScopeError> {
        let p = self.positions(token)?;
        let mut kids = Kids::default();
        for relation in Relation::ALL {
            match self.cascade.rule_set(relation).first_match(&p, self.sets) {
                Found::Kid { token: kid, .. } => kids.kids.set(relation, kid),
                Found::SelfReference { rule } => {
                    warn!(token, %relation, rule, "relation rule resolved a token to itself");
                    kids.self_references.push((relation, rule));
                }
                Found::Nothing => {}
            }
        }
        Ok(kids)
    }

    pub fn explain(&self, token: TokenId, relation: Relation) -> Result<Vec<Explanation>, ScopeError> {
        let p = self.positions(token)?;
        Ok(self.cascade.rule_set(relation).explain(&p, self.sets))
    }

    /// The quantified word for a quantifier: the first following nominal that
    /// is not itself a quantifier, crossing only quantifiers and articles
    pub fn quantified(&self, token: TokenId) -> Result<Option<TokenId>, ScopeError> {
        let is_target = |t: TokenId| {
            !self.sets.contains(SetKind::Quantifiers, t) && self.sets.contains(SetKind::Nominals, t)
        };
        if is_target(token) {
            return Ok(Some(token));
        }
        let walker = self.positions(token)?.walker();
        Ok(walker.ahead(is_target, |t| {
            !self.sets.contains(SetKind::Quantifiers, t)
                && self.corpus.feature_or_empty(t, Feature::Sp) != "art"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{TextCorpus, WordSpec};
    use crate::wordsets::WordSet;

    fn all_sets(quants: &[TokenId], preps: &[TokenId], noms: &[TokenId]) -> WordSets {
        let set = |tokens: &[TokenId]| tokens.iter().copied().collect::<WordSet>();
        WordSets::new()
            .with(SetKind::Quantifiers, set(quants))
            .with(SetKind::Prepositions, set(preps))
            .with(SetKind::Nominals, set(noms))
    }

    /// One phrase atom per call, all in one verse
    fn corpus_of(atoms: &[&[WordSpec]]) -> TextCorpus {
        let mut builder = TextCorpus::builder();
        builder.start_book("Genesis").start_chapter(1).start_verse(1);
        for atom in atoms {
            builder.start(UnitType::PhraseAtom);
            for word in atom.iter() {
                builder.push(word.clone());
            }
        }
        builder.build()
    }

    fn word(lex: &str, sp: &str) -> WordSpec {
        WordSpec::new(lex, lex, sp)
    }

    fn noun(lex: &str, st: &str) -> WordSpec {
        word(lex, "subs").with(Feature::St, st)
    }

    #[test]
    fn test_construct_skips_article() {
        // DBR H->RY: construct noun, article, absolute noun
        let corpus = corpus_of(&[&[noun("DBR/", "c"), word("H", "art"), noun(">RY/", "a")]]);
        let sets = all_sets(&[], &[], &[0, 2]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(0, Relation::Construct).unwrap(), Some(2));
        assert_eq!(resolver.kid(0, Relation::Adjacency).unwrap(), None);
        assert_eq!(resolver.kid(2, Relation::Construct).unwrap(), None);
    }

    #[test]
    fn test_construct_direct() {
        let corpus = corpus_of(&[&[noun("BJT/", "c"), noun("MLK/", "a")]]);
        let sets = all_sets(&[], &[], &[0, 1]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(0, Relation::Construct).unwrap(), Some(1));
    }

    #[test]
    fn test_construct_stops_at_unit_boundary() {
        let corpus = corpus_of(&[&[noun("BJT/", "c")], &[noun("MLK/", "a")]]);
        let sets = all_sets(&[], &[], &[0, 1]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(0, Relation::Construct).unwrap(), None);

        let wide = resolver.with_context(UnitType::Verse).unwrap();
        assert_eq!(wide.kid(0, Relation::Construct).unwrap(), Some(1));
    }

    #[test]
    fn test_adjacency_policies() {
        let corpus = corpus_of(&[
            &[noun(">JC/", "a"), word("H", "art"), word("VWB/", "adjv")],
            &[word("HLK[", "verb"), word("VWB/", "adjv")],
        ]);
        let sets = all_sets(&[], &[], &[0, 2, 4]);

        let strict = Cascade::standard(AdjacencyPolicy::Absolute);
        let resolver = Resolver::new(&corpus, &strict, &sets, UnitType::PhraseAtom).unwrap();
        assert_eq!(resolver.kid(0, Relation::Adjacency).unwrap(), Some(2));
        assert_eq!(resolver.kid(3, Relation::Adjacency).unwrap(), None);

        let relaxed = Cascade::standard(AdjacencyPolicy::AbsoluteOrUnmarked);
        let resolver = Resolver::new(&corpus, &relaxed, &sets, UnitType::PhraseAtom).unwrap();
        assert_eq!(resolver.kid(3, Relation::Adjacency).unwrap(), Some(4));
    }

    #[test]
    fn test_prep_modification() {
        let corpus = corpus_of(&[&[noun("MLK/", "a"), word("B", "prep"), noun(">RY/", "a")]]);
        let sets = all_sets(&[], &[1], &[0, 2]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(0, Relation::PrepMod).unwrap(), Some(1));
        assert_eq!(resolver.kid(1, Relation::PrepMod).unwrap(), None);
    }

    #[test]
    fn test_coordination_over_article() {
        // noun-A, conjunction, article, noun-B
        let corpus = corpus_of(&[&[
            noun("CMJM/", "a"),
            word("W", "conj"),
            word("H", "art"),
            noun(">RY/", "a"),
        ]]);
        let sets = all_sets(&[], &[], &[0, 3]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(0, Relation::Coordination).unwrap(), Some(3));
    }

    #[test]
    fn test_coordination_with_prepositions() {
        // B + BJT + W + B + CDH
        let corpus = corpus_of(&[&[
            word("B", "prep"),
            noun("BJT/", "a"),
            word("W", "conj"),
            word("B", "prep"),
            noun("FDH/", "a"),
        ]]);
        let sets = all_sets(&[], &[0, 3], &[1, 4]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(1, Relation::Coordination).unwrap(), Some(4));
        // a preposition never coordinates through the plain rules
        assert_eq!(resolver.kid(0, Relation::Coordination).unwrap(), None);
    }

    #[test]
    fn test_quantification_order() {
        // KL H-<M: quantifier, article, noun
        let corpus = corpus_of(&[&[word("KL/", "subs"), word("H", "art"), noun("<M/", "a")]]);
        let sets = all_sets(&[0], &[], &[0, 2]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(2, Relation::Quantification).unwrap(), Some(0));
        assert_eq!(resolver.kid(0, Relation::Quantification).unwrap(), None);
        assert_eq!(resolver.quantified(0).unwrap(), Some(2));
    }

    #[test]
    fn test_forward_quantifier_wins_over_backward() {
        let corpus = corpus_of(&[&[word("C<NJM/", "subs"), noun("JWM/", "a"), word("CLC/", "subs")]]);
        let sets = all_sets(&[0, 2], &[], &[0, 1, 2]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(resolver.kid(1, Relation::Quantification).unwrap(), Some(2));
    }

    const FIRST: &[Rule] = &[
        Rule::new(1, &[Cond::Is(1, Feature::Sp, "subs")]),
        Rule::new(2, &[Cond::Is(2, Feature::Sp, "subs")]),
    ];

    #[test]
    fn test_first_match_wins() {
        let corpus = corpus_of(&[&[word("A", "verb"), word("B", "subs"), word("C", "subs")]]);
        let sets = all_sets(&[], &[], &[]);
        let p = Positions::new(&corpus, 0, UnitType::PhraseAtom).unwrap();
        let rules = RuleSet::new(Relation::Adjacency, FIRST);

        assert_eq!(rules.first_match(&p, &sets), Found::Kid { token: 1, rule: 0 });

        let reversed: Vec<Rule> = FIRST.iter().rev().copied().collect();
        let rules = RuleSet::new(Relation::Adjacency, &reversed);
        assert_eq!(rules.first_match(&p, &sets), Found::Kid { token: 2, rule: 0 });
    }

    const SELF: &[Rule] = &[Rule::new(0, &[Cond::Is(0, Feature::Sp, "verb")])];

    #[test]
    fn test_self_reference_detected() {
        let corpus = corpus_of(&[&[word("A", "verb"), word("B", "subs")]]);
        let sets = all_sets(&[], &[], &[]);
        let cascade = Cascade::default().with_rule_set(RuleSet::new(Relation::Adjacency, SELF));
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        assert_eq!(
            resolver.find(0, Relation::Adjacency).unwrap(),
            Found::SelfReference { rule: 0 }
        );
        assert_eq!(resolver.kid(0, Relation::Adjacency).unwrap(), None);
        let kids = resolver.kids(0).unwrap();
        assert_eq!(kids.self_references, vec![(Relation::Adjacency, 0)]);
        assert_eq!(kids.kids.get(Relation::Adjacency), None);
    }

    #[test]
    fn test_missing_candidate_never_matches() {
        // construct noun at the end of its unit: conditions hold, no candidate
        let corpus = corpus_of(&[&[noun("BJT/", "c")]]);
        let sets = all_sets(&[], &[], &[0]);
        let p = Positions::new(&corpus, 0, UnitType::PhraseAtom).unwrap();

        assert!(!Cond::IsNot(1, Feature::Sp, "art").eval(&p, &sets));
        assert!(!Cond::NotIn(1, SetKind::Nominals).eval(&p, &sets));
        assert_eq!(
            Cascade::default().rule_set(Relation::Construct).first_match(&p, &sets),
            Found::Nothing
        );
    }

    #[test]
    fn test_undefined_set_fails_fast() {
        let corpus = corpus_of(&[&[noun("BJT/", "c")]]);
        let sets = WordSets::new().with(SetKind::Nominals, WordSet::default());
        let cascade = Cascade::default();

        let err = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap_err();
        assert!(matches!(err, AnalysisError::UndefinedSet { .. }));

        let err = Resolver::new(&corpus, &cascade, &all_sets(&[], &[], &[]), UnitType::Word)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Scope(_)));
    }

    #[test]
    fn test_explain() {
        let corpus = corpus_of(&[&[noun("DBR/", "c"), word("H", "art"), noun(">RY/", "a")]]);
        let sets = all_sets(&[], &[], &[0, 2]);
        let cascade = Cascade::default();
        let resolver = Resolver::new(&corpus, &cascade, &sets, UnitType::PhraseAtom).unwrap();

        let explanations = resolver.explain(0, Relation::Construct).unwrap();
        assert_eq!(explanations.len(), 2);
        assert!(!explanations[0].accepted());
        assert!(!explanations[0].outcomes[1].1);
        assert!(explanations[1].accepted());
        assert_eq!(explanations[1].candidate, Some(2));
        assert_eq!(explanations[1].outcomes[1].0.to_string(), "P(1).sp == art");
    }

    #[test]
    fn test_relation_map() {
        let mut map = RelationMap::default();
        assert!(map.is_empty());
        map.set(Relation::Quantification, 4);
        map.set(Relation::Construct, 2);

        let filled: Vec<_> = map.iter().collect();
        assert_eq!(filled, vec![(Relation::Construct, 2), (Relation::Quantification, 4)]);
    }
}
