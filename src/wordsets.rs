//! Classification sets consulted by the relation rules
//!
//! The sets (quantifiers, prepositions, nominals) are computed once, before
//! any relation is resolved, and are read-only afterwards. The builders here
//! derive them from token attributes alone; callers with better sets can hand
//! in their own through [`WordSets::with`].

use crate::corpus::{Corpus, Feature, TokenId, UnitType};
use crate::positions::{Positions, ScopeError};
use crate::relations::SetKind;
use rustc_hash::FxHashSet;
use tracing::info;

/// Parts of speech counted as nominal
pub const NOMINAL_SPS: &[&str] = &[
    "subs", "nmpr", "adjv", "advb", "prde", "prps", "prin", "inrg",
];

/// Lexemes that behave as quantifiers regardless of lexical set
pub const QUANTIFIER_LEXEMES: &[&str] = &[
    "KL/", "M<V/", "JTR/", "M<FR/", "XYJ/", "<FRWN/", "C>R=/", "MSPR/", "RB/", "RB=/", "XMJCJT/",
];

/// Immutable set of tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSet(FxHashSet<TokenId>);

impl WordSet {
    pub fn contains(&self, token: TokenId) -> bool {
        self.0.contains(&token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<TokenId> for WordSet {
    fn from_iter<I: IntoIterator<Item = TokenId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The classification sets handed to the relation rules
#[derive(Debug, Clone, Default)]
pub struct WordSets {
    quantifiers: Option<WordSet>,
    prepositions: Option<WordSet>,
    nominals: Option<WordSet>,
}

impl WordSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: SetKind, set: WordSet) -> Self {
        *self.slot(kind) = Some(set);
        self
    }

    /// Build all three sets from token attributes
    pub fn derive<C: Corpus + ?Sized>(corpus: &C) -> Result<Self, ScopeError> {
        let preps = prepositions(corpus)?;
        info!(count = preps.len(), "prepositions ready");
        let quants = quantifiers(corpus)?;
        info!(count = quants.len(), "quantifiers ready");
        let noms = nominals(corpus, &preps);
        info!(count = noms.len(), "nominals ready");

        Ok(Self::new()
            .with(SetKind::Prepositions, preps)
            .with(SetKind::Quantifiers, quants)
            .with(SetKind::Nominals, noms))
    }

    pub fn get(&self, kind: SetKind) -> Option<&WordSet> {
        match kind {
            SetKind::Quantifiers => self.quantifiers.as_ref(),
            SetKind::Prepositions => self.prepositions.as_ref(),
            SetKind::Nominals => self.nominals.as_ref(),
        }
    }

    /// Membership test; false when the set is absent
    pub fn contains(&self, kind: SetKind, token: TokenId) -> bool {
        self.get(kind).is_some_and(|set| set.contains(token))
    }

    fn slot(&mut self, kind: SetKind) -> &mut Option<WordSet> {
        match kind {
            SetKind::Quantifiers => &mut self.quantifiers,
            SetKind::Prepositions => &mut self.prepositions,
            SetKind::Nominals => &mut self.nominals,
        }
    }
}

/// Prepositions and prepositional nouns
///
/// - phrase-dependent part of speech `prep`
/// - potential prepositions (`ls=ppre`) in construct, except `DRK/`
/// - `BD/` directly after `L` in the same phrase atom ("except")
pub fn prepositions<C: Corpus + ?Sized>(corpus: &C) -> Result<WordSet, ScopeError> {
    let mut preps = FxHashSet::default();

    for &token in corpus.tokens() {
        let feature = move |f: Feature| corpus.feature_or_empty(token, f);

        if feature(Feature::Pdp) == "prep" {
            preps.insert(token);
        } else if feature(Feature::Ls) == "ppre"
            && feature(Feature::St) == "c"
            && feature(Feature::Lex) != "DRK/"
        {
            preps.insert(token);
        } else if feature(Feature::Lex) == "BD/" {
            let p = Positions::new(corpus, token, UnitType::PhraseAtom)?;
            if p.feature(-1, Feature::Pdp) == "prep" && p.feature(-1, Feature::Lex) == "L" {
                preps.insert(token);
            }
        }
    }

    Ok(WordSet(preps))
}

/// Cardinals, quantifying lexemes, and `BN/` in age expressions
pub fn quantifiers<C: Corpus + ?Sized>(corpus: &C) -> Result<WordSet, ScopeError> {
    let mut quants = FxHashSet::default();

    for &token in corpus.tokens() {
        let feature = move |f: Feature| corpus.feature_or_empty(token, f);

        if feature(Feature::Ls) == "card"
            || QUANTIFIER_LEXEMES.iter().any(|&lex| lex == feature(Feature::Lex))
        {
            quants.insert(token);
            continue;
        }

        // "son of N years"
        if feature(Feature::Lex) == "BN/"
            && feature(Feature::St) == "c"
            && feature(Feature::Nu) == "sg"
        {
            let p = Positions::new(corpus, token, UnitType::PhraseAtom)?;
            if p.feature(1, Feature::Ls) == "card" {
                quants.insert(token);
            }
        }
    }

    Ok(WordSet(quants))
}

/// Nouns in the broad sense (including adjectives, adverbs and participles),
/// never prepositions
pub fn nominals<C: Corpus + ?Sized>(corpus: &C, preps: &WordSet) -> WordSet {
    corpus
        .tokens()
        .iter()
        .copied()
        .filter(|&token| !preps.contains(token))
        .filter(|&token| {
            let sp = corpus.feature_or_empty(token, Feature::Sp);
            let vt = corpus.feature_or_empty(token, Feature::Vt);
            NOMINAL_SPS.iter().any(|&nominal| nominal == sp)
                || (sp == "verb" && matches!(vt, "ptcp" | "ptca"))
        })
        .collect()
}
