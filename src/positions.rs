//! Relative positional addressing
//!
//! For an origin token, [`Positions`] provides access to the token N steps
//! away inside the enclosing unit of a given type. Offsets that fall outside
//! the unit resolve to nothing rather than failing, so lookups can be chained
//! freely by the relation rules.

use crate::corpus::{Corpus, Feature, TokenId, UnitType};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// The requested context does not properly contain the origin's unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("context {context} is not larger than {origin_type} (origin {origin:?})")]
pub struct ScopeError {
    pub origin: Option<TokenId>,
    pub origin_type: UnitType,
    pub context: UnitType,
}

/// Result of a combined token/feature lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'c> {
    /// No features requested, token in range
    Token(TokenId),
    /// One feature requested; empty when out of range
    Value(&'c str),
    /// Several features requested; empty when out of range
    Values(FxHashSet<&'c str>),
    /// No features requested, token out of range
    Missing,
}

/// Positional view of one origin token within a bounding unit
#[derive(Debug)]
pub struct Positions<'c, C: Corpus + ?Sized> {
    corpus: &'c C,
    context: UnitType,
    horizon: &'c [TokenId],
    index: Option<usize>,
}

impl<'c, C: Corpus + ?Sized> Clone for Positions<'c, C> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'c, C: Corpus + ?Sized> Positions<'c, C> {
    pub fn new(corpus: &'c C, origin: TokenId, context: UnitType) -> Result<Self, ScopeError> {
        Self::at(corpus, Some(origin), context)
    }

    /// Positions for a possibly missing origin
    ///
    /// A missing origin yields a view where every offset is out of range.
    pub fn at(
        corpus: &'c C,
        origin: Option<TokenId>,
        context: UnitType,
    ) -> Result<Self, ScopeError> {
        if !context.contains(UnitType::Word) {
            return Err(ScopeError {
                origin,
                origin_type: UnitType::Word,
                context,
            });
        }

        let horizon = origin
            .and_then(|token| corpus.enclosing(token, context))
            .map(|unit| corpus.tokens_of(unit))
            .unwrap_or(&[]);
        let index = origin.and_then(|token| horizon.binary_search(&token).ok());

        Ok(Self {
            corpus,
            context,
            horizon,
            index,
        })
    }

    /// Token `offset` steps away, if still inside the context
    pub fn get(&self, offset: isize) -> Option<TokenId> {
        let index = self.index?.checked_add_signed(offset)?;
        self.horizon.get(index).copied()
    }

    pub fn origin(&self) -> Option<TokenId> {
        self.get(0)
    }

    pub fn context(&self) -> UnitType {
        self.context
    }

    /// Tokens of the bounding unit
    pub fn horizon(&self) -> &'c [TokenId] {
        self.horizon
    }

    /// Feature value at `offset`; empty when out of range or undefined
    pub fn feature(&self, offset: isize, feature: Feature) -> &'c str {
        let corpus = self.corpus;
        self.get(offset)
            .map(|token| corpus.feature_or_empty(token, feature))
            .unwrap_or("")
    }

    /// Set of feature values at `offset`; empty when out of range
    pub fn features(&self, offset: isize, features: &[Feature]) -> FxHashSet<&'c str> {
        let corpus = self.corpus;
        match self.get(offset) {
            Some(token) => features
                .iter()
                .map(|&feature| corpus.feature_or_empty(token, feature))
                .collect(),
            None => FxHashSet::default(),
        }
    }

    /// Token or feature lookup, shaped by how many features are requested
    pub fn lookup(&self, offset: isize, features: &[Feature]) -> Lookup<'c> {
        match (features, self.get(offset)) {
            ([], Some(token)) => Lookup::Token(token),
            ([], None) => Lookup::Missing,
            ([feature], _) => Lookup::Value(self.feature(offset, *feature)),
            (many, _) => Lookup::Values(self.features(offset, many)),
        }
    }

    /// Positions re-anchored on the token at `offset`
    pub fn relative(&self, offset: isize) -> Positions<'c, C> {
        let index = self
            .get(offset)
            .and_then(|_| self.index?.checked_add_signed(offset));
        Positions { index, ..self.clone() }
    }

    pub fn walker(&self) -> Walker<'c> {
        Walker {
            path: self.horizon,
            index: self.index,
        }
    }
}

/// Walks forward or backward from a token to the first one that satisfies a
/// predicate, optionally interrupted by a stop predicate.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'c> {
    path: &'c [TokenId],
    index: Option<usize>,
}

impl<'c> Walker<'c> {
    pub fn new<C: Corpus + ?Sized>(
        corpus: &'c C,
        origin: TokenId,
        context: UnitType,
    ) -> Result<Self, ScopeError> {
        Ok(Positions::new(corpus, origin, context)?.walker())
    }

    /// First token after the origin where `found` holds
    pub fn ahead<F, S>(&self, found: F, stop: S) -> Option<TokenId>
    where
        F: FnMut(TokenId) -> bool,
        S: FnMut(TokenId) -> bool,
    {
        let index = self.index?;
        first_result(self.path[index + 1..].iter().copied(), found, stop)
    }

    /// First token before the origin, walking backward, where `found` holds
    pub fn back<F, S>(&self, found: F, stop: S) -> Option<TokenId>
    where
        F: FnMut(TokenId) -> bool,
        S: FnMut(TokenId) -> bool,
    {
        let index = self.index?;
        first_result(self.path[..index].iter().rev().copied(), found, stop)
    }
}

fn first_result<I, F, S>(path: I, mut found: F, mut stop: S) -> Option<TokenId>
where
    I: Iterator<Item = TokenId>,
    F: FnMut(TokenId) -> bool,
    S: FnMut(TokenId) -> bool,
{
    for token in path {
        if found(token) {
            return Some(token);
        }
        if stop(token) {
            break;
        }
    }
    None
}
