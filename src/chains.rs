//! Coordination chains
//!
//! Follows coordination links from a starting token until none is found,
//! collecting the tokens on the way. A sweep over the corpus keeps track of
//! claimed tokens so that each chain is counted once.

use crate::config::PairPolicy;
use crate::corpus::{Corpus, TokenId};
use crate::pairs::PairEvidence;
use crate::positions::ScopeError;
use crate::relations::{Found, Relation, Resolver};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Why a climb stopped before coordination ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainBreak {
    /// The coordination rule `rule` resolved `token` to itself
    SelfReference { token: TokenId, rule: usize },
    /// `from` coordinates with `to`, which is already on the chain
    Cycle { from: TokenId, to: TokenId },
}

/// Tokens transitively coordinated with each other
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub tokens: Vec<TokenId>,
    pub broken: Option<ChainBreak>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn start(&self) -> Option<TokenId> {
        self.tokens.first().copied()
    }
}

/// Climb the coordination chain starting at `start`
///
/// The start token is always the first member. Revisiting a token or a self
/// reference ends the climb and is recorded in [`Chain::broken`].
pub fn climb<C: Corpus + ?Sized>(
    resolver: &Resolver<'_, C>,
    start: TokenId,
) -> Result<Chain, ScopeError> {
    climb_until(resolver, start, |_| false).map(|(chain, _)| chain)
}

/// Climb from `start`, halting before the first token `stop` accepts
///
/// Also returns the token the climb ran into, if it halted that way.
fn climb_until<C, F>(
    resolver: &Resolver<'_, C>,
    start: TokenId,
    stop: F,
) -> Result<(Chain, Option<TokenId>), ScopeError>
where
    C: Corpus + ?Sized,
    F: Fn(TokenId) -> bool,
{
    let mut tokens = Vec::new();
    let mut visited = FxHashSet::default();
    let mut broken = None;
    let mut joined = None;
    let mut stack = vec![start];

    while let Some(token) = stack.pop() {
        visited.insert(token);
        tokens.push(token);

        match resolver.find(token, Relation::Coordination)? {
            Found::Kid { token: next, .. } if visited.contains(&next) => {
                warn!(start, from = token, to = next, "coordination chain revisits a token");
                broken = Some(ChainBreak::Cycle {
                    from: token,
                    to: next,
                });
            }
            Found::Kid { token: next, .. } if stop(next) => joined = Some(next),
            Found::Kid { token: next, .. } => stack.push(next),
            Found::SelfReference { rule } => {
                warn!(start, token, rule, "coordination rule resolved a token to itself");
                broken = Some(ChainBreak::SelfReference { token, rule });
            }
            Found::Nothing => {}
        }
    }

    Ok((Chain { tokens, broken }, joined))
}

/// Sweeps the corpus for coordination chains, collecting pair evidence
///
/// Every token is claimed by exactly one chain. A climb stops at the first
/// token an earlier climb claimed and joins that chain, so the chains found
/// do not depend on the order in which starts are tried.
#[derive(Debug)]
pub struct ChainClimber<'a, C: Corpus + ?Sized> {
    resolver: Resolver<'a, C>,
    policy: PairPolicy,
    /// Index into `groups` of each claimed token
    owner: FxHashMap<TokenId, usize>,
    groups: Vec<Chain>,
}

impl<'a, C: Corpus + ?Sized> ChainClimber<'a, C> {
    pub fn new(resolver: Resolver<'a, C>, policy: PairPolicy) -> Self {
        Self {
            resolver,
            policy,
            owner: FxHashMap::default(),
            groups: Vec::new(),
        }
    }

    pub fn is_covered(&self, token: TokenId) -> bool {
        self.owner.contains_key(&token)
    }

    /// Climb from `start` unless it is already covered
    ///
    /// Returns false if `start` was already claimed.
    pub fn claim(&mut self, start: TokenId) -> Result<bool, ScopeError> {
        if self.is_covered(start) {
            return Ok(false);
        }

        let (chain, joined) =
            climb_until(&self.resolver, start, |token| self.owner.contains_key(&token))?;
        let group = joined
            .and_then(|token| self.owner.get(&token).copied())
            .unwrap_or(self.groups.len());
        for &token in &chain.tokens {
            self.owner.insert(token, group);
        }

        if group == self.groups.len() {
            self.groups.push(chain);
        } else {
            let target = &mut self.groups[group];
            debug!(start, joined = target.tokens[0], "coordination chain joins a claimed one");
            target.tokens.extend(chain.tokens);
            target.broken = target.broken.or(chain.broken);
        }
        Ok(true)
    }

    /// Claim every token for which `starts` holds
    pub fn sweep<I, F>(&mut self, tokens: I, mut starts: F) -> Result<(), ScopeError>
    where
        I: IntoIterator<Item = TokenId>,
        F: FnMut(TokenId) -> bool,
    {
        for token in tokens {
            if !self.is_covered(token) && starts(token) {
                self.claim(token)?;
            }
        }
        Ok(())
    }

    /// Chains of two or more tokens, members in corpus order, ordered by
    /// first member
    pub fn chains(&self) -> Vec<Chain> {
        let mut chains: Vec<Chain> = self
            .groups
            .iter()
            .filter(|chain| chain.len() >= 2)
            .cloned()
            .map(|mut chain| {
                chain.tokens.sort_unstable();
                chain
            })
            .collect();
        chains.sort_unstable_by_key(|chain| chain.tokens[0]);
        chains
    }

    pub fn finish(self) -> (PairEvidence, Vec<Chain>) {
        let chains = self.chains();
        let mut evidence = PairEvidence::new();
        for chain in &chains {
            debug!(start = chain.tokens[0], len = chain.len(), "coordination chain");
            evidence.record_chain(self.resolver.corpus(), &chain.tokens, self.policy);
        }
        (evidence, chains)
    }
}
