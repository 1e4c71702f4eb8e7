//! Attested lexeme pairs
//!
//! Maps lexeme A to every lexeme B seen coordinated (or in construct) with it,
//! keeping the concrete token pairs behind each entry.

use crate::config::PairPolicy;
use crate::corpus::{Corpus, Feature, TokenId};
use rustc_hash::{FxHashMap, FxHashSet};

/// A concrete (A, B) token pair backing a lexeme pair
pub type Occurrence = (TokenId, TokenId);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairEvidence {
    pairs: FxHashMap<String, FxHashMap<String, Vec<Occurrence>>>,
}

impl PairEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, a: &str, b: &str, occurrence: Occurrence) {
        self.pairs
            .entry(a.to_string())
            .or_default()
            .entry(b.to_string())
            .or_default()
            .push(occurrence);
    }

    /// Record the lexemes of two tokens, A to B only
    pub fn record_tokens<C: Corpus + ?Sized>(&mut self, corpus: &C, a: TokenId, b: TokenId) {
        self.record(
            corpus.feature_or_empty(a, Feature::Lex),
            corpus.feature_or_empty(b, Feature::Lex),
            (a, b),
        );
    }

    /// Record every pair of distinct chain members
    ///
    /// With [`PairPolicy::Both`] each unordered pair is recorded in both
    /// directions; with [`PairPolicy::Forward`] only from the earlier member to
    /// the later one.
    pub fn record_chain<C: Corpus + ?Sized>(
        &mut self,
        corpus: &C,
        chain: &[TokenId],
        policy: PairPolicy,
    ) {
        for (i, &a) in chain.iter().enumerate() {
            for (j, &b) in chain.iter().enumerate() {
                let keep = match policy {
                    PairPolicy::Both => i != j,
                    PairPolicy::Forward => i < j,
                };
                if keep {
                    self.record_tokens(corpus, a, b);
                }
            }
        }
    }

    /// Lexemes attested with `lex`
    pub fn partners<'a>(&'a self, lex: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .get(lex)
            .into_iter()
            .flat_map(|partners| partners.keys().map(String::as_str))
    }

    pub fn occurrences(&self, a: &str, b: &str) -> &[Occurrence] {
        self.pairs
            .get(a)
            .and_then(|partners| partners.get(b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        !self.occurrences(a, b).is_empty()
    }

    /// Number of lexemes with at least one partner
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Total number of token pairs recorded
    pub fn occurrence_count(&self) -> usize {
        self.pairs
            .values()
            .flat_map(FxHashMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Every (A, B, occurrences) entry
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[Occurrence])> + '_ {
        self.pairs.iter().flat_map(|(a, partners)| {
            partners
                .iter()
                .map(move |(b, occurrences)| (a.as_str(), b.as_str(), occurrences.as_slice()))
        })
    }

    /// For each lexeme, the union of its partners' partner sets
    pub fn expanded(&self) -> FxHashMap<&str, FxHashSet<&str>> {
        let mut expanded: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();
        for (lex, partners) in &self.pairs {
            let entry = expanded.entry(lex.as_str()).or_default();
            for partner in partners.keys() {
                entry.extend(self.partners(partner));
            }
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{TextCorpus, WordSpec};

    fn create_test_corpus(lexemes: &[&str]) -> TextCorpus {
        let mut builder = TextCorpus::builder();
        builder.start_book("Genesis").start_chapter(1).start_verse(1);
        for lex in lexemes {
            builder.push(WordSpec::new(lex, lex, "subs"));
        }
        builder.build()
    }

    #[test]
    fn test_chain_both_directions() {
        let corpus = create_test_corpus(&["CMJM/", ">RY/", "JM/", "MJM/"]);
        let mut evidence = PairEvidence::new();
        evidence.record_chain(&corpus, &[0, 1, 2, 3], PairPolicy::Both);

        // N(N-1) directed entries for a chain of N
        assert_eq!(evidence.occurrence_count(), 12);
        assert_eq!(evidence.len(), 4);
        assert!(evidence.contains("CMJM/", "MJM/"));
        assert!(evidence.contains("MJM/", "CMJM/"));
        assert!(!evidence.contains("CMJM/", "CMJM/"));
        assert_eq!(evidence.occurrences(">RY/", "JM/"), &[(1, 2)]);
    }

    #[test]
    fn test_chain_forward_only() {
        let corpus = create_test_corpus(&["CMJM/", ">RY/", "JM/"]);
        let mut evidence = PairEvidence::new();
        evidence.record_chain(&corpus, &[0, 1, 2], PairPolicy::Forward);

        assert_eq!(evidence.occurrence_count(), 3);
        assert!(evidence.contains("CMJM/", ">RY/"));
        assert!(!evidence.contains(">RY/", "CMJM/"));
        assert_eq!(evidence.partners("JM/").count(), 0);
    }

    #[test]
    fn test_repeated_pairs_accumulate() {
        let corpus = create_test_corpus(&["SWS/", "RKB/", "SWS/", "RKB/"]);
        let mut evidence = PairEvidence::new();
        evidence.record_chain(&corpus, &[0, 1], PairPolicy::Both);
        evidence.record_chain(&corpus, &[2, 3], PairPolicy::Both);

        assert_eq!(evidence.occurrences("SWS/", "RKB/"), &[(0, 1), (2, 3)]);
        assert_eq!(evidence.iter().count(), 2);
    }

    #[test]
    fn test_expanded() {
        let mut evidence = PairEvidence::new();
        evidence.record("A", "B", (0, 1));
        evidence.record("B", "A", (1, 0));
        evidence.record("B", "C", (2, 3));

        let expanded = evidence.expanded();
        let mut a: Vec<_> = expanded["A"].iter().copied().collect();
        a.sort_unstable();
        assert_eq!(a, vec!["A", "C"]);
        assert!(expanded["B"].contains("B"));
    }
}
