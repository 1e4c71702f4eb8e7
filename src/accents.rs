//! Accent classification
//!
//! Labels each token as carrying a disjunctive accent, a conjunctive accent,
//! or neither. Accents are read from the two-digit accent codes in the
//! transliterated text of the token's phonological word: the token together
//! with its neighbours joined by maqqeph or written without a separator.
//!
//! Poetic books (Psalms, Job, Proverbs) follow a different accent system, so
//! each book is assigned one of two rule partitions, named after the number of
//! disjunctive accents each tradition distinguishes.

use crate::corpus::{Corpus, Feature, TokenId, UnitType};
use crate::error::AnalysisError;
use crate::positions::{Positions, ScopeError};
use regex::Regex;

/// Books annotated with the poetic accent system
pub const POETIC_BOOKS: &[&str] = &["Psalmi", "Iob", "Job", "Proverbia", "Psalms", "Proverbs"];

/// Accent rule partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// The 21 prose books
    TwentyOne,
    /// The 3 poetic books
    Three,
}

impl Partition {
    pub fn of_book(book: &str) -> Self {
        if POETIC_BOOKS.iter().any(|&poetic| poetic == book) {
            Partition::Three
        } else {
            Partition::TwentyOne
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Partition::TwentyOne => "21",
            Partition::Three => "3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccentKind {
    Disjunctive,
    Conjunctive,
    Unknown,
}

/// Accent class of a token with the names of the matching accents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccentLabel {
    pub kind: AccentKind,
    pub names: Vec<&'static str>,
}

impl AccentLabel {
    pub fn unknown() -> Self {
        Self {
            kind: AccentKind::Unknown,
            names: Vec::new(),
        }
    }

    pub fn is_disjunctive(&self) -> bool {
        self.kind == AccentKind::Disjunctive
    }
}

// Each accent is a sequence of code alternatives that must appear in order.
type Table = &'static [(&'static str, &'static [&'static str])];

const DISJUNCTIVE_21: Table = &[
    ("atnach", &["92"]),
    ("tiphchah", &["73"]),
    ("zaqeph qaton", &["80"]),
    ("zaqeph gadol", &["85"]),
    ("segolta", &["01"]),
    ("shalshelet", &["65"]),
    ("rebia", &["81"]),
    ("zarqa", &["02"]),
    ("pashta", &["03"]),
    ("yetiv", &["10"]),
    ("tebir", &["91"]),
    ("geresh", &["61"]),
    ("gershayim", &["62"]),
    ("legarmeh", &["74", "05"]),
    ("pazer qaton", &["83"]),
    ("pazer gadol", &["84"]),
    ("telisha gedola", &["14|44"]),
    ("silluq", &["75", "00"]),
];

const DISJUNCTIVE_3: Table = &[
    ("atnach", &["92"]),
    ("rebia", &["81"]),
    ("oleh weyored", &["60", "71"]),
    ("rebia mugrash", &["11", "81"]),
    ("shalshelet gedolah", &["65", "05"]),
    ("tsinor", &["82"]),
    ("dechi", &["13"]),
    ("pazer", &["83"]),
    ("mehuppak legarmeh", &["70", "05"]),
    ("azla legarmeh", &["63|33", "05"]),
    ("silluq", &["75", "00"]),
];

/// Tiphchah followed by silluq or atnach within the same unit
const MAYELAH: &[&str] = &["73", "75|92"];

const CONJUNCTIVE_21: Table = &[
    ("munach", &["74"]),
    ("mahpak", &["70"]),
    ("merkha", &["71"]),
    ("merkha kefula", &["72"]),
    ("darga", &["94"]),
    ("qadma", &["63|33"]),
    ("telisha qetanna", &["04|24"]),
    ("galgal", &["93"]),
    ("mayelah", MAYELAH),
];

const CONJUNCTIVE_3: Table = &[
    ("munach", &["74"]),
    ("mahpak", &["70"]),
    ("merkha", &["71"]),
    ("tarcha", &["73"]),
    ("galgal", &["93"]),
    ("azla", &["63|33"]),
    ("ole", &["60"]),
    ("iluy", &["64"]),
    ("mayelah", MAYELAH),
];

#[derive(Debug, Clone)]
struct AccentPattern {
    name: &'static str,
    regex: Regex,
}

/// Anchored at the start of the marker, each code matched as a whole code
fn compile(codes: &[&str]) -> Regex {
    let mut source = String::from("^");
    for code in codes {
        source.push_str(&format!(r".*\b(?:{code})\b"));
    }
    Regex::new(&source).expect("accent tables hold valid patterns")
}

fn compile_table(table: Table) -> Vec<AccentPattern> {
    table
        .iter()
        .map(|&(name, codes)| AccentPattern {
            name,
            regex: compile(codes),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct PartitionTables {
    disjunctive: Vec<AccentPattern>,
    conjunctive: Vec<AccentPattern>,
}

impl PartitionTables {
    fn new(disjunctive: Table, conjunctive: Table) -> Self {
        Self {
            disjunctive: compile_table(disjunctive),
            conjunctive: compile_table(conjunctive),
        }
    }
}

fn matching(patterns: &[AccentPattern], marker: &str) -> Vec<&'static str> {
    patterns
        .iter()
        .filter(|pattern| pattern.regex.is_match(marker))
        .map(|pattern| pattern.name)
        .collect()
}

/// Compiled accent tables for both partitions
#[derive(Debug, Clone)]
pub struct AccentClassifier {
    twenty_one: PartitionTables,
    three: PartitionTables,
    mayelah: Regex,
}

impl AccentClassifier {
    pub fn new() -> Self {
        Self {
            twenty_one: PartitionTables::new(DISJUNCTIVE_21, CONJUNCTIVE_21),
            three: PartitionTables::new(DISJUNCTIVE_3, CONJUNCTIVE_3),
            mayelah: compile(MAYELAH),
        }
    }

    fn tables(&self, partition: Partition) -> &PartitionTables {
        match partition {
            Partition::TwentyOne => &self.twenty_one,
            Partition::Three => &self.three,
        }
    }

    /// Classify a normalized marker string
    ///
    /// Disjunctive patterns are tried first; conjunctive patterns are only
    /// consulted when no disjunctive pattern matched.
    pub fn classify_marker(&self, partition: Partition, marker: &str) -> AccentLabel {
        let tables = self.tables(partition);

        let mut names = matching(&tables.disjunctive, marker);
        if self.mayelah.is_match(marker) {
            // tiphchah before silluq/atnach is the conjunctive mayelah
            names.retain(|&name| name != "tiphchah");
        }
        if !names.is_empty() {
            return AccentLabel {
                kind: AccentKind::Disjunctive,
                names,
            };
        }

        let names = matching(&tables.conjunctive, marker);
        if !names.is_empty() {
            return AccentLabel {
                kind: AccentKind::Conjunctive,
                names,
            };
        }

        AccentLabel::unknown()
    }

    pub fn classify<C: Corpus + ?Sized>(
        &self,
        corpus: &C,
        token: TokenId,
    ) -> Result<AccentLabel, AnalysisError> {
        let section = corpus
            .section(token)
            .ok_or(AnalysisError::Unsectioned { token })?;
        let partition = Partition::of_book(section.book);
        let word = phonological_word(corpus, token)?;
        Ok(self.classify_marker(partition, &marker(corpus, &word)))
    }
}

impl Default for AccentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// True if nothing but maqqeph (or nothing at all) separates the token from
/// the next one
pub fn binds_to_next<C: Corpus + ?Sized>(corpus: &C, token: TokenId) -> bool {
    let trailer = corpus.feature_or_empty(token, Feature::Trailer);
    trailer.is_empty() || trailer.contains('&')
}

/// The tokens sharing one accent unit with `token`, in corpus order
pub fn phonological_word<C: Corpus + ?Sized>(
    corpus: &C,
    token: TokenId,
) -> Result<Vec<TokenId>, ScopeError> {
    let p = Positions::new(corpus, token, UnitType::Verse)?;

    let mut start = 0;
    while let Some(prev) = p.get(start - 1) {
        if !binds_to_next(corpus, prev) {
            break;
        }
        start -= 1;
    }

    let mut end = 0;
    while let (Some(current), Some(_)) = (p.get(end), p.get(end + 1)) {
        if !binds_to_next(corpus, current) {
            break;
        }
        end += 1;
    }

    Ok((start..=end).filter_map(|offset| p.get(offset)).collect())
}

/// Accent codes of a token sequence, space separated, with `&` between
/// tokens joined by maqqeph
pub fn marker<C: Corpus + ?Sized>(corpus: &C, tokens: &[TokenId]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (i, &token) in tokens.iter().enumerate() {
        let rendered = corpus.render(&[token]);
        parts.extend(accent_codes(&rendered).map(str::to_string));
        if i + 1 < tokens.len() && rendered.trim_end().ends_with('&') {
            parts.push("&".to_string());
        }
    }
    parts.join(" ")
}

/// Runs of digits split into two-digit codes
fn accent_codes(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .flat_map(|run| (0..run.len() / 2).map(move |i| &run[2 * i..2 * i + 2]))
}
