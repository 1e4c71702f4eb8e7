//! Corpus data structures
//!
//! The analysis core only talks to a corpus through the [`Corpus`] trait.
//! [`TextCorpus`] is an in-memory implementation holding one sequential text
//! split into nested, contiguous units: phrase atoms inside phrases inside
//! clauses inside verses inside chapters inside books.

use lasso::{Rodeo, Spur};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a token (word). Ids follow corpus order.
pub type TokenId = usize;

/// Structural unit types, ordered by containment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitType {
    Word,
    PhraseAtom,
    Phrase,
    Clause,
    Verse,
    Chapter,
    Book,
}

impl UnitType {
    /// All unit types that can contain words, smallest first
    pub const CONTAINERS: [UnitType; 6] = [
        UnitType::PhraseAtom,
        UnitType::Phrase,
        UnitType::Clause,
        UnitType::Verse,
        UnitType::Chapter,
        UnitType::Book,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnitType::Word => "word",
            UnitType::PhraseAtom => "phrase_atom",
            UnitType::Phrase => "phrase",
            UnitType::Clause => "clause",
            UnitType::Verse => "verse",
            UnitType::Chapter => "chapter",
            UnitType::Book => "book",
        }
    }

    /// True if units of this type properly contain units of `other`
    pub fn contains(self, other: UnitType) -> bool {
        self > other
    }

    fn slot(self) -> Option<usize> {
        match self {
            UnitType::Word => None,
            UnitType::PhraseAtom => Some(0),
            UnitType::Phrase => Some(1),
            UnitType::Clause => Some(2),
            UnitType::Verse => Some(3),
            UnitType::Chapter => Some(4),
            UnitType::Book => Some(5),
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A name that does not denote a known unit type or feature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {name}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

impl FromStr for UnitType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "word" => Ok(UnitType::Word),
            "phrase_atom" => Ok(UnitType::PhraseAtom),
            "phrase" => Ok(UnitType::Phrase),
            "clause" => Ok(UnitType::Clause),
            "verse" => Ok(UnitType::Verse),
            "chapter" => Ok(UnitType::Chapter),
            "book" => Ok(UnitType::Book),
            _ => Err(UnknownName {
                kind: "unit type",
                name: s.to_string(),
            }),
        }
    }
}

/// Token attributes consulted by the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Transliterated surface text, accent codes included
    Text,
    /// Material after the word: space, maqqeph (`&`), paseq, sof pasuq
    Trailer,
    Lex,
    /// Part of speech
    Sp,
    /// Phrase-dependent part of speech
    Pdp,
    /// State: `c` construct, `a` absolute, `e` emphatic, `NA`
    St,
    Nu,
    Gn,
    /// Verbal tense, used for participles
    Vt,
    /// Lexical set (`card`, `ordn`, `ppre`, ...)
    Ls,
}

impl Feature {
    pub const COUNT: usize = 10;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::Text,
        Feature::Trailer,
        Feature::Lex,
        Feature::Sp,
        Feature::Pdp,
        Feature::St,
        Feature::Nu,
        Feature::Gn,
        Feature::Vt,
        Feature::Ls,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Text => "text",
            Feature::Trailer => "trailer",
            Feature::Lex => "lex",
            Feature::Sp => "sp",
            Feature::Pdp => "pdp",
            Feature::St => "st",
            Feature::Nu => "nu",
            Feature::Gn => "gn",
            Feature::Vt => "vt",
            Feature::Ls => "ls",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| UnknownName {
                kind: "feature",
                name: s.to_string(),
            })
    }
}

/// Handle to one unit of a given type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    pub kind: UnitType,
    pub index: usize,
}

/// Book, chapter and verse of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub book: &'a str,
    pub chapter: u32,
    pub verse: u32,
}

/// Read-only access to an annotated corpus
pub trait Corpus {
    /// All tokens in corpus order
    fn tokens(&self) -> &[TokenId];

    /// Value of a feature, `None` when undefined
    fn feature(&self, token: TokenId, feature: Feature) -> Option<&str>;

    /// The unit of type `kind` containing `token`
    fn enclosing(&self, token: TokenId, kind: UnitType) -> Option<Unit>;

    /// Tokens of a unit in corpus order
    fn tokens_of(&self, unit: Unit) -> &[TokenId];

    fn section(&self, token: TokenId) -> Option<Section<'_>>;

    /// Value of a feature, empty when undefined
    fn feature_or_empty(&self, token: TokenId, feature: Feature) -> &str {
        self.feature(token, feature).unwrap_or("")
    }

    /// Surface rendering of a token sequence (text followed by trailer)
    fn render(&self, tokens: &[TokenId]) -> String {
        let mut out = String::new();
        for &token in tokens {
            out.push_str(self.feature_or_empty(token, Feature::Text));
            out.push_str(self.feature_or_empty(token, Feature::Trailer));
        }
        out
    }
}

#[derive(Debug, Clone, Default)]
struct UnitTable {
    spans: Vec<Range<usize>>,
    of_token: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct VerseRef {
    book: Spur,
    chapter: u32,
    verse: u32,
}

/// In-memory corpus
#[derive(Debug)]
pub struct TextCorpus {
    strings: Rodeo,
    words: Vec<[Option<Spur>; Feature::COUNT]>,
    ids: Vec<TokenId>,
    units: [UnitTable; 6],
    verses: Vec<VerseRef>,
}

impl TextCorpus {
    pub fn builder() -> CorpusBuilder {
        CorpusBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of units of a given type
    pub fn unit_count(&self, kind: UnitType) -> usize {
        match kind.slot() {
            Some(slot) => self.units[slot].spans.len(),
            None => self.words.len(),
        }
    }
}

impl Corpus for TextCorpus {
    fn tokens(&self) -> &[TokenId] {
        &self.ids
    }

    fn feature(&self, token: TokenId, feature: Feature) -> Option<&str> {
        let spur = self.words.get(token)?[feature.index()]?;
        Some(self.strings.resolve(&spur))
    }

    fn enclosing(&self, token: TokenId, kind: UnitType) -> Option<Unit> {
        if token >= self.words.len() {
            return None;
        }
        let index = match kind.slot() {
            Some(slot) => *self.units[slot].of_token.get(token)?,
            None => token,
        };
        Some(Unit { kind, index })
    }

    fn tokens_of(&self, unit: Unit) -> &[TokenId] {
        let span = match unit.kind.slot() {
            Some(slot) => self.units[slot].spans.get(unit.index).cloned(),
            None if unit.index < self.ids.len() => Some(unit.index..unit.index + 1),
            None => None,
        };
        span.map(|span| &self.ids[span]).unwrap_or(&[])
    }

    fn section(&self, token: TokenId) -> Option<Section<'_>> {
        let verse = self.enclosing(token, UnitType::Verse)?;
        let verse = self.verses.get(verse.index)?;
        Some(Section {
            book: self.strings.resolve(&verse.book),
            chapter: verse.chapter,
            verse: verse.verse,
        })
    }
}

/// Feature values for one word to be added to a corpus
#[derive(Debug, Clone, Default)]
pub struct WordSpec {
    values: [Option<String>; Feature::COUNT],
}

impl WordSpec {
    /// A word followed by a plain space
    pub fn new(text: &str, lex: &str, sp: &str) -> Self {
        Self::default()
            .with(Feature::Text, text)
            .with(Feature::Trailer, " ")
            .with(Feature::Lex, lex)
            .with(Feature::Sp, sp)
    }

    pub fn with(mut self, feature: Feature, value: &str) -> Self {
        self.set(feature, value);
        self
    }

    pub fn set(&mut self, feature: Feature, value: &str) {
        self.values[feature.index()] = Some(value.to_string());
    }

    pub fn unset(&mut self, feature: Feature) {
        self.values[feature.index()] = None;
    }
}

/// Incremental construction of a [`TextCorpus`]
///
/// Starting a unit closes the open unit of that type and of every smaller
/// type; the next pushed word opens fresh units wherever none is open.
#[derive(Debug)]
pub struct CorpusBuilder {
    corpus: TextCorpus,
    open: [bool; 6],
    book: Spur,
    chapter: u32,
    verse: u32,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        let mut strings = Rodeo::new();
        let book = strings.get_or_intern_static("");
        Self {
            corpus: TextCorpus {
                strings,
                words: Vec::new(),
                ids: Vec::new(),
                units: Default::default(),
                verses: Vec::new(),
            },
            open: [false; 6],
            book,
            chapter: 0,
            verse: 0,
        }
    }

    /// Close the current unit of `kind` (and all smaller ones)
    pub fn start(&mut self, kind: UnitType) -> &mut Self {
        for container in UnitType::CONTAINERS {
            if container <= kind {
                if let Some(slot) = container.slot() {
                    self.open[slot] = false;
                }
            }
        }
        self
    }

    pub fn start_book(&mut self, name: &str) -> &mut Self {
        self.book = self.corpus.strings.get_or_intern(name);
        self.start(UnitType::Book)
    }

    pub fn start_chapter(&mut self, chapter: u32) -> &mut Self {
        self.chapter = chapter;
        self.start(UnitType::Chapter)
    }

    pub fn start_verse(&mut self, verse: u32) -> &mut Self {
        self.verse = verse;
        self.start(UnitType::Verse)
    }

    /// Append a word, returning its token id
    pub fn push(&mut self, word: WordSpec) -> TokenId {
        let id = self.corpus.words.len();
        let mut values = [None; Feature::COUNT];
        for (slot, value) in values.iter_mut().zip(word.values.iter()) {
            *slot = value.as_deref().map(|v| self.corpus.strings.get_or_intern(v));
        }
        self.corpus.words.push(values);
        self.corpus.ids.push(id);

        for container in UnitType::CONTAINERS {
            let Some(slot) = container.slot() else {
                continue;
            };
            let table = &mut self.corpus.units[slot];
            if !self.open[slot] {
                table.spans.push(id..id);
                self.open[slot] = true;
                if container == UnitType::Verse {
                    self.corpus.verses.push(VerseRef {
                        book: self.book,
                        chapter: self.chapter,
                        verse: self.verse,
                    });
                }
            }
            let unit = table.spans.len() - 1;
            table.spans[unit].end = id + 1;
            table.of_token.push(unit);
        }
        id
    }

    pub fn build(self) -> TextCorpus {
        self.corpus
    }
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_verse_corpus() -> TextCorpus {
        let mut builder = TextCorpus::builder();
        builder.start_book("Genesis").start_chapter(1).start_verse(1);
        builder.push(WordSpec::new("B.:-", "B", "prep").with(Feature::Trailer, ""));
        builder.push(WordSpec::new("R;>CI73JT", "R>CJT/", "subs"));
        builder.start(UnitType::PhraseAtom);
        builder.push(WordSpec::new("B.@R@74>", "BR>[", "verb"));
        builder.start_verse(2);
        builder.push(WordSpec::new("W:@-", "W", "conj"));
        builder.build()
    }

    #[test]
    fn test_corpus_creation() {
        let corpus = two_verse_corpus();

        assert_eq!(corpus.len(), 4);
        assert_eq!(corpus.tokens(), &[0, 1, 2, 3]);
        assert_eq!(corpus.feature(1, Feature::Lex), Some("R>CJT/"));
        assert_eq!(corpus.feature(1, Feature::St), None);
        assert_eq!(corpus.feature_or_empty(1, Feature::St), "");
    }

    #[test]
    fn test_units_nest() {
        let corpus = two_verse_corpus();

        assert_eq!(corpus.unit_count(UnitType::PhraseAtom), 3);
        assert_eq!(corpus.unit_count(UnitType::Verse), 2);
        assert_eq!(corpus.unit_count(UnitType::Book), 1);

        let atom = corpus.enclosing(1, UnitType::PhraseAtom).unwrap();
        assert_eq!(corpus.tokens_of(atom), &[0, 1]);
        let verse = corpus.enclosing(3, UnitType::Verse).unwrap();
        assert_eq!(corpus.tokens_of(verse), &[3]);
        let word = corpus.enclosing(2, UnitType::Word).unwrap();
        assert_eq!(corpus.tokens_of(word), &[2]);
        assert_eq!(corpus.enclosing(9, UnitType::Verse), None);
    }

    #[test]
    fn test_sections() {
        let corpus = two_verse_corpus();

        let section = corpus.section(2).unwrap();
        assert_eq!(section.book, "Genesis");
        assert_eq!((section.chapter, section.verse), (1, 1));
        assert_eq!(corpus.section(3).unwrap().verse, 2);
    }

    #[test]
    fn test_render() {
        let corpus = two_verse_corpus();
        assert_eq!(corpus.render(&[0, 1]), "B.:-R;>CI73JT ");
    }

    #[test]
    fn test_names_parse() {
        assert_eq!("phrase_atom".parse::<UnitType>(), Ok(UnitType::PhraseAtom));
        assert_eq!("sp".parse::<Feature>(), Ok(Feature::Sp));
        assert!("gloss".parse::<Feature>().is_err());
        assert!(UnitType::Verse.contains(UnitType::Word));
        assert!(!UnitType::Word.contains(UnitType::Word));
    }
}
