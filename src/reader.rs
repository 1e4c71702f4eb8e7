//! Corpus file parsing
//!
//! Reads a tab-separated word-per-line format into a [`TextCorpus`]:
//!
//! ```text
//! # book = Genesis
//! # chapter = 1
//! # verse = 1
//! 1	B.:-	_	B	prep	_	pdp=prep	1	1	1
//! 2	R;>CI73JT	 	R>CJT/	subs	a	nu=sg|gn=f	1	1	1
//! ```
//!
//! Columns: ID, TEXT, TRAILER, LEX, SP, ST, FEATS, ATOM, PHRASE, CLAUSE.
//! `_` marks an empty value. A change of the ATOM, PHRASE or CLAUSE id opens
//! a new unit of that type; a blank line closes the current verse.
//! Files ending in `.gz` are decompressed on the fly.

use crate::corpus::{CorpusBuilder, Feature, TextCorpus, UnitType, UnknownName, WordSpec};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Lines};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Error while reading a corpus file
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error at line {line_num}: {message}")]
    Line { line_num: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn error(line_num: usize, message: String) -> ParseError {
    ParseError::Line { line_num, message }
}

const COLUMNS: usize = 10;

/// Unit columns, largest first
const UNIT_COLUMNS: [(usize, UnitType); 3] = [
    (9, UnitType::Clause),
    (8, UnitType::Phrase),
    (7, UnitType::PhraseAtom),
];

pub struct CorpusReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
}

impl CorpusReader<Box<dyn BufRead>> {
    /// Open a corpus file, decompressing `.gz` files
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl CorpusReader<Cursor<String>> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::new(Cursor::new(text.to_string()))
    }
}

impl<R: BufRead> CorpusReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    /// Parse the whole input
    pub fn read(mut self) -> Result<TextCorpus, ParseError> {
        let mut builder = TextCorpus::builder();
        let mut units: [Option<String>; 3] = Default::default();

        while let Some(line) = self.lines.next() {
            self.line_num += 1;
            let line = line?;
            let line = line.trim_end_matches('\r');

            if line.trim().is_empty() {
                builder.start(UnitType::Verse);
                units = Default::default();
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                if parse_comment(comment, self.line_num, &mut builder)? {
                    units = Default::default();
                }
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != COLUMNS {
                return Err(error(
                    self.line_num,
                    format!("Expected {COLUMNS} fields, found {}", fields.len()),
                ));
            }

            for ((column, kind), open) in UNIT_COLUMNS.iter().zip(units.iter_mut()) {
                let id = fields[*column];
                if open.as_deref() != Some(id) {
                    builder.start(*kind);
                    *open = Some(id.to_string());
                }
            }

            let word = parse_word(&fields, self.line_num)?;
            builder.push(word);
        }

        let corpus = builder.build();
        info!(
            words = corpus.len(),
            verses = corpus.unit_count(UnitType::Verse),
            "corpus read"
        );
        Ok(corpus)
    }
}

/// Apply a `# key = value` line; true if it opened a section
fn parse_comment(
    comment: &str,
    line_num: usize,
    builder: &mut CorpusBuilder,
) -> Result<bool, ParseError> {
    let Some((key, value)) = comment.split_once('=') else {
        return Ok(false);
    };
    let value = value.trim();
    let number = || {
        value
            .parse::<u32>()
            .map_err(|_| error(line_num, format!("Invalid number: {value}")))
    };

    match key.trim() {
        "book" => builder.start_book(value),
        "chapter" => builder.start_chapter(number()?),
        "verse" => builder.start_verse(number()?),
        _ => return Ok(false),
    };
    Ok(true)
}

fn value(field: &str) -> Option<&str> {
    if field == "_" { None } else { Some(field) }
}

fn parse_word(fields: &[&str], line_num: usize) -> Result<WordSpec, ParseError> {
    fields[0]
        .parse::<usize>()
        .map_err(|_| error(line_num, format!("Invalid ID: {}", fields[0])))?;

    let mut word = WordSpec::default();
    let columns = [
        (1, Feature::Text),
        (2, Feature::Trailer),
        (3, Feature::Lex),
        (4, Feature::Sp),
        (5, Feature::St),
    ];
    for (column, feature) in columns {
        match value(fields[column]) {
            Some(v) => word.set(feature, v),
            // an absent trailer means the next word follows directly
            None if feature == Feature::Trailer => word.set(feature, ""),
            None => word.unset(feature),
        }
    }

    if let Some(feats) = value(fields[6]) {
        for pair in feats.split('|') {
            let Some((key, v)) = pair.split_once('=') else {
                return Err(error(line_num, format!("Invalid feature: {pair}")));
            };
            let feature: Feature = key
                .parse()
                .map_err(|e: UnknownName| error(line_num, e.to_string()))?;
            word.set(feature, v);
        }
    }

    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const GENESIS: &str = "# book = Genesis
# chapter = 1
# verse = 1
1\tB.:-\t_\tB\tprep\t_\tpdp=prep\t1\t1\t1
2\tR;>CI73JT\t \tR>CJT/\tsubs\ta\tnu=sg|gn=f\t1\t1\t1
3\tB.@R@74>\t \tBR>[\tverb\t_\tvt=perf\t2\t2\t1
4\t>:ELOHI92YM\t \t>LHJM/\tsubs\ta\tnu=pl\t3\t3\t1

# verse = 2
1\tW:@-\t_\tW\tconj\t_\t_\t1\t1\t1
2\tH@>@75REY\t00 \t>RY/\tsubs\ta\t_\t1\t1\t1
";

    #[test]
    fn test_read_words_and_features() {
        let corpus = CorpusReader::from_str(GENESIS).read().unwrap();

        assert_eq!(corpus.len(), 6);
        assert_eq!(corpus.feature(0, Feature::Trailer), Some(""));
        assert_eq!(corpus.feature(1, Feature::Lex), Some("R>CJT/"));
        assert_eq!(corpus.feature(1, Feature::Gn), Some("f"));
        assert_eq!(corpus.feature(0, Feature::Pdp), Some("prep"));
        assert_eq!(corpus.feature(0, Feature::St), None);
        assert_eq!(corpus.feature(5, Feature::Trailer), Some("00 "));
    }

    #[test]
    fn test_read_units() {
        let corpus = CorpusReader::from_str(GENESIS).read().unwrap();

        assert_eq!(corpus.unit_count(UnitType::Verse), 2);
        assert_eq!(corpus.unit_count(UnitType::Chapter), 1);
        assert_eq!(corpus.unit_count(UnitType::PhraseAtom), 4);
        assert_eq!(corpus.unit_count(UnitType::Clause), 2);

        let atom = corpus.enclosing(1, UnitType::PhraseAtom).unwrap();
        assert_eq!(corpus.tokens_of(atom), &[0, 1]);

        let section = corpus.section(5).unwrap();
        assert_eq!((section.book, section.chapter, section.verse), ("Genesis", 1, 2));
    }

    #[test]
    fn test_field_count_error() {
        let err = CorpusReader::from_str("# verse = 1\n1\tW\tW\n").read().unwrap_err();
        assert_eq!(err.to_string(), "Parse error at line 2: Expected 10 fields, found 3");
    }

    #[test]
    fn test_unknown_feature_error() {
        let line = "1\tW\t_\tW\tconj\t_\tcase=nom\t1\t1\t1\n";
        let err = CorpusReader::from_str(line).read().unwrap_err();
        assert!(matches!(err, ParseError::Line { line_num: 1, .. }));
        assert!(err.to_string().contains("unknown feature: case"));
    }

    #[test]
    fn test_invalid_verse_number() {
        let err = CorpusReader::from_str("# verse = one\n").read().unwrap_err();
        assert!(err.to_string().contains("Invalid number: one"));
    }

    #[test]
    fn test_read_gzip_file() {
        let path = std::env::temp_dir().join(format!("wordgrammar-{}.tsv.gz", std::process::id()));
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(GENESIS.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let corpus = CorpusReader::from_file(&path).unwrap().read().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(corpus.len(), 6);
        assert_eq!(corpus.feature(3, Feature::Text), Some(">:ELOHI92YM"));
    }
}
