use std::io::BufRead;

use crate::errors::{PerceptagError, Result};
use crate::vocabulary::{START_TAG, STOP_TAG};

/// A token of a labeled corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased surface form. May contain internal spaces.
    pub word: String,

    /// Gold tag.
    pub tag: String,
}

/// A line of a labeled corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A token with its gold tag.
    Token(Token),

    /// A blank line closing a sentence.
    Boundary,
}

impl Record {
    /// Parses a line of a labeled corpus.
    ///
    /// The line is trimmed first. An empty line is a sentence boundary. Otherwise the tag is
    /// the substring after the last space and the word is everything before it, lowercased.
    ///
    /// # Arguments
    ///
    /// * `line` - A line without the trailing newline.
    /// * `line_no` - The 1-based line number used in error messages.
    ///
    /// # Errors
    ///
    /// [`PerceptagError::InvalidCorpus`] is returned when a non-blank line has no space, or
    /// when its tag is one of the sentinels [`START_TAG`] and [`STOP_TAG`].
    ///
    /// # Examples
    ///
    /// ```
    /// use perceptag::{Record, Token};
    ///
    /// let r = Record::parse_labeled("New York NNP", 1).unwrap();
    /// assert_eq!(
    ///     Record::Token(Token { word: "new york".into(), tag: "NNP".into() }),
    ///     r,
    /// );
    /// assert_eq!(Record::Boundary, Record::parse_labeled("  ", 2).unwrap());
    /// ```
    pub fn parse_labeled(line: &str, line_no: usize) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Boundary);
        }
        let (word, tag) = line.rsplit_once(' ').ok_or_else(|| {
            PerceptagError::invalid_corpus(line_no, format!("no tag separator in {line:?}"))
        })?;
        if tag == START_TAG || tag == STOP_TAG {
            return Err(PerceptagError::invalid_corpus(
                line_no,
                format!("reserved tag {tag:?}"),
            ));
        }
        Ok(Self::Token(Token {
            word: word.to_lowercase(),
            tag: tag.to_string(),
        }))
    }
}

/// Normalizes a line of unlabeled input.
///
/// Returns `None` for a sentence boundary, otherwise the trimmed and lowercased token.
pub fn normalize_token(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_lowercase())
    }
}

/// An in-memory labeled corpus.
///
/// Records are kept in input order, so an epoch is a restart of [`Corpus::records`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    records: Vec<Record>,
}

impl Corpus {
    /// Reads a labeled corpus.
    ///
    /// # Errors
    ///
    /// Read errors are returned as is. A malformed line yields
    /// [`PerceptagError::InvalidCorpus`].
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut corpus = Self::default();
        for (i, line) in rdr.lines().enumerate() {
            corpus.records.push(Record::parse_labeled(&line?, i + 1)?);
        }
        Ok(corpus)
    }

    /// Parses a labeled corpus from in-memory lines.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let records = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| Record::parse_labeled(line.as_ref(), i + 1))
            .collect::<Result<_>>()?;
        Ok(Self { records })
    }

    /// Appends another corpus.
    ///
    /// If the current corpus ends in the middle of a sentence, a boundary is inserted first
    /// so that sentences never span two sources.
    pub fn append(&mut self, mut other: Self) {
        self.close_sentence();
        self.records.append(&mut other.records);
    }

    /// Terminates a trailing unterminated sentence with a boundary.
    pub fn close_sentence(&mut self) {
        if let Some(Record::Token(_)) = self.records.last() {
            self.records.push(Record::Boundary);
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records, including boundaries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of tokens, excluding boundaries.
    pub fn n_tokens(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, Record::Token(_)))
            .count()
    }

    /// Iterates over non-empty sentences.
    ///
    /// A trailing sentence without a closing boundary is yielded as well.
    pub fn sentences(&self) -> Sentences<'_> {
        Sentences {
            records: &self.records,
        }
    }
}

/// Iterator over the sentences of a [`Corpus`].
pub struct Sentences<'a> {
    records: &'a [Record],
}

impl<'a> Iterator for Sentences<'a> {
    type Item = Vec<&'a Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.records.is_empty() {
                return None;
            }
            let end = self
                .records
                .iter()
                .position(|r| *r == Record::Boundary)
                .unwrap_or(self.records.len());
            let sentence: Vec<&Token> = self.records[..end]
                .iter()
                .filter_map(|r| match r {
                    Record::Token(token) => Some(token),
                    Record::Boundary => None,
                })
                .collect();
            self.records = &self.records[(end + 1).min(self.records.len())..];
            if !sentence.is_empty() {
                return Some(sentence);
            }
        }
    }
}
