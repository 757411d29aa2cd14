use std::fmt;
use std::io::{BufRead, Write};

use crate::corpus;
use crate::errors::Result;
use crate::model::{Context, Model};
use crate::scorer::Scorer;

/// Placeholder printed for tokens that received no tag.
pub const UNRESOLVED_TAG: &str = "UNRESOLVED";

/// A line of tagger output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedLine<'a> {
    /// A lowercased token with its decided tag.
    Token {
        word: String,
        tag: Option<&'a str>,
    },

    /// A blank line separating sentences.
    Boundary,
}

impl fmt::Display for TaggedLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Token { word, tag } => {
                write!(f, "{} {}", word, tag.unwrap_or(UNRESOLVED_TAG))
            }
            Self::Boundary => Ok(()),
        }
    }
}

/// Greedy left-to-right tagger.
///
/// # Examples
///
/// ```
/// use perceptag::{Corpus, Tagger, Trainer};
///
/// let corpus = Corpus::from_lines(["dog NN", "the DT", ""]).unwrap();
/// let (model, _) = Trainer::new(&corpus).train(1).unwrap();
/// let tagger = Tagger::new(model);
///
/// let lines: Vec<String> = tagger
///     .tag_lines(["Dog", "the", "", "cat"])
///     .map(|line| line.to_string())
///     .collect();
/// assert_eq!(vec!["dog NN", "the DT", "", "cat NN"], lines);
/// ```
pub struct Tagger {
    model: Model,
}

impl Tagger {
    /// Creates a new tagger.
    ///
    /// # Arguments
    ///
    /// * `model` - A trained model.
    pub fn new(model: Model) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn scorer(&self) -> Scorer<'_> {
        Scorer::new(&self.model)
    }

    /// Decides a single tag, see [`Scorer::decide`].
    pub fn decide(&self, context: Context, word: &str) -> Option<&str> {
        self.scorer()
            .decide(context, word)
            .and_then(|id| self.model.tags.name(id))
    }

    /// Tags one sentence. Words are lowercased before decoding.
    ///
    /// # Returns
    ///
    /// One decision per word, `None` where no tag could be decided.
    pub fn tag_sentence<S>(&self, words: &[S]) -> Vec<Option<&str>>
    where
        S: AsRef<str>,
    {
        let scorer = self.scorer();
        let mut context = Context::Start;
        let mut tags = Vec::with_capacity(words.len());
        for word in words {
            let decided = scorer.decide(context, &word.as_ref().to_lowercase());
            context = Context::from(decided);
            tags.push(decided.and_then(|id| self.model.tags.name(id)));
        }
        tags
    }

    /// Lazily tags a sequence of unlabeled lines.
    ///
    /// A blank line resets the context and is echoed as [`TaggedLine::Boundary`].
    pub fn tag_lines<I>(&self, lines: I) -> TaggedLines<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        TaggedLines {
            tagger: self,
            scorer: self.scorer(),
            lines: lines.into_iter(),
            context: Context::Start,
        }
    }

    /// Tags every line of `rdr` and writes the result to `wtr`.
    ///
    /// # Returns
    ///
    /// The number of tagged tokens.
    ///
    /// # Errors
    ///
    /// I/O errors of `rdr` and `wtr` are returned as is.
    pub fn tag_stream<R, W>(&self, rdr: R, wtr: &mut W) -> Result<usize>
    where
        R: BufRead,
        W: Write,
    {
        let scorer = self.scorer();
        let mut context = Context::Start;
        let mut n_tokens = 0;
        for line in rdr.lines() {
            let tagged = self.step(&scorer, &mut context, &line?);
            if let TaggedLine::Token { .. } = tagged {
                n_tokens += 1;
            }
            writeln!(wtr, "{tagged}")?;
        }
        Ok(n_tokens)
    }

    fn step(&self, scorer: &Scorer, context: &mut Context, line: &str) -> TaggedLine<'_> {
        match corpus::normalize_token(line) {
            Some(word) => {
                let decided = scorer.decide(*context, &word);
                *context = Context::from(decided);
                TaggedLine::Token {
                    word,
                    tag: decided.and_then(|id| self.model.tags.name(id)),
                }
            }
            None => {
                *context = Context::Start;
                TaggedLine::Boundary
            }
        }
    }
}

/// Iterator returned by [`Tagger::tag_lines`].
pub struct TaggedLines<'a, I> {
    tagger: &'a Tagger,
    scorer: Scorer<'a>,
    lines: I,
    context: Context,
}

impl<'a, I> Iterator for TaggedLines<'a, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = TaggedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(
            self.tagger
                .step(&self.scorer, &mut self.context, line.as_ref()),
        )
    }
}
