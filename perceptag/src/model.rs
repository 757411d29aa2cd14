use std::io::{Read, Write};

use crate::corpus::Corpus;
use crate::errors::{PerceptagError, Result};
use crate::vocabulary::{self, Indexer, TagSet, Vocabulary};

/// Score stored in the tables. Every training update moves an entry by exactly one.
pub type ScoreValue = i32;

/// Source side of a transition: the tag decided for the preceding token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    /// Beginning of a sentence.
    Start,

    /// A tag id.
    Tag(usize),

    /// The preceding decision produced no tag. No transition row exists for it.
    Unresolved,
}

impl From<Option<usize>> for Context {
    fn from(tag: Option<usize>) -> Self {
        tag.map_or(Self::Unresolved, Self::Tag)
    }
}

/// Target side of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    /// A tag id.
    Tag(usize),

    /// End of a sentence.
    Stop,
}

// Transition scores are a dense (n_tags + 1) x (n_tags + 1) matrix:
//
//           tag0 tag1 ... STOP
//
// tag0        .    .        .
// tag1        .    .        .
// ...
// START       .    .        .
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionTable {
    n_tags: usize,
    scores: Vec<ScoreValue>,
}

impl TransitionTable {
    /// Allocates a zero-filled table over `n_tags` tags and the two sentinels.
    pub fn new(n_tags: usize) -> Self {
        Self {
            n_tags,
            scores: vec![0; (n_tags + 1) * (n_tags + 1)],
        }
    }

    #[inline]
    fn row_index(&self, context: Context) -> Option<usize> {
        match context {
            Context::Start => Some(self.n_tags),
            Context::Tag(id) if id < self.n_tags => Some(id),
            _ => None,
        }
    }

    #[inline]
    fn col_index(&self, label: Label) -> Option<usize> {
        match label {
            Label::Stop => Some(self.n_tags),
            Label::Tag(id) if id < self.n_tags => Some(id),
            Label::Tag(_) => None,
        }
    }

    /// Gets the scores of all targets reachable from `context`, indexed by tag id with the
    /// [`Label::Stop`] score last.
    ///
    /// Returns `None` if the context has no row.
    #[inline]
    pub fn row(&self, context: Context) -> Option<&[ScoreValue]> {
        let width = self.n_tags + 1;
        let r = self.row_index(context)?;
        Some(&self.scores[r * width..(r + 1) * width])
    }

    #[inline]
    pub fn get(&self, context: Context, label: Label) -> Option<ScoreValue> {
        let r = self.row_index(context)?;
        let c = self.col_index(label)?;
        Some(self.scores[r * (self.n_tags + 1) + c])
    }

    /// Adds `delta` to an entry, saturating at the bounds of [`ScoreValue`]. Out-of-domain
    /// keys are ignored.
    pub fn add(&mut self, context: Context, label: Label, delta: ScoreValue) {
        if let (Some(r), Some(c)) = (self.row_index(context), self.col_index(label)) {
            let score = &mut self.scores[r * (self.n_tags + 1) + c];
            *score = score.saturating_add(delta);
        }
    }

    /// Overwrites an entry.
    ///
    /// Returns `false` if the key is out of domain.
    pub fn set(&mut self, context: Context, label: Label, score: ScoreValue) -> bool {
        match (self.row_index(context), self.col_index(label)) {
            (Some(r), Some(c)) => {
                self.scores[r * (self.n_tags + 1) + c] = score;
                true
            }
            _ => false,
        }
    }

    pub const fn n_tags(&self) -> usize {
        self.n_tags
    }
}

// Emission scores are a dense n_tags x n_words matrix in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmissionTable {
    n_words: usize,
    scores: Vec<ScoreValue>,
}

impl EmissionTable {
    /// Allocates a zero-filled table.
    pub fn new(n_tags: usize, n_words: usize) -> Self {
        Self {
            n_words,
            scores: vec![0; n_tags * n_words],
        }
    }

    #[inline]
    fn index(&self, tag: usize, word: usize) -> Option<usize> {
        if word < self.n_words {
            let idx = tag * self.n_words + word;
            (idx < self.scores.len()).then_some(idx)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, tag: usize, word: usize) -> Option<ScoreValue> {
        self.index(tag, word).map(|idx| self.scores[idx])
    }

    /// Adds `delta` to an entry, saturating at the bounds of [`ScoreValue`]. Out-of-domain
    /// keys are ignored.
    pub fn add(&mut self, tag: usize, word: usize, delta: ScoreValue) {
        if let Some(idx) = self.index(tag, word) {
            self.scores[idx] = self.scores[idx].saturating_add(delta);
        }
    }

    /// Overwrites an entry. Returns `false` if the key is out of domain.
    pub fn set(&mut self, tag: usize, word: usize, score: ScoreValue) -> bool {
        if let Some(idx) = self.index(tag, word) {
            self.scores[idx] = score;
            true
        } else {
            false
        }
    }

    pub const fn n_words(&self) -> usize {
        self.n_words
    }
}

/// Model data: tag set, vocabulary and the two score tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub(crate) tags: TagSet,
    pub(crate) vocabulary: Vocabulary,
    pub(crate) transitions: TransitionTable,
    pub(crate) emissions: EmissionTable,
}

impl Model {
    /// Creates a model with zero-filled tables over the given tag set and vocabulary.
    pub fn new(tags: TagSet, vocabulary: Vocabulary) -> Self {
        let transitions = TransitionTable::new(tags.len());
        let emissions = EmissionTable::new(tags.len(), vocabulary.len());
        Self {
            tags,
            vocabulary,
            transitions,
            emissions,
        }
    }

    /// Scans a labeled corpus and allocates an untrained model for it.
    ///
    /// # Examples
    ///
    /// ```
    /// use perceptag::{Context, Corpus, Label, Model};
    ///
    /// let corpus = Corpus::from_lines(["the DT", "dog NN", ""]).unwrap();
    /// let model = Model::from_corpus(&corpus);
    /// assert_eq!(2, model.tags().len());
    /// assert_eq!(3, model.vocabulary().len());
    /// assert_eq!(Some(0), model.transitions().get(Context::Start, Label::Stop));
    /// ```
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let (tags, vocabulary) = vocabulary::scan_corpus(corpus);
        Self::new(tags, vocabulary)
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn emissions(&self) -> &EmissionTable {
        &self.emissions
    }

    /// Gets a transition score by tag labels.
    ///
    /// [`START_TAG`](crate::START_TAG) is accepted as `from` and [`STOP_TAG`](crate::STOP_TAG)
    /// as `to`.
    pub fn transition_score(&self, from: &str, to: &str) -> Option<ScoreValue> {
        let context = if from == vocabulary::START_TAG {
            Context::Start
        } else {
            Context::Tag(self.tags.id(from)?)
        };
        let label = if to == vocabulary::STOP_TAG {
            Label::Stop
        } else {
            Label::Tag(self.tags.id(to)?)
        };
        self.transitions.get(context, label)
    }

    /// Gets an emission score by tag label and word form.
    pub fn emission_score(&self, tag: &str, word: &str) -> Option<ScoreValue> {
        self.emissions
            .get(self.tags.id(tag)?, self.vocabulary.id(word)?)
    }

    fn context_by_name(&self, from: &str) -> Result<Context> {
        if from == vocabulary::START_TAG {
            return Ok(Context::Start);
        }
        self.tags
            .id(from)
            .map(Context::Tag)
            .ok_or_else(|| PerceptagError::invalid_argument("from", format!("unknown tag {from:?}")))
    }

    fn label_by_name(&self, to: &str) -> Result<Label> {
        if to == vocabulary::STOP_TAG {
            return Ok(Label::Stop);
        }
        self.tags
            .id(to)
            .map(Label::Tag)
            .ok_or_else(|| PerceptagError::invalid_argument("to", format!("unknown tag {to:?}")))
    }

    /// Overwrites a transition score by tag labels.
    ///
    /// # Errors
    ///
    /// [`PerceptagError::InvalidArgument`] is returned if either label is not in the model.
    pub fn set_transition_score(&mut self, from: &str, to: &str, score: ScoreValue) -> Result<()> {
        let context = self.context_by_name(from)?;
        let label = self.label_by_name(to)?;
        self.transitions.set(context, label, score);
        Ok(())
    }

    /// Overwrites an emission score by tag label and word form.
    ///
    /// # Errors
    ///
    /// [`PerceptagError::InvalidArgument`] is returned if the tag or the word is not in the
    /// model.
    pub fn set_emission_score(&mut self, tag: &str, word: &str, score: ScoreValue) -> Result<()> {
        let tag_id = self
            .tags
            .id(tag)
            .ok_or_else(|| PerceptagError::invalid_argument("tag", format!("unknown tag {tag:?}")))?;
        let word_id = self.vocabulary.id(word).ok_or_else(|| {
            PerceptagError::invalid_argument("word", format!("unknown word {word:?}"))
        })?;
        self.emissions.set(tag_id, word_id, score);
        Ok(())
    }

    /// Exports the model data.
    ///
    /// # Arguments
    ///
    /// * `wtr` - Byte-oriented sink object.
    ///
    /// # Errors
    ///
    /// When `wtr` generates an error, it will be returned as is.
    pub fn write<W>(&self, wtr: &mut W) -> Result<()>
    where
        W: Write,
    {
        let config = bincode::config::standard();
        bincode::encode_into_std_write(self.tags.0.keys(), wtr, config)?;
        bincode::encode_into_std_write(self.vocabulary.indexer.keys(), wtr, config)?;
        bincode::encode_into_std_write(self.transitions.scores.as_slice(), wtr, config)?;
        bincode::encode_into_std_write(self.emissions.scores.as_slice(), wtr, config)?;
        Ok(())
    }

    /// Creates a model from a reader.
    ///
    /// # Arguments
    ///
    /// * `rdr` - A data source.
    ///
    /// # Returns
    ///
    /// A model data read from `rdr`.
    ///
    /// # Errors
    ///
    /// When `rdr` generates an error, it will be returned as is. If the tables do not match
    /// the tag set and vocabulary, [`PerceptagError::InvalidModel`] is returned.
    pub fn read<R>(rdr: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let config = bincode::config::standard();
        let tags: Vec<String> = bincode::decode_from_std_read(rdr, config)?;
        let words: Vec<String> = bincode::decode_from_std_read(rdr, config)?;
        let transition_scores: Vec<ScoreValue> = bincode::decode_from_std_read(rdr, config)?;
        let emission_scores: Vec<ScoreValue> = bincode::decode_from_std_read(rdr, config)?;

        let tags = Indexer::from_sorted_keys(tags)
            .map(TagSet)
            .ok_or_else(|| PerceptagError::invalid_model("tags are not sorted"))?;
        let vocabulary = Indexer::from_sorted_keys(words)
            .and_then(Vocabulary::from_indexer)
            .ok_or_else(|| {
                PerceptagError::invalid_model("words are not sorted or lack the unknown word")
            })?;

        let mut model = Self::new(tags, vocabulary);
        if transition_scores.len() != model.transitions.scores.len() {
            return Err(PerceptagError::invalid_model(format!(
                "transition table has {} entries, expected {}",
                transition_scores.len(),
                model.transitions.scores.len(),
            )));
        }
        if emission_scores.len() != model.emissions.scores.len() {
            return Err(PerceptagError::invalid_model(format!(
                "emission table has {} entries, expected {}",
                emission_scores.len(),
                model.emissions.scores.len(),
            )));
        }
        model.transitions.scores = transition_scores;
        model.emissions.scores = emission_scores;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::vocabulary::{START_TAG, STOP_TAG, UNKNOWN_WORD};

    fn example_model() -> Model {
        let corpus = Corpus::from_lines(["the DT", "dog NN", ""]).unwrap();
        Model::from_corpus(&corpus)
    }

    #[test]
    fn test_from_corpus_dense_zero() {
        let model = example_model();

        for from in [START_TAG, "DT", "NN"] {
            for to in ["DT", "NN", STOP_TAG] {
                assert_eq!(Some(0), model.transition_score(from, to), "{from} -> {to}");
            }
        }
        for tag in ["DT", "NN"] {
            for word in ["the", "dog", UNKNOWN_WORD] {
                assert_eq!(Some(0), model.emission_score(tag, word), "{tag} / {word}");
            }
        }
    }

    #[test]
    fn test_sentinels_out_of_domain() {
        let model = example_model();

        assert_eq!(None, model.transition_score(STOP_TAG, "DT"));
        assert_eq!(None, model.transition_score("DT", START_TAG));
        assert_eq!(None, model.emission_score(STOP_TAG, "the"));
        assert_eq!(None, model.emission_score("DT", "cat"));
    }

    #[test]
    fn test_transition_row() {
        let mut table = TransitionTable::new(2);
        table.add(Context::Start, Label::Tag(1), 3);
        table.add(Context::Tag(0), Label::Stop, -2);
        table.add(Context::Unresolved, Label::Tag(0), 5);
        table.add(Context::Tag(2), Label::Tag(0), 5);

        assert_eq!(Some(&[0, 3, 0][..]), table.row(Context::Start));
        assert_eq!(Some(&[0, 0, -2][..]), table.row(Context::Tag(0)));
        assert_eq!(None, table.row(Context::Unresolved));
        assert_eq!(None, table.row(Context::Tag(2)));
    }

    #[test]
    fn test_emission_bounds() {
        let mut table = EmissionTable::new(2, 3);
        table.add(1, 2, -4);
        table.add(2, 0, 1);
        table.add(0, 3, 1);

        assert_eq!(Some(-4), table.get(1, 2));
        assert_eq!(None, table.get(2, 0));
        assert_eq!(None, table.get(0, 3));
    }

    #[test]
    fn test_add_saturates() {
        let mut transitions = TransitionTable::new(1);
        transitions.add(Context::Start, Label::Stop, ScoreValue::MAX);
        transitions.add(Context::Start, Label::Stop, 1);
        let mut emissions = EmissionTable::new(1, 1);
        emissions.add(0, 0, ScoreValue::MIN);
        emissions.add(0, 0, -1);

        assert_eq!(Some(ScoreValue::MAX), transitions.get(Context::Start, Label::Stop));
        assert_eq!(Some(ScoreValue::MIN), emissions.get(0, 0));
    }

    #[test]
    fn test_empty_model() {
        let model = Model::from_corpus(&Corpus::default());

        assert!(model.tags().is_empty());
        assert_eq!(1, model.vocabulary().len());
        assert_eq!(Some(0), model.transition_score(START_TAG, STOP_TAG));
    }

    #[test]
    fn test_set_scores() {
        let mut model = example_model();
        model.set_transition_score(START_TAG, "NN", 4).unwrap();
        model.set_transition_score("DT", STOP_TAG, -1).unwrap();
        model.set_emission_score("NN", UNKNOWN_WORD, 2).unwrap();

        assert_eq!(Some(4), model.transition_score(START_TAG, "NN"));
        assert_eq!(Some(-1), model.transition_score("DT", STOP_TAG));
        assert_eq!(Some(2), model.emission_score("NN", UNKNOWN_WORD));
    }

    #[test]
    fn test_set_scores_unknown_key() {
        let mut model = example_model();

        assert_eq!(
            "InvalidArgumentError: to: unknown tag \"_START\"",
            &model
                .set_transition_score("DT", START_TAG, 1)
                .err()
                .unwrap()
                .to_string()
        );
        assert!(model.set_emission_score("DT", "cat", 1).is_err());
        assert!(model.set_emission_score(STOP_TAG, "the", 1).is_err());
        assert_eq!(example_model(), model);
    }

    #[test]
    fn test_write_read() {
        let mut model = example_model();
        model
            .transitions
            .add(Context::Start, Label::Tag(0), 7);
        model.emissions.add(1, 2, -3);

        let mut buf = vec![];
        model.write(&mut buf).unwrap();
        let loaded = Model::read(&mut buf.as_slice()).unwrap();

        assert_eq!(model, loaded);
    }

    #[test]
    fn test_read_truncated_table() {
        let config = bincode::config::standard();
        let mut buf = vec![];
        bincode::encode_into_std_write(vec!["DT".to_string()], &mut buf, config).unwrap();
        bincode::encode_into_std_write(vec![UNKNOWN_WORD.to_string()], &mut buf, config).unwrap();
        bincode::encode_into_std_write(vec![0i32; 3], &mut buf, config).unwrap();
        bincode::encode_into_std_write(vec![0i32; 1], &mut buf, config).unwrap();

        let r = Model::read(&mut buf.as_slice());

        assert!(r.is_err());
        assert_eq!(
            "InvalidModelError: transition table has 3 entries, expected 4",
            &r.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_read_without_unknown_word() {
        let config = bincode::config::standard();
        let mut buf = vec![];
        bincode::encode_into_std_write(Vec::<String>::new(), &mut buf, config).unwrap();
        bincode::encode_into_std_write(vec!["dog".to_string()], &mut buf, config).unwrap();
        bincode::encode_into_std_write(vec![0i32; 1], &mut buf, config).unwrap();
        bincode::encode_into_std_write(Vec::<i32>::new(), &mut buf, config).unwrap();

        let r = Model::read(&mut buf.as_slice());

        assert!(matches!(r, Err(PerceptagError::InvalidModel(_))));
    }
}
