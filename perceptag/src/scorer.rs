use crate::model::{Context, EmissionTable, Label, Model, TransitionTable};
use crate::vocabulary::Vocabulary;

/// What the decoder observes at the current position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Observation {
    /// A word id, already resolved against the vocabulary.
    Word(usize),

    /// End of the sentence.
    End,
}

/// Picks the best next tag given the previous decision.
///
/// Candidates are visited in ascending tag id order. A candidate replaces the current best
/// only if its score is strictly greater, so ties go to the lowest tag id. The first candidate
/// is always accepted, whatever its score. Sums are computed in `i64`, so they never overflow.
pub(crate) fn best_tag(
    transitions: &TransitionTable,
    emissions: &EmissionTable,
    context: Context,
    observation: Observation,
) -> Option<usize> {
    let row = transitions.row(context)?;
    let mut best_score = 0i64;
    let mut best_tag = None;
    // The last column of a row is STOP, which never emits.
    for (tag, &trans_score) in row[..transitions.n_tags()].iter().enumerate() {
        let score = match observation {
            Observation::End => i64::from(trans_score),
            Observation::Word(word) => match emissions.get(tag, word) {
                Some(emit_score) => i64::from(trans_score) + i64::from(emit_score),
                None => continue,
            },
        };
        if score > best_score || best_tag.is_none() {
            best_score = score;
            best_tag = Some(tag);
        }
    }
    best_tag
}

/// Read-only view of a model that makes single greedy decisions.
#[derive(Clone, Copy)]
pub struct Scorer<'a> {
    vocabulary: &'a Vocabulary,
    transitions: &'a TransitionTable,
    emissions: &'a EmissionTable,
}

impl<'a> Scorer<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self {
            vocabulary: &model.vocabulary,
            transitions: &model.transitions,
            emissions: &model.emissions,
        }
    }

    /// Decides the tag of `word` following `context`.
    ///
    /// An empty `word` signals the end of the sentence and is scored by transitions alone.
    /// A non-empty word that is not in the vocabulary is replaced by
    /// [`UNKNOWN_WORD`](crate::UNKNOWN_WORD). The word is looked up as given; it is not
    /// lowercased here.
    ///
    /// # Returns
    ///
    /// The best tag id, or `None` if `context` has no transition row or no candidate could
    /// be scored.
    ///
    /// # Examples
    ///
    /// ```
    /// use perceptag::{Context, Corpus, Model, Scorer};
    ///
    /// let corpus = Corpus::from_lines(["the DT", "dog NN", ""]).unwrap();
    /// let model = Model::from_corpus(&corpus);
    /// let scorer = Scorer::new(&model);
    ///
    /// // All scores are zero, so the first tag in order wins.
    /// assert_eq!(model.tags().id("DT"), scorer.decide(Context::Start, "dog"));
    /// assert_eq!(None, scorer.decide(Context::Unresolved, "dog"));
    /// ```
    pub fn decide(&self, context: Context, word: &str) -> Option<usize> {
        let observation = if word.is_empty() {
            Observation::End
        } else {
            Observation::Word(self.vocabulary.resolve(word))
        };
        best_tag(self.transitions, self.emissions, context, observation)
    }

    /// Score of `label` following `context` for `word`, computed the same way as in
    /// [`Scorer::decide`].
    pub fn score(&self, context: Context, label: Label, word: &str) -> Option<i64> {
        let trans_score = i64::from(self.transitions.get(context, label)?);
        match label {
            Label::Stop => Some(trans_score),
            Label::Tag(_) if word.is_empty() => Some(trans_score),
            Label::Tag(tag) => {
                let emit_score = self.emissions.get(tag, self.vocabulary.resolve(word))?;
                Some(trans_score + i64::from(emit_score))
            }
        }
    }
}
