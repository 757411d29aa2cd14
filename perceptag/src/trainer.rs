use crate::corpus::{Corpus, Record};
use crate::errors::{PerceptagError, Result};
use crate::model::{Context, Label, Model};
use crate::scorer::{self, Observation};

/// A corpus record with word and tag already mapped to ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step {
    observation: Observation,
    gold: Label,
}

/// Statistics collected while training.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrainingReport {
    /// Number of mismatched decisions in each epoch, sentence ends included.
    pub mismatches: Vec<usize>,
}

/// Structured-perceptron trainer.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
/// use std::io::{BufReader, BufWriter};
///
/// use perceptag::{Corpus, Trainer};
///
/// let f = BufReader::new(File::open("train").unwrap());
/// let corpus = Corpus::from_reader(f).unwrap();
///
/// let trainer = Trainer::new(&corpus);
/// let (model, report) = trainer.train(5).unwrap();
/// println!("{:?}", report.mismatches);
///
/// let mut f = BufWriter::new(File::create("model.bin").unwrap());
/// model.write(&mut f).unwrap();
/// ```
pub struct Trainer {
    model: Model,
    steps: Vec<Step>,
}

impl Trainer {
    /// Creates a trainer with zero-filled tables built from `corpus`.
    ///
    /// The corpus is scanned once for its tags and words and then cached in memory, so every
    /// epoch replays exactly the same sequence.
    pub fn new(corpus: &Corpus) -> Self {
        let model = Model::from_corpus(corpus);
        let steps = corpus
            .records()
            .iter()
            .map(|record| match record {
                Record::Token(token) => Step {
                    observation: Observation::Word(model.vocabulary.resolve(&token.word)),
                    // Every tag of the corpus is in the tag set.
                    gold: model
                        .tags
                        .id(&token.tag)
                        .map_or(Label::Stop, Label::Tag),
                },
                Record::Boundary => Step {
                    observation: Observation::End,
                    gold: Label::Stop,
                },
            })
            .collect();
        Self { model, steps }
    }

    /// The model in its current state.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Gets the number of tags.
    pub fn n_tags(&self) -> usize {
        self.model.tags.len()
    }

    /// Gets the number of vocabulary entries, including the unknown word.
    pub fn n_words(&self) -> usize {
        self.model.vocabulary.len()
    }

    /// Runs one pass over the corpus and updates the tables in place.
    ///
    /// # Returns
    ///
    /// The number of mismatched decisions.
    pub fn run_epoch(&mut self) -> usize {
        let transitions = &mut self.model.transitions;
        let emissions = &mut self.model.emissions;
        let mut n_mismatches = 0;
        let mut context = Context::Start;
        for step in &self.steps {
            let predicted = scorer::best_tag(transitions, emissions, context, step.observation);
            if predicted.map(Label::Tag) != Some(step.gold) {
                n_mismatches += 1;
                transitions.add(context, step.gold, 1);
                if let (Label::Tag(gold), Observation::Word(word)) = (step.gold, step.observation)
                {
                    emissions.add(gold, word, 1);
                }
                if let Some(predicted) = predicted {
                    transitions.add(context, Label::Tag(predicted), -1);
                    if let Observation::Word(word) = step.observation {
                        emissions.add(predicted, word, -1);
                    }
                }
            }
            context = match step.gold {
                Label::Tag(tag) => Context::Tag(tag),
                Label::Stop => Context::Start,
            };
        }
        n_mismatches
    }

    /// Trains the tables for `n_epochs` passes over the corpus.
    ///
    /// # Errors
    ///
    /// [`PerceptagError::InvalidArgument`] is returned if `n_epochs` is zero.
    pub fn train(mut self, n_epochs: usize) -> Result<(Model, TrainingReport)> {
        if n_epochs == 0 {
            return Err(PerceptagError::invalid_argument(
                "n_epochs",
                "must be at least 1",
            ));
        }
        let mut report = TrainingReport::default();
        for epoch in 0..n_epochs {
            let n_mismatches = self.run_epoch();
            log::debug!(
                "epoch {}/{}: {} mismatches over {} steps",
                epoch + 1,
                n_epochs,
                n_mismatches,
                self.steps.len(),
            );
            report.mismatches.push(n_mismatches);
        }
        Ok((self.model, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tagger::Tagger;
    use crate::vocabulary::{START_TAG, STOP_TAG, UNKNOWN_WORD};

    fn assert_transitions(model: &Model, expected: &[(&str, &str, i32)]) {
        let mut froms = vec![START_TAG];
        froms.extend(model.tags().iter());
        let mut tos: Vec<&str> = model.tags().iter().collect();
        tos.push(STOP_TAG);
        for &from in &froms {
            for &to in &tos {
                let want = expected
                    .iter()
                    .find(|(f, t, _)| *f == from && *t == to)
                    .map_or(0, |&(_, _, s)| s);
                assert_eq!(
                    Some(want),
                    model.transition_score(from, to),
                    "{from} -> {to}"
                );
            }
        }
    }

    fn assert_emissions(model: &Model, expected: &[(&str, &str, i32)]) {
        for tag in model.tags().iter() {
            for word in model.vocabulary().iter() {
                let want = expected
                    .iter()
                    .find(|(t, w, _)| *t == tag && *w == word)
                    .map_or(0, |&(_, _, s)| s);
                assert_eq!(Some(want), model.emission_score(tag, word), "{tag} / {word}");
            }
        }
    }

    fn count_tagging_errors(tagger: &Tagger, corpus: &Corpus) -> usize {
        let mut n_errors = 0;
        for sentence in corpus.sentences() {
            let words: Vec<&str> = sentence.iter().map(|t| t.word.as_str()).collect();
            let predictions = tagger.tag_sentence(words.as_slice());
            for (token, predicted) in sentence.iter().zip(predictions) {
                if predicted != Some(token.tag.as_str()) {
                    n_errors += 1;
                }
            }
        }
        n_errors
    }

    #[test]
    fn test_new_builds_zero_model() {
        let corpus = Corpus::from_lines(["the DT", "dog NN", ""]).unwrap();
        let trainer = Trainer::new(&corpus);

        assert_eq!(2, trainer.n_tags());
        assert_eq!(3, trainer.n_words());
        assert_transitions(trainer.model(), &[]);
        assert_emissions(trainer.model(), &[]);
    }

    #[test]
    fn test_one_epoch_first_decision_matches() {
        // The all-zero model picks DT for the first token, which is already correct.
        let corpus = Corpus::from_lines(["the DT", "dog NN", ""]).unwrap();
        let (model, report) = Trainer::new(&corpus).train(1).unwrap();

        assert_eq!(vec![2], report.mismatches);
        assert_transitions(
            &model,
            &[
                ("DT", "NN", 1),
                ("DT", "DT", -1),
                ("NN", STOP_TAG, 1),
                ("NN", "DT", -1),
            ],
        );
        assert_emissions(&model, &[("NN", "dog", 1), ("DT", "dog", -1)]);
    }

    #[test]
    fn test_one_epoch_first_decision_mismatches() {
        let corpus = Corpus::from_lines(["dog NN", "the DT", ""]).unwrap();
        let (model, report) = Trainer::new(&corpus).train(1).unwrap();

        assert_eq!(vec![2], report.mismatches);
        assert_transitions(
            &model,
            &[
                (START_TAG, "NN", 1),
                (START_TAG, "DT", -1),
                ("DT", STOP_TAG, 1),
                ("DT", "DT", -1),
            ],
        );
        assert_emissions(&model, &[("NN", "dog", 1), ("DT", "dog", -1)]);
    }

    #[test]
    fn test_multiple_epochs() {
        let corpus = Corpus::from_lines(["dog NN", "the DT", ""]).unwrap();
        let (model, report) = Trainer::new(&corpus).train(3).unwrap();

        // Sentence ends can never be predicted, so each epoch has at least one mismatch.
        assert_eq!(vec![2, 1, 1], report.mismatches);
        assert_transitions(
            &model,
            &[
                (START_TAG, "NN", 1),
                (START_TAG, "DT", -1),
                ("DT", STOP_TAG, 3),
                ("DT", "DT", -2),
                ("DT", "NN", -1),
            ],
        );
        assert_emissions(&model, &[("NN", "dog", 1), ("DT", "dog", -1)]);
    }

    #[test]
    fn test_updates_are_online() {
        let corpus =
            Corpus::from_lines(["a DT", "", "dog NN", "", "dog NN", ""]).unwrap();
        let (model, report) = Trainer::new(&corpus).train(1).unwrap();

        // The second "dog" is already tagged correctly thanks to the update made on the first.
        assert_eq!(vec![4], report.mismatches);
        assert_eq!(Some(1), model.emission_score("NN", "dog"));
        assert_eq!(Some(1), model.transition_score(START_TAG, "NN"));
        assert_eq!(Some(2), model.transition_score("NN", STOP_TAG));
        assert_eq!(Some(-1), model.transition_score("NN", "NN"));
    }

    #[test]
    fn test_tagging_errors_do_not_increase() {
        let corpus = Corpus::from_lines(["dog NN", "the DT", ""]).unwrap();
        let mut trainer = Trainer::new(&corpus);

        let before = count_tagging_errors(&Tagger::new(trainer.model().clone()), &corpus);
        trainer.run_epoch();
        let after = count_tagging_errors(&Tagger::new(trainer.model().clone()), &corpus);

        assert_eq!(1, before);
        assert_eq!(0, after);
    }

    #[test]
    fn test_unknown_word_after_training() {
        let corpus = Corpus::from_lines(["dog NN", "the DT", ""]).unwrap();
        let (model, _) = Trainer::new(&corpus).train(2).unwrap();
        let tagger = Tagger::new(model);

        assert_eq!(
            tagger.decide(Context::Start, UNKNOWN_WORD),
            tagger.tag_sentence(&["Zebra"])[0],
        );
    }

    #[test]
    fn test_empty_corpus() {
        let (model, report) = Trainer::new(&Corpus::default()).train(3).unwrap();

        assert_eq!(vec![0, 0, 0], report.mismatches);
        assert!(model.tags().is_empty());
        assert_eq!(vec![UNKNOWN_WORD], model.vocabulary().iter().collect::<Vec<_>>());
        let tagger = Tagger::new(model);
        assert_eq!(vec![None::<&str>, None], tagger.tag_sentence(&["hello", "world"]));
    }

    #[test]
    fn test_no_tag_promotes_gold_only() {
        let corpus = Corpus::from_lines(["", ""]).unwrap();
        let (model, report) = Trainer::new(&corpus).train(2).unwrap();

        // With no tags the decoder never has a candidate, so only START -> STOP moves.
        assert_eq!(vec![2, 2], report.mismatches);
        assert_eq!(Some(4), model.transition_score(START_TAG, STOP_TAG));
        assert_transitions(&model, &[(START_TAG, STOP_TAG, 4)]);
        assert!(model.tags().is_empty());
        assert_eq!(vec![UNKNOWN_WORD], model.vocabulary().iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_epochs() {
        let corpus = Corpus::from_lines(["dog NN", ""]).unwrap();
        let r = Trainer::new(&corpus).train(0);

        assert!(r.is_err());
        assert_eq!(
            "InvalidArgumentError: n_epochs: must be at least 1",
            &r.err().unwrap().to_string()
        );
    }
}
