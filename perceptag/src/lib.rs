//! # Perceptag
//!
//! Perceptag is a part-of-speech tagger trained with an online structured perceptron.
//!
//! Each token is tagged greedily from left to right: the decision for a word only depends on
//! the tag decided for the preceding word and on two integer score tables, one for tag
//! transitions and one for tag/word emissions.
//!
//! ## Examples
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{stdin, stdout, BufReader};
//!
//! use perceptag::{Corpus, Tagger, Trainer};
//!
//! let f = BufReader::new(File::open("train").unwrap());
//! let corpus = Corpus::from_reader(f).unwrap();
//! let (model, _) = Trainer::new(&corpus).train(5).unwrap();
//!
//! let tagger = Tagger::new(model);
//! tagger.tag_stream(stdin().lock(), &mut stdout().lock()).unwrap();
//! ```

mod corpus;
mod evaluation;
mod model;
mod scorer;
mod tagger;
mod trainer;
mod vocabulary;

pub mod errors;

pub use corpus::{normalize_token, Corpus, Record, Sentences, Token};
pub use evaluation::{Evaluation, LabelMeasure};
pub use model::{Context, EmissionTable, Label, Model, ScoreValue, TransitionTable};
pub use scorer::Scorer;
pub use tagger::{TaggedLine, TaggedLines, Tagger, UNRESOLVED_TAG};
pub use trainer::{Trainer, TrainingReport};
pub use vocabulary::{TagSet, Vocabulary, START_TAG, STOP_TAG, UNKNOWN_WORD};
