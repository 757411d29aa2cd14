use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::corpus::{Corpus, Record};

/// Pseudo-tag used as the previous tag of the first token in a sentence.
pub const START_TAG: &str = "_START";

/// Pseudo-tag that closes a sentence.
pub const STOP_TAG: &str = "_STOP";

/// Placeholder substituted for words that do not appear in the vocabulary.
pub const UNKNOWN_WORD: &str = "#UNK#";

/// Bidirectional mapping between strings and dense ids.
///
/// Keys are stored in ascending byte order, so ids are stable for a given set of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Indexer {
    ids: HashMap<String, usize>,
    keys: Vec<String>,
}

impl Indexer {
    fn from_set(keys: BTreeSet<String>) -> Self {
        let keys: Vec<String> = keys.into_iter().collect();
        let ids = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
        Self { ids, keys }
    }

    /// Rebuilds an indexer from keys read back from a model file.
    ///
    /// Returns `None` if the keys are not strictly ascending.
    pub(crate) fn from_sorted_keys(keys: Vec<String>) -> Option<Self> {
        if keys.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }
        let ids = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
        Some(Self { ids, keys })
    }

    #[inline]
    fn get(&self, key: &str) -> Option<usize> {
        self.ids.get(key).copied()
    }

    #[inline]
    fn key(&self, id: usize) -> Option<&str> {
        self.keys.get(id).map(String::as_str)
    }

    #[inline]
    fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// The set of tags observed in a training corpus.
///
/// The sentinels [`START_TAG`] and [`STOP_TAG`] are not members; they are addressed through
/// [`Context::Start`](crate::Context::Start) and [`Label::Stop`](crate::Label::Stop) instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(pub(crate) Indexer);

impl TagSet {
    /// Creates a tag set from arbitrary tag labels. Duplicates are merged.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Indexer::from_set(tags.into_iter().map(Into::into).collect()))
    }

    /// Gets the id of a tag.
    pub fn id(&self, tag: &str) -> Option<usize> {
        self.0.get(tag)
    }

    /// Gets the label of a tag id.
    pub fn name(&self, id: usize) -> Option<&str> {
        self.0.key(id)
    }

    /// Number of tags, excluding the sentinels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    /// Iterates over tag labels in id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.keys().iter().map(String::as_str)
    }
}

/// The set of known lowercase word forms, always including [`UNKNOWN_WORD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub(crate) indexer: Indexer,
    unknown_id: usize,
}

impl Vocabulary {
    /// Creates a vocabulary from word forms. [`UNKNOWN_WORD`] is always added.
    ///
    /// Words are stored as given; callers lowercase them beforehand.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = words.into_iter().map(Into::into).collect();
        set.insert(UNKNOWN_WORD.to_string());
        let indexer = Indexer::from_set(set);
        let unknown_id = indexer.get(UNKNOWN_WORD).unwrap_or_default();
        Self {
            indexer,
            unknown_id,
        }
    }

    pub(crate) fn from_indexer(indexer: Indexer) -> Option<Self> {
        let unknown_id = indexer.get(UNKNOWN_WORD)?;
        Some(Self {
            indexer,
            unknown_id,
        })
    }

    /// Gets the id of a known word.
    pub fn id(&self, word: &str) -> Option<usize> {
        self.indexer.get(word)
    }

    /// Gets the id of a word, substituting [`UNKNOWN_WORD`] for unseen words.
    #[inline]
    pub fn resolve(&self, word: &str) -> usize {
        self.indexer.get(word).unwrap_or(self.unknown_id)
    }

    /// Id of [`UNKNOWN_WORD`].
    pub const fn unknown_id(&self) -> usize {
        self.unknown_id
    }

    pub fn contains(&self, word: &str) -> bool {
        self.indexer.get(word).is_some()
    }

    /// Gets the word form of an id.
    pub fn word(&self, id: usize) -> Option<&str> {
        self.indexer.key(id)
    }

    /// Number of entries, including [`UNKNOWN_WORD`].
    pub fn len(&self) -> usize {
        self.indexer.len()
    }

    /// Always `false`, since [`UNKNOWN_WORD`] is a member.
    pub fn is_empty(&self) -> bool {
        self.indexer.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.indexer.keys().iter().map(String::as_str)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::from_words(std::iter::empty::<String>())
    }
}

/// Scans a corpus once and collects its tag set and vocabulary.
pub fn scan_corpus(corpus: &Corpus) -> (TagSet, Vocabulary) {
    let mut tags = BTreeSet::new();
    let mut words = BTreeSet::new();
    for record in corpus.records() {
        if let Record::Token(token) = record {
            if !tags.contains(token.tag.as_str()) {
                tags.insert(token.tag.clone());
            }
            if !words.contains(token.word.as_str()) {
                words.insert(token.word.clone());
            }
        }
    }
    (TagSet::from_tags(tags), Vocabulary::from_words(words))
}
