use crate::error::{IndexError, Result};
use crate::phrase;
use crate::postings::PostingsStore;
use crate::tokenizer::{Normalizer, StemmingNormalizer};
use crate::{DocId, Position};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_MAX_WORD_DELTA: u32 = 3;

fn default_max_word_delta() -> u32 { DEFAULT_MAX_WORD_DELTA }
fn default_language() -> String { "english".to_string() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Maximum number of skipped token slots between neighbouring phrase terms.
    #[serde(default = "default_max_word_delta")]
    pub max_word_delta: u32,
    #[serde(default = "default_language")]
    pub language: String,
    /// Added to the language's built-in stop words.
    #[serde(default)]
    pub stop_words: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { max_word_delta: default_max_word_delta(), language: default_language(), stop_words: Vec::new() }
    }
}

impl IndexConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buf = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&buf)?)
    }

    pub fn normalizer(&self) -> Result<StemmingNormalizer> {
        Ok(StemmingNormalizer::new(&self.language, &self.stop_words)?)
    }
}

/// In-memory positional inverted index answering gap-tolerant phrase queries.
///
/// Documents get dense ids in insertion order, starting at 0. Mutation needs `&mut self`;
/// share it between threads through [`crate::corpus::Corpus`] or an outer lock.
pub struct PositionalIndex {
    max_word_delta: u32,
    postings: PostingsStore,
    next_doc_id: DocId,
    normalizer: Arc<dyn Normalizer>,
}

impl PositionalIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let normalizer = config.normalizer()?;
        Ok(Self::with_normalizer(config.max_word_delta, Arc::new(normalizer)))
    }

    pub fn with_normalizer(max_word_delta: u32, normalizer: Arc<dyn Normalizer>) -> Self {
        Self { max_word_delta, postings: PostingsStore::new(), next_doc_id: 0, normalizer }
    }

    /// Normalizes `text` and indexes it under the next document id.
    /// Text without any indexable term still consumes an id.
    pub fn add(&mut self, text: &str) -> Result<DocId> {
        let tokens = self.normalizer.normalize_with_positions(text)?;
        self.add_normalized(tokens)
    }

    /// Indexes already-normalized `(term, position)` pairs under the next document id.
    pub fn add_normalized<I, S>(&mut self, tokens: I) -> Result<DocId>
    where
        I: IntoIterator<Item = (S, Position)>,
        S: AsRef<str>,
    {
        let doc_id = self.next_doc_id;
        let next = doc_id.checked_add(1).ok_or(IndexError::DocIdSpaceExhausted)?;
        let mut recorded = 0usize;
        for (term, pos) in tokens {
            self.postings.record(term.as_ref(), doc_id, pos);
            recorded += 1;
        }
        self.next_doc_id = next;
        debug!(doc_id, tokens = recorded, "indexed document");
        Ok(doc_id)
    }

    /// Records a single occurrence for a document `add` already assigned.
    pub fn record(&mut self, term: &str, doc_id: DocId, position: Position) -> Result<()> {
        if doc_id >= self.next_doc_id {
            return Err(IndexError::DocumentOutOfRange { doc_id, next_doc_id: self.next_doc_id });
        }
        self.postings.record(term, doc_id, position);
        Ok(())
    }

    /// Documents matching `phrase` with the configured word delta.
    pub fn search(&self, phrase: &str) -> Result<RoaringBitmap> {
        self.search_with_gap(phrase, self.max_word_delta)
    }

    pub fn search_with_gap(&self, phrase: &str, max_gap: u32) -> Result<RoaringBitmap> {
        let terms = self.normalizer.normalize(phrase)?;
        Ok(self.search_terms_with_gap(&terms, max_gap))
    }

    /// Phrase search over already-normalized terms.
    pub fn search_terms<T: AsRef<str>>(&self, terms: &[T]) -> RoaringBitmap {
        self.search_terms_with_gap(terms, self.max_word_delta)
    }

    pub fn search_terms_with_gap<T: AsRef<str>>(&self, terms: &[T], max_gap: u32) -> RoaringBitmap {
        let hits = phrase::search(&self.postings, terms, max_gap);
        debug!(terms = terms.len(), hits = hits.len(), "phrase search");
        hits
    }

    pub fn documents_containing(&self, term: &str) -> &RoaringBitmap {
        self.postings.documents_containing(term)
    }

    pub fn positions(&self, term: &str, doc_id: DocId) -> Vec<Position> {
        self.postings.positions(term, doc_id)
    }

    pub fn num_docs(&self) -> u32 { self.next_doc_id }

    pub fn num_terms(&self) -> usize { self.postings.num_terms() }

    pub fn max_word_delta(&self) -> u32 { self.max_word_delta }

    pub fn normalizer(&self) -> &Arc<dyn Normalizer> { &self.normalizer }
}

impl Default for PositionalIndex {
    fn default() -> Self {
        Self::with_normalizer(DEFAULT_MAX_WORD_DELTA, Arc::new(StemmingNormalizer::english()))
    }
}

impl fmt::Debug for PositionalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionalIndex")
            .field("max_word_delta", &self.max_word_delta)
            .field("num_docs", &self.next_doc_id)
            .field("num_terms", &self.postings.num_terms())
            .finish()
    }
}
