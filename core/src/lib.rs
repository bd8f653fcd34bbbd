//! Positional inverted index with gap-tolerant phrase search.
//!
//! Text goes through a [`Normalizer`] (tokenize, drop stop words, stem), every surviving
//! term is recorded with its token offset, and phrase queries are answered by intersecting
//! per-term document sets and then walking the per-document position lists.

pub mod corpus;
pub mod error;
pub mod index;
pub mod phrase;
pub mod postings;
pub mod tokenizer;

pub type DocId = u32;
pub type Position = u32;

pub use corpus::{read_documents, Corpus, DocMeta, Hit, InputDoc};
pub use error::{IndexError, NormalizeError, Result};
pub use index::{IndexConfig, PositionalIndex, DEFAULT_MAX_WORD_DELTA};
pub use postings::PostingsStore;
pub use roaring::RoaringBitmap;
pub use tokenizer::{tokenize, Normalizer, StemmingNormalizer};
