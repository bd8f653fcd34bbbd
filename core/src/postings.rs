use crate::{DocId, Position};
use roaring::RoaringBitmap;
use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref EMPTY: RoaringBitmap = RoaringBitmap::new();
}

/// Term -> documents and (term, document) -> positions.
///
/// A document id is in a term's document set iff the pair has at least one recorded position.
/// Nothing is ever removed.
#[derive(Debug, Default, Clone)]
pub struct PostingsStore {
    term_docs: HashMap<String, RoaringBitmap>,
    term_doc_positions: HashMap<(String, DocId), RoaringBitmap>,
}

impl PostingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one occurrence. Recording the same triple twice changes nothing.
    pub fn record(&mut self, term: &str, doc_id: DocId, position: Position) {
        match self.term_docs.get_mut(term) {
            Some(docs) => {
                docs.insert(doc_id);
            }
            None => {
                let mut docs = RoaringBitmap::new();
                docs.insert(doc_id);
                self.term_docs.insert(term.to_string(), docs);
            }
        }
        self.term_doc_positions
            .entry((term.to_string(), doc_id))
            .or_default()
            .insert(position);
    }

    /// Documents containing `term`; empty for unseen terms.
    pub fn documents_containing(&self, term: &str) -> &RoaringBitmap {
        self.term_docs.get(term).unwrap_or(&EMPTY)
    }

    /// Ascending positions of `term` in `doc_id`; empty if the pair was never recorded.
    pub fn positions(&self, term: &str, doc_id: DocId) -> Vec<Position> {
        // The tuple key needs an owned term; lookups for absent terms skip the allocation.
        if !self.term_docs.get(term).is_some_and(|docs| docs.contains(doc_id)) {
            return Vec::new();
        }
        self.term_doc_positions
            .get(&(term.to_string(), doc_id))
            .map(|poses| poses.iter().collect())
            .unwrap_or_default()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.term_docs.contains_key(term)
    }

    pub fn num_terms(&self) -> usize {
        self.term_docs.len()
    }
}
