//! Phrase matching over positional postings.
//!
//! A query is answered in two steps: the candidate set is narrowed by intersecting
//! the document sets of all query terms, then each candidate is verified by walking
//! the per-term position lists left to right.

use crate::postings::PostingsStore;
use crate::{DocId, Position};
use roaring::RoaringBitmap;
use tracing::trace;

/// Read-only view of positional postings.
pub trait PostingsSource {
    fn documents_containing(&self, term: &str) -> &RoaringBitmap;

    /// Ascending positions of `term` in `doc_id`, empty when absent.
    fn positions(&self, term: &str, doc_id: DocId) -> Vec<Position>;
}

impl PostingsSource for PostingsStore {
    fn documents_containing(&self, term: &str) -> &RoaringBitmap {
        PostingsStore::documents_containing(self, term)
    }

    fn positions(&self, term: &str, doc_id: DocId) -> Vec<Position> {
        PostingsStore::positions(self, term, doc_id)
    }
}

/// Documents containing every term, or nothing as soon as one intersection comes up empty.
pub fn candidate_documents<S, T>(source: &S, terms: &[T]) -> RoaringBitmap
where
    S: PostingsSource + ?Sized,
    T: AsRef<str>,
{
    let Some((first, rest)) = terms.split_first() else {
        return RoaringBitmap::new();
    };
    let mut candidates = source.documents_containing(first.as_ref()).clone();
    if candidates.is_empty() {
        trace!(term = first.as_ref(), "no documents for first term");
        return candidates;
    }
    for term in rest {
        candidates &= source.documents_containing(term.as_ref());
        if candidates.is_empty() {
            trace!(term = term.as_ref(), "candidate set exhausted");
            return RoaringBitmap::new();
        }
    }
    candidates
}

/// Whether one position per list can be chosen, non-decreasing from list to list,
/// with at most `max_gap` skipped token slots between neighbours.
///
/// Each start position of the first list is tried in turn. Cursors into the later
/// lists only ever move forward, across attempts too, so a document costs one pass
/// over its position lists.
pub fn contains_phrase(position_lists: &[Vec<Position>], max_gap: u32) -> bool {
    let Some((first, rest)) = position_lists.split_first() else {
        return false;
    };
    let mut cursors = vec![0usize; rest.len()];

    'starts: for &start in first {
        let mut prev = start;
        for (positions, cursor) in rest.iter().zip(cursors.iter_mut()) {
            let mut idx = *cursor;
            while idx < positions.len() && positions[idx] < prev {
                idx += 1;
            }
            let Some(&pos) = positions.get(idx) else {
                continue 'starts;
            };
            if skipped(prev, pos) > max_gap {
                continue 'starts;
            }
            *cursor = idx;
            prev = pos;
        }
        return true;
    }
    false
}

/// Token slots strictly between `prev` and `pos` (`pos >= prev`).
#[inline]
fn skipped(prev: Position, pos: Position) -> u32 {
    (pos - prev).saturating_sub(1)
}

/// Documents in which `terms` occur in order with at most `max_gap` skipped slots between neighbours.
pub fn search<S, T>(source: &S, terms: &[T], max_gap: u32) -> RoaringBitmap
where
    S: PostingsSource + ?Sized,
    T: AsRef<str>,
{
    match terms {
        [] => RoaringBitmap::new(),
        [only] => source.documents_containing(only.as_ref()).clone(),
        _ => {
            let candidates = candidate_documents(source, terms);
            let mut result = RoaringBitmap::new();
            for doc_id in candidates.iter() {
                let lists: Vec<Vec<Position>> = terms
                    .iter()
                    .map(|term| source.positions(term.as_ref(), doc_id))
                    .collect();
                if contains_phrase(&lists, max_gap) {
                    result.insert(doc_id);
                }
            }
            result
        }
    }
}
