use posindex::tokenizer::Normalizer;
use posindex::{DocId, IndexConfig, IndexError, NormalizeError, PositionalIndex};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::Arc;

/// Splits on whitespace; no stop words, no stemming.
struct Whitespace;

impl Normalizer for Whitespace {
    fn normalize(&self, text: &str) -> Result<Vec<String>, NormalizeError> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }
}

struct Broken;

impl Normalizer for Broken {
    fn normalize(&self, _text: &str) -> Result<Vec<String>, NormalizeError> {
        Err(NormalizeError::UnsupportedLanguage("xx".into()))
    }
}

fn stub_index(max_gap: u32, docs: &[&str]) -> PositionalIndex {
    let mut index = PositionalIndex::with_normalizer(max_gap, Arc::new(Whitespace));
    for doc in docs {
        index.add(doc).unwrap();
    }
    index
}

fn english(docs: &[&str]) -> PositionalIndex {
    let mut index = PositionalIndex::new(&IndexConfig::default()).unwrap();
    for doc in docs {
        index.add(doc).unwrap();
    }
    index
}

fn ids(index: &PositionalIndex, phrase: &str) -> Vec<DocId> {
    index.search(phrase).unwrap().iter().collect()
}

#[test]
fn gap_boundaries() {
    let adjacent = stub_index(0, &["a b"]);
    assert_eq!(ids(&adjacent, "a b"), vec![0]);

    let strict = stub_index(0, &["a x b"]);
    assert!(ids(&strict, "a b").is_empty());
    let loose = stub_index(1, &["a x b"]);
    assert_eq!(ids(&loose, "a b"), vec![0]);
    assert_eq!(strict.search_with_gap("a b", 1).unwrap().len(), 1);
}

#[test]
fn empty_query_matches_nothing() {
    let index = stub_index(3, &["a b", "c"]);
    assert!(index.search("").unwrap().is_empty());
    assert!(index.search_terms::<&str>(&[]).is_empty());
}

#[test]
fn single_term_equals_document_set() {
    let index = stub_index(0, &["a b", "b", "b a a", ""]);
    for term in ["a", "b", "missing"] {
        assert_eq!(&index.search_terms(&[term]), index.documents_containing(term));
    }
}

#[test]
fn document_ids_are_sequential_including_empty_text() {
    let mut index = english(&[]);
    assert_eq!(index.add("Python is great").unwrap(), 0);
    assert_eq!(index.add("").unwrap(), 1);
    assert_eq!(index.add("the of and").unwrap(), 2);
    assert_eq!(index.add("Python again").unwrap(), 3);
    assert_eq!(index.num_docs(), 4);
    assert_eq!(ids(&index, "python"), vec![0, 3]);
}

#[test]
fn readding_same_text_gets_new_id() {
    let index = english(&["Python is great", "Python is great"]);
    assert_eq!(ids(&index, "python great"), vec![0, 1]);
}

#[test]
fn membership_agrees_with_positions() {
    let index = stub_index(3, &["a b a", "c", "b c d", "a"]);
    for term in ["a", "b", "c", "d", "e"] {
        for doc_id in 0..4 {
            assert_eq!(
                index.documents_containing(term).contains(doc_id),
                !index.positions(term, doc_id).is_empty()
            );
        }
    }
    assert_eq!(index.positions("a", 0), vec![0, 2]);
}

#[test]
fn multi_document_scenario() {
    let index = english(&["Python is great", "Python is powerful", "Java is versatile"]);
    assert_eq!(ids(&index, "Python"), vec![0, 1]);
    assert_eq!(ids(&index, "Python powerful"), vec![1]);
    assert!(ids(&index, "Ruby").is_empty());
    assert!(ids(&index, "Ruby is great").is_empty());
}

#[test]
fn phrase_beyond_word_delta_is_rejected() {
    let index = english(&["Python supports a concept of iteration over containers"]);
    assert_eq!(index.max_word_delta(), 3);
    assert!(ids(&index, "Python containers").is_empty());
    assert_eq!(ids(&index, "iteration containers"), vec![0]);
}

#[test]
fn stop_words_in_query_are_ignored() {
    let index = english(&["Python is great"]);
    assert_eq!(ids(&index, "Python is not great"), vec![0]);
    assert!(ids(&index, "Python is horrible").is_empty());
}

#[test]
fn later_occurrence_completes_phrase() {
    let index = english(&["Python is great and Python is powerful"]);
    assert_eq!(ids(&index, "Python is powerful"), vec![0]);
}

#[test]
fn unseen_term_short_circuits_across_docs() {
    let index = english(&["Python is great", "Java is great"]);
    assert!(ids(&index, "great Python Ruby").is_empty());
}

#[test]
fn large_documents_find_embedded_phrases() {
    let filler = [
        "the", "and", "time", "year", "people", "way", "day", "man", "thing", "woman", "life",
        "child", "world", "school", "state", "family", "student", "group", "country", "problem",
    ];
    let phrases = ["climate change", "artificial intelligence", "quantum computing"];
    let mut index = english(&[]);
    let mut rng = StdRng::seed_from_u64(42);
    for round in 0..10 {
        for (i, phrase) in phrases.iter().enumerate() {
            let mut words: Vec<&str> = (0..1000).map(|_| *filler.choose(&mut rng).unwrap()).collect();
            words.insert(100 + round * 50 + i, phrase);
            index.add(&words.join(" ")).unwrap();
        }
    }
    for phrase in phrases {
        assert_eq!(index.search(phrase).unwrap().len(), 10, "{phrase}");
    }
}

#[test]
fn normalizer_errors_propagate() {
    let mut index = PositionalIndex::with_normalizer(3, Arc::new(Broken));
    assert!(matches!(index.add("anything"), Err(IndexError::Normalize(_))));
    assert_eq!(index.num_docs(), 0);
    assert!(matches!(index.search("anything"), Err(IndexError::Normalize(_))));
}

#[test]
fn direct_record_requires_assigned_id() {
    let mut index = stub_index(3, &["a"]);
    assert!(matches!(index.record("b", 5, 0), Err(IndexError::DocumentOutOfRange { doc_id: 5, .. })));
    index.record("b", 0, 1).unwrap();
    index.record("b", 0, 1).unwrap();
    assert_eq!(index.positions("b", 0), vec![1]);
    assert_eq!(index.search_terms(&["a", "b"]).len(), 1);
}

#[test]
fn possessive_documents_are_found_by_subject() {
    let index = english(&["Python's iterators are fast", "Python iterators are fast"]);
    assert_eq!(ids(&index, "Python"), vec![0, 1]);
    assert_eq!(ids(&index, "Python iterators"), vec![0, 1]);
}
