use crate::error::{IndexError, Result};
use crate::index::{IndexConfig, PositionalIndex};
use crate::tokenizer::Normalizer;
use crate::{DocId, Position};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use walkdir::WalkDir;

/// One input record, as found in JSON / JSONL files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDoc {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    pub title: String,
    pub url: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    #[serde(flatten)]
    pub meta: DocMeta,
}

struct Inner {
    index: PositionalIndex,
    docs: Vec<DocMeta>,
}

impl Inner {
    fn push(&mut self, doc: InputDoc, tokens: Vec<(String, Position)>) -> Result<DocId> {
        let doc_id = self.index.add_normalized(tokens)?;
        self.docs.push(DocMeta { external_id: doc.id, title: doc.title, url: doc.url, text: doc.body });
        Ok(doc_id)
    }
}

/// A positional index plus the documents behind it, safe to share between threads.
///
/// Every document is indexed under one write lock, so readers never observe a
/// partially recorded document.
pub struct Corpus {
    normalizer: Arc<dyn Normalizer>,
    inner: RwLock<Inner>,
}

impl Corpus {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self::from_index(PositionalIndex::new(config)?))
    }

    pub fn from_index(index: PositionalIndex) -> Self {
        let normalizer = Arc::clone(index.normalizer());
        // Documents already in the index have no stored text.
        let docs = (0..index.num_docs())
            .map(|doc_id| DocMeta {
                external_id: doc_id.to_string(),
                title: String::new(),
                url: None,
                text: String::new(),
            })
            .collect();
        Self { normalizer, inner: RwLock::new(Inner { index, docs }) }
    }

    pub fn add(&self, doc: InputDoc) -> Result<DocId> {
        // Normalize before taking the lock; only the recording is exclusive.
        let tokens = self.normalizer.normalize_with_positions(&doc.body)?;
        let mut inner = self.inner.write();
        inner.push(doc, tokens)
    }

    /// Adds every document or none: all bodies are normalized and the id space is
    /// checked before the first one is recorded.
    pub fn add_all<I: IntoIterator<Item = InputDoc>>(&self, docs: I) -> Result<Vec<DocId>> {
        let prepared = docs
            .into_iter()
            .map(|doc| {
                let tokens = self.normalizer.normalize_with_positions(&doc.body)?;
                Ok((doc, tokens))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut inner = self.inner.write();
        let free = u64::from(DocId::MAX - inner.index.num_docs());
        if prepared.len() as u64 > free {
            return Err(IndexError::DocIdSpaceExhausted);
        }
        let mut added = Vec::with_capacity(prepared.len());
        for (doc, tokens) in prepared {
            added.push(inner.push(doc, tokens)?);
        }
        Ok(added)
    }

    /// Matching document ids in ascending order.
    pub fn search_ids(&self, phrase: &str) -> Result<Vec<DocId>> {
        let terms = self.normalizer.normalize(phrase)?;
        let hits = self.inner.read().index.search_terms(&terms);
        Ok(hits.iter().collect())
    }

    /// Matching documents in ascending id order, at most `limit` of them, plus the total hit count.
    pub fn search(&self, phrase: &str, limit: usize) -> Result<(usize, Vec<Hit>)> {
        let terms = self.normalizer.normalize(phrase)?;
        let inner = self.inner.read();
        let ids = inner.index.search_terms(&terms);
        let hits = ids
            .iter()
            .take(limit)
            .filter_map(|doc_id| {
                inner.docs.get(doc_id as usize).map(|meta| Hit { doc_id, meta: meta.clone() })
            })
            .collect();
        Ok((ids.len() as usize, hits))
    }

    pub fn doc(&self, doc_id: DocId) -> Option<DocMeta> {
        self.inner.read().docs.get(doc_id as usize).cloned()
    }

    pub fn num_docs(&self) -> u32 {
        self.inner.read().index.num_docs()
    }

    pub fn num_terms(&self) -> usize {
        self.inner.read().index.num_terms()
    }

    pub fn max_word_delta(&self) -> u32 {
        self.inner.read().index.max_word_delta()
    }
}

/// Reads documents from a `.json` file (object or array), a `.jsonl` file, or a directory of those.
pub fn read_documents<P: AsRef<Path>>(path: P) -> Result<Vec<InputDoc>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        return Err(IndexError::InvalidInput { path: path.display().to_string(), reason: "no such file or directory".into() });
    }

    let mut docs = Vec::new();
    for file in files {
        if extension(&file) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    info!(path = %path.display(), docs = docs.len(), "read documents");
    Ok(docs)
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        docs.push(serde_json::from_str(&line)?);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => {
            return Err(IndexError::InvalidInput {
                path: file.display().to_string(),
                reason: "expected a JSON object or array".into(),
            })
        }
    }
    Ok(())
}
