use crate::error::NormalizeError;
use crate::Position;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+(?:['’]\p{L}+)?").expect("valid regex");
    static ref ENGLISH: StemmingNormalizer = StemmingNormalizer::english();
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Turns raw text into the terms the index stores and queries.
///
/// Ingestion and querying must go through the same normalizer, otherwise stored
/// terms and query terms are not comparable.
pub trait Normalizer: Send + Sync {
    /// Ordered terms of `text`. May be empty.
    fn normalize(&self, text: &str) -> Result<Vec<String>, NormalizeError>;

    /// Terms paired with their token offset in `text`.
    ///
    /// Normalizers that drop tokens (stop words, punctuation) should report the
    /// offset in the unfiltered token stream so the dropped tokens show up as gaps.
    /// The default numbers the terms consecutively.
    fn normalize_with_positions(&self, text: &str) -> Result<Vec<(String, Position)>, NormalizeError> {
        self.normalize(text)?
            .into_iter()
            .enumerate()
            .map(|(pos, term)| Ok((term, to_position(pos)?)))
            .collect()
    }
}

pub(crate) fn to_position(pos: usize) -> Result<Position, NormalizeError> {
    Position::try_from(pos).map_err(|_| NormalizeError::Failed(format!("token offset {pos} exceeds u32")))
}

fn algorithm_for(language: &str) -> Option<Algorithm> {
    let algorithm = match language {
        "arabic" => Algorithm::Arabic,
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        "finnish" => Algorithm::Finnish,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "greek" => Algorithm::Greek,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "tamil" => Algorithm::Tamil,
        "turkish" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}

/// NFKC + lowercase + stop-word removal + Snowball stemming.
pub struct StemmingNormalizer {
    language: String,
    stemmer: Stemmer,
    stop_words: HashSet<String>,
}

impl StemmingNormalizer {
    /// Builds a normalizer for `language` (a Snowball algorithm name such as "english").
    /// English starts from a built-in stop-word list; `extra_stop_words` are added for any language.
    pub fn new<I, S>(language: &str, extra_stop_words: I) -> Result<Self, NormalizeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let language = language.trim().to_lowercase();
        let algorithm = algorithm_for(&language)
            .ok_or_else(|| NormalizeError::UnsupportedLanguage(language.clone()))?;
        let mut stop_words: HashSet<String> = if language == "english" {
            ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect()
        } else {
            HashSet::new()
        };
        stop_words.extend(extra_stop_words.into_iter().map(|w| w.as_ref().trim().to_lowercase()));
        Ok(Self { language, stemmer: Stemmer::create(algorithm), stop_words })
    }

    pub fn english() -> Self {
        Self {
            language: "english".to_string(),
            stemmer: Stemmer::create(Algorithm::English),
            stop_words: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// (stem, token offset) pairs. Words and their clitics ("'s", "n't") each take an
    /// offset; clitics and stop words are dropped.
    fn terms(&self, text: &str) -> Vec<(String, usize)> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        let mut pos = 0usize;
        for mat in RE.find_iter(&normalized) {
            let (word, clitic) = split_clitic(mat.as_str());
            if !word.is_empty() && !self.is_stopword(word) {
                tokens.push((self.stemmer.stem(word).into_owned(), pos));
            }
            pos += if clitic.is_some() { 2 } else { 1 };
        }
        tokens
    }
}

/// "python's" -> ("python", "'s"), "don't" -> ("do", "n't").
fn split_clitic(token: &str) -> (&str, Option<&str>) {
    let Some(idx) = token.find(['\'', '’']) else {
        return (token, None);
    };
    let word = &token[..idx];
    let suffix = &token[idx..];
    if suffix.trim_start_matches(['\'', '’']) == "t" && word.len() > 1 && word.ends_with('n') {
        let cut = word.len() - 1;
        return (&word[..cut], Some(&token[cut..]));
    }
    (word, Some(suffix))
}

impl fmt::Debug for StemmingNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StemmingNormalizer")
            .field("language", &self.language)
            .field("stop_words", &self.stop_words.len())
            .finish()
    }
}

impl Default for StemmingNormalizer {
    fn default() -> Self {
        Self::english()
    }
}

impl Normalizer for StemmingNormalizer {
    fn normalize(&self, text: &str) -> Result<Vec<String>, NormalizeError> {
        Ok(self.terms(text).into_iter().map(|(term, _)| term).collect())
    }

    fn normalize_with_positions(&self, text: &str) -> Result<Vec<(String, Position)>, NormalizeError> {
        self.terms(text)
            .into_iter()
            .map(|(term, pos)| Ok((term, to_position(pos)?)))
            .collect()
    }
}

/// Tokenize English text into (term, position) using NFKC normalization, lowercase, stopword removal, and stemming.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    ENGLISH.terms(text)
}
