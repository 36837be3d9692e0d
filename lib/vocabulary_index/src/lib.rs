use log::warn;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Name of the vocabulary that gets IANA media-type suffix handling.
pub const MEDIA_TYPES_VOCABULARY: &str = "media_types";

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error(transparent)]
    ReadFileError(#[from] std::io::Error),
    #[error(transparent)]
    ReadJSONError(#[from] serde_json::Error),
}

/// One line of a vocabulary JSONL file. The generator emits `uri`/`label`
/// entries for most vocabularies and `uri`/`code`/`url` for licenses.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyEntry {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default, alias = "code")]
    pub value: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "equivalentUri")]
    pub equivalent_uri: Option<String>,
}

impl VocabularyEntry {
    fn fields(&self) -> impl Iterator<Item = &String> {
        [
            self.uri.as_ref(),
            self.value.as_ref(),
            self.label.as_ref(),
            self.url.as_ref(),
            self.equivalent_uri.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    fn is_blank(&self) -> bool {
        self.fields().next().is_none()
    }
}

pub struct Vocabulary {
    pub name: String,
    pub entries: Vec<VocabularyEntry>,
    terms: HashSet<String>,
    media_types: bool,
}

impl Vocabulary {
    pub fn from_entries(name: &str, entries: Vec<VocabularyEntry>) -> Vocabulary {
        let media_types = name == MEDIA_TYPES_VOCABULARY;
        let mut terms = HashSet::new();
        for entry in &entries {
            for field in entry.fields() {
                let normalized = normalize(field);
                if media_types {
                    if let Some(mime) = iana_mime_suffix(&normalized) {
                        terms.insert(mime.to_string());
                    }
                }
                terms.insert(normalized);
            }
        }
        Vocabulary {
            name: name.to_string(),
            entries,
            terms,
            media_types,
        }
    }

    pub fn empty(name: &str) -> Vocabulary {
        Vocabulary::from_entries(name, vec![])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive, trimmed membership over every entry field. For the
    /// media-types vocabulary an IANA URI on either side matches by its MIME
    /// suffix.
    pub fn contains(&self, value: &str) -> bool {
        let normalized = normalize(value);
        if self.terms.contains(&normalized) {
            return true;
        }
        if self.media_types {
            if let Some(mime) = iana_mime_suffix(&normalized) {
                return self.terms.contains(mime);
            }
        }
        false
    }
}

/// Process-wide index of controlled vocabularies, loaded lazily from
/// `<dir>/<name>.jsonl`. Concurrent first-loads of the same name are
/// deduplicated behind the map lock. A failed load caches an empty
/// vocabulary and warns once; it is never fatal.
pub struct VocabularyIndex {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<Vocabulary>>>,
}

impl VocabularyIndex {
    pub fn new(dir: impl Into<PathBuf>) -> VocabularyIndex {
        VocabularyIndex {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn load(&self, name: &str) -> Arc<Vocabulary> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(vocabulary) = cache.get(name) {
            return vocabulary.clone();
        }
        let path = self.dir.join(format!("{}.jsonl", name));
        let vocabulary = match read_jsonl(&path) {
            Ok(entries) => Arc::new(Vocabulary::from_entries(name, entries)),
            Err(e) => {
                warn!(
                    "Could not load vocabulary `{}` from {}: {}",
                    name,
                    path.display(),
                    e
                );
                Arc::new(Vocabulary::empty(name))
            }
        };
        cache.insert(name.to_string(), vocabulary.clone());
        vocabulary
    }

    pub fn matches(&self, values: &[String], name: &str) -> bool {
        let vocabulary = self.load(name);
        values.iter().any(|v| vocabulary.contains(v))
    }
}

fn read_jsonl(path: &Path) -> Result<Vec<VocabularyEntry>, VocabularyError> {
    let content = std::fs::read_to_string(path)?;
    let mut entries = vec![];
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: VocabularyEntry = serde_json::from_str(line)?;
        // The first line is generator metadata and carries none of the
        // entry fields.
        if !entry.is_blank() {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn iana_mime_suffix(s: &str) -> Option<&str> {
    let (_, mime) = s.split_once("/media-types/")?;
    let mime = mime.trim_matches('/');
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}
