use std::collections::BTreeMap;

use parse_display::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
mod tests;

pub type ArticleMap = BTreeMap<String, Article>;
pub type AuthorMap = BTreeMap<String, Author>;

/// A single article as it appears on the wire.
///
/// Fields other than `id`, `title` and `body` are preserved in `extra` so
/// that payloads can round-trip without the store knowing about them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The `{ articles, authors }` payload served by `GET /data` and embedded
/// in server-rendered markup for hydration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub articles: Vec<Article>,
    pub authors: Vec<Author>,
}

impl RawData {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Consumes the raw sequences and builds the id-keyed maps the store
    /// holds. Fails fast on empty or duplicate ids.
    pub fn index(self) -> Result<(ArticleMap, AuthorMap), DataError> {
        let articles = index_by_id(self.articles)?;
        let authors = index_by_id(self.authors)?;
        Ok((articles, authors))
    }
}

/// A wire record that carries its own map key.
pub trait Record {
    fn id(&self) -> &str;
    fn kind() -> RecordKind;
}
impl Record for Article {
    fn id(&self) -> &str {
        &self.id
    }
    fn kind() -> RecordKind {
        RecordKind::Article
    }
}
impl Record for Author {
    fn id(&self) -> &str {
        &self.id
    }
    fn kind() -> RecordKind {
        RecordKind::Author
    }
}

pub(crate) fn index_by_id<T: Record>(items: Vec<T>) -> Result<BTreeMap<String, T>, DataError> {
    let mut map = BTreeMap::new();
    for (index, item) in items.into_iter().enumerate() {
        let id = item.id();
        if id.is_empty() {
            return Err(DataError::MissingId {
                kind: T::kind(),
                index,
            });
        }
        let id = id.to_owned();
        if map.insert(id.clone(), item).is_some() {
            return Err(DataError::DuplicateId { kind: T::kind(), id });
        }
    }
    Ok(map)
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display(style = "lowercase")]
pub enum RecordKind {
    Article,
    Author,
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum DataError {
    #[display("{kind} at index {index} has an empty id")]
    MissingId { kind: RecordKind, index: usize },
    #[display("duplicate {kind} id `{id}`")]
    DuplicateId { kind: RecordKind, id: String },
}
impl std::error::Error for DataError {}
