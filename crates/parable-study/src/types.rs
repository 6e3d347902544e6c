//! Core data types for references, verses, parable entries, and topics.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parsed scripture reference such as `Luke 15:11-32`.
///
/// Always satisfies `verse_end >= verse_start >= 1`, and `book` is a
/// non-empty token with all whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub book: String,
    pub chapter: u32,
    pub verse_start: u32,
    pub verse_end: u32,
}

impl Reference {
    /// Verse numbers covered by this reference, in ascending order.
    pub fn verses(&self) -> RangeInclusive<u32> {
        self.verse_start..=self.verse_end
    }

    /// Number of verses covered by this reference.
    pub fn verse_count(&self) -> u32 {
        self.verse_end - self.verse_start + 1
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verse_start == self.verse_end {
            write!(f, "{} {}:{}", self.book, self.chapter, self.verse_start)
        } else {
            write!(
                f,
                "{} {}:{}-{}",
                self.book, self.chapter, self.verse_start, self.verse_end
            )
        }
    }
}

/// Outcome of fetching a single verse for the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerseResult {
    Text { reference: String, text: String },
    Error { reference: String, error: String },
}

/// One aggregated reference of a parable.
///
/// Serializes as `{parable, reference, verseText}` or
/// `{parable, reference, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParableEntry {
    pub parable: String,
    pub reference: String,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

/// Either the combined verse text or the unit-level failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryOutcome {
    Text {
        #[serde(rename = "verseText")]
        verse_text: String,
    },
    Failed {
        error: String,
    },
}

impl ParableEntry {
    pub fn text(parable: &str, reference: &str, verse_text: String) -> Self {
        Self {
            parable: parable.to_string(),
            reference: reference.to_string(),
            outcome: EntryOutcome::Text { verse_text },
        }
    }

    pub fn failed(parable: &str, reference: &str, error: String) -> Self {
        Self {
            parable: parable.to_string(),
            reference: reference.to_string(),
            outcome: EntryOutcome::Failed { error },
        }
    }

    pub fn verse_text(&self) -> Option<&str> {
        match &self.outcome {
            EntryOutcome::Text { verse_text } => Some(verse_text),
            EntryOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            EntryOutcome::Text { .. } => None,
            EntryOutcome::Failed { error } => Some(error),
        }
    }
}

/// A topic description supplied by the topics file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub topic: String,
    pub description: String,
}

/// All references and topic descriptions collected for one parable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedParable {
    pub name: String,
    pub references: Vec<String>,
    pub topics: Vec<String>,
}

impl GroupedParable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            references: Vec::new(),
            topics: Vec::new(),
        }
    }
}

/// Parable groups keyed by name, iterated in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ParableGroups {
    groups: Vec<GroupedParable>,
    index: HashMap<String, usize>,
}

impl ParableGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the group for `name`, creating an empty one at the end if missing.
    pub fn get_or_insert(&mut self, name: &str) -> &mut GroupedParable {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.groups.push(GroupedParable::new(name));
                let idx = self.groups.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.groups[idx]
    }

    pub fn get(&self, name: &str) -> Option<&GroupedParable> {
        self.index.get(name).map(|&idx| &self.groups[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupedParable> {
        self.groups.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, GroupedParable> {
        self.groups.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_vec(self) -> Vec<GroupedParable> {
        self.groups
    }
}

impl Serialize for ParableGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.groups.serialize(serializer)
    }
}

/// Parable name → reference strings, in the order the source listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParableCatalog {
    parables: Vec<(String, Vec<String>)>,
}

impl ParableCatalog {
    pub fn new(parables: Vec<(String, Vec<String>)>) -> Self {
        Self { parables }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, Vec<String>)> {
        self.parables.iter()
    }

    /// References listed for `name`, if the parable exists.
    pub fn references(&self, name: &str) -> Option<&[String]> {
        self.parables
            .iter()
            .find(|(parable, _)| parable == name)
            .map(|(_, refs)| refs.as_slice())
    }

    pub fn len(&self) -> usize {
        self.parables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parables.is_empty()
    }
}

impl<'de> Deserialize<'de> for ParableCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = ParableCatalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping parable names to reference lists")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ParableCatalog::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut parables: Vec<(String, Vec<String>)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, refs)) = map.next_entry::<String, Vec<String>>()? {
                    // Repeated key: last value wins, first position kept.
                    match parables.iter_mut().find(|(existing, _)| *existing == name) {
                        Some((_, existing)) => *existing = refs,
                        None => parables.push((name, refs)),
                    }
                }
                Ok(ParableCatalog { parables })
            }
        }

        deserializer.deserialize_any(CatalogVisitor)
    }
}

/// Errors that abort a whole request.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("Reference source unavailable: {0}")]
    Unavailable(String),

    #[error("Reference source returned no data")]
    Empty,

    #[error("Topic source unavailable: {0}")]
    Topics(String),
}

/// Errors from fetching verse text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerseError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Verse source returned status {0}")]
    Status(u16),

    #[error("Malformed verse payload: {0}")]
    Malformed(String),

    #[error("Invalid verse endpoint: {0}")]
    Endpoint(String),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Verse range too long: {0} verses")]
    RangeTooLong(u32),
}

impl VerseError {
    /// Whether the whole verse source is unusable, not just this verse.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VerseError::Endpoint(_))
    }
}

/// Convenience result type.
pub type SourceResult<T> = Result<T, SourceError>;
