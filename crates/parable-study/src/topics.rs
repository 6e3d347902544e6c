//! Topic loading and merging of topic descriptions into parable groups.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::types::{ParableEntry, ParableGroups, SourceError, SourceResult, TopicRecord};

/// Default topics file, relative to the working directory.
pub const DEFAULT_TOPICS_FILE: &str = "parable_topics.json";

/// A source of `{topic, description}` records.
#[async_trait]
pub trait TopicSource: Send + Sync {
    async fn load_topics(&self) -> SourceResult<Vec<TopicRecord>>;
}

/// Reads topics from a JSON array on disk at every call.
#[derive(Debug, Clone)]
pub struct FileTopicSource {
    path: PathBuf,
}

impl FileTopicSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TopicSource for FileTopicSource {
    async fn load_topics(&self) -> SourceResult<Vec<TopicRecord>> {
        let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::Topics(format!("Failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            SourceError::Topics(format!("Failed to parse {}: {e}", self.path.display()))
        })
    }
}

/// Normalize a name for topic matching: lowercase, then drop whitespace and
/// everything outside `[A-Za-z0-9_]`.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Fold entries into groups by parable name, keeping only the references.
pub fn group_entries(entries: &[ParableEntry]) -> ParableGroups {
    let mut groups = ParableGroups::new();
    for entry in entries {
        groups
            .get_or_insert(&entry.parable)
            .references
            .push(entry.reference.clone());
    }
    groups
}

/// Append each topic's description to the group whose normalized name
/// matches. Unmatched topics are dropped. When several groups normalize to
/// the same key, the first one in insertion order wins.
pub fn attach_topics(groups: &mut ParableGroups, topics: &[TopicRecord]) {
    let keys: Vec<String> = groups.iter().map(|g| normalize(&g.name)).collect();

    for topic in topics {
        let wanted = normalize(&topic.topic);
        match keys.iter().position(|k| *k == wanted) {
            Some(idx) => {
                if let Some(group) = groups.iter_mut().nth(idx) {
                    group.topics.push(topic.description.clone());
                }
            }
            None => tracing::warn!("No exact match for topic: {}", topic.topic),
        }
    }
}

/// Group entries by parable and attach matching topic descriptions.
pub fn merge(entries: &[ParableEntry], topics: &[TopicRecord]) -> ParableGroups {
    let mut groups = group_entries(entries);
    attach_topics(&mut groups, topics);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn topic(topic: &str, description: &str) -> TopicRecord {
        TopicRecord {
            topic: topic.to_string(),
            description: description.to_string(),
        }
    }

    fn entry(parable: &str, reference: &str) -> ParableEntry {
        ParableEntry::text(parable, reference, String::new())
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("The Lost Sheep"), "thelostsheep");
        assert_eq!(normalize("the lost sheep!"), "thelostsheep");
        assert_eq!(normalize("  The\tGood-Samaritan's  "), "thegoodsamaritans");
        assert_eq!(normalize("snake_case 42"), "snake_case42");
        assert_eq!(normalize("Café"), "caf");
    }

    #[test]
    fn test_group_entries_keeps_reference_order() {
        let entries = vec![
            entry("Sower", "Matthew 13:3-9"),
            entry("Lost Coin", "Luke 15:8-10"),
            ParableEntry::failed("Sower", "Mark 4:3-9", "boom".into()),
        ];

        let groups = group_entries(&entries);

        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Sower", "Lost Coin"]);
        let sower = groups.get("Sower").unwrap();
        assert_eq!(sower.references, vec!["Matthew 13:3-9", "Mark 4:3-9"]);
        assert!(sower.topics.is_empty());
    }

    #[test]
    fn test_merge_matches_case_and_punctuation_insensitively() {
        let entries = vec![entry("The Lost Sheep", "Luke 15:3-7")];
        let topics = vec![topic("the lost sheep!", "d"), topic("Unrelated", "x")];

        let groups = merge(&entries, &topics);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("The Lost Sheep").unwrap().topics, vec!["d"]);
    }

    #[test]
    fn test_multiple_topics_accumulate_in_order() {
        let entries = vec![entry("Mustard Seed", "Mark 4:30-32")];
        let topics = vec![topic("Mustard Seed", "faith"), topic("mustard-seed", "growth")];

        let groups = merge(&entries, &topics);

        assert_eq!(
            groups.get("Mustard Seed").unwrap().topics,
            vec!["faith", "growth"]
        );
    }

    #[test]
    fn test_tie_goes_to_first_group() {
        let entries = vec![entry("Lost Sheep", "Luke 15:4"), entry("Lost-Sheep", "Matthew 18:12")];
        let topics = vec![topic("lost sheep", "d")];

        let groups = merge(&entries, &topics);

        assert_eq!(groups.get("Lost Sheep").unwrap().topics, vec!["d"]);
        assert!(groups.get("Lost-Sheep").unwrap().topics.is_empty());
    }

    #[tokio::test]
    async fn test_file_topic_source_reads_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"topic": "The Sower", "description": "Receptivity"}}]"#
        )
        .unwrap();

        let source = FileTopicSource::new(file.path());
        let topics = source.load_topics().await.unwrap();

        assert_eq!(topics, vec![topic("The Sower", "Receptivity")]);
    }

    #[tokio::test]
    async fn test_file_topic_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileTopicSource::new(dir.path().join("missing.json"));
        assert!(matches!(missing.load_topics().await, Err(SourceError::Topics(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        let bad = FileTopicSource::new(bad);
        assert!(matches!(bad.load_topics().await, Err(SourceError::Topics(_))));
    }
}
