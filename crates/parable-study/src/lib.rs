//! Parable Study: core library for scripture reference parsing, verse
//! retrieval, parable aggregation, and topic merging.

pub mod aggregate;
pub mod detail;
pub mod reference;
pub mod sources;
pub mod topics;
pub mod types;
pub mod verse;

pub use aggregate::{AggregatorOptions, ParableAggregator, ParableSource};
pub use detail::fetch_group_verses;
pub use reference::parse;
pub use sources::{build_client, HttpParableSource, HttpVerseSource};
pub use topics::{merge, normalize, FileTopicSource, TopicSource};
pub use types::*;
pub use verse::{VerseFetcher, VerseSource};
