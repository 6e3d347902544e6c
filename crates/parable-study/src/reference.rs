//! Scripture reference parsing.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::Reference;

/// `Book Chapter:Verse` with an optional `-Verse` end, anchored at the start.
const REFERENCE_PATTERN: &str = r"^([A-Za-z ]+) (\d+):(\d+)(?:-(\d+))?";

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(REFERENCE_PATTERN).expect("reference regex is valid"))
}

/// Parse a reference string like `"Luke 15:11-32"` or `"Song of Solomon 2:1"`.
///
/// Returns `None` when the string does not match the grammar, when a verse
/// is zero, when the range is descending, or when a number overflows. Text
/// after the match is ignored. Book names are not checked against any
/// canon; the verse source reports those failures per verse.
pub fn parse(reference: &str) -> Option<Reference> {
    let caps = reference_regex().captures(reference)?;

    let book: String = caps[1].split_whitespace().collect();
    if book.is_empty() {
        return None;
    }

    let chapter = caps[2].parse::<u32>().ok()?;
    let verse_start = caps[3].parse::<u32>().ok()?;
    let verse_end = match caps.get(4) {
        Some(end) => end.as_str().parse::<u32>().ok()?,
        None => verse_start,
    };

    if verse_start == 0 || verse_end < verse_start {
        return None;
    }

    Some(Reference {
        book,
        chapter,
        verse_start,
        verse_end,
    })
}
