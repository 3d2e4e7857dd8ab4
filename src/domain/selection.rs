// Selection codec - the shareable #<short>,<short> fragment form
use thiserror::Error;

use super::commit::{CommitId, SHORT_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionWarning {
    #[error("selection entry `{0}` is shorter than a commit short form")]
    TooShort(String),
    #[error("selection entry `{0}` does not match any known commit")]
    Unknown(String),
}

/// Encode active keys as a fragment body: short forms joined by commas.
/// An empty selection encodes as the empty string.
pub fn encode<'a, I>(keys: I) -> String
where
    I: IntoIterator<Item = &'a CommitId>,
{
    let shorts: Vec<&str> = keys.into_iter().map(CommitId::short).collect();
    shorts.join(",")
}

/// Split a fragment into short-form candidates.
///
/// A leading `#` is tolerated, empty segments are skipped, segments longer
/// than the short form are truncated to it, and undersized or non-utf8-safe
/// segments are dropped with a warning. Resolution against the commit index
/// is the caller's job; decode never consults it.
pub fn decode(fragment: &str) -> (Vec<String>, Vec<SelectionWarning>) {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    let mut candidates = Vec::new();
    let mut warnings = Vec::new();
    for segment in body.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if segment.len() < SHORT_LEN {
            warnings.push(SelectionWarning::TooShort(segment.to_string()));
            continue;
        }
        match segment.get(..SHORT_LEN) {
            Some(prefix) => candidates.push(prefix.to_ascii_lowercase()),
            // a multibyte char straddles the cut; nothing hex lives there
            None => warnings.push(SelectionWarning::Unknown(segment.to_string())),
        }
    }
    (candidates, warnings)
}
