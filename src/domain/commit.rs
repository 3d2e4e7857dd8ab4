// Commit identity - validated hashes and their short display form
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the short commit form used in selection strings and labels.
pub const SHORT_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCommit {
    #[error("commit hash `{0}` is shorter than the short form")]
    TooShort(String),
    #[error("commit hash `{0}` contains non-hex characters")]
    NotHex(String),
}

/// A git commit hash, stored lowercase. Accepts full 40-char hashes as well
/// as abbreviated ones, as long as they are at least [`SHORT_LEN`] hex digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    pub fn parse(hash: &str) -> Result<Self, InvalidCommit> {
        if hash.len() < SHORT_LEN {
            return Err(InvalidCommit::TooShort(hash.to_string()));
        }
        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidCommit::NotHex(hash.to_string()));
        }
        Ok(CommitId(hash.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first [`SHORT_LEN`] characters, as git abbreviates hashes.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CommitId {
    type Err = InvalidCommit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitId::parse(s)
    }
}

impl TryFrom<String> for CommitId {
    type Error = InvalidCommit;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CommitId::parse(&value)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> String {
        id.0
    }
}
