use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoIdError {
    #[error("repository must be in owner/repo format (e.g. \"rust-lang/cargo\")")]
    BadFormat,

    #[error("repository owner and name must be non-empty")]
    EmptySegment,

    #[error("repository owner and name must each be at most 100 characters")]
    TooLong,

    #[error("repository owner and name may only contain letters, digits, '.', '_' and '-'")]
    BadCharacter,

    #[error("repository name must not end in .git")]
    GitSuffix,
}

/// A validated `owner/repo` pair.
///
/// Construction goes through [`RepoId::parse`]; a `RepoId` that exists is
/// syntactically valid per GitHub naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

const MAX_SEGMENT_LEN: usize = 100;

impl RepoId {
    /// Parse and validate an `owner/repo` string.
    ///
    /// Purely syntactic: no network access, no existence check. Callers map
    /// a failure to a 400-class response.
    pub fn parse(input: &str) -> Result<RepoId, RepoIdError> {
        let mut parts = input.split('/');
        let (owner, repo) = match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) => (owner, repo),
            _ => return Err(RepoIdError::BadFormat),
        };

        validate_segment(owner)?;
        validate_segment(repo)?;

        if repo.ends_with(".git") {
            return Err(RepoIdError::GitSuffix);
        }

        Ok(RepoId {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

fn validate_segment(segment: &str) -> Result<(), RepoIdError> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(RepoIdError::EmptySegment);
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(RepoIdError::TooLong);
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(RepoIdError::BadCharacter);
    }
    Ok(())
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
