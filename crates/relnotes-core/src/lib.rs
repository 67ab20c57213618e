pub mod dates;
pub mod pull_request;
pub mod repo;

pub use dates::{DateRange, DateRangeError, DateRangeRequest};
pub use pull_request::{FetchResult, PullRequest};
pub use repo::{RepoId, RepoIdError};
