pub mod error;
pub mod fetch;

pub use error::GitHubError;
pub use fetch::{Credentials, FetchConfig, GitHubClient};
