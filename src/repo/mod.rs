//! Repository provider: fetches the code to analyze.

mod cloner;

pub use cloner::{clone_repository, resolve_url, CloneOptions, ClonedRepository};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid repository identifier '{0}', expected owner/name or a clone URL")]
    InvalidIdentifier(String),

    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("failed to clone {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("clone task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}
