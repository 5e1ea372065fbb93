//! Git repository cloning.
//!
//! Repositories are cloned with git2 into a temporary directory that lives
//! exactly as long as the returned [`ClonedRepository`].

use super::ProviderError;
use git2::{Cred, CredentialType, FetchOptions, Progress, RemoteCallbacks, Repository};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Options for cloning a repository.
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Branch to checkout (None for the default branch).
    pub branch: Option<String>,
    /// Depth for a shallow clone (None for a full clone).
    pub depth: Option<i32>,
    /// Access token forwarded as HTTPS credentials.
    pub token: Option<String>,
    /// Directory the temporary checkout is created in (system temp dir if None).
    pub workdir: Option<PathBuf>,
}

impl CloneOptions {
    /// Shallow clone of the default branch.
    pub fn shallow() -> Self {
        Self {
            depth: Some(1),
            ..Self::default()
        }
    }
}

/// What is known about a clone once it is checked out.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryMetadata {
    pub name: String,
    pub url: String,
    pub default_branch: Option<String>,
    pub head_commit: Option<String>,
}

/// A checked out repository. Dropping it removes the checkout.
#[derive(Debug)]
pub struct ClonedRepository {
    dir: TempDir,
    pub metadata: RepositoryMetadata,
}

impl ClonedRepository {
    /// Path to the repository root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn is_url(identifier: &str) -> bool {
    ["https://", "http://", "ssh://", "git://", "file://", "git@"]
        .iter()
        .any(|prefix| identifier.starts_with(prefix))
}

/// Turn `owner/name` or a clone URL into a clone URL.
pub fn resolve_url(identifier: &str) -> Result<String, ProviderError> {
    let identifier = identifier.trim();
    if is_url(identifier) {
        return Ok(identifier.to_string());
    }

    let mut parts = identifier.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(format!(
            "https://github.com/{}/{}.git",
            owner,
            name.trim_end_matches(".git")
        )),
        _ => Err(ProviderError::InvalidIdentifier(identifier.to_string())),
    }
}

/// Repository name: the last path segment of the URL without `.git`.
pub fn repository_name(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(url)
        .trim_end_matches(".git")
        .to_string()
}

fn callbacks(token: Option<&str>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;

    callbacks.credentials(move |_url, username, allowed| {
        attempts += 1;
        if attempts > 3 {
            return Err(git2::Error::from_str("authentication failed"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some(token) = token {
                return Cred::userpass_plaintext("x-access-token", token);
            }
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username.unwrap_or("git"));
        }
        Cred::default()
    });

    callbacks.transfer_progress(|progress: Progress<'_>| {
        if progress.received_objects() == progress.total_objects() {
            debug!("Received {} objects", progress.total_objects());
        }
        true
    });

    callbacks
}

fn inspect(repo: &Repository) -> (Option<String>, Option<String>) {
    let Ok(head) = repo.head() else {
        return (None, None);
    };
    let branch = head.shorthand().map(String::from);
    let commit = head.peel_to_commit().ok().map(|c| c.id().to_string());
    (branch, commit)
}

/// Clone `identifier` into `target`, an existing empty directory.
pub fn clone_into(
    identifier: &str,
    options: &CloneOptions,
    target: &Path,
) -> Result<RepositoryMetadata, ProviderError> {
    let url = resolve_url(identifier)?;
    info!("Cloning repository: {}", url);
    debug!("Clone target: {}", target.display());

    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks(options.token.as_deref()));
    if let Some(depth) = options.depth {
        fetch_opts.depth(depth);
    }

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_opts);
    if let Some(ref branch) = options.branch {
        builder.branch(branch);
    }

    let repo = builder
        .clone(&url, target)
        .map_err(|source| ProviderError::Clone {
            url: url.clone(),
            source,
        })?;

    let (default_branch, head_commit) = inspect(&repo);
    let metadata = RepositoryMetadata {
        name: repository_name(&url),
        url,
        default_branch,
        head_commit,
    };
    info!(
        "Cloned {} ({})",
        metadata.name,
        metadata.head_commit.as_deref().unwrap_or("no commits")
    );

    Ok(metadata)
}

/// Clone a repository given as `owner/name` or a URL.
///
/// The checkout directory is owned by this future, not by the blocking git
/// thread, so cancelling the future removes it.
pub async fn clone_repository(
    identifier: &str,
    options: &CloneOptions,
) -> Result<ClonedRepository, ProviderError> {
    let dir = match options.workdir {
        Some(ref parent) => TempDir::new_in(parent),
        None => TempDir::new(),
    }
    .map_err(ProviderError::TempDir)?;

    let identifier = identifier.to_string();
    let options = options.clone();
    let target = dir.path().to_path_buf();
    let metadata =
        tokio::task::spawn_blocking(move || clone_into(&identifier, &options, &target)).await??;

    Ok(ClonedRepository { dir, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn source_repo() -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("app.py"), "print('hello')\n").unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("app.py")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let commit = repo
            .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();

        (dir, commit.to_string())
    }

    #[test]
    fn test_resolve_owner_name() {
        assert_eq!(
            resolve_url("rust-lang/rust").unwrap(),
            "https://github.com/rust-lang/rust.git"
        );
        assert_eq!(
            resolve_url("git@github.com:rust-lang/rust.git").unwrap(),
            "git@github.com:rust-lang/rust.git"
        );
        assert!(matches!(
            resolve_url("just-a-name"),
            Err(ProviderError::InvalidIdentifier(_))
        ));
        assert!(resolve_url("a/b/c").is_err());
    }

    #[test]
    fn test_repository_name() {
        assert_eq!(repository_name("https://github.com/rust-lang/rust.git"), "rust");
        assert_eq!(repository_name("git@github.com:owner/tool.git"), "tool");
        assert_eq!(repository_name("https://example.com/group/project/"), "project");
    }

    #[tokio::test]
    async fn test_clone_local_repository() {
        let (source, commit) = source_repo();
        let url = format!("file://{}", source.path().display());

        let cloned = clone_repository(&url, &CloneOptions::default()).await.unwrap();
        assert!(cloned.path().join("app.py").exists());
        assert_eq!(cloned.metadata.head_commit.as_deref(), Some(commit.as_str()));
        assert!(cloned.metadata.default_branch.is_some());

        let checkout = cloned.path().to_path_buf();
        drop(cloned);
        assert!(!checkout.exists());
    }

    #[tokio::test]
    async fn test_clone_failure_is_reported() {
        let missing = TempDir::new().unwrap();
        let url = format!("file://{}/nothing-here", missing.path().display());
        let options = CloneOptions {
            workdir: Some(missing.path().to_path_buf()),
            ..CloneOptions::default()
        };
        let err = clone_repository(&url, &options).await.unwrap_err();
        assert!(matches!(err, ProviderError::Clone { .. }));
        // the failed checkout is not left behind
        assert_eq!(fs::read_dir(missing.path()).unwrap().count(), 0);
    }
}
