//! Configuration loading for the refdex server.
//!
//! Settings come from a TOML file merged with `REFDEX_`-prefixed environment
//! variables (environment wins). Each tracked repository is described once at
//! startup and is immutable for the process lifetime; there is no runtime
//! reconfiguration.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_REFRESH_SECS: u64 = 900;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAINLINE_REF: &str = "master";

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seconds between index refresh passes.
    #[serde(default = "default_refresh_secs")]
    refresh_secs: u64,
    /// One entry per tracked repository.
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

/// Configuration for a single tracked repository.
///
/// Immutable after construction; the sync pipeline holds one of these per
/// repository for the whole process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Short project name, used as the route segment and index key.
    pub project: String,
    /// Remote clone URL.
    pub remote: String,
    /// Local working copy location.
    pub cache_dir: PathBuf,
    /// Per-operation deadline for VCS and extractor calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    /// Branch checked out for the "mainline" pseudo-tag.
    #[serde(default = "default_mainline_ref")]
    pub mainline: String,
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_mainline_ref() -> String {
    DEFAULT_MAINLINE_REF.to_string()
}

impl Config {
    /// Load configuration from a TOML file merged with `REFDEX_` environment
    /// variables, then validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("REFDEX_"))
            .extract()
            .map_err(ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(repositories = config.repositories.len(), "configuration loaded");
        Ok(config)
    }

    /// Interval between scheduled sync passes.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            exn::bail!(ErrorKind::Invalid("no repositories configured".to_string()));
        }
        if self.refresh_secs == 0 {
            exn::bail!(ErrorKind::Invalid("refresh_secs must be non-zero".to_string()));
        }
        let mut seen = HashSet::new();
        for repo in &self.repositories {
            repo.validate()?;
            if !seen.insert(repo.project.as_str()) {
                exn::bail!(ErrorKind::Invalid(format!("duplicate project name `{}`", repo.project)));
            }
        }
        Ok(())
    }
}

impl RepositoryConfig {
    /// Per-operation deadline for this repository.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.project.is_empty() {
            exn::bail!(ErrorKind::Invalid("repository with empty project name".to_string()));
        }
        // Project names become a single route segment; a slash would collide
        // with the tag and package route separators.
        if self.project.contains('/') {
            exn::bail!(ErrorKind::Invalid(format!("project name `{}` contains `/`", self.project)));
        }
        if self.remote.is_empty() {
            exn::bail!(ErrorKind::Invalid(format!("repository `{}` has empty remote", self.project)));
        }
        if self.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid(format!("repository `{}` has zero timeout", self.project)));
        }
        if self.mainline.is_empty() {
            exn::bail!(ErrorKind::Invalid(format!("repository `{}` has empty mainline ref", self.project)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const MINIMAL: &str = r#"
        [[repositories]]
        project = "activity"
        remote = "https://example.com/org/activity.git"
        cache_dir = "/var/cache/refdex/activity"
    "#;

    #[test]
    fn test_minimal_config_with_defaults() {
        let file = write_config(MINIMAL);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(DEFAULT_REFRESH_SECS));
        assert_eq!(config.repositories.len(), 1);
        let repo = &config.repositories[0];
        assert_eq!(repo.project, "activity");
        assert_eq!(repo.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(repo.mainline, "master");
    }

    #[test]
    fn test_explicit_values() {
        let file = write_config(
            r#"
            refresh_secs = 30

            [[repositories]]
            project = "activity"
            remote = "https://example.com/org/activity.git"
            cache_dir = "/var/cache/refdex/activity"
            timeout_secs = 5
            mainline = "main"
        "#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.repositories[0].timeout(), Duration::from_secs(5));
        assert_eq!(config.repositories[0].mainline, "main");
    }

    #[test]
    fn test_no_repositories_rejected() {
        let file = write_config("refresh_secs = 30\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_duplicate_project_names_rejected() {
        let file = write_config(
            r#"
            [[repositories]]
            project = "activity"
            remote = "https://example.com/a.git"
            cache_dir = "/tmp/a"

            [[repositories]]
            project = "activity"
            remote = "https://example.com/b.git"
            cache_dir = "/tmp/b"
        "#,
        );
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[rstest]
    #[case::slash_in_project("a/b", "https://example.com/a.git", 10)]
    #[case::empty_project("", "https://example.com/a.git", 10)]
    #[case::empty_remote("activity", "", 10)]
    #[case::zero_timeout("activity", "https://example.com/a.git", 0)]
    fn test_invalid_repository_rejected(#[case] project: &str, #[case] remote: &str, #[case] timeout: u64) {
        let file = write_config(&format!(
            r#"
            [[repositories]]
            project = "{project}"
            remote = "{remote}"
            cache_dir = "/tmp/a"
            timeout_secs = {timeout}
        "#,
        ));
        assert!(Config::load(file.path()).is_err());
    }
}
