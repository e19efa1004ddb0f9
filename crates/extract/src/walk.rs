//! Working copy directory traversal.
//!
//! Streams every non-hidden directory under a root in deterministic
//! depth-first lexicographic order, root first. Determinism matters: package
//! discovery order feeds straight into generation ordering, and two passes
//! over an unchanged working copy must produce identical results.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use futures::Stream;
use std::path::{Path, PathBuf};

fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()).is_some_and(|name| name.starts_with('.'))
}

/// Stream all candidate package directories under `root`, including `root`
/// itself.
///
/// Hidden directories (leading `.`, which also covers VCS metadata) are
/// skipped entirely. An unreadable directory yields an error and the walk
/// continues with its siblings.
pub fn package_dirs(root: &Path) -> impl Stream<Item = Result<PathBuf>> + '_ {
    let mut stack = vec![root.to_path_buf()];
    stream! {
        while let Some(current) = stack.pop() {
            yield Ok(current.clone());
            let mut entries = match tokio::fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(_) => {
                    yield Err(exn::Exn::from(ErrorKind::UnreadableDirectory(current)));
                    continue;
                },
            };
            let mut children = Vec::new();
            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        let path = entry.path();
                        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
                        if is_dir && !is_hidden(&path) {
                            children.push(path);
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(exn::Exn::from(ErrorKind::Io(e)));
                        break;
                    },
                }
            }
            // Reverse-sorted push gives lexicographic pop order.
            children.sort_unstable();
            children.reverse();
            stack.extend(children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, pin_mut};

    async fn collect(root: &Path) -> Vec<PathBuf> {
        let walk = package_dirs(root);
        pin_mut!(walk);
        let mut dirs = Vec::new();
        while let Some(dir) = walk.next().await {
            dirs.push(dir.unwrap());
        }
        dirs
    }

    #[tokio::test]
    async fn test_walk_is_deterministic_depth_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("b/inner")).unwrap();
        std::fs::create_dir_all(root.join("a")).unwrap();
        std::fs::write(root.join("a/file.rs"), "// doc").unwrap();
        let expected =
            vec![root.to_path_buf(), root.join("a"), root.join("b"), root.join("b/inner")];
        assert_eq!(collect(root).await, expected);
        // Second pass over the unchanged tree yields the same order.
        assert_eq!(collect(root).await, expected);
    }

    #[tokio::test]
    async fn test_hidden_directories_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join(".git/objects")).unwrap();
        std::fs::create_dir_all(root.join(".hidden")).unwrap();
        std::fs::create_dir_all(root.join("visible")).unwrap();
        assert_eq!(collect(root).await, vec![root.to_path_buf(), root.join("visible")]);
    }

    #[tokio::test]
    async fn test_missing_root_yields_error_then_ends() {
        let walk = package_dirs(Path::new("/nonexistent/refdex-walk"));
        pin_mut!(walk);
        // Root is yielded optimistically, then its read fails.
        assert!(walk.next().await.unwrap().is_ok());
        assert!(walk.next().await.unwrap().is_err());
        assert!(walk.next().await.is_none());
    }
}
