//! Generation data model.
//!
//! A "generation" is one complete sync pass's worth of index data. Ordering
//! keys are plain lexicographic string comparisons at every level, so a sort
//! is idempotent and two runs over identical inputs produce identical
//! orderings. That determinism is what makes route tables reproducible.

use refdex_extract::models::DocPayload;

/// Pseudo-tag representing the latest unreleased state of a repository.
///
/// Always present in a repository's tag list in addition to its discovered
/// version tags.
pub const MAINLINE: &str = "mainline";

/// Documentation for one source package at one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDoc {
    /// Import-path-like identifier: remote location plus relative directory.
    pub import_path: String,
    /// Opaque payload produced by the external extractor.
    pub payload: DocPayload,
}

/// All packages documented at a single tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedPackageSet {
    pub tag: String,
    pub packages: Vec<PackageDoc>,
}

impl TaggedPackageSet {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), packages: Vec::new() }
    }

    /// Sort packages by import path.
    pub fn sort(&mut self) {
        self.packages.sort_by(|a, b| a.import_path.cmp(&b.import_path));
    }
}

/// One repository's complete result for one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryGeneration {
    pub tag_sets: Vec<TaggedPackageSet>,
}

impl RepositoryGeneration {
    pub fn new(tag_sets: Vec<TaggedPackageSet>) -> Self {
        Self { tag_sets }
    }

    /// Sort tag sets by tag, cascading into each set's packages.
    pub fn sort(&mut self) {
        self.tag_sets.sort_by(|a, b| a.tag.cmp(&b.tag));
        for set in &mut self.tag_sets {
            set.sort();
        }
    }
}

/// A repository generation labelled with its project name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGeneration {
    pub project: String,
    pub generation: RepositoryGeneration,
}

/// The complete index for one sync pass across all tracked repositories.
///
/// Within one generation a repository contributes at most one
/// [`RepositoryGeneration`]; the aggregator's accumulator key guarantees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexGeneration {
    pub projects: Vec<ProjectGeneration>,
}

impl IndexGeneration {
    pub fn new(projects: Vec<ProjectGeneration>) -> Self {
        Self { projects }
    }

    /// Sort projects by name, cascading into tags and packages.
    pub fn sort(&mut self) {
        self.projects.sort_by(|a, b| a.project.cmp(&b.project));
        for project in &mut self.projects {
            project.generation.sort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(import_path: &str) -> PackageDoc {
        PackageDoc {
            import_path: import_path.to_string(),
            payload: DocPayload::undocumented(import_path.rsplit('/').next().unwrap_or(import_path)),
        }
    }

    fn unsorted_generation() -> IndexGeneration {
        IndexGeneration::new(vec![
            ProjectGeneration {
                project: "beta".to_string(),
                generation: RepositoryGeneration::new(vec![TaggedPackageSet::new(MAINLINE)]),
            },
            ProjectGeneration {
                project: "alpha".to_string(),
                generation: RepositoryGeneration::new(vec![
                    TaggedPackageSet {
                        tag: "v1".to_string(),
                        packages: vec![package("example.com/alpha/z"), package("example.com/alpha/a")],
                    },
                    TaggedPackageSet::new(MAINLINE),
                ]),
            },
        ])
    }

    #[test]
    fn test_sort_cascades_through_all_levels() {
        let mut generation = unsorted_generation();
        generation.sort();
        let projects: Vec<_> = generation.projects.iter().map(|p| p.project.as_str()).collect();
        assert_eq!(projects, vec!["alpha", "beta"]);
        let alpha = &generation.projects[0].generation;
        let tags: Vec<_> = alpha.tag_sets.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec![MAINLINE, "v1"]);
        let packages: Vec<_> = alpha.tag_sets[1].packages.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(packages, vec!["example.com/alpha/a", "example.com/alpha/z"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut once = unsorted_generation();
        once.sort();
        let mut twice = once.clone();
        twice.sort();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_is_stable_across_runs() {
        let mut first = unsorted_generation();
        let mut second = unsorted_generation();
        first.sort();
        second.sort();
        assert_eq!(first, second);
    }
}
