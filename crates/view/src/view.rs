//! Immutable request-servable views.
//!
//! A [`View`] is the materialization of one complete generation: page objects
//! for every repository, tag and package, cross-linked parent to child, plus
//! a route table for request resolution. Views are never mutated after
//! construction; the publisher swaps whole `Arc<View>`s instead.

use crate::generation::IndexGeneration;
use refdex_extract::models::DocPayload;
use std::collections::BTreeMap;

/// Route of the home page, an alias for the repository listing.
pub const HOME_ROUTE: &str = "/";
/// Route prefix for the repository listing and everything under it.
pub const REPOSITORIES_ROUTE: &str = "/repo";

fn repository_route(project: &str) -> String {
    format!("{REPOSITORIES_ROUTE}/{project}")
}
fn tag_route(project: &str, tag: &str) -> String {
    format!("{REPOSITORIES_ROUTE}/{project}/tag/{tag}")
}
fn package_route(project: &str, tag: &str, import_path: &str) -> String {
    format!("{REPOSITORIES_ROUTE}/{project}/tag/{tag}/pkg/{import_path}")
}

/// Page object for one tracked repository.
#[derive(Debug)]
pub struct RepositoryPage {
    pub name: String,
    pub route: String,
    pub tags: Vec<TagPage>,
}

/// Page object for one tag of one repository.
#[derive(Debug)]
pub struct TagPage {
    pub name: String,
    pub route: String,
    /// Owning repository name (parent link).
    pub repository: String,
    pub packages: Vec<PackagePage>,
}

/// Page object for one package at one tag.
#[derive(Debug)]
pub struct PackagePage {
    /// Last segment of the import path.
    pub name: String,
    pub route: String,
    pub import_path: String,
    /// Owning repository name (grandparent link).
    pub repository: String,
    /// Owning tag name (parent link).
    pub tag: String,
    pub payload: DocPayload,
}

/// Index into a view's page tree; values are positions in the sorted
/// repository/tag/package vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageRef {
    Repositories,
    Repository(usize),
    Tag(usize, usize),
    Package(usize, usize, usize),
}

/// A resolved page, borrowed from the view that owns it.
#[derive(Debug)]
pub enum Page<'a> {
    /// Listing of all tracked repositories.
    Repositories(&'a [RepositoryPage]),
    Repository(&'a RepositoryPage),
    Tag(&'a TagPage),
    Package(&'a PackagePage),
}

/// Outcome of resolving a request path against the current view.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// The index is being rebuilt; render the refreshing placeholder.
    Refreshing,
    /// No page exists at this path in the current generation.
    NotFound,
    Page(Page<'a>),
}

/// The currently-served, read-only materialization of a generation.
#[derive(Debug)]
pub enum View {
    /// Static placeholder signalling "index rebuild in progress".
    Refreshing,
    Ready(IndexView),
}

/// The page tree and route table of a complete generation.
#[derive(Debug)]
pub struct IndexView {
    repositories: Vec<RepositoryPage>,
    routes: BTreeMap<String, PageRef>,
}

impl View {
    /// Build a fully-linked view from a complete generation.
    ///
    /// The generation is sorted first, so routes and page order are
    /// deterministic for a given generation's contents. Route collisions
    /// cannot occur: project names are unique by configuration, tags are
    /// unique within a repository and import paths within a tag.
    pub fn build(mut generation: IndexGeneration) -> Self {
        generation.sort();
        let mut routes = BTreeMap::new();
        // The home page is the repository listing.
        routes.insert(HOME_ROUTE.to_string(), PageRef::Repositories);
        routes.insert(REPOSITORIES_ROUTE.to_string(), PageRef::Repositories);
        let mut repositories = Vec::with_capacity(generation.projects.len());
        for (repo_idx, project) in generation.projects.into_iter().enumerate() {
            let mut page = RepositoryPage {
                route: repository_route(&project.project),
                name: project.project,
                tags: Vec::with_capacity(project.generation.tag_sets.len()),
            };
            routes.insert(page.route.clone(), PageRef::Repository(repo_idx));
            for (tag_idx, set) in project.generation.tag_sets.into_iter().enumerate() {
                let mut tag_page = TagPage {
                    route: tag_route(&page.name, &set.tag),
                    name: set.tag,
                    repository: page.name.clone(),
                    packages: Vec::with_capacity(set.packages.len()),
                };
                routes.insert(tag_page.route.clone(), PageRef::Tag(repo_idx, tag_idx));
                for (pkg_idx, package) in set.packages.into_iter().enumerate() {
                    let package_page = PackagePage {
                        route: package_route(&page.name, &tag_page.name, &package.import_path),
                        name: package
                            .import_path
                            .rsplit('/')
                            .next()
                            .unwrap_or(package.import_path.as_str())
                            .to_string(),
                        import_path: package.import_path,
                        repository: page.name.clone(),
                        tag: tag_page.name.clone(),
                        payload: package.payload,
                    };
                    routes.insert(package_page.route.clone(), PageRef::Package(repo_idx, tag_idx, pkg_idx));
                    tag_page.packages.push(package_page);
                }
                page.tags.push(tag_page);
            }
            repositories.push(page);
        }
        Self::Ready(IndexView { repositories, routes })
    }

    /// Whether this is the refreshing placeholder.
    pub fn is_refreshing(&self) -> bool {
        matches!(self, Self::Refreshing)
    }

    /// All repository pages, in sorted order. `None` while refreshing.
    pub fn repositories(&self) -> Option<&[RepositoryPage]> {
        match self {
            Self::Refreshing => None,
            Self::Ready(index) => Some(&index.repositories),
        }
    }

    /// Number of routable pages in this view.
    pub fn route_count(&self) -> usize {
        match self {
            Self::Refreshing => 0,
            Self::Ready(index) => index.routes.len(),
        }
    }

    /// Resolve a request path to a page.
    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        let index = match self {
            Self::Refreshing => return Resolution::Refreshing,
            Self::Ready(index) => index,
        };
        let Some(page_ref) = index.routes.get(path) else {
            return Resolution::NotFound;
        };
        let page = match *page_ref {
            PageRef::Repositories => Page::Repositories(&index.repositories),
            PageRef::Repository(r) => Page::Repository(&index.repositories[r]),
            PageRef::Tag(r, t) => Page::Tag(&index.repositories[r].tags[t]),
            PageRef::Package(r, t, p) => Page::Package(&index.repositories[r].tags[t].packages[p]),
        };
        Resolution::Page(page)
    }
}
