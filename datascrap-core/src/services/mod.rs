//! One façade per backend resource. Each call is exactly one transport round trip.

pub mod articles;
pub mod digests;
pub mod sources;

pub use articles::{ArticleFilter, ArticlesService};
pub use digests::{DigestFilter, DigestsService};
pub use sources::{SourceFilter, SourcesService};

use crate::transport::{ApiClient, RequestOptions};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Page request; both values are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Zero is clamped to 1 for either value.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.page_size)
    }

    pub fn previous(&self) -> Self {
        Self::new(self.page.saturating_sub(1), self.page_size)
    }

    pub(crate) fn apply(&self, options: RequestOptions) -> RequestOptions {
        options
            .query("page", self.page)
            .query("page_size", self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// The three resource services sharing one transport.
#[derive(Clone)]
pub struct Services {
    pub sources: SourcesService,
    pub articles: ArticlesService,
    pub digests: DigestsService,
}

impl Services {
    pub fn new(client: ApiClient) -> Self {
        Self {
            sources: SourcesService::new(client.clone()),
            articles: ArticlesService::new(client.clone()),
            digests: DigestsService::new(client),
        }
    }
}
