//! Page models for the dashboard.
//!
//! Every page goes through the same four states; loaders perform the service
//! calls and pick the state, renderers only draw what they are handed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{ApiError, ErrorKind};
use crate::guard::Route;
use crate::models::{
    Article, DeliveryMethod, Digest, DigestStatus, Source, SourceStatus, SourceType,
};
use crate::services::{
    ArticleFilter, ArticlesService, DigestFilter, DigestsService, Pagination, Services,
    SourceFilter, SourcesService,
};

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Empty(EmptyState),
    Failed(ErrorPanel),
    Ready(T),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyAction {
    pub label: &'static str,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub description: &'static str,
    pub action: Option<EmptyAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub title: String,
    pub message: String,
    pub hint: String,
    pub kind: ErrorKind,
    /// Whether offering a retry makes sense; a 401 sends the user to login instead.
    pub retry: bool,
}

/// Page kinds, each with its own placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Sources,
    Articles,
    Digests,
    Digest,
    Activity,
    Analytics,
    ApiKeys,
}

impl Page {
    pub fn empty_state(self) -> EmptyState {
        match self {
            Page::Dashboard | Page::Sources => EmptyState {
                title: "No sources yet",
                description: "Add your first source to start generating content digests. You can add websites, blogs, or RSS feeds.",
                action: Some(EmptyAction {
                    label: "Add Source",
                    route: Route::NewSource,
                }),
            },
            Page::Articles => EmptyState {
                title: "No articles yet",
                description: "Articles scraped from your sources will appear here. Add sources to start collecting content.",
                action: None,
            },
            Page::Digests => EmptyState {
                title: "No digests yet",
                description: "Your AI-generated content digests will appear here. Add some sources to get started.",
                action: None,
            },
            Page::Digest => EmptyState {
                title: "No articles in this digest",
                description: "This digest does not reference any articles.",
                action: None,
            },
            Page::Activity => EmptyState {
                title: "No recent activity",
                description: "Your recent digests and source updates will appear here.",
                action: None,
            },
            Page::Analytics => EmptyState {
                title: "No analytics yet",
                description: "Usage charts will appear here once your sources have been scraped.",
                action: None,
            },
            Page::ApiKeys => EmptyState {
                title: "No API keys",
                description: "API key management is not available yet.",
                action: None,
            },
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Sources => "sources",
            Page::Articles => "articles",
            Page::Digests => "digests",
            Page::Digest => "digest",
            Page::Activity => "activity",
            Page::Analytics => "analytics",
            Page::ApiKeys => "API keys",
        }
    }

    pub fn loading_text(self) -> String {
        format!("Loading {}...", self.noun())
    }

    pub fn error_panel(self, err: &ApiError) -> ErrorPanel {
        let noun = self.noun();
        ErrorPanel {
            title: format!("Error Loading {}", capitalize(noun)),
            message: err.message.clone(),
            hint: format!("Failed to load your {noun}. Please try refreshing the page."),
            kind: err.kind,
            retry: !err.is_unauthorized(),
        }
    }

    /// Pick the state for a finished load.
    pub fn state<T>(self, result: Result<T, ApiError>, is_empty: impl FnOnce(&T) -> bool) -> ViewState<T> {
        match result {
            Ok(value) if is_empty(&value) => ViewState::Empty(self.empty_state()),
            Ok(value) => ViewState::Ready(value),
            Err(err) => {
                warn!(page = self.noun(), kind = %err.kind, error = %err, "error fetching page data");
                ViewState::Failed(self.error_panel(&err))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// "active" -> "Active".
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// Minutes to read `text` at 200 words per minute, never less than one.
pub fn read_time_minutes(text: &str) -> usize {
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SourceCard {
    pub id: String,
    pub name: String,
    pub url: String,
    pub source_type: SourceType,
    pub status: SourceStatus,
    pub status_label: String,
    pub articles_count: u64,
    pub last_scraped: String,
}

impl From<&Source> for SourceCard {
    fn from(source: &Source) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            url: source.url.clone(),
            source_type: source.source_type,
            status: source.status,
            status_label: capitalize(source.status.as_str()),
            articles_count: source.articles_count,
            last_scraped: source
                .last_scraped_at
                .map(format_date)
                .unwrap_or_else(|| "Never".to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleListItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub scraped_at: String,
    pub read_time: usize,
    pub summary: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
}

impl ArticleListItem {
    /// `source_names` maps source ids to display names; unknown ids show the id.
    pub fn from_article(article: &Article, source_names: &HashMap<String, String>) -> Self {
        let body = article
            .content
            .as_deref()
            .or(article.excerpt.as_deref())
            .unwrap_or_default();
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
            source: source_names
                .get(&article.source_id)
                .cloned()
                .unwrap_or_else(|| article.source_id.clone()),
            scraped_at: format_date(article.scraped_at),
            read_time: read_time_minutes(body),
            summary: article.summary.clone().filter(|s| !s.trim().is_empty()),
            excerpt: article.excerpt.clone().filter(|s| !s.trim().is_empty()),
            content: article.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DigestCard {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub article_count: u64,
    pub status: DigestStatus,
    pub status_label: String,
    pub delivery_method: DeliveryMethod,
    pub sent_at: Option<String>,
}

impl From<&Digest> for DigestCard {
    fn from(digest: &Digest) -> Self {
        Self {
            id: digest.id.clone(),
            title: digest.title.clone(),
            created_at: format_date(digest.created_at),
            article_count: digest.article_count,
            status: digest.status,
            status_label: capitalize(digest.status.as_str()),
            delivery_method: digest.delivery_method,
            sent_at: digest.sent_at.map(format_date),
        }
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub shown: usize,
}

impl PageInfo {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.total
    }

    pub fn summary(&self, noun: &str) -> String {
        format!("Showing {} of {} {noun}", self.shown, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourcesPage {
    pub cards: Vec<SourceCard>,
    pub info: PageInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticlesPage {
    pub items: Vec<ArticleListItem>,
    pub info: PageInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DigestsPage {
    pub cards: Vec<DigestCard>,
    pub info: PageInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DigestDetail {
    pub card: DigestCard,
    pub content: Option<serde_json::Value>,
    pub articles: Vec<ArticleListItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub active_sources: u64,
    pub digests: u64,
    pub articles: u64,
}

impl DashboardStats {
    pub fn show_getting_started(&self) -> bool {
        self.active_sources == 0
    }
}

pub async fn load_sources_page(
    service: &SourcesService,
    filter: &SourceFilter,
    page: Pagination,
) -> ViewState<SourcesPage> {
    let result = service.list(filter, page).await.map(|list| SourcesPage {
        cards: list.sources.iter().map(SourceCard::from).collect(),
        info: PageInfo {
            page: list.page,
            page_size: list.page_size,
            total: list.total,
            shown: list.sources.len(),
        },
    });
    Page::Sources.state(result, |p| p.cards.is_empty())
}

pub async fn load_articles_page(
    service: &ArticlesService,
    filter: &ArticleFilter,
    page: Pagination,
    source_names: &HashMap<String, String>,
) -> ViewState<ArticlesPage> {
    let result = service.list(filter, page).await.map(|list| ArticlesPage {
        items: list
            .articles
            .iter()
            .map(|a| ArticleListItem::from_article(a, source_names))
            .collect(),
        info: PageInfo {
            page: list.page,
            page_size: list.page_size,
            total: list.total,
            shown: list.articles.len(),
        },
    });
    Page::Articles.state(result, |p| p.items.is_empty())
}

pub async fn load_digests_page(
    service: &DigestsService,
    filter: &DigestFilter,
    page: Pagination,
) -> ViewState<DigestsPage> {
    let result = service.list(filter, page).await.map(|list| DigestsPage {
        cards: list.digests.iter().map(DigestCard::from).collect(),
        info: PageInfo {
            page: list.page,
            page_size: list.page_size,
            total: list.total,
            shown: list.digests.len(),
        },
    });
    Page::Digests.state(result, |p| p.cards.is_empty())
}

/// Digest header plus its articles; a missing digest shows as a not-found error panel.
pub async fn load_digest_detail(
    service: &DigestsService,
    id: &str,
    source_names: &HashMap<String, String>,
) -> ViewState<DigestDetail> {
    let result = async {
        let digest = service.get(id).await?;
        let articles = service.articles(id).await?;
        Ok::<_, ApiError>(DigestDetail {
            card: DigestCard::from(&digest),
            content: digest.content,
            articles: articles
                .iter()
                .map(|a| ArticleListItem::from_article(a, source_names))
                .collect(),
        })
    }
    .await;
    Page::Digest.state(result, |_| false)
}

pub async fn load_dashboard(services: &Services) -> ViewState<DashboardStats> {
    let result = async {
        let active = SourceFilter {
            status: Some(SourceStatus::Active),
            source_type: None,
        };
        let sources = services.sources.list(&active, Pagination::new(1, 1)).await?;
        let digests = services
            .digests
            .list(&DigestFilter::default(), Pagination::new(1, 1))
            .await?;
        let articles = services.articles.stats().await?;
        Ok::<_, ApiError>(DashboardStats {
            active_sources: sources.total,
            digests: digests.total,
            articles: articles.total,
        })
    }
    .await;
    Page::Dashboard.state(result, |_| false)
}
