use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ApiError;
use crate::models::{
    Article, ArticleCreate, ArticleList, ArticleStats, ArticleSummarizeRequest, ArticleUpdate,
    DeleteAck, JobAck,
};
use crate::services::Pagination;
use crate::transport::{ApiClient, ApiPath, RequestOptions};

const BASE: &str = "/api/v1/articles";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub source_id: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ArticleFilter {
    fn to_options(&self) -> RequestOptions {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        RequestOptions::new()
            .query_opt("source_id", self.source_id.as_deref())
            .query_opt("search", search)
            .query_opt("start_date", self.start_date.map(rfc3339))
            .query_opt("end_date", self.end_date.map(rfc3339))
    }
}

pub(crate) fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Clone)]
pub struct ArticlesService {
    client: ApiClient,
}

impl ArticlesService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &ArticleFilter, page: Pagination) -> Result<ArticleList, ApiError> {
        let options = page.apply(filter.to_options());
        self.client.get(BASE, &options).await
    }

    pub async fn get(&self, id: &str) -> Result<Article, ApiError> {
        self.client
            .get(ApiPath::new(BASE).segment(id), &RequestOptions::new())
            .await
    }

    pub async fn create(&self, payload: &ArticleCreate) -> Result<Article, ApiError> {
        self.client.post(BASE, payload, &RequestOptions::new()).await
    }

    pub async fn update(&self, id: &str, payload: &ArticleUpdate) -> Result<Article, ApiError> {
        self.client
            .patch(ApiPath::new(BASE).segment(id), payload, &RequestOptions::new())
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteAck, ApiError> {
        self.client
            .delete(ApiPath::new(BASE).segment(id), &RequestOptions::new())
            .await
    }

    /// Queue AI summarization; completion is tracked by the backend.
    pub async fn summarize(&self, request: &ArticleSummarizeRequest) -> Result<JobAck, ApiError> {
        self.client
            .post(ApiPath::new(BASE).segment("summarize"), request, &RequestOptions::new())
            .await
    }

    pub async fn stats(&self) -> Result<ArticleStats, ApiError> {
        self.client
            .get(ApiPath::new(BASE).segment("stats").segment("overview"), &RequestOptions::new())
            .await
    }
}
