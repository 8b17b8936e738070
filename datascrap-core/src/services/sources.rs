use crate::error::ApiError;
use crate::models::{
    DeleteAck, JobAck, Source, SourceCreate, SourceList, SourceStatus, SourceType, SourceUpdate,
};
use crate::services::Pagination;
use crate::transport::{ApiClient, ApiPath, RequestOptions};

const BASE: &str = "/api/v1/sources";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilter {
    pub status: Option<SourceStatus>,
    pub source_type: Option<SourceType>,
}

impl SourceFilter {
    fn to_options(&self) -> RequestOptions {
        RequestOptions::new()
            .query_opt("status", self.status)
            .query_opt("type", self.source_type)
    }
}

#[derive(Clone)]
pub struct SourcesService {
    client: ApiClient,
}

impl SourcesService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &SourceFilter, page: Pagination) -> Result<SourceList, ApiError> {
        let options = page.apply(filter.to_options());
        self.client.get(BASE, &options).await
    }

    pub async fn get(&self, id: &str) -> Result<Source, ApiError> {
        self.client
            .get(ApiPath::new(BASE).segment(id), &RequestOptions::new())
            .await
    }

    pub async fn create(&self, payload: &SourceCreate) -> Result<Source, ApiError> {
        self.client.post(BASE, payload, &RequestOptions::new()).await
    }

    pub async fn update(&self, id: &str, payload: &SourceUpdate) -> Result<Source, ApiError> {
        self.client
            .patch(ApiPath::new(BASE).segment(id), payload, &RequestOptions::new())
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteAck, ApiError> {
        self.client
            .delete(ApiPath::new(BASE).segment(id), &RequestOptions::new())
            .await
    }

    /// Ask the backend to scrape the source now.
    pub async fn scrape(&self, id: &str) -> Result<JobAck, ApiError> {
        self.client
            .post_empty(ApiPath::new(BASE).segment(id).segment("scrape"), &RequestOptions::new())
            .await
    }
}
