use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::models::{
    Article, DeleteAck, DeliveryMethod, Digest, DigestCreate, DigestDeliveryRequest,
    DigestGenerateRequest, DigestList, DigestStatus, DigestUpdate, GenerateAck, JobAck,
};
use crate::services::articles::rfc3339;
use crate::services::Pagination;
use crate::transport::{ApiClient, ApiPath, RequestOptions};

const BASE: &str = "/api/v1/digests";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestFilter {
    pub status: Option<DigestStatus>,
    pub delivery_method: Option<DeliveryMethod>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl DigestFilter {
    fn to_options(&self) -> RequestOptions {
        RequestOptions::new()
            .query_opt("status", self.status)
            .query_opt("delivery_method", self.delivery_method)
            .query_opt("start_date", self.start_date.map(rfc3339))
            .query_opt("end_date", self.end_date.map(rfc3339))
    }
}

#[derive(Clone)]
pub struct DigestsService {
    client: ApiClient,
}

impl DigestsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &DigestFilter, page: Pagination) -> Result<DigestList, ApiError> {
        let options = page.apply(filter.to_options());
        self.client.get(BASE, &options).await
    }

    pub async fn get(&self, id: &str) -> Result<Digest, ApiError> {
        self.client
            .get(ApiPath::new(BASE).segment(id), &RequestOptions::new())
            .await
    }

    pub async fn create(&self, payload: &DigestCreate) -> Result<Digest, ApiError> {
        self.client.post(BASE, payload, &RequestOptions::new()).await
    }

    pub async fn update(&self, id: &str, payload: &DigestUpdate) -> Result<Digest, ApiError> {
        self.client
            .patch(ApiPath::new(BASE).segment(id), payload, &RequestOptions::new())
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteAck, ApiError> {
        self.client
            .delete(ApiPath::new(BASE).segment(id), &RequestOptions::new())
            .await
    }

    pub async fn generate(&self, request: &DigestGenerateRequest) -> Result<GenerateAck, ApiError> {
        self.client
            .post(ApiPath::new(BASE).segment("generate"), request, &RequestOptions::new())
            .await
    }

    /// Send a digest by email and/or Notion.
    pub async fn deliver(&self, request: &DigestDeliveryRequest) -> Result<JobAck, ApiError> {
        self.client
            .post(ApiPath::new(BASE).segment("deliver"), request, &RequestOptions::new())
            .await
    }

    pub async fn articles(&self, id: &str) -> Result<Vec<Article>, ApiError> {
        self.client
            .get(ApiPath::new(BASE).segment(id).segment("articles"), &RequestOptions::new())
            .await
    }
}
