mod common;

use std::num::NonZeroU32;

use datascrap_core::models::{
    ArticleSummarizeRequest, DeliveryMethod, DigestDeliveryRequest, DigestGenerateRequest,
    DigestStatus, SourceCreate, SourceStatus, SourceType, SourceUpdate,
};
use datascrap_core::services::{ArticleFilter, DigestFilter, SourceFilter};
use datascrap_core::{ErrorKind, Pagination, Services, SessionStore};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{article_json, client_for, digest_json, session, source_json};

async fn services(server: &MockServer) -> Services {
    let (client, _) = client_for(server, SessionStore::with_session(session("tok")));
    Services::new(client)
}

#[tokio::test]
async fn empty_account_lists_no_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sources"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sources": [], "total": 0, "page": 1, "page_size": 50
        })))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server).await;
    let list = services
        .sources
        .list(&SourceFilter::default(), Pagination::new(1, 50))
        .await
        .unwrap();

    assert!(list.sources.is_empty());
    assert_eq!(list.total, 0);
    assert_eq!(list.page, 1);
    assert_eq!(list.page_size, 50);
}

#[tokio::test]
async fn list_sends_only_set_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sources": [source_json("s1", "Blog", "rss", "active")],
            "total": 3, "page": 2, "page_size": 1
        })))
        .mount(&server)
        .await;

    let services = services(&server).await;
    let filter = SourceFilter {
        status: Some(SourceStatus::Active),
        source_type: None,
    };
    let list = services
        .sources
        .list(&filter, Pagination::new(2, 1))
        .await
        .unwrap();

    assert!(list.sources.len() <= list.page_size as usize);
    assert!(list.total >= list.sources.len() as u64);

    let requests = server.received_requests().await.unwrap();
    let query: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(query.contains(&("status".into(), "active".into())));
    assert!(query.contains(&("page".into(), "2".into())));
    assert!(query.contains(&("page_size".into(), "1".into())));
    assert!(!query.iter().any(|(k, _)| k == "type"));
}

#[test]
fn pagination_clamps_to_one() {
    let page = Pagination::new(0, 0);
    assert_eq!(page.page(), 1);
    assert_eq!(page.page_size(), 1);
    assert_eq!(page.previous().page(), 1);
    assert_eq!(Pagination::default().page_size(), 50);
}

#[tokio::test]
async fn create_then_get_echoes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sources"))
        .and(body_json(json!({
            "name": "Blog", "url": "https://x.com", "type": "rss", "status": "active"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(source_json("s1", "Blog", "rss", "active")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sources/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(source_json("s1", "Blog", "rss", "active")))
        .mount(&server)
        .await;

    let services = services(&server).await;
    let payload = SourceCreate {
        name: "Blog".into(),
        url: "https://x.com".into(),
        source_type: SourceType::Rss,
        status: SourceStatus::Active,
        scrape_frequency: None,
    };
    let created = services.sources.create(&payload).await.unwrap();
    assert_eq!(created.source_type, SourceType::Rss);
    assert_eq!(created.status, SourceStatus::Active);

    let fetched = services.sources.get(&created.id).await.unwrap();
    assert_eq!(fetched.name, payload.name);
    assert_eq!(fetched.url, payload.url);
    assert_eq!(fetched.source_type, payload.source_type);
}

#[tokio::test]
async fn update_sends_only_supplied_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/sources/s1"))
        .and(body_json(json!({"status": "inactive", "scrape_frequency": 7200})))
        .respond_with(ResponseTemplate::new(200).set_body_json(source_json("s1", "Blog", "rss", "inactive")))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server).await;
    let update = SourceUpdate {
        status: Some(SourceStatus::Inactive),
        scrape_frequency: NonZeroU32::new(7200),
        ..Default::default()
    };
    let updated = services.sources.update("s1", &update).await.unwrap();
    assert_eq!(updated.status, SourceStatus::Inactive);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/sources/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Source deleted"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/sources/s1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Source not found"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sources/s1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Source not found"})))
        .mount(&server)
        .await;

    let services = services(&server).await;
    let ack = services.sources.delete("s1").await.unwrap();
    assert_eq!(ack.message, "Source deleted");

    let err = services.sources.get("s1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // a second delete of the same id is not a success
    let err = services.sources.delete("s1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn scrape_returns_job_acknowledgement() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sources/s1/scrape"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "message": "Scrape queued", "job_id": "job-9"
        })))
        .mount(&server)
        .await;

    let services = services(&server).await;
    let ack = services.sources.scrape("s1").await.unwrap();
    assert_eq!(ack.job_id.as_deref(), Some("job-9"));
}

#[tokio::test]
async fn articles_list_summarize_and_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/articles"))
        .and(query_param("source_id", "s1"))
        .and(query_param("search", "rust"))
        .and(query_param("start_date", "2024-10-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [article_json("a1", "s1")], "total": 1, "page": 1, "page_size": 20
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/articles/summarize"))
        .and(body_json(json!({"article_id": "a1", "max_length": 300})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Summarization started"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/articles/stats/overview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 12, "last_24_hours": 2, "last_7_days": 5, "last_30_days": 12,
            "by_source": {"s1": 12}
        })))
        .mount(&server)
        .await;

    let services = services(&server).await;
    let filter = ArticleFilter {
        source_id: Some("s1".into()),
        search: Some("  rust ".into()),
        start_date: Some("2024-10-01T00:00:00Z".parse().unwrap()),
        end_date: None,
    };
    let list = services
        .articles
        .list(&filter, Pagination::new(1, 20))
        .await
        .unwrap();
    assert_eq!(list.articles[0].source_id, "s1");

    let mut request = ArticleSummarizeRequest::for_article("a1");
    request.max_length = Some(300);
    let ack = services.articles.summarize(&request).await.unwrap();
    assert!(ack.job_id.is_none());

    let stats = services.articles.stats().await.unwrap();
    assert_eq!(stats.total, 12);
    assert_eq!(stats.by_source.get("s1"), Some(&12));
}

#[tokio::test]
async fn digests_generate_deliver_and_articles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/digests"))
        .and(query_param("status", "sent"))
        .and(query_param("delivery_method", "email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "digests": [digest_json("d1", "sent")], "total": 1, "page": 1, "page_size": 50
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/digests/generate"))
        .and(body_json(json!({"max_articles": 10, "delivery_method": "notion"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Digest generation started", "digest_id": "d2", "job_id": "job-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/digests/deliver"))
        .and(body_json(json!({"digest_id": "d1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Delivery queued", "job_id": "job-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/digests/d1/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            article_json("a1", "s1"), article_json("a2", "s1")
        ])))
        .mount(&server)
        .await;

    let services = services(&server).await;
    let filter = DigestFilter {
        status: Some(DigestStatus::Sent),
        delivery_method: Some(DeliveryMethod::Email),
        ..Default::default()
    };
    let list = services.digests.list(&filter, Pagination::default()).await.unwrap();
    assert_eq!(list.digests[0].status, DigestStatus::Sent);
    assert!(list.digests[0].content.is_some());

    let generated = services
        .digests
        .generate(&DigestGenerateRequest {
            max_articles: Some(10),
            delivery_method: Some(DeliveryMethod::Notion),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(generated.digest_id.as_deref(), Some("d2"));

    let delivered = services
        .digests
        .deliver(&DigestDeliveryRequest::for_digest("d1"))
        .await
        .unwrap();
    assert_eq!(delivered.job_id.as_deref(), Some("job-2"));

    let articles = services.digests.articles("d1").await.unwrap();
    assert_eq!(articles.len(), 2);
}

#[tokio::test]
async fn unknown_enum_value_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sources/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(source_json("s1", "Blog", "podcast", "active")))
        .mount(&server)
        .await;

    let services = services(&server).await;
    let err = services.sources.get("s1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
}

#[tokio::test]
async fn delete_encodes_slash_in_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/sources/feeds%2Fs1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Source deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server).await;
    let ack = services.sources.delete("feeds/s1").await.unwrap();
    assert_eq!(ack.message, "Source deleted");
}
