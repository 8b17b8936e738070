#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use datascrap_core::{ApiClient, AuthUser, Navigator, Route, Session, SessionStore};
use serde_json::{json, Value};
use url::Url;
use wiremock::MockServer;

#[derive(Default)]
pub struct RecordingNavigator {
    pub visited: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        self.visited.lock().unwrap().push(route.clone());
    }
}

pub fn session(token: &str) -> Session {
    Session {
        access_token: token.into(),
        refresh_token: Some("refresh-1".into()),
        expires_at: None,
        user: AuthUser {
            id: "user-1".into(),
            email: Some("reader@example.com".into()),
            created_at: None,
        },
    }
}

pub fn client_for(server: &MockServer, sessions: SessionStore) -> (ApiClient, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let client = ApiClient::new(Url::parse(&server.uri()).unwrap(), Arc::new(sessions))
        .unwrap()
        .with_navigator(navigator.clone());
    (client, navigator)
}

pub fn source_json(id: &str, name: &str, kind: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": "user-1",
        "name": name,
        "url": "https://x.com",
        "type": kind,
        "status": status,
        "scrape_frequency": 3600,
        "last_scraped_at": null,
        "articles_count": 0,
        "created_at": "2024-10-21T07:28:00Z",
        "updated_at": "2024-10-21T07:28:00Z"
    })
}

pub fn article_json(id: &str, source_id: &str) -> Value {
    json!({
        "id": id,
        "source_id": source_id,
        "user_id": "user-1",
        "title": "Rust 1.80 released",
        "url": "https://blog.rust-lang.org/1.80",
        "content": "Lorem ipsum dolor sit amet",
        "excerpt": "Lorem ipsum",
        "summary": "A new Rust release.",
        "author": null,
        "published_at": "2024-10-21T07:28:00Z",
        "scraped_at": "2024-10-21T08:00:00Z",
        "created_at": "2024-10-21T08:00:00Z",
        "updated_at": "2024-10-21T08:00:00Z"
    })
}

pub fn digest_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": "user-1",
        "title": "Weekly digest",
        "status": status,
        "content": {"sections": []},
        "article_count": 2,
        "delivery_method": "email",
        "sent_at": null,
        "created_at": "2024-10-21T09:00:00Z",
        "updated_at": "2024-10-21T09:00:00Z"
    })
}
