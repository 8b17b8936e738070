mod common;

use datascrap_core::{SessionProvider, SessionStore};

use common::session;

fn temp_dir(prefix: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "{prefix}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

#[tokio::test]
async fn session_survives_reload() {
    let dir = temp_dir("datascrap_session");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("session.json");

    let store = SessionStore::load_from(&path).await;
    assert!(store.current_session().await.is_none());

    store.set(session("tok-1")).await;

    let reopened = SessionStore::load_from(&path).await;
    let restored = reopened.current_session().await.expect("session persisted");
    assert_eq!(restored.access_token, "tok-1");
    assert_eq!(restored.user.id, "user-1");

    // Sign-out clears the file too
    reopened.clear().await;
    let after_clear = SessionStore::load_from(&path).await;
    assert!(after_clear.current_session().await.is_none());

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn load_uses_tmp_fallback_on_corrupted_json() {
    let dir = temp_dir("datascrap_corrupt");
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let path = dir.join("session.json");
    tokio::fs::write(&path, b"{ this is not json ").await.unwrap();

    let tmp_path = dir.join("session.json.tmp");
    let bytes = serde_json::to_vec(&Some(session("from-tmp"))).unwrap();
    tokio::fs::write(&tmp_path, bytes).await.unwrap();

    let store = SessionStore::load_from(&path).await;
    let restored = store.current_session().await;
    assert_eq!(
        restored.map(|s| s.access_token).as_deref(),
        Some("from-tmp"),
        "should fall back to tmp file when main is corrupted"
    );

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[test]
fn blank_token_is_not_a_bearer() {
    let mut s = session("   ");
    assert!(s.bearer_token().is_none());
    s.access_token = "abc".into();
    assert_eq!(s.bearer_token(), Some("abc"));
}

#[test]
fn expiry_is_checked_against_now() {
    let now = chrono::Utc::now();
    let mut s = session("abc");
    assert!(!s.is_expired(now));
    s.expires_at = Some(now - chrono::Duration::seconds(1));
    assert!(s.is_expired(now));
}

#[tokio::test]
async fn missing_parent_directories_are_created() {
    let dir = temp_dir("datascrap_nested");
    let path = dir.join("a").join("b").join("session.json");

    let store = SessionStore::load_from(&path).await;
    store.set(session("tok-nested")).await;

    assert!(tokio::fs::try_exists(&path).await.unwrap());
    let reopened = SessionStore::load_from(&path).await;
    assert_eq!(reopened.get().await.unwrap().access_token, "tok-nested");

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[cfg(unix)]
#[tokio::test]
async fn session_file_is_private_to_owner() {
    use std::os::unix::fs::PermissionsExt;

    let dir = temp_dir("datascrap_mode");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("session.json");
    // a leftover temp file with open permissions must not leak its mode
    tokio::fs::write(path.with_extension("json.tmp"), b"{}").await.unwrap();
    tokio::fs::set_permissions(
        path.with_extension("json.tmp"),
        std::fs::Permissions::from_mode(0o644),
    )
    .await
    .unwrap();

    let store = SessionStore::load_from(&path).await;
    store.set(session("tok-secret")).await;

    let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
