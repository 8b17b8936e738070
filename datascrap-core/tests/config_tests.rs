use std::collections::HashMap;

use datascrap_core::config::DEFAULT_API_URL;
use datascrap_core::{AppConfig, ClientConfig, ConfigError};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn api_url_falls_back_to_local_default() {
    let config = ClientConfig::from_lookup(lookup(&[
        ("DATASCRAP_IDENTITY_URL", "https://id.example.com"),
        ("DATASCRAP_IDENTITY_ANON_KEY", "anon"),
    ]))
    .unwrap();
    assert_eq!(config.api_url.as_str(), format!("{DEFAULT_API_URL}/"));
    assert_eq!(config.identity_key.as_str(), "anon");
    assert_eq!(
        config.oauth_redirect_url.as_str(),
        "http://localhost:3000/auth/callback"
    );
}

#[test]
fn public_env_names_are_accepted() {
    let config = ClientConfig::from_lookup(lookup(&[
        ("NEXT_PUBLIC_API_URL", "https://api.example.com"),
        ("NEXT_PUBLIC_SUPABASE_URL", "https://id.example.com"),
        ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon"),
    ]))
    .unwrap();
    assert_eq!(config.api_url.host_str(), Some("api.example.com"));
}

#[test]
fn oauth_redirect_derives_from_site_url() {
    let config = ClientConfig::from_lookup(lookup(&[
        ("DATASCRAP_IDENTITY_URL", "https://id.example.com"),
        ("DATASCRAP_IDENTITY_ANON_KEY", "anon"),
        ("NEXT_PUBLIC_SITE_URL", "https://app.example.com/"),
    ]))
    .unwrap();
    assert_eq!(
        config.oauth_redirect_url.as_str(),
        "https://app.example.com/auth/callback"
    );
}

#[test]
fn identity_settings_are_required() {
    let err = ClientConfig::from_lookup(lookup(&[("DATASCRAP_IDENTITY_ANON_KEY", "anon")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Missing("DATASCRAP_IDENTITY_URL")));

    let err = ClientConfig::from_lookup(lookup(&[
        ("DATASCRAP_IDENTITY_URL", "https://id.example.com"),
        ("DATASCRAP_IDENTITY_ANON_KEY", "   "),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Missing("DATASCRAP_IDENTITY_ANON_KEY")));
}

#[test]
fn malformed_url_is_reported() {
    let err = ClientConfig::from_lookup(lookup(&[
        ("DATASCRAP_API_URL", "not a url"),
        ("DATASCRAP_IDENTITY_URL", "https://id.example.com"),
        ("DATASCRAP_IDENTITY_ANON_KEY", "anon"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { name: "DATASCRAP_API_URL", .. }));
}

#[test]
fn app_config_defaults_are_written_and_reloaded() {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "datascrap_config_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));

    let config = AppConfig::load_from_dir(&dir);
    assert_eq!(config.ui.page_size, 50);
    assert!(dir.join("config.json").exists());

    let mut changed = config.clone();
    changed.ui.page_size = 500;
    changed.save_to(&dir.join("config.json")).unwrap();

    let reloaded = AppConfig::load_from_dir(&dir);
    assert_eq!(reloaded.ui.page_size, 500);
    assert_eq!(reloaded.page_size(), 100);

    let _ = std::fs::remove_dir_all(&dir);
}
