mod app;
mod pages;
mod theme;

use std::error::Error;
use std::sync::Arc;

use datascrap_core::{
    ApiClient, AppConfig, AuthGuard, ClientConfig, IdentityClient, Navigator, RefreshingSessions,
    Services, SessionProvider, SessionStore,
};
use eframe::{egui, NativeOptions};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::{AppInit, ChannelNavigator, DashboardApp};

fn main() -> Result<(), Box<dyn Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring unreadable .env file: {e}");
        }
    }
    init_tracing();

    let client_config = ClientConfig::from_env().map_err(|e| {
        error!(error = %e, "missing or invalid configuration");
        e
    })?;

    let runtime = Arc::new(Runtime::new()?);
    let dir = AppConfig::config_dir()?;
    let config = AppConfig::load_from_dir(&dir);
    let sessions = runtime.block_on(SessionStore::load_from(dir.join("session.json")));

    let (route_tx, route_rx) = mpsc::unbounded_channel();
    let navigator: Arc<dyn Navigator> = Arc::new(ChannelNavigator::new(route_tx));

    let identity = IdentityClient::new(
        client_config.identity_url.clone(),
        client_config.identity_key.clone(),
    )?;
    // One refreshing source for the transport and the guard, so an expired token is renewed once.
    let live_sessions = RefreshingSessions::new(sessions.clone(), identity.clone());
    let provider: Arc<dyn SessionProvider> = Arc::new(live_sessions.clone());
    let client = ApiClient::new(client_config.api_url.clone(), provider)?
        .with_navigator(navigator.clone());
    let guard = AuthGuard::with_sessions(identity.clone(), live_sessions.clone(), navigator);

    info!(api = %client_config.api_url, identity = %client_config.identity_url, "starting dashboard");

    let init = AppInit {
        runtime,
        services: Services::new(client),
        identity,
        sessions,
        live_sessions,
        guard,
        routes: route_rx,
        config,
        config_path: dir.join("config.json"),
        oauth_redirect: client_config.oauth_redirect_url,
    };

    eframe::run_native(
        "DataScrap",
        NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1100.0, 760.0])
                .with_min_inner_size([760.0, 520.0]),
            ..Default::default()
        },
        Box::new(move |cc| Box::new(DashboardApp::new(init, cc.egui_ctx.clone()))),
    )?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
