use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use datascrap_core::models::{
    ArticleSummarizeRequest, DigestDeliveryRequest, DigestGenerateRequest, Source,
};
use datascrap_core::services::{ArticleFilter, DigestFilter, SourceFilter};
use datascrap_core::view::{
    load_articles_page, load_dashboard, load_digest_detail, load_digests_page, load_sources_page,
    ArticlesPage, DashboardStats, DigestDetail, DigestsPage, ErrorPanel, SourcesPage,
};
use datascrap_core::{
    ApiError, AppConfig, AuthGuard, AuthUser, ErrorKind, IdentityClient, Navigator,
    OAuthProvider, Pagination, Profile, RefreshingSessions, Route, Services, SessionStore,
    ViewState,
};
use eframe::egui::{self, RichText};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::pages::{self, Action, DeleteConfirm, Listing, LoginForm, SourceForm};
use crate::theme;

/// Page size used when resolving source names for article lists.
const SOURCE_NAME_PAGE: u32 = 100;

pub struct AppInit {
    pub runtime: Arc<Runtime>,
    pub services: Services,
    pub identity: IdentityClient,
    pub sessions: SessionStore,
    /// Same store as `sessions`, refreshed on expiry; shared with the transport.
    pub live_sessions: RefreshingSessions,
    pub guard: AuthGuard,
    pub routes: mpsc::UnboundedReceiver<Route>,
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub oauth_redirect: Url,
}

/// Forwards navigation requests from the transport and the guard to the UI thread.
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new(tx: mpsc::UnboundedSender<Route>) -> Self {
        Self { tx }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: &Route) {
        if self.tx.send(route.clone()).is_err() {
            debug!(%route, "window closed, navigation dropped");
        }
    }
}

/// Results of spawned work, drained once per frame.
enum UiEvent {
    Session(Option<AuthUser>),
    Authorized(AuthUser),
    Denied,
    SignedIn(Result<AuthUser, String>),
    SignedUp(Result<Option<AuthUser>, String>),
    SignedOut,
    Dashboard(ViewState<DashboardStats>),
    Sources(ViewState<SourcesPage>),
    Articles(ViewState<ArticlesPage>, HashMap<String, String>),
    Digests(ViewState<DigestsPage>),
    Digest(ViewState<DigestDetail>),
    SourceCreated(Result<Source, ApiError>),
    Profile(ViewState<Option<Profile>>),
    /// Outcome of a one-shot action; the route, when given, is reloaded if still shown.
    Notice(Result<String, ApiError>, Option<Route>),
}

pub struct DashboardApp {
    runtime: Arc<Runtime>,
    ctx: egui::Context,
    services: Services,
    identity: IdentityClient,
    sessions: SessionStore,
    live_sessions: RefreshingSessions,
    guard: AuthGuard,
    routes: mpsc::UnboundedReceiver<Route>,
    events_tx: mpsc::UnboundedSender<UiEvent>,
    events: mpsc::UnboundedReceiver<UiEvent>,
    config: AppConfig,
    config_path: PathBuf,
    oauth_redirect: Url,

    route: Route,
    user: Option<AuthUser>,
    checking_session: bool,
    notice: Option<(bool, String)>,

    login: LoginForm,
    source_form: SourceForm,
    dashboard: ViewState<DashboardStats>,
    sources: Listing<SourcesPage, SourceFilter>,
    source_delete: DeleteConfirm,
    articles: Listing<ArticlesPage, ArticleFilter>,
    article_search: String,
    expanded_article: Option<String>,
    source_names: HashMap<String, String>,
    digests: Listing<DigestsPage, DigestFilter>,
    digest: ViewState<DigestDetail>,
    profile: ViewState<Option<Profile>>,
}

impl DashboardApp {
    pub fn new(init: AppInit, ctx: egui::Context) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let page_size = init.config.page_size();
        let app = Self {
            runtime: init.runtime,
            ctx,
            services: init.services,
            identity: init.identity,
            sessions: init.sessions,
            live_sessions: init.live_sessions,
            guard: init.guard,
            routes: init.routes,
            events_tx,
            events,
            config: init.config,
            config_path: init.config_path,
            oauth_redirect: init.oauth_redirect,
            route: Route::Dashboard,
            user: None,
            checking_session: true,
            notice: None,
            login: LoginForm::default(),
            source_form: SourceForm::default(),
            dashboard: ViewState::Loading,
            sources: Listing::new(page_size),
            source_delete: DeleteConfirm::default(),
            articles: Listing::new(page_size),
            article_search: String::new(),
            expanded_article: None,
            source_names: HashMap::new(),
            digests: Listing::new(page_size),
            digest: ViewState::Loading,
            profile: ViewState::Loading,
        };

        let guard = app.guard.clone();
        app.spawn(async move { UiEvent::Session(guard.current_user().await) });
        app
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(task.await);
            ctx.request_repaint();
        });
    }

    /// Runs `task` only once the guard confirms a signed-in user.
    fn spawn_guarded<F>(&self, task: F)
    where
        F: Future<Output = UiEvent> + Send + 'static,
    {
        let guard = self.guard.clone();
        let tx = self.events_tx.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            match guard.require_auth().await {
                Ok(user) => {
                    let _ = tx.send(UiEvent::Authorized(user));
                    let _ = tx.send(task.await);
                }
                Err(redirect) => {
                    debug!(to = %redirect.to, "view needs a signed-in user");
                    let _ = tx.send(UiEvent::Denied);
                }
            }
            ctx.request_repaint();
        });
    }

    fn check_auth(&self) {
        let guard = self.guard.clone();
        self.spawn(async move {
            match guard.require_auth().await {
                Ok(user) => UiEvent::Authorized(user),
                Err(_) => UiEvent::Denied,
            }
        });
    }

    fn navigate(&mut self, route: Route) {
        self.notice = None;
        self.route = route.clone();
        self.load(&route);
    }

    fn load(&mut self, route: &Route) {
        let services = self.services.clone();
        match route {
            Route::Login | Route::Signup => {
                let guard = self.guard.clone();
                let ctx = self.ctx.clone();
                self.runtime.spawn(async move {
                    // Sends the dashboard route through the navigator when still signed in.
                    if guard.redirect_if_authenticated().await.is_some() {
                        ctx.request_repaint();
                    }
                });
            }
            Route::Dashboard => {
                self.dashboard = ViewState::Loading;
                self.spawn_guarded(async move { UiEvent::Dashboard(load_dashboard(&services).await) });
            }
            Route::Sources => {
                self.sources.state = ViewState::Loading;
                let filter = self.sources.filter.clone();
                let page = self.sources.page;
                self.spawn_guarded(async move {
                    UiEvent::Sources(load_sources_page(&services.sources, &filter, page).await)
                });
            }
            Route::NewSource => {
                self.source_form = SourceForm::default();
                self.check_auth();
            }
            Route::Articles => {
                self.articles.state = ViewState::Loading;
                let filter = self.articles.filter.clone();
                let page = self.articles.page;
                self.spawn_guarded(async move {
                    let names = source_names(&services).await;
                    let state = load_articles_page(&services.articles, &filter, page, &names).await;
                    UiEvent::Articles(state, names)
                });
            }
            Route::Digests => {
                self.digests.state = ViewState::Loading;
                let filter = self.digests.filter.clone();
                let page = self.digests.page;
                self.spawn_guarded(async move {
                    UiEvent::Digests(load_digests_page(&services.digests, &filter, page).await)
                });
            }
            Route::Digest(id) => {
                self.digest = ViewState::Loading;
                let id = id.clone();
                self.spawn_guarded(async move {
                    let names = source_names(&services).await;
                    UiEvent::Digest(load_digest_detail(&services.digests, &id, &names).await)
                });
            }
            Route::Account => {
                self.profile = ViewState::Loading;
                let identity = self.identity.clone();
                let sessions = self.live_sessions.clone();
                self.spawn_guarded(async move { UiEvent::Profile(load_profile(&identity, &sessions).await) });
            }
            Route::Settings => self.check_auth(),
        }
    }

    fn drain_routes(&mut self) {
        while let Ok(route) = self.routes.try_recv() {
            match route {
                Route::Login | Route::Signup => {
                    if !self.route.is_public() {
                        self.login.notice = Some("Please sign in to continue.".to_owned());
                    }
                    self.user = None;
                    self.route = route;
                }
                other if other != self.route => self.navigate(other),
                _ => {}
            }
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                UiEvent::Session(user) => {
                    self.checking_session = false;
                    match user {
                        Some(user) => {
                            info!(user = %user.id, "restored session");
                            self.user = Some(user);
                            self.navigate(Route::Dashboard);
                        }
                        None => self.route = Route::Login,
                    }
                }
                UiEvent::Authorized(user) => self.user = Some(user),
                UiEvent::Denied => self.user = None,
                UiEvent::SignedIn(Ok(user)) | UiEvent::SignedUp(Ok(Some(user))) => {
                    info!(user = %user.id, "signed in");
                    self.user = Some(user);
                    self.login = LoginForm::default();
                    self.navigate(Route::Dashboard);
                }
                UiEvent::SignedUp(Ok(None)) => {
                    self.login = LoginForm {
                        notice: Some("Check your email to confirm your account, then sign in.".to_owned()),
                        ..LoginForm::default()
                    };
                    self.route = Route::Login;
                }
                UiEvent::SignedIn(Err(message)) | UiEvent::SignedUp(Err(message)) => {
                    self.login.busy = false;
                    self.login.error = Some(message);
                }
                UiEvent::SignedOut => {
                    self.user = None;
                    self.reset_pages();
                    self.route = Route::Login;
                }
                UiEvent::Dashboard(state) => self.dashboard = state,
                UiEvent::Sources(state) => self.sources.state = state,
                UiEvent::Articles(state, names) => {
                    self.articles.state = state;
                    self.source_names = names;
                }
                UiEvent::Digests(state) => self.digests.state = state,
                UiEvent::Digest(state) => self.digest = state,
                UiEvent::Profile(state) => self.profile = state,
                UiEvent::SourceCreated(Ok(source)) => {
                    info!(source = %source.id, "source added");
                    self.source_form = SourceForm::default();
                    self.navigate(Route::Sources);
                    self.notice = Some((true, format!("Added {}", source.name)));
                }
                UiEvent::SourceCreated(Err(err)) => {
                    self.source_form.busy = false;
                    self.source_form.error = Some(err.detail.unwrap_or(err.message));
                }
                UiEvent::Notice(Ok(message), reload) => {
                    if !message.is_empty() {
                        self.notice = Some((true, message));
                    }
                    if let Some(route) = reload.filter(|r| *r == self.route) {
                        self.load(&route);
                    }
                }
                UiEvent::Notice(Err(err), _) => {
                    if !err.is_unauthorized() {
                        self.notice = Some((false, err.message));
                    }
                }
            }
        }
    }

    fn reset_pages(&mut self) {
        let page_size = self.config.page_size();
        self.dashboard = ViewState::Loading;
        self.sources = Listing::new(page_size);
        self.source_delete.cancel();
        self.articles = Listing::new(page_size);
        self.digests = Listing::new(page_size);
        self.digest = ViewState::Loading;
        self.profile = ViewState::Loading;
        self.article_search.clear();
        self.expanded_article = None;
        self.source_names.clear();
    }

    fn current_pagination(&mut self) -> Option<&mut Pagination> {
        match self.route {
            Route::Sources => Some(&mut self.sources.page),
            Route::Articles => Some(&mut self.articles.page),
            Route::Digests => Some(&mut self.digests.page),
            _ => None,
        }
    }

    fn handle(&mut self, action: Action) {
        match action {
            Action::Go(route) => self.navigate(route),
            Action::Reload => {
                let route = self.route.clone();
                self.load(&route);
            }
            Action::FilterChanged => {
                let page_size = self.config.page_size();
                if let Some(page) = self.current_pagination() {
                    *page = Pagination::new(1, page_size);
                }
                let route = self.route.clone();
                self.load(&route);
            }
            Action::PreviousPage | Action::NextPage => {
                if let Some(page) = self.current_pagination() {
                    *page = if action == Action::NextPage {
                        page.next()
                    } else {
                        page.previous()
                    };
                }
                let route = self.route.clone();
                self.load(&route);
            }
            Action::CreateSource => match self.source_form.validate() {
                Ok(payload) => {
                    self.source_form.busy = true;
                    self.source_form.error = None;
                    let sources = self.services.sources.clone();
                    self.spawn(async move { UiEvent::SourceCreated(sources.create(&payload).await) });
                }
                Err(message) => self.source_form.error = Some(message),
            },
            Action::ScrapeSource(id) => {
                let sources = self.services.sources.clone();
                self.spawn(async move {
                    let result = sources.scrape(&id).await.map(|ack| ack.message);
                    UiEvent::Notice(result, Some(Route::Sources))
                });
            }
            Action::DeleteSource(id) => {
                let sources = self.services.sources.clone();
                self.spawn(async move {
                    let result = sources.delete(&id).await.map(|ack| ack.message);
                    UiEvent::Notice(result, Some(Route::Sources))
                });
            }
            Action::Summarize(id) => {
                let articles = self.services.articles.clone();
                self.spawn(async move {
                    let request = ArticleSummarizeRequest::for_article(id);
                    UiEvent::Notice(articles.summarize(&request).await.map(|ack| ack.message), None)
                });
            }
            Action::GenerateDigest => {
                let digests = self.services.digests.clone();
                self.spawn(async move {
                    let result = digests
                        .generate(&DigestGenerateRequest::default())
                        .await
                        .map(|ack| ack.message);
                    UiEvent::Notice(result, Some(Route::Digests))
                });
            }
            Action::DeliverDigest(id) => {
                let digests = self.services.digests.clone();
                self.spawn(async move {
                    let request = DigestDeliveryRequest::for_digest(id.clone());
                    let result = digests.deliver(&request).await.map(|ack| ack.message);
                    UiEvent::Notice(result, Some(Route::Digest(id)))
                });
            }
            Action::OpenLink(url) => self.open_in_browser(&url),
            Action::SignIn | Action::SignUp => self.submit_credentials(action == Action::SignUp),
            Action::OAuth(provider) => self.start_oauth(provider),
            Action::CompleteOAuth => self.complete_oauth(),
            Action::SignOut => {
                let identity = self.identity.clone();
                let sessions = self.sessions.clone();
                self.spawn(async move {
                    if let Some(session) = sessions.get().await {
                        if let Err(e) = identity.sign_out(&session.access_token).await {
                            warn!(error = %e, "sign-out request failed");
                        }
                    }
                    sessions.clear().await;
                    UiEvent::SignedOut
                });
            }
            Action::SaveSettings => {
                self.notice = Some(match self.config.save_to(&self.config_path) {
                    Ok(()) => (true, "Settings saved".to_owned()),
                    Err(e) => {
                        warn!(error = %e, "failed to save settings");
                        (false, format!("Could not save settings: {e}"))
                    }
                });
            }
        }
    }

    fn submit_credentials(&mut self, signing_up: bool) {
        let (email, password) = match self.login.credentials(signing_up) {
            Ok(pair) => pair,
            Err(message) => {
                self.login.error = Some(message);
                return;
            }
        };
        self.login.busy = true;
        self.login.error = None;
        self.login.notice = None;

        let identity = self.identity.clone();
        let sessions = self.sessions.clone();
        self.spawn(async move {
            if signing_up {
                match identity.sign_up(&email, &password).await {
                    Ok(Some(session)) => {
                        let user = session.user.clone();
                        sessions.set(session).await;
                        UiEvent::SignedUp(Ok(Some(user)))
                    }
                    Ok(None) => UiEvent::SignedUp(Ok(None)),
                    Err(e) => UiEvent::SignedUp(Err(e.to_string())),
                }
            } else {
                match identity.sign_in_with_password(&email, &password).await {
                    Ok(session) => {
                        let user = session.user.clone();
                        sessions.set(session).await;
                        UiEvent::SignedIn(Ok(user))
                    }
                    Err(e) => UiEvent::SignedIn(Err(e.to_string())),
                }
            }
        });
    }

    fn start_oauth(&mut self, provider: OAuthProvider) {
        match self
            .identity
            .oauth_authorize_url(provider, self.oauth_redirect.as_str())
        {
            Ok(url) => {
                info!(provider = provider.as_str(), "opening browser for sign-in");
                self.open_in_browser(url.as_str());
            }
            Err(e) => self.login.error = Some(e.to_string()),
        }
    }

    fn complete_oauth(&mut self) {
        let redirect = match Url::parse(self.login.callback_url.trim()) {
            Ok(url) => url,
            Err(_) => {
                self.login.error = Some("That does not look like a sign-in address".to_owned());
                return;
            }
        };
        self.login.busy = true;
        self.login.error = None;

        let identity = self.identity.clone();
        let sessions = self.sessions.clone();
        self.spawn(async move {
            match identity.session_from_redirect(&redirect).await {
                Ok(session) => {
                    let user = session.user.clone();
                    sessions.set(session).await;
                    UiEvent::SignedIn(Ok(user))
                }
                Err(e) => UiEvent::SignedIn(Err(e.to_string())),
            }
        });
    }

    fn open_in_browser(&mut self, url: &str) {
        if let Err(e) = webbrowser::open(url) {
            warn!(%url, error = %e, "failed to open browser");
            let message = format!("Could not open the browser: {e}");
            if self.route.is_public() {
                self.login.error = Some(message);
            } else {
                self.notice = Some((false, message));
            }
        }
    }

    fn nav_selected(&self, target: &Route) -> bool {
        match (&self.route, target) {
            (Route::Digest(_), Route::Digests) | (Route::NewSource, Route::Sources) => true,
            (current, target) => current == target,
        }
    }

    fn draw_sidebar(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        egui::SidePanel::left("nav_panel")
            .resizable(false)
            .exact_width(self.config.ui.sidebar_width)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.heading(RichText::new("DataScrap").color(self.config.theme.accent_color32()));
                ui.add_space(12.0);

                for (label, route) in [
                    ("Dashboard", Route::Dashboard),
                    ("Sources", Route::Sources),
                    ("Articles", Route::Articles),
                    ("Digests", Route::Digests),
                    ("Settings", Route::Settings),
                    ("Account", Route::Account),
                ] {
                    let selected = self.nav_selected(&route);
                    let button = ui.add_sized(
                        [ui.available_width(), 30.0],
                        egui::SelectableLabel::new(selected, label),
                    );
                    if button.clicked() && !selected {
                        actions.push(Action::Go(route));
                    }
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    ui.add_space(8.0);
                    if ui.button("Sign out").clicked() {
                        actions.push(Action::SignOut);
                    }
                    if let Some(email) = self.user.as_ref().and_then(|u| u.email.as_deref()) {
                        ui.label(RichText::new(email).small());
                    }
                });
            });
    }

    fn draw_main(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some((ok, message)) = &self.notice {
                let color = if *ok {
                    self.config.theme.success_color32()
                } else {
                    self.config.theme.error_color32()
                };
                let mut dismissed = false;
                ui.horizontal(|ui| {
                    ui.label(RichText::new(message.as_str()).color(color));
                    dismissed = ui.small_button("x").clicked();
                });
                if dismissed {
                    self.notice = None;
                }
                ui.separator();
            }

            let theme = &self.config.theme;
            match &self.route {
                Route::Dashboard => {
                    pages::dashboard(ui, &self.dashboard, self.user.as_ref(), theme, actions)
                }
                Route::Sources => {
                    pages::sources(ui, &mut self.sources, &mut self.source_delete, theme, actions)
                }
                Route::NewSource => pages::new_source(ui, &mut self.source_form, theme, actions),
                Route::Articles => pages::articles(
                    ui,
                    &mut self.articles,
                    &mut self.article_search,
                    &self.source_names,
                    &mut self.expanded_article,
                    self.config.ui.show_summaries,
                    theme,
                    actions,
                ),
                Route::Digests => pages::digests(ui, &mut self.digests, theme, actions),
                Route::Digest(_) => pages::digest_detail(ui, &self.digest, theme, actions),
                Route::Settings => pages::settings(ui, &mut self.config, actions),
                Route::Account => {
                    pages::account(ui, self.user.as_ref(), &self.profile, theme, actions)
                }
                Route::Login | Route::Signup => {}
            }
        });
    }
}

/// Source id to name, used to label articles. A failure leaves articles unlabeled.
async fn source_names(services: &Services) -> HashMap<String, String> {
    match services
        .sources
        .list(&SourceFilter::default(), Pagination::new(1, SOURCE_NAME_PAGE))
        .await
    {
        Ok(list) => list
            .sources
            .into_iter()
            .map(|source| (source.id, source.name))
            .collect(),
        Err(e) => {
            warn!(error = %e, "could not load source names");
            HashMap::new()
        }
    }
}

/// Subscription profile of the signed-in user. `Ready(None)` means no profile row yet.
async fn load_profile(identity: &IdentityClient, sessions: &RefreshingSessions) -> ViewState<Option<Profile>> {
    let Some(session) = sessions.valid_session().await else {
        return ViewState::Ready(None);
    };
    match identity.profile(&session.access_token, &session.user.id).await {
        Ok(profile) => ViewState::Ready(profile),
        Err(e) => {
            warn!(error = %e, "could not load profile");
            ViewState::Failed(ErrorPanel {
                title: "Error Loading Plan".to_owned(),
                message: e.to_string(),
                hint: "Your subscription details could not be loaded.".to_owned(),
                kind: ErrorKind::Unknown,
                retry: true,
            })
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply(ctx, &self.config.theme, self.config.ui.font_size);
        self.drain_events();
        self.drain_routes();

        let mut actions = Vec::new();
        if self.checking_session {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.add_space(80.0);
                ui.vertical_centered(|ui| {
                    ui.add(egui::Spinner::new().size(32.0));
                    ui.label("Checking your session...");
                });
            });
        } else if self.route.is_public() {
            let signing_up = self.route == Route::Signup;
            let theme = self.config.theme.clone();
            egui::CentralPanel::default().show(ctx, |ui| {
                pages::login(ui, &mut self.login, signing_up, &theme, &mut actions);
            });
        } else {
            self.draw_sidebar(ctx, &mut actions);
            self.draw_main(ctx, &mut actions);
        }

        for action in actions {
            self.handle(action);
        }
    }
}
