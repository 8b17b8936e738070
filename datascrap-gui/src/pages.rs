//! Page renderers. Each draws one view and reports what the user asked
//! for as [`Action`]s; the app decides what to spawn.

use std::collections::HashMap;

use datascrap_core::config::{AppConfig, ThemeConfig};
use datascrap_core::models::{DigestStatus, SourceCreate, SourceStatus, SourceType};
use datascrap_core::services::{ArticleFilter, DigestFilter, SourceFilter};
use datascrap_core::view::{
    capitalize, ArticlesPage, DashboardStats, DigestDetail, DigestsPage, PageInfo, SourcesPage,
};
use datascrap_core::auth::FREE_TIER;
use datascrap_core::{AuthUser, OAuthProvider, Page, Pagination, Profile, Route, ViewState};
use eframe::egui::{self, RichText};
use url::Url;

use crate::theme;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Go(Route),
    Reload,
    FilterChanged,
    PreviousPage,
    NextPage,
    CreateSource,
    ScrapeSource(String),
    DeleteSource(String),
    Summarize(String),
    OpenLink(String),
    GenerateDigest,
    DeliverDigest(String),
    SignIn,
    SignUp,
    OAuth(OAuthProvider),
    CompleteOAuth,
    SignOut,
    SaveSettings,
}

/// A paged, filterable collection view.
pub struct Listing<T, F> {
    pub state: ViewState<T>,
    pub filter: F,
    pub page: Pagination,
}

impl<T, F: Default> Listing<T, F> {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: ViewState::Loading,
            filter: F::default(),
            page: Pagination::new(1, page_size),
        }
    }
}

/// Two-step delete: the first click arms a row, the second sends the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteConfirm {
    pending: Option<String>,
}

impl DeleteConfirm {
    pub fn request(&mut self, id: &str) {
        self.pending = Some(id.to_owned());
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.as_deref() == Some(id)
    }

    /// The delete action, only when `id` is the row waiting for confirmation.
    pub fn confirm(&mut self, id: &str) -> Option<Action> {
        if !self.is_pending(id) {
            return None;
        }
        self.pending = None;
        Some(Action::DeleteSource(id.to_owned()))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone)]
pub struct SourceForm {
    pub name: String,
    pub url: String,
    pub source_type: SourceType,
    pub error: Option<String>,
    pub busy: bool,
}

impl Default for SourceForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            source_type: SourceType::Website,
            error: None,
            busy: false,
        }
    }
}

impl SourceForm {
    pub fn validate(&self) -> Result<SourceCreate, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_owned());
        }
        let url = self.url.trim();
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(SourceCreate {
                name: name.to_owned(),
                url: url.to_owned(),
                source_type: self.source_type,
                status: SourceStatus::Active,
                scrape_frequency: None,
            }),
            _ => Err("Please enter a valid URL".to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub callback_url: String,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub busy: bool,
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl LoginForm {
    pub fn credentials(&self, signing_up: bool) -> Result<(String, String), String> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("Please enter a valid email address".to_owned());
        }
        if self.password.is_empty() {
            return Err("Password is required".to_owned());
        }
        if signing_up && self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
        Ok((email.to_owned(), self.password.clone()))
    }
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Draws the loading, empty and error states; `body` only runs for `Ready`.
pub fn state_view<T>(
    ui: &mut egui::Ui,
    page: Page,
    state: &ViewState<T>,
    theme: &ThemeConfig,
    out: &mut Vec<Action>,
    body: impl FnOnce(&mut egui::Ui, &T, &mut Vec<Action>),
) {
    match state {
        ViewState::Loading => {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.add(egui::Spinner::new().size(28.0));
                ui.label(RichText::new(page.loading_text()).color(theme.secondary_text_color32()));
            });
        }
        ViewState::Empty(empty) => {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(empty.title).strong().size(18.0));
                ui.label(RichText::new(empty.description).color(theme.secondary_text_color32()));
                if let Some(action) = &empty.action {
                    ui.add_space(8.0);
                    if ui.button(action.label).clicked() {
                        out.push(Action::Go(action.route.clone()));
                    }
                }
            });
        }
        ViewState::Failed(panel) => {
            egui::Frame::group(ui.style())
                .stroke(egui::Stroke::new(1.0, theme.error_color32()))
                .inner_margin(egui::Margin::same(12.0))
                .show(ui, |ui| {
                    ui.label(RichText::new(&panel.title).strong().color(theme.error_color32()));
                    ui.label(panel.message.as_str());
                    ui.label(RichText::new(&panel.hint).small().color(theme.secondary_text_color32()));
                    if panel.retry && ui.button("Retry").clicked() {
                        out.push(Action::Reload);
                    }
                });
        }
        ViewState::Ready(value) => body(ui, value, out),
    }
}

fn pager(ui: &mut egui::Ui, info: &PageInfo, noun: &str, out: &mut Vec<Action>) {
    ui.separator();
    ui.horizontal(|ui| {
        ui.label(info.summary(noun));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.add_enabled(info.has_next(), egui::Button::new("Next")).clicked() {
                out.push(Action::NextPage);
            }
            ui.label(format!("Page {}", info.page));
            if ui
                .add_enabled(info.has_previous(), egui::Button::new("Previous"))
                .clicked()
            {
                out.push(Action::PreviousPage);
            }
        });
    });
}

fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::group(ui.style())
        .rounding(8.0)
        .inner_margin(egui::Margin::same(12.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui);
        });
    ui.add_space(6.0);
}

fn page_header(ui: &mut egui::Ui, title: &str, subtitle: &str, theme: &ThemeConfig) {
    ui.heading(title);
    ui.label(RichText::new(subtitle).color(theme.secondary_text_color32()));
    ui.add_space(8.0);
}

fn filter_combo<V: Copy + PartialEq>(
    ui: &mut egui::Ui,
    id: &str,
    value: &mut Option<V>,
    options: &[(V, &str)],
) -> bool {
    let before = *value;
    let selected = options
        .iter()
        .find(|(v, _)| Some(*v) == *value)
        .map(|(_, label)| *label)
        .unwrap_or("All");
    egui::ComboBox::from_id_source(id)
        .selected_text(selected)
        .show_ui(ui, |ui| {
            ui.selectable_value(value, None, "All");
            for (v, label) in options {
                ui.selectable_value(value, Some(*v), *label);
            }
        });
    before != *value
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

pub fn dashboard(
    ui: &mut egui::Ui,
    state: &ViewState<DashboardStats>,
    user: Option<&AuthUser>,
    theme: &ThemeConfig,
    out: &mut Vec<Action>,
) {
    let greeting = user
        .and_then(|u| u.email.as_deref())
        .map(|email| format!("Welcome back, {email}"))
        .unwrap_or_else(|| "Welcome back".to_owned());
    page_header(ui, "Dashboard", &greeting, theme);

    state_view(ui, Page::Dashboard, state, theme, out, |ui, stats, out| {
        ui.columns(3, |cols| {
            for (col, (label, value)) in cols.iter_mut().zip([
                ("Active Sources", stats.active_sources),
                ("Digests", stats.digests),
                ("Articles", stats.articles),
            ]) {
                card(col, |ui| {
                    ui.label(RichText::new(label).color(theme.secondary_text_color32()));
                    ui.label(RichText::new(value.to_string()).strong().size(24.0));
                });
            }
        });

        if stats.show_getting_started() {
            card(ui, |ui| {
                ui.label(RichText::new("Get started").strong());
                ui.label("Add a website or RSS feed and DataScrap will collect its articles for your digests.");
                if ui.button("Add your first source").clicked() {
                    out.push(Action::Go(Route::NewSource));
                }
            });
        }
    });

    ui.add_space(12.0);
    ui.label(RichText::new("Recent Activity").strong());
    let empty: ViewState<()> = ViewState::Empty(Page::Activity.empty_state());
    state_view(ui, Page::Activity, &empty, theme, out, |_, _, _| {});
}

pub fn sources(
    ui: &mut egui::Ui,
    listing: &mut Listing<SourcesPage, SourceFilter>,
    deleting: &mut DeleteConfirm,
    theme: &ThemeConfig,
    out: &mut Vec<Action>,
) {
    ui.horizontal(|ui| {
        ui.heading("Sources");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Add Source").clicked() {
                out.push(Action::Go(Route::NewSource));
            }
        });
    });
    ui.label(RichText::new("Manage the websites and feeds you follow").color(theme.secondary_text_color32()));

    ui.horizontal(|ui| {
        ui.label("Status");
        let status_changed = filter_combo(
            ui,
            "source_status",
            &mut listing.filter.status,
            &[
                (SourceStatus::Active, "Active"),
                (SourceStatus::Inactive, "Inactive"),
                (SourceStatus::Error, "Error"),
            ],
        );
        ui.label("Type");
        let type_changed = filter_combo(
            ui,
            "source_type",
            &mut listing.filter.source_type,
            &[(SourceType::Website, "Website"), (SourceType::Rss, "RSS")],
        );
        if status_changed || type_changed {
            out.push(Action::FilterChanged);
        }
    });
    ui.add_space(6.0);

    state_view(ui, Page::Sources, &listing.state, theme, out, |ui, page, out| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            for source in &page.cards {
                card(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&source.name).strong());
                        ui.label(
                            RichText::new(&source.status_label)
                                .color(theme::source_status_color(theme, source.status)),
                        );
                        ui.label(RichText::new(source.source_type.as_str()).small());
                    });
                    ui.hyperlink_to(source.url.as_str(), &source.url);
                    ui.horizontal(|ui| {
                        ui.label(format!("{} articles", source.articles_count));
                        ui.label(format!("Last scraped: {}", source.last_scraped));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if deleting.is_pending(&source.id) {
                                if ui.button("Cancel").clicked() {
                                    deleting.cancel();
                                }
                                let confirm = egui::Button::new(
                                    RichText::new("Confirm delete").color(theme.error_color32()),
                                );
                                if ui.add(confirm).clicked() {
                                    out.extend(deleting.confirm(&source.id));
                                }
                                ui.label(RichText::new("Delete this source and its articles?").small());
                                return;
                            }
                            if ui.button("Delete").clicked() {
                                deleting.request(&source.id);
                            }
                            if ui.button("Scrape now").clicked() {
                                out.push(Action::ScrapeSource(source.id.clone()));
                            }
                        });
                    });
                });
            }
        });
        pager(ui, &page.info, "sources", out);
    });
}

pub fn new_source(ui: &mut egui::Ui, form: &mut SourceForm, theme: &ThemeConfig, out: &mut Vec<Action>) {
    page_header(
        ui,
        "Add New Source",
        "Add a website or RSS feed to scrape for content",
        theme,
    );

    card(ui, |ui| {
        egui::Grid::new("new_source_form")
            .num_columns(2)
            .spacing([12.0, 10.0])
            .show(ui, |ui| {
                ui.label("Name");
                ui.add(
                    egui::TextEdit::singleline(&mut form.name)
                        .hint_text("Tech Blog")
                        .desired_width(360.0),
                );
                ui.end_row();

                ui.label("URL");
                ui.add(
                    egui::TextEdit::singleline(&mut form.url)
                        .hint_text("https://example.com/blog")
                        .desired_width(360.0),
                );
                ui.end_row();

                ui.label("Type");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut form.source_type, SourceType::Website, "Website");
                    ui.radio_value(&mut form.source_type, SourceType::Rss, "RSS Feed");
                });
                ui.end_row();
            });

        if let Some(err) = &form.error {
            ui.label(RichText::new(err).color(theme.error_color32()));
        }

        ui.horizontal(|ui| {
            if ui.button("Cancel").clicked() {
                out.push(Action::Go(Route::Sources));
            }
            let label = if form.busy { "Adding..." } else { "Add Source" };
            if ui.add_enabled(!form.busy, egui::Button::new(label)).clicked() {
                out.push(Action::CreateSource);
            }
        });
    });
}

#[allow(clippy::too_many_arguments)]
pub fn articles(
    ui: &mut egui::Ui,
    listing: &mut Listing<ArticlesPage, ArticleFilter>,
    search: &mut String,
    source_names: &HashMap<String, String>,
    expanded: &mut Option<String>,
    show_summaries: bool,
    theme: &ThemeConfig,
    out: &mut Vec<Action>,
) {
    page_header(ui, "Articles", "Browse content scraped from your sources", theme);

    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(search)
                .hint_text("Search articles...")
                .desired_width(260.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if submitted || ui.button("Search").clicked() {
            listing.filter.search = Some(search.clone());
            out.push(Action::FilterChanged);
        }

        let before = listing.filter.source_id.clone();
        let selected = before
            .as_ref()
            .and_then(|id| source_names.get(id))
            .map(String::as_str)
            .unwrap_or("All sources");
        egui::ComboBox::from_id_source("article_source")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut listing.filter.source_id, None, "All sources");
                let mut names: Vec<_> = source_names.iter().collect();
                names.sort_by(|a, b| a.1.cmp(b.1));
                for (id, name) in names {
                    ui.selectable_value(&mut listing.filter.source_id, Some(id.clone()), name.as_str());
                }
            });
        if before != listing.filter.source_id {
            out.push(Action::FilterChanged);
        }
    });
    ui.add_space(6.0);

    state_view(ui, Page::Articles, &listing.state, theme, out, |ui, page, out| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            for item in &page.items {
                card(ui, |ui| {
                    ui.label(RichText::new(&item.title).strong());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&item.source).color(theme.accent_color32()));
                        ui.label(RichText::new(&item.scraped_at).small());
                        ui.label(RichText::new(format!("{} min read", item.read_time)).small());
                    });

                    let blurb = if show_summaries {
                        item.summary.as_ref().or(item.excerpt.as_ref())
                    } else {
                        item.excerpt.as_ref()
                    };
                    if let Some(text) = blurb {
                        ui.label(RichText::new(text).color(theme.secondary_text_color32()));
                    }

                    let is_open = expanded.as_deref() == Some(item.id.as_str());
                    if is_open {
                        if let Some(html) = &item.content {
                            egui::ScrollArea::vertical()
                                .id_source(&item.id)
                                .max_height(360.0)
                                .show(ui, |ui| {
                                    ui.label(html2text::from_read(html.as_bytes(), 100));
                                });
                        }
                    }

                    ui.horizontal(|ui| {
                        if item.content.is_some() {
                            let label = if is_open { "Hide" } else { "Read" };
                            if ui.button(label).clicked() {
                                *expanded = if is_open { None } else { Some(item.id.clone()) };
                            }
                        }
                        if ui.button("Summarize").clicked() {
                            out.push(Action::Summarize(item.id.clone()));
                        }
                        if ui.button("Open original").clicked() {
                            out.push(Action::OpenLink(item.url.clone()));
                        }
                    });
                });
            }
        });
        pager(ui, &page.info, "articles", out);
    });
}

pub fn digests(
    ui: &mut egui::Ui,
    listing: &mut Listing<DigestsPage, DigestFilter>,
    theme: &ThemeConfig,
    out: &mut Vec<Action>,
) {
    ui.horizontal(|ui| {
        ui.heading("Digests");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Generate Digest").clicked() {
                out.push(Action::GenerateDigest);
            }
        });
    });
    ui.label(RichText::new("View your AI-generated content digests").color(theme.secondary_text_color32()));

    ui.horizontal(|ui| {
        ui.label("Status");
        if filter_combo(
            ui,
            "digest_status",
            &mut listing.filter.status,
            &[
                (DigestStatus::Draft, "Draft"),
                (DigestStatus::Pending, "Pending"),
                (DigestStatus::Sent, "Sent"),
                (DigestStatus::Failed, "Failed"),
            ],
        ) {
            out.push(Action::FilterChanged);
        }
    });
    ui.add_space(6.0);

    state_view(ui, Page::Digests, &listing.state, theme, out, |ui, page, out| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            for digest in &page.cards {
                card(ui, |ui| {
                    ui.horizontal(|ui| {
                        if ui.link(RichText::new(&digest.title).strong()).clicked() {
                            out.push(Action::Go(Route::Digest(digest.id.clone())));
                        }
                        ui.label(
                            RichText::new(&digest.status_label)
                                .color(theme::digest_status_color(theme, digest.status)),
                        );
                    });
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&digest.created_at).small());
                        ui.label(format!("{} articles", digest.article_count));
                        ui.label(format!("via {}", capitalize(digest.delivery_method.as_str())));
                        if let Some(sent) = &digest.sent_at {
                            ui.label(RichText::new(format!("Sent {sent}")).small());
                        }
                    });
                });
            }
        });
        pager(ui, &page.info, "digests", out);
    });
}

pub fn digest_detail(
    ui: &mut egui::Ui,
    state: &ViewState<DigestDetail>,
    theme: &ThemeConfig,
    out: &mut Vec<Action>,
) {
    if ui.link("< Back to digests").clicked() {
        out.push(Action::Go(Route::Digests));
    }

    state_view(ui, Page::Digest, state, theme, out, |ui, detail, out| {
        ui.horizontal(|ui| {
            ui.heading(detail.card.title.as_str());
            ui.label(
                RichText::new(&detail.card.status_label)
                    .color(theme::digest_status_color(theme, detail.card.status)),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Deliver").clicked() {
                    out.push(Action::DeliverDigest(detail.card.id.clone()));
                }
            });
        });
        ui.label(
            RichText::new(format!(
                "{} · {} articles",
                detail.card.created_at, detail.card.article_count
            ))
            .color(theme.secondary_text_color32()),
        );

        egui::ScrollArea::vertical().show(ui, |ui| {
            if let Some(content) = &detail.content {
                card(ui, |ui| {
                    ui.label(digest_text(content));
                });
            }

            ui.label(RichText::new("Articles").strong());
            if detail.articles.is_empty() {
                let empty = Page::Digest.empty_state();
                ui.label(RichText::new(empty.description).color(theme.secondary_text_color32()));
            }
            for item in &detail.articles {
                card(ui, |ui| {
                    if ui.link(RichText::new(&item.title).strong()).clicked() {
                        out.push(Action::OpenLink(item.url.clone()));
                    }
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&item.source).color(theme.accent_color32()));
                        ui.label(RichText::new(format!("{} min read", item.read_time)).small());
                    });
                    if let Some(summary) = &item.summary {
                        ui.label(summary.as_str());
                    }
                });
            }
        });
    });
}

/// Digest bodies are opaque: HTML strings are flattened to text, anything else is pretty-printed.
pub fn digest_text(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(html) => html2text::from_read(html.as_bytes(), 100),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

pub fn settings(ui: &mut egui::Ui, config: &mut AppConfig, out: &mut Vec<Action>) {
    let theme = config.theme.clone();
    page_header(ui, "Settings", "Dashboard preferences stored on this machine", &theme);

    card(ui, |ui| {
        ui.label(RichText::new("Display").strong());
        ui.add(egui::Slider::new(&mut config.ui.page_size, 1..=100).text("Items per page"));
        ui.add(egui::Slider::new(&mut config.ui.font_size, 10.0..=22.0).text("Font size"));
        ui.add(egui::Slider::new(&mut config.ui.sidebar_width, 160.0..=320.0).text("Sidebar width"));
        ui.checkbox(&mut config.ui.show_summaries, "Show AI summaries in article lists");
        if ui.button("Save").clicked() {
            out.push(Action::SaveSettings);
        }
    });

    ui.label(RichText::new("API Keys").strong());
    let empty: ViewState<()> = ViewState::Empty(Page::ApiKeys.empty_state());
    state_view(ui, Page::ApiKeys, &empty, &theme, out, |_, _, _| {});
}

pub fn account(
    ui: &mut egui::Ui,
    user: Option<&AuthUser>,
    profile: &ViewState<Option<Profile>>,
    theme: &ThemeConfig,
    out: &mut Vec<Action>,
) {
    page_header(ui, "Account", "Your DataScrap identity", theme);
    card(ui, |ui| {
        egui::Grid::new("account_grid").num_columns(2).show(ui, |ui| {
            ui.label("Email");
            ui.label(user.and_then(|u| u.email.as_deref()).unwrap_or("-"));
            ui.end_row();
            ui.label("User ID");
            ui.label(user.map(|u| u.id.as_str()).unwrap_or("-"));
            ui.end_row();
            ui.label("Plan");
            match profile {
                ViewState::Loading => {
                    ui.spinner();
                }
                ViewState::Ready(profile) => {
                    let (tier, active) = plan_label(profile.as_ref());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(capitalize(tier)).strong());
                        if active {
                            ui.label(RichText::new("Active").color(theme.success_color32()));
                        }
                    });
                }
                _ => {
                    ui.label(RichText::new("Unavailable").color(theme.secondary_text_color32()));
                }
            }
            ui.end_row();
            if let Some(created) = user.and_then(|u| u.created_at) {
                ui.label("Member since");
                ui.label(datascrap_core::view::format_date(created));
                ui.end_row();
            }
        });
    });
    if ui.button("Sign out").clicked() {
        out.push(Action::SignOut);
    }
}

/// Tier name and whether a paid subscription is active. No profile means the free tier.
pub fn plan_label(profile: Option<&Profile>) -> (&str, bool) {
    match profile {
        Some(profile) => (profile.tier(), profile.has_active_subscription()),
        None => (FREE_TIER, false),
    }
}

pub fn login(ui: &mut egui::Ui, form: &mut LoginForm, signing_up: bool, theme: &ThemeConfig, out: &mut Vec<Action>) {
    ui.vertical_centered(|ui| {
        ui.add_space(48.0);
        ui.heading(if signing_up { "Create your account" } else { "Sign in to DataScrap" });
        ui.add_space(12.0);

        ui.add(
            egui::TextEdit::singleline(&mut form.email)
                .hint_text("you@example.com")
                .desired_width(300.0),
        );
        let password = ui.add(
            egui::TextEdit::singleline(&mut form.password)
                .password(true)
                .hint_text("Password")
                .desired_width(300.0),
        );
        let submitted = password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        if let Some(err) = &form.error {
            ui.label(RichText::new(err).color(theme.error_color32()));
        }
        if let Some(notice) = &form.notice {
            ui.label(RichText::new(notice).color(theme.success_color32()));
        }

        let label = match (signing_up, form.busy) {
            (_, true) => "Please wait...",
            (true, false) => "Sign up",
            (false, false) => "Sign in",
        };
        if ui.add_enabled(!form.busy, egui::Button::new(label)).clicked() || (submitted && !form.busy) {
            out.push(if signing_up { Action::SignUp } else { Action::SignIn });
        }

        ui.add_space(8.0);
        ui.label(RichText::new("or continue with").small());
        ui.horizontal(|ui| {
            ui.add_space((ui.available_width() - 200.0).max(0.0) / 2.0);
            if ui.button("Google").clicked() {
                out.push(Action::OAuth(OAuthProvider::Google));
            }
            if ui.button("GitHub").clicked() {
                out.push(Action::OAuth(OAuthProvider::Github));
            }
        });

        ui.add_space(8.0);
        ui.label(RichText::new("After signing in with a provider, paste the address your browser landed on:").small());
        ui.add(
            egui::TextEdit::singleline(&mut form.callback_url)
                .hint_text("http://localhost:3000/auth/callback#access_token=...")
                .desired_width(300.0),
        );
        if ui
            .add_enabled(!form.busy && !form.callback_url.trim().is_empty(), egui::Button::new("Complete sign-in"))
            .clicked()
        {
            out.push(Action::CompleteOAuth);
        }

        ui.add_space(12.0);
        let (prompt, link, route) = if signing_up {
            ("Already have an account?", "Sign in", Route::Login)
        } else {
            ("Don't have an account?", "Sign up", Route::Signup)
        };
        ui.horizontal(|ui| {
            ui.add_space((ui.available_width() - 220.0).max(0.0) / 2.0);
            ui.label(prompt);
            if ui.link(link).clicked() {
                out.push(Action::Go(route));
            }
        });
    });
}
