use datascrap_core::config::ThemeConfig;
use datascrap_core::models::{DigestStatus, SourceStatus};
use eframe::egui::{self, Color32, Rounding, Stroke};

pub fn apply(ctx: &egui::Context, theme: &ThemeConfig, font_size: f32) {
    let mut style = (*ctx.style()).clone();

    let bg_color = theme.background_color32();
    let panel_color = theme.panel_color32();
    let text_color = theme.text_color32();
    let accent_color = theme.accent_color32();
    let border_color = blend(panel_color, text_color, 0.15);
    let hover_color = blend(panel_color, text_color, 0.08);

    style.visuals.dark_mode = true;
    style.visuals.panel_fill = panel_color;
    style.visuals.window_fill = bg_color;
    style.visuals.extreme_bg_color = blend(bg_color, Color32::BLACK, 0.2);
    style.visuals.faint_bg_color = hover_color;
    style.visuals.override_text_color = Some(text_color);

    style.visuals.widgets.noninteractive.bg_fill = panel_color;
    style.visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, border_color);
    style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, text_color);

    style.visuals.widgets.inactive.bg_fill = hover_color;
    style.visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, border_color);
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, text_color);

    style.visuals.widgets.hovered.bg_fill = border_color;
    style.visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, accent_color);
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, text_color);

    style.visuals.widgets.active.bg_fill = accent_color;
    style.visuals.widgets.active.bg_stroke = Stroke::new(1.0, accent_color);
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    let [r, g, b] = theme.accent_color;
    style.visuals.selection.bg_fill = Color32::from_rgba_unmultiplied(r, g, b, 60);
    style.visuals.selection.stroke = Stroke::new(1.0, accent_color);

    for widget in [
        &mut style.visuals.widgets.noninteractive,
        &mut style.visuals.widgets.inactive,
        &mut style.visuals.widgets.hovered,
        &mut style.visuals.widgets.active,
    ] {
        widget.rounding = Rounding::same(6.0);
    }

    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);
    style.spacing.interact_size = egui::vec2(36.0, 28.0);

    for (text_style, font) in style.text_styles.iter_mut() {
        font.size = match text_style {
            egui::TextStyle::Heading => font_size * 1.6,
            egui::TextStyle::Small => font_size * 0.8,
            _ => font_size,
        };
    }

    ctx.set_style(style);
}

pub fn source_status_color(theme: &ThemeConfig, status: SourceStatus) -> Color32 {
    match status {
        SourceStatus::Active => theme.success_color32(),
        SourceStatus::Inactive => theme.secondary_text_color32(),
        SourceStatus::Error => theme.error_color32(),
    }
}

pub fn digest_status_color(theme: &ThemeConfig, status: DigestStatus) -> Color32 {
    match status {
        DigestStatus::Sent => theme.success_color32(),
        DigestStatus::Pending => theme.warning_color32(),
        DigestStatus::Failed => theme.error_color32(),
        DigestStatus::Draft => theme.secondary_text_color32(),
    }
}

fn blend(from: Color32, to: Color32, t: f32) -> Color32 {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color32::from_rgb(mix(from.r(), to.r()), mix(from.g(), to.g()), mix(from.b(), to.b()))
}
