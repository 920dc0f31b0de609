use serde::{Deserialize, Serialize};
use crate::core::overlay::escape_html;
use crate::models::{FitPreference, Measurements, UserSettings, WidgetPosition, WidgetSite};

pub const WIDGET_ROOT_ID: &str = "pinkvanity-root";

/// Minimum gap kept between the card and the viewport edges while dragging
pub const DRAG_MARGIN: f64 = 8.0;

/// Default anchor: 16px from the top right corner
const DEFAULT_OFFSET: f64 = 16.0;

/// Card width in pixels
pub const WIDGET_WIDTH: f64 = 340.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Pointer event on the drag handle, in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// 0 is the primary button
    #[serde(default)]
    pub button: u16,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    TopRight,
    At(WidgetPosition),
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start_x: f64,
    start_y: f64,
    start_left: f64,
    start_top: f64,
}

/// Raw form input from the settings panel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub bust: String,
    #[serde(default)]
    pub waist: String,
    #[serde(default)]
    pub hips: String,
    #[serde(default, rename = "fitPreference")]
    pub fit_preference: String,
}

impl SettingsForm {
    /// Pre-fill the form from stored settings
    pub fn from_settings(settings: &UserSettings) -> Self {
        let show = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            bust: show(settings.measurements.bust_in),
            waist: show(settings.measurements.waist_in),
            hips: show(settings.measurements.hips_in),
            fit_preference: settings.fit_preference.to_string(),
        }
    }

    pub fn to_settings(&self) -> UserSettings {
        UserSettings {
            measurements: Measurements {
                bust_in: parse_optional_number(&self.bust),
                waist_in: parse_optional_number(&self.waist),
                hips_in: parse_optional_number(&self.hips),
            },
            fit_preference: normalize_fit_preference(&self.fit_preference),
        }
    }
}

/// Blank, non-numeric, non-finite and non-positive input all mean "unset"
pub fn parse_optional_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

pub fn normalize_fit_preference(value: &str) -> FitPreference {
    match value {
        "fitted" => FitPreference::Fitted,
        "relaxed" => FitPreference::Relaxed,
        _ => FitPreference::Regular,
    }
}

pub fn clamp(n: f64, min: f64, max: f64) -> f64 {
    n.max(min).min(max)
}

/// The draggable settings card
#[derive(Debug, Clone)]
pub struct Widget {
    site: WidgetSite,
    viewport: Size,
    card: Size,
    anchor: Anchor,
    expanded: bool,
    visible: bool,
    drag: Option<Drag>,
    settings: UserSettings,
    settings_saved_at: Option<i64>,
}

impl Widget {
    /// Mount collapsed; restores the saved position when there is one
    pub fn mount(
        site: WidgetSite,
        settings: UserSettings,
        saved_position: Option<WidgetPosition>,
        viewport: Size,
        card: Size,
    ) -> Self {
        Self {
            site,
            viewport,
            card,
            anchor: saved_position.map(Anchor::At).unwrap_or(Anchor::TopRight),
            expanded: false,
            visible: true,
            drag: None,
            settings,
            settings_saved_at: None,
        }
    }

    pub fn site(&self) -> WidgetSite {
        self.site
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn resize_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Top-left corner in viewport coordinates
    pub fn position(&self) -> WidgetPosition {
        match self.anchor {
            Anchor::At(pos) => pos,
            Anchor::TopRight => WidgetPosition {
                left: self.viewport.width - DEFAULT_OFFSET - self.card.width,
                top: DEFAULT_OFFSET,
            },
        }
    }

    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.expanded { "Collapse" } else { "Expand" }
    }

    /// "Hide" removes the widget for the rest of the page visit
    pub fn hide(&mut self) {
        self.visible = false;
        self.drag = None;
    }

    /// Start a drag on primary-button press; returns whether it started
    pub fn pointer_down(&mut self, ev: PointerEvent) -> bool {
        if ev.button != 0 || !self.visible {
            return false;
        }

        // Switch to left/top anchoring for the rest of the drag.
        let start = self.position();
        self.anchor = Anchor::At(start);
        self.drag = Some(Drag {
            start_x: ev.x,
            start_y: ev.y,
            start_left: start.left,
            start_top: start.top,
        });
        true
    }

    /// Move while dragging, clamped to the viewport on both axes
    pub fn pointer_move(&mut self, ev: PointerEvent) -> Option<WidgetPosition> {
        let drag = self.drag?;

        let max_left = self.viewport.width - self.card.width - DRAG_MARGIN;
        let max_top = self.viewport.height - self.card.height - DRAG_MARGIN;

        let next = WidgetPosition {
            left: clamp(drag.start_left + (ev.x - drag.start_x), DRAG_MARGIN, DRAG_MARGIN.max(max_left)),
            top: clamp(drag.start_top + (ev.y - drag.start_y), DRAG_MARGIN, DRAG_MARGIN.max(max_top)),
        };
        self.anchor = Anchor::At(next);
        Some(next)
    }

    /// End the drag (pointer up or cancel); yields the position to persist
    pub fn pointer_up(&mut self) -> Option<WidgetPosition> {
        self.drag.take()?;
        let pos = self.position();
        (pos.left.is_finite() && pos.top.is_finite()).then_some(pos)
    }

    /// Apply the settings form; the caller persists the returned settings
    pub fn save_settings(&mut self, form: &SettingsForm, now_ms: i64) -> UserSettings {
        self.settings = form.to_settings();
        self.settings_saved_at = Some(now_ms);
        self.settings
    }

    /// Settings changed outside the widget; no "Saved." feedback
    pub fn replace_settings(&mut self, settings: UserSettings) {
        self.settings = settings;
    }

    pub fn summary(&self) -> String {
        if self.settings.measurements.is_empty() {
            "Vanity sizing: add your measurements to get a size recommendation.".to_string()
        } else {
            format!(
                "Vanity sizing: ready (fit: {}). Pink tax: ready for side-by-side compare.",
                self.settings.fit_preference
            )
        }
    }

    pub fn saved_label(&self) -> &'static str {
        if self.settings_saved_at.is_some() { "Saved." } else { "" }
    }

    /// Markup of the widget root, `None` once hidden
    pub fn render(&self) -> Option<String> {
        if !self.visible {
            return None;
        }

        let anchor_style = match self.anchor {
            Anchor::TopRight => format!("right: {}px; top: {}px;", DEFAULT_OFFSET, DEFAULT_OFFSET),
            Anchor::At(pos) => format!("left: {}px; top: {}px;", pos.left, pos.top),
        };
        let form = SettingsForm::from_settings(&self.settings);
        let panel_style = if self.expanded { "opacity: 1;" } else { "max-height: 0px; opacity: 0;" };

        Some(format!(
            concat!(
                "<div id=\"{id}\" style=\"position: fixed; width: {width}px; {anchor}\">",
                "<div class=\"pv-drag-tab\" aria-label=\"Drag PinkVanity widget\">⋮⋮ Drag</div>",
                "<div class=\"pv-widget-card\">",
                "<div class=\"pv-widget-header\">",
                "<div class=\"pv-widget-title\">PinkVanity</div>",
                "<div class=\"pv-widget-subtitle\">AE / ZARA / H&amp;M • {site}</div>",
                "<button class=\"pv-toggle\">{toggle}</button>",
                "<button class=\"pv-hide\">Hide</button>",
                "</div>",
                "<div class=\"pv-summary\">{summary}</div>",
                "<div class=\"pv-saved\">{saved}</div>",
                "<div class=\"pv-panel\" style=\"{panel}\">",
                "<label>Bust (in)<input name=\"bust\" placeholder=\"e.g. 36\" value=\"{bust}\"></label>",
                "<label>Waist (in)<input name=\"waist\" placeholder=\"e.g. 29\" value=\"{waist}\"></label>",
                "<label>Hips (in)<input name=\"hips\" placeholder=\"e.g. 39\" value=\"{hips}\"></label>",
                "<label>Fit preference<select name=\"fitPreference\">{options}</select></label>",
                "<button class=\"pv-save\">Save</button>",
                "<div class=\"pv-note\">Saved locally (no accounts).</div>",
                "</div></div></div>"
            ),
            id = WIDGET_ROOT_ID,
            width = WIDGET_WIDTH,
            anchor = anchor_style,
            site = self.site,
            toggle = self.toggle_label(),
            summary = escape_html(&self.summary()),
            saved = self.saved_label(),
            panel = panel_style,
            bust = escape_html(&form.bust),
            waist = escape_html(&form.waist),
            hips = escape_html(&form.hips),
            options = fit_options(self.settings.fit_preference),
        ))
    }
}

fn fit_options(selected: FitPreference) -> String {
    [FitPreference::Regular, FitPreference::Fitted, FitPreference::Relaxed]
        .iter()
        .map(|p| {
            let sel = if *p == selected { " selected" } else { "" };
            format!("<option value=\"{0}\"{1}>{0}</option>", p, sel)
        })
        .collect()
}
