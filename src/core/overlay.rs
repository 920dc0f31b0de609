use crate::models::{Category, ClothingMatchResponse, MatchResponse, RecordSavingsMessage};

pub const OVERLAY_ID: &str = "pinkvanity-overlay";

/// Savings at or above this percentage get the highlighted badge
const BIG_SAVINGS_PERCENT: f64 = 30.0;

/// What the overlay card currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    Loading,
    ProductMatch(MatchResponse),
    ClothingMatch(ClothingMatchResponse),
    Error(String),
}

/// The floating result card injected into the page
///
/// Behaves like a singleton DOM node: `show_loading` recreates it, the other
/// states reuse it (creating it when absent) and replace its content
/// wholesale. Hiding keeps the node around.
#[derive(Debug, Default)]
pub struct Overlay {
    content: Option<OverlayContent>,
    hidden: bool,
    /// Number of times the node has been (re)created
    mounts: u64,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&mut self) {
        self.mounts += 1;
        self.content = Some(OverlayContent::Loading);
        self.hidden = false;
    }

    fn show(&mut self, content: OverlayContent) {
        if self.content.is_none() {
            self.create();
        }
        self.hidden = false;
        self.content = Some(content);
    }

    pub fn show_loading(&mut self) {
        self.create();
    }

    pub fn show_product_match(&mut self, result: MatchResponse) {
        self.show(OverlayContent::ProductMatch(result));
    }

    pub fn show_clothing_match(&mut self, result: ClothingMatchResponse) {
        self.show(OverlayContent::ClothingMatch(result));
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.show(OverlayContent::Error(message.into()));
    }

    /// Hide without removing; also what the close button does
    pub fn hide(&mut self) {
        if self.content.is_some() {
            self.hidden = true;
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.content.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.content.is_some() && !self.hidden
    }

    pub fn content(&self) -> Option<&OverlayContent> {
        self.content.as_ref()
    }

    pub fn mounts(&self) -> u64 {
        self.mounts
    }

    /// Message sent when the user clicks "Swap & Save!" on a product match
    pub fn swap_message(&self) -> Option<RecordSavingsMessage> {
        match &self.content {
            Some(OverlayContent::ProductMatch(result)) if result.found_match => {
                result.product_match.as_ref().map(|m| RecordSavingsMessage {
                    amount: m.savings_amount,
                    category: Category::PersonalCare.as_str().to_string(),
                    product: m.title.clone(),
                })
            }
            _ => None,
        }
    }

    /// Full markup of the overlay node, `None` when not mounted
    pub fn render(&self) -> Option<String> {
        let content = self.content.as_ref()?;
        let class = if self.hidden { " class=\"pv-hidden\"" } else { "" };

        Some(format!(
            concat!(
                "<div id=\"{id}\"{class}>",
                "<div class=\"pv-card\">",
                "<div class=\"pv-header\">",
                "<span class=\"pv-logo\">PinkVanity</span>",
                "<button class=\"pv-close\" aria-label=\"Close\">&times;</button>",
                "</div>",
                "<div class=\"pv-content\">{body}</div>",
                "</div></div>"
            ),
            id = OVERLAY_ID,
            class = class,
            body = render_content(content),
        ))
    }
}

fn render_content(content: &OverlayContent) -> String {
    match content {
        OverlayContent::Loading => concat!(
            "<div class=\"pv-loading\">",
            "<div class=\"pv-spinner\"></div>",
            "<p>Searching for savings...</p>",
            "</div>"
        )
        .to_string(),
        OverlayContent::ProductMatch(result) => render_product_match(result),
        OverlayContent::ClothingMatch(result) => render_clothing_match(result),
        OverlayContent::Error(message) => format!(
            concat!(
                "<div class=\"pv-error\">",
                "<p class=\"pv-icon\">&#9888;</p>",
                "<p>{}</p>",
                "<button class=\"pv-retry-btn\">Retry</button>",
                "</div>"
            ),
            escape_html(message)
        ),
    }
}

fn render_product_match(result: &MatchResponse) -> String {
    let Some(m) = result.product_match.as_ref().filter(|_| result.found_match) else {
        return concat!(
            "<div class=\"pv-no-match\">",
            "<p class=\"pv-icon\">&#128269;</p>",
            "<p>No cheaper men's equivalent found.</p>",
            "<p class=\"pv-subtext\">This product appears to be fairly priced!</p>",
            "</div>"
        )
        .to_string();
    };

    let savings_class = if m.savings_percent >= BIG_SAVINGS_PERCENT { " pv-big-savings" } else { "" };
    let reasons: String = m
        .match_reasons
        .iter()
        .map(|r| format!("<li>{}</li>", escape_html(r)))
        .collect();

    format!(
        concat!(
            "<div class=\"pv-match{savings_class}\">",
            "<div class=\"pv-savings-badge\">Save {percent:.0}%</div>",
            "{comparison}",
            "<div class=\"pv-savings-amount\">You save: <strong>${amount:.2}</strong></div>",
            "<div class=\"pv-match-reasons\">",
            "<p class=\"pv-reasons-title\">Why it's equivalent:</p>",
            "<ul>{reasons}</ul>",
            "</div>",
            "<div class=\"pv-similarity\">Similarity Score: {similarity:.0}%</div>",
            "<button class=\"pv-swap-btn\">Swap &amp; Save!</button>",
            "</div>"
        ),
        savings_class = savings_class,
        percent = m.savings_percent,
        comparison = render_comparison(&result.original_product, result.original_price, &m.title, m.price),
        amount = m.savings_amount,
        reasons = reasons,
        similarity = m.similarity_score * 100.0,
    )
}

fn render_clothing_match(result: &ClothingMatchResponse) -> String {
    let Some(equiv) = result.mens_equivalent.as_ref().filter(|_| result.found_match) else {
        return concat!(
            "<div class=\"pv-no-match\">",
            "<p class=\"pv-icon\">&#128085;</p>",
            "<p>No men's equivalent found for this item.</p>",
            "</div>"
        )
        .to_string();
    };

    let (size, notes) = match &result.size_recommendation {
        Some(rec) => (rec.size.as_str(), rec.fit_notes.as_slice()),
        None => ("Unknown", &[][..]),
    };
    let notes: String = notes
        .iter()
        .map(|n| format!("<li>{}</li>", escape_html(n)))
        .collect();

    format!(
        concat!(
            "<div class=\"pv-match pv-clothing-match\">",
            "<div class=\"pv-savings-badge\">Save {percent:.0}%</div>",
            "{comparison}",
            "<div class=\"pv-size-recommendation\">",
            "<div class=\"pv-size-badge\">Buy Size: <strong>{size}</strong></div>",
            "<div class=\"pv-fit-notes\">",
            "<p class=\"pv-fit-title\">Fit Notes:</p>",
            "<ul>{notes}</ul>",
            "</div></div>",
            "<div class=\"pv-savings-amount\">You save: <strong>${amount:.2}</strong></div>",
            "<button class=\"pv-swap-btn\">Swap &amp; Save!</button>",
            "</div>"
        ),
        percent = equiv.savings_percent,
        comparison = render_comparison(&result.original_product, result.original_price, &equiv.title, equiv.price),
        size = escape_html(size),
        notes = notes,
        amount = equiv.savings_amount,
    )
}

fn render_comparison(original: &str, original_price: f64, alternative: &str, alternative_price: f64) -> String {
    format!(
        concat!(
            "<div class=\"pv-comparison\">",
            "<div class=\"pv-original\">",
            "<span class=\"pv-label\">You're viewing:</span>",
            "<span class=\"pv-product-name\">{}</span>",
            "<span class=\"pv-price\">${:.2}</span>",
            "</div>",
            "<div class=\"pv-arrow\">&#8594;</div>",
            "<div class=\"pv-alternative\">",
            "<span class=\"pv-label\">Swap to:</span>",
            "<span class=\"pv-product-name\">{}</span>",
            "<span class=\"pv-price pv-price-better\">${:.2}</span>",
            "</div></div>"
        ),
        escape_html(original),
        original_price,
        escape_html(alternative),
        alternative_price,
    )
}

/// Escape text for interpolation into HTML element content or attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
