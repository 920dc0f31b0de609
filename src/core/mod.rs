// Core exports: pure page logic with no I/O
pub mod classify;
pub mod detect;
pub mod overlay;
pub mod scrape;
pub mod widget;

pub use classify::{Classification, detect_category, is_womens_product};
pub use detect::{detect_site, widget_site};
pub use overlay::{Overlay, OverlayContent, OVERLAY_ID};
pub use scrape::{PageSnapshot, parse_price, scrape_product};
pub use widget::{PointerEvent, SettingsForm, Size, Widget};
