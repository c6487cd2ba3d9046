// CV rendering: font metrics → page layout → PDF bytes → transient file.
// Layout and PDF writing are CPU-bound; async callers run them inside
// tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod layout;
pub mod pdf;

pub use layout::{default_page_style, PageStyle};
pub use pdf::{write_cv_pdf, FontSource, RenderError};
