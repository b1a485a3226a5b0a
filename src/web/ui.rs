//! UI rendering.
//!
//! Loads HTML templates from the `templates/` directory and injects session fields.

mod pages;
mod renderer;

pub use pages::{escape_html, preload_templates};
pub use renderer::{HtmlRenderer, Renderer};
