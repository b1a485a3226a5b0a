//! Renderer seam between request dispatch and page markup.

use crate::config::Config;
use crate::store::SessionRecord;
use crate::web::ui::pages::{Branding, get_landing_page, get_session_page};

/// Produces the HTML bodies served on the read and landing paths.
pub trait Renderer: Send + Sync {
    fn render_session(&self, record: &SessionRecord) -> String;

    /// Landing page, also served when a read finds no session.
    fn render_landing(&self) -> String;
}

/// Template-backed renderer.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    app_name: String,
    analytics_id: Option<String>,
}

impl HtmlRenderer {
    #[must_use]
    pub fn new(app_name: impl Into<String>, analytics_id: Option<String>) -> Self {
        Self {
            app_name: app_name.into(),
            analytics_id,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.app_name.clone(), config.analytics_id.clone())
    }

    fn branding(&self) -> Branding<'_> {
        Branding {
            app_name: &self.app_name,
            analytics_id: self.analytics_id.as_deref(),
        }
    }
}

impl Renderer for HtmlRenderer {
    fn render_session(&self, record: &SessionRecord) -> String {
        get_session_page(record, &self.branding())
    }

    fn render_landing(&self) -> String {
        get_landing_page(&self.branding())
    }
}
