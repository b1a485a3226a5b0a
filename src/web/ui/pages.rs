//! HTML page rendering.
//!
//! Provides functions to render the session and landing pages using loaded templates.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::error;

use crate::store::SessionRecord;

const TEMPLATE_DIR: &str = "templates";
const SESSION_TEMPLATE: &str = "session.html";
const LANDING_TEMPLATE: &str = "landing.html";
static TEMPLATES: OnceLock<HashMap<String, Arc<str>>> = OnceLock::new();

const FALLBACK_SESSION: &str = "<!DOCTYPE html><html><head><title>{{APP_NAME}}</title>{{ANALYTICS_HEAD}}</head><body>{{ANALYTICS_BODY}}<h1>{{APP_NAME}}</h1><h2>Topic: {{TOPIC}}</h2><p>Start Time: {{START_TIME}}</p><p>Duration: {{DURATION}} minutes</p><p>Join URL: <a href=\"{{JOIN_HREF}}\">{{JOIN_URL}}</a></p><p>Powered by {{APP_NAME}}</p></body></html>";
const FALLBACK_LANDING: &str = "<!DOCTYPE html><html><head><title>{{APP_NAME}}</title>{{ANALYTICS_HEAD}}</head><body>{{ANALYTICS_BODY}}<h1>Welcome to {{APP_NAME}}</h1><p>Please provide a valid group ID and token to see specific session details.</p><p>Powered by {{APP_NAME}}</p></body></html>";

/// Pre-loads all templates into memory.
pub fn preload_templates() {
    let _ = get_template_map();
}

fn get_template_map() -> &'static HashMap<String, Arc<str>> {
    TEMPLATES.get_or_init(|| {
        let mut m = HashMap::new();
        for name in &[SESSION_TEMPLATE, LANDING_TEMPLATE] {
            let path = Path::new(TEMPLATE_DIR).join(name);
            match fs::read_to_string(&path) {
                Ok(content) => {
                    m.insert((*name).to_string(), Arc::from(content));
                }
                Err(e) => {
                    error!(file = name, error = %e, "Failed to load UI template, using built-in markup");
                }
            }
        }
        m
    })
}

fn load_template(filename: &str, fallback: &'static str) -> Arc<str> {
    get_template_map()
        .get(filename)
        .cloned()
        .unwrap_or_else(|| Arc::from(fallback))
}

/// Page chrome shared by every page.
pub struct Branding<'a> {
    pub app_name: &'a str,
    pub analytics_id: Option<&'a str>,
}

/// Renders the detail page for a published session.
#[must_use]
pub fn get_session_page(record: &SessionRecord, branding: &Branding<'_>) -> String {
    let template = load_template(SESSION_TEMPLATE, FALLBACK_SESSION);

    let field = |name: &str| escape_html(&record.field(name).unwrap_or_default());
    let join_url = record.field("join_url").unwrap_or_default();
    let join_href = if is_web_link(&join_url) {
        escape_html(&join_url)
    } else {
        "#".to_string()
    };

    let topic = field("topic");
    let start_time = field("start_time");
    let duration = field("duration");
    let join_text = escape_html(&join_url);
    let (head, body) = analytics_snippets(branding.analytics_id);
    let app_name = escape_html(branding.app_name);

    fill(
        &template,
        &[
            ("APP_NAME", app_name.as_str()),
            ("ANALYTICS_HEAD", head.as_str()),
            ("ANALYTICS_BODY", body.as_str()),
            ("TOPIC", topic.as_str()),
            ("START_TIME", start_time.as_str()),
            ("DURATION", duration.as_str()),
            ("JOIN_URL", join_text.as_str()),
            ("JOIN_HREF", join_href.as_str()),
        ],
    )
}

/// Renders the generic landing page, also used when no session matches.
#[must_use]
pub fn get_landing_page(branding: &Branding<'_>) -> String {
    let template = load_template(LANDING_TEMPLATE, FALLBACK_LANDING);
    let (head, body) = analytics_snippets(branding.analytics_id);
    let app_name = escape_html(branding.app_name);

    fill(
        &template,
        &[
            ("APP_NAME", app_name.as_str()),
            ("ANALYTICS_HEAD", head.as_str()),
            ("ANALYTICS_BODY", body.as_str()),
        ],
    )
}

fn analytics_snippets(analytics_id: Option<&str>) -> (String, String) {
    let Some(id) = analytics_id else {
        return (String::new(), String::new());
    };
    let id = escape_html(id);
    let head = format!(
        "<script>(function(w,d,s,l,i){{w[l]=w[l]||[];w[l].push({{'gtm.start':new Date().getTime(),event:'gtm.js'}});\
         var f=d.getElementsByTagName(s)[0],j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;\
         j.src='https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);\
         }})(window,document,'script','dataLayer','{id}');</script>"
    );
    let body = format!(
        "<noscript><iframe src=\"https://www.googletagmanager.com/ns.html?id={id}\" \
         height=\"0\" width=\"0\" style=\"display:none;visibility:hidden\"></iframe></noscript>"
    );
    (head, body)
}

fn is_web_link(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Escapes text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Substitutes `{{NAME}}` placeholders in a single pass.
///
/// Substituted values are never rescanned; unknown placeholders are kept as is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match values.iter().find(|(k, _)| *k == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
