//! Security header injection.
//!
//! Strips fingerprinting headers and adds HSTS, CSP and related policies to
//! every response the edge writes.

use pingora::Result;
use pingora::http::ResponseHeader;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline' https://www.googletagmanager.com; \
     img-src 'self' data: https:; \
     style-src 'self' 'unsafe-inline'; \
     frame-src https://www.googletagmanager.com; \
     connect-src 'self' https:; \
     frame-ancestors 'none'";

/// Injects the standard security headers.
///
/// # Errors
///
/// Returns an error if header insertion fails.
pub fn inject_security_headers(response: &mut ResponseHeader) -> Result<()> {
    response.remove_header("Server");
    response.remove_header("X-Powered-By");
    response.remove_header("Via");

    response.insert_header(
        "Strict-Transport-Security",
        "max-age=63072000; includeSubDomains; preload",
    )?;
    response.insert_header("Content-Security-Policy", CONTENT_SECURITY_POLICY)?;
    response.insert_header("X-Content-Type-Options", "nosniff")?;
    response.insert_header("Referrer-Policy", "no-referrer")?;
    response.insert_header(
        "Permissions-Policy",
        "geolocation=(), microphone=(), camera=(), payment=(), usb=(), interest-cohort=()",
    )?;
    response.insert_header("Cross-Origin-Resource-Policy", "same-origin")?;

    Ok(())
}
