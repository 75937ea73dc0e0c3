//! Body-scraping patterns.
//!
//! The pod exposes no token endpoint; the CSRF token and the lookup lists are
//! embedded in server-rendered pages. Everything scraped goes through
//! [`extract_pattern`] against this fixed registry.

use lazy_static::lazy_static;
use regex::Regex;

/// Named entry of the pattern registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKey {
    /// `<meta>` tag carrying the CSRF token, attributes in either order.
    CsrfToken,
    /// Inline JSON array of the user's aspects.
    Aspects,
    /// Inline JSON array of configured service identifiers.
    Services,
}

lazy_static! {
    static ref CSRF_TOKEN: Regex =
        Regex::new(r#"content="([^"]*)" name="csrf-token"|name="csrf-token" content="([^"]*)""#)
            .expect("valid csrf pattern");
    static ref ASPECTS: Regex =
        Regex::new(r#""aspects":(\[.*?\])"#).expect("valid aspects pattern");
    static ref SERVICES: Regex =
        Regex::new(r#""configured_services":(\[.*?\])"#).expect("valid services pattern");
}

impl PatternKey {
    fn regex(&self) -> &'static Regex {
        match self {
            Self::CsrfToken => &CSRF_TOKEN,
            Self::Aspects => &ASPECTS,
            Self::Services => &SERVICES,
        }
    }
}

/// First capture of `key` in `body`, whichever alternative matched.
pub fn extract_pattern(body: &str, key: PatternKey) -> Option<String> {
    let caps = key.regex().captures(body)?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str().to_string())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_content_first() {
        let body = r#"<head><meta content="abc+/=" name="csrf-token" /></head>"#;
        assert_eq!(extract_pattern(body, PatternKey::CsrfToken).as_deref(), Some("abc+/="));

        let body = r#"<meta content="authenticity_token" name="csrf-param" /><meta content="T" name="csrf-token" />"#;
        assert_eq!(extract_pattern(body, PatternKey::CsrfToken).as_deref(), Some("T"));
    }

    #[test]
    fn test_token_name_first() {
        let body = r#"<meta name="csrf-param" content="authenticity_token" />
<meta name="csrf-token" content="XyZ123==" />"#;
        assert_eq!(extract_pattern(body, PatternKey::CsrfToken).as_deref(), Some("XyZ123=="));
    }

    #[test]
    fn test_token_missing() {
        assert!(extract_pattern("<html></html>", PatternKey::CsrfToken).is_none());
    }

    #[test]
    fn test_empty_token_is_reported_as_empty() {
        let body = r#"<meta name="csrf-token" content="" />"#;
        assert_eq!(extract_pattern(body, PatternKey::CsrfToken).as_deref(), Some(""));
    }

    #[test]
    fn test_lists() {
        let body = r#"window.gon={"aspects":[{"id":1,"name":"Family"},{"id":2,"name":"Work"}],"configured_services":["twitter","tumblr"]};"#;
        assert_eq!(
            extract_pattern(body, PatternKey::Aspects).as_deref(),
            Some(r#"[{"id":1,"name":"Family"},{"id":2,"name":"Work"}]"#)
        );
        assert_eq!(
            extract_pattern(body, PatternKey::Services).as_deref(),
            Some(r#"["twitter","tumblr"]"#)
        );
    }

    #[test]
    fn test_empty_list() {
        let body = r#"{"configured_services":[],"aspects":[{"id":1,"name":"A"}]}"#;
        assert_eq!(extract_pattern(body, PatternKey::Services).as_deref(), Some("[]"));
    }
}
