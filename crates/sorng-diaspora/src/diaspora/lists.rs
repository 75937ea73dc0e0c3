//! Cached aspect and connected-service lookups.
//!
//! Both lists are embedded as inline JSON in `GET /bookmarklet`. A cache is
//! served as-is until a forced refresh; failed fetches keep the stale cache.

use crate::diaspora::api_client::{DiasporaApiClient, RequestOptions, BOOKMARKLET_PATH};
use crate::diaspora::error::{DiasporaError, DiasporaResult};
use crate::diaspora::patterns::{extract_pattern, PatternKey};
use crate::diaspora::types::*;
use log::{debug, info};
use std::collections::BTreeMap;

/// Aspect and service list operations.
pub struct DiasporaLists;

impl DiasporaLists {
    /// Aspects of the signed-in user, `public` included.
    pub async fn aspects(
        client: &mut DiasporaApiClient,
        force: bool,
    ) -> DiasporaResult<BTreeMap<String, String>> {
        Self::fetch(client, ListKind::Aspects, force).await
    }

    /// Connected services of the signed-in user.
    pub async fn services(
        client: &mut DiasporaApiClient,
        force: bool,
    ) -> DiasporaResult<BTreeMap<String, String>> {
        Self::fetch(client, ListKind::Services, force).await
    }

    fn cache(client: &DiasporaApiClient, kind: ListKind) -> &BTreeMap<String, String> {
        match kind {
            ListKind::Aspects => &client.session().aspects_cache,
            ListKind::Services => &client.session().services_cache,
        }
    }

    fn cache_mut(client: &mut DiasporaApiClient, kind: ListKind) -> &mut BTreeMap<String, String> {
        match kind {
            ListKind::Aspects => &mut client.session_mut().aspects_cache,
            ListKind::Services => &mut client.session_mut().services_cache,
        }
    }

    async fn fetch(
        client: &mut DiasporaApiClient,
        kind: ListKind,
        force: bool,
    ) -> DiasporaResult<BTreeMap<String, String>> {
        client.require_login()?;

        if !force && !Self::cache(client, kind).is_empty() {
            debug!("Serving cached {:?}", kind);
            return Ok(Self::cache(client, kind).clone());
        }

        let response = match client.execute(BOOKMARKLET_PATH, RequestOptions::get()).await {
            Ok(r) if r.status_code == 200 => r,
            outcome => {
                let mut err = match kind {
                    ListKind::Aspects => DiasporaError::aspects_fetch_failed("Error loading aspects."),
                    ListKind::Services => {
                        DiasporaError::services_fetch_failed("Error loading connected services.")
                    }
                };
                if let Err(transport) = outcome {
                    err = err.with_detail(transport.message);
                }
                return Err(client.report(err));
            }
        };

        if let Some(list) = Self::parse(kind, &response.body) {
            info!("Loaded {} {:?} entries", list.len(), kind);
            *Self::cache_mut(client, kind) = list;
        }
        Ok(Self::cache(client, kind).clone())
    }

    /// Build a list from the page body; `None` if the fragment is missing or
    /// does not decode.
    pub fn parse(kind: ListKind, body: &str) -> Option<BTreeMap<String, String>> {
        match kind {
            ListKind::Aspects => {
                let raw = extract_pattern(body, PatternKey::Aspects)?;
                let aspects: Vec<AspectEntry> = serde_json::from_str(&raw).ok()?;
                let mut list = BTreeMap::new();
                list.insert(PUBLIC_ASPECT_ID.to_string(), PUBLIC_ASPECT_NAME.to_string());
                list.extend(aspects.into_iter().map(|a| (a.id, a.name)));
                Some(list)
            }
            ListKind::Services => {
                let raw = extract_pattern(body, PatternKey::Services)?;
                let services: Vec<String> = serde_json::from_str(&raw).ok()?;
                Some(
                    services
                        .into_iter()
                        .map(|s| {
                            let name = capitalize(&s);
                            (s, name)
                        })
                        .collect(),
                )
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<script>window.gon={"aspects":[{"id":1,"name":"Family"},{"id":"2","name":"Work"}],"configured_services":["twitter","tumblr"]};</script>"#;

    #[test]
    fn test_parse_aspects_includes_public() {
        let list = DiasporaLists::parse(ListKind::Aspects, PAGE).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list["public"], "Public");
        assert_eq!(list["1"], "Family");
        assert_eq!(list["2"], "Work");
    }

    #[test]
    fn test_parse_services_capitalized() {
        let list = DiasporaLists::parse(ListKind::Services, PAGE).unwrap();
        assert_eq!(list["twitter"], "Twitter");
        assert_eq!(list["tumblr"], "Tumblr");
    }

    #[test]
    fn test_parse_missing_fragment() {
        assert!(DiasporaLists::parse(ListKind::Aspects, "<html></html>").is_none());
        assert!(DiasporaLists::parse(ListKind::Services, r#""configured_services":[oops]"#).is_none());
    }

    #[test]
    fn test_parse_empty_services() {
        let list = DiasporaLists::parse(ListKind::Services, r#""configured_services":[]"#).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("wordpress"), "Wordpress");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("évent"), "Évent");
    }
}
