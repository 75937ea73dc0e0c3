//! Status messages and deletion.
//!
//! Endpoints:
//! - `POST   /status_messages`: create a status message (201)
//! - `DELETE /posts/{id}`: delete a post (204)
//! - `DELETE /comments/{id}`: delete a comment (204)

use crate::diaspora::api_client::{DiasporaApiClient, RequestOptions, STATUS_MESSAGES_PATH};
use crate::diaspora::error::{DiasporaError, DiasporaResult};
use crate::diaspora::types::*;
use log::info;
use serde_json::{json, Map, Value};

/// Post and comment operations.
pub struct DiasporaPosts;

impl DiasporaPosts {
    /// JSON body of a status message.
    ///
    /// `aspect_ids` and `status_message` are inserted after the extra fields,
    /// so an extra field of the same name never replaces them.
    pub fn build_body(
        text: &str,
        aspects: &AspectSelection,
        provider_name: &str,
        extra_fields: Map<String, Value>,
    ) -> Value {
        let status_message = StatusMessage {
            text: text.to_string(),
            provider_display_name: provider_name.to_string(),
        };
        let mut body = extra_fields;
        body.insert("aspect_ids".into(), json!(aspects));
        body.insert("status_message".into(), json!(status_message));
        Value::Object(body)
    }

    /// Create a status message.
    pub async fn create(
        client: &mut DiasporaApiClient,
        text: &str,
        aspects: &AspectSelection,
        extra_fields: Map<String, Value>,
    ) -> DiasporaResult<PostResult> {
        client.require_login()?;

        let body = Self::build_body(text, aspects, &client.config().provider_name, extra_fields);
        let token = client.fetch_token(false).await.unwrap_or_default();
        let options = RequestOptions::post_json(body).json_api(&token);

        let response = match client.execute(STATUS_MESSAGES_PATH, options).await {
            Ok(r) => r,
            Err(e) => {
                let err = DiasporaError::post_failed("Error posting to diaspora*: Unknown error")
                    .with_detail(e.message);
                return Err(client.report(err));
            }
        };

        if response.status_code != 201 {
            let reason = response
                .json::<Value>()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| "Unknown error".to_string());
            let err = DiasporaError::post_failed(format!("Error posting to diaspora*: {}", reason));
            return Err(client.report(err));
        }

        let mut fields = response.json::<Map<String, Value>>().unwrap_or_default();
        fields.remove("permalink");
        let guid = match fields.remove("guid") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let permalink = if guid.is_empty() {
            String::new()
        } else {
            client.pod_url(&format!("/posts/{}", guid))
        };
        info!("Posted status message {}", permalink);

        Ok(PostResult {
            guid,
            permalink,
            fields,
        })
    }

    /// Delete a post or comment. `kind` must be `"post"` or `"comment"`.
    pub async fn delete(client: &mut DiasporaApiClient, kind: &str, id: &str) -> DiasporaResult<()> {
        client.require_login()?;
        let Some(target) = DeleteTarget::parse(kind) else {
            return Err(client.report(DiasporaError::invalid_delete_target(kind)));
        };
        let Some(path) = target.path(id) else {
            return Err(client.report(DiasporaError::invalid_delete_id(target, id)));
        };

        let token = client.fetch_token(false).await.unwrap_or_default();
        let options = RequestOptions::delete().json_api(&token);
        let outcome = match client.execute(&path, options).await {
            Ok(response) => Self::delete_outcome(target, response.status_code),
            Err(e) => Err(DiasporaError::unknown_remote().with_detail(e.message)),
        };

        match outcome {
            Ok(()) => {
                info!("Deleted {} {}", target, id);
                Ok(())
            }
            Err(err) => Err(client.report(err)),
        }
    }

    /// Map a DELETE status to its outcome.
    ///
    /// The pod signals "not yours" with 403 for comments but 500 for posts;
    /// the opposite code on the other target is not a known answer.
    pub fn delete_outcome(target: DeleteTarget, status: u16) -> DiasporaResult<()> {
        match (status, target) {
            (204, _) => Ok(()),
            (404, DeleteTarget::Post) => Err(DiasporaError::delete_failed(
                target,
                "The post you tried to delete does not exist.",
            )),
            (404, DeleteTarget::Comment) => Err(DiasporaError::delete_failed(
                target,
                "The comment you tried to delete does not exist.",
            )),
            (403, DeleteTarget::Comment) => Err(DiasporaError::delete_failed(
                target,
                "The comment you tried to delete does not belong to you.",
            )),
            (500, DeleteTarget::Post) => Err(DiasporaError::delete_failed(
                target,
                "The post you tried to delete does not belong to you.",
            )),
            _ => Err(DiasporaError::unknown_remote()),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diaspora::error::DiasporaErrorKind;

    #[test]
    fn test_body_public() {
        let body = DiasporaPosts::build_body(
            "hello world",
            &AspectSelection::from_ids(Vec::<String>::new()),
            "SortOfRemote NG",
            Map::new(),
        );
        assert_eq!(body["aspect_ids"], "public");
        assert_eq!(body["status_message"]["text"], "hello world");
        assert_eq!(body["status_message"]["provider_display_name"], "SortOfRemote NG");
    }

    #[test]
    fn test_body_public_wins_over_other_aspects() {
        let aspects = AspectSelection::from(vec!["public".to_string(), "family".to_string()]);
        let body = DiasporaPosts::build_body("x", &aspects, "p", Map::new());
        assert_eq!(body["aspect_ids"], "public");
    }

    #[test]
    fn test_body_extra_fields_cannot_override_base() {
        let mut extra = Map::new();
        extra.insert("aspect_ids".into(), json!(["9"]));
        extra.insert("status_message".into(), json!("nope"));
        extra.insert("photos".into(), json!([1, 2]));
        let body = DiasporaPosts::build_body("x", &AspectSelection::from("1,2"), "p", extra);
        assert_eq!(body["aspect_ids"], json!(["1", "2"]));
        assert_eq!(body["status_message"]["text"], "x");
        assert_eq!(body["photos"], json!([1, 2]));
    }

    #[test]
    fn test_delete_outcome_success() {
        assert!(DiasporaPosts::delete_outcome(DeleteTarget::Post, 204).is_ok());
        assert!(DiasporaPosts::delete_outcome(DeleteTarget::Comment, 204).is_ok());
    }

    #[test]
    fn test_delete_outcome_not_found() {
        let err = DiasporaPosts::delete_outcome(DeleteTarget::Comment, 404).unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::DeleteFailed(DeleteTarget::Comment));
        assert!(err.message.contains("comment"));
        assert!(err.message.contains("does not exist"));
    }

    #[test]
    fn test_delete_outcome_forbidden_only_for_comments() {
        let err = DiasporaPosts::delete_outcome(DeleteTarget::Comment, 403).unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::DeleteFailed(DeleteTarget::Comment));
        assert!(err.message.contains("does not belong to you"));

        let err = DiasporaPosts::delete_outcome(DeleteTarget::Post, 403).unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::UnknownRemoteError);
    }

    #[test]
    fn test_delete_outcome_server_error_only_for_posts() {
        let err = DiasporaPosts::delete_outcome(DeleteTarget::Post, 500).unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::DeleteFailed(DeleteTarget::Post));
        assert!(err.message.contains("does not belong to you"));

        let err = DiasporaPosts::delete_outcome(DeleteTarget::Comment, 500).unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::UnknownRemoteError);
    }

    #[test]
    fn test_delete_outcome_unmapped() {
        let err = DiasporaPosts::delete_outcome(DeleteTarget::Post, 200).unwrap_err();
        assert_eq!(err.kind, DiasporaErrorKind::UnknownRemoteError);
    }
}
