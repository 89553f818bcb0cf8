//! Identity provider backed by the BaaS auth endpoint.
//!
//! The access token is verified by asking the BaaS who it belongs to
//! (`GET {baas_url}/auth/v1/user`). The role then comes from the caller's
//! profile row.

use crate::caller::Caller;
use crate::error::{AuthError, Result};
use crate::providers::{IdentityProvider, ProfileDirectory};
use async_trait::async_trait;
use campus_core::UserId;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Subset of the BaaS user object we rely on.
#[derive(Debug, Deserialize)]
struct BaasUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// [`IdentityProvider`] that verifies tokens against the BaaS.
#[derive(Clone)]
pub struct BaasIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    profiles: Arc<dyn ProfileDirectory>,
}

impl BaasIdentityProvider {
    /// Create a provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::InternalError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            profiles,
        })
    }

    async fn fetch_user(&self, token: &str) -> Result<BaasUser> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<BaasUser>()
                .await
                .map_err(|e| AuthError::ProviderUnavailable(format!("Malformed user payload: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidToken),
            status => Err(AuthError::ProviderUnavailable(format!(
                "Unexpected status {status} from auth endpoint"
            ))),
        }
    }
}

#[async_trait]
impl IdentityProvider for BaasIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<Caller> {
        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = self.fetch_user(token).await?;
        let user_id = UserId::from_uuid(user.id);
        let role = self.profiles.role_of(user_id).await?;

        tracing::debug!(user_id = %user_id, role = %role, "Caller authenticated");

        Ok(Caller::new(user_id, user.email, role))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::MockProfileDirectory;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode as HttpStatus};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use campus_core::Role;

    const USER_ID: &str = "6f1c0a2e-8d1b-4a53-9a0e-3c7d2b9f4e11";

    /// Answers `/auth/v1/user` according to the bearer token.
    async fn current_user(headers: HeaderMap) -> Response {
        if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon-key") {
            return (HttpStatus::BAD_REQUEST, "missing apikey").into_response();
        }

        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();

        match token {
            "good" => axum::Json(serde_json::json!({
                "id": USER_ID,
                "aud": "authenticated",
                "email": "ada@campus.test"
            }))
            .into_response(),
            "expired" => HttpStatus::UNAUTHORIZED.into_response(),
            "banned" => HttpStatus::FORBIDDEN.into_response(),
            "garbled" => (HttpStatus::OK, "<html>not json</html>").into_response(),
            _ => HttpStatus::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    async fn spawn_auth_server() -> String {
        let app = Router::new().route("/auth/v1/user", get(current_user));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        base
    }

    fn provider(base: &str, profiles: MockProfileDirectory) -> BaasIdentityProvider {
        BaasIdentityProvider::new(base, "anon-key", Duration::from_secs(5), Arc::new(profiles))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_resolves_caller_with_profile_role() {
        let base = spawn_auth_server().await;
        let profiles = MockProfileDirectory::new();
        let user_id = UserId::from_uuid(USER_ID.parse().unwrap());
        profiles.set_role(user_id, Role::Professor);

        let caller = provider(&base, profiles).authenticate("good").await.unwrap();

        assert_eq!(caller.user_id, user_id);
        assert_eq!(caller.email.as_deref(), Some("ada@campus.test"));
        assert_eq!(caller.role, Role::Professor);
    }

    #[tokio::test]
    async fn test_valid_token_without_profile_is_student() {
        let base = spawn_auth_server().await;

        let caller = provider(&base, MockProfileDirectory::new())
            .authenticate("good")
            .await
            .unwrap();

        assert_eq!(caller.role, Role::Student);
    }

    #[tokio::test]
    async fn test_rejected_tokens_are_invalid() {
        let base = spawn_auth_server().await;
        let provider = provider(&base, MockProfileDirectory::new());

        for token in ["expired", "banned"] {
            let err = provider.authenticate(token).await.unwrap_err();
            assert_eq!(err, AuthError::InvalidToken, "token {token}");
        }
    }

    #[tokio::test]
    async fn test_server_error_means_provider_unavailable() {
        let base = spawn_auth_server().await;

        let err = provider(&base, MockProfileDirectory::new())
            .authenticate("boom")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_means_provider_unavailable() {
        let base = spawn_auth_server().await;

        let err = provider(&base, MockProfileDirectory::new())
            .authenticate("garbled")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ProviderUnavailable(ref msg) if msg.contains("Malformed")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_means_provider_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = provider(&base, MockProfileDirectory::new())
            .authenticate("good")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_token_is_missing_credentials() {
        // Port 9 is never contacted: the check happens before any request.
        let err = provider("http://127.0.0.1:9", MockProfileDirectory::new())
            .authenticate("")
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::MissingCredentials);
    }

    #[test]
    fn test_user_payload_ignores_extra_fields() {
        let json = r#"{
            "id": "6f1c0a2e-8d1b-4a53-9a0e-3c7d2b9f4e11",
            "aud": "authenticated",
            "email": "ada@campus.test",
            "app_metadata": {"provider": "email"}
        }"#;

        let user: BaasUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@campus.test"));
    }

    #[test]
    fn test_user_payload_without_email() {
        let json = r#"{"id": "6f1c0a2e-8d1b-4a53-9a0e-3c7d2b9f4e11"}"#;
        let user: BaasUser = serde_json::from_str(json).unwrap();
        assert!(user.email.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let profiles = Arc::new(crate::mocks::MockProfileDirectory::new());
        let provider = BaasIdentityProvider::new(
            "https://project.baas.test/",
            "anon",
            Duration::from_secs(5),
            profiles,
        )
        .unwrap();

        assert_eq!(provider.base_url, "https://project.baas.test");
    }
}
