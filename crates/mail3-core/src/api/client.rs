use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ApiError, AvatarSource, EligibilityReporter, FeedSource, RegistrationApi};
use crate::config::ClientConfig;
use crate::models::{AvatarResponse, FeedPage, PrimitiveAddressResponse, RegistrationState};

#[derive(Debug, Deserialize)]
struct TokenStateResponse {
    state: RegistrationState,
}

#[derive(Debug, Serialize)]
struct TokenStateRequest<'a> {
    token: &'a str,
    state: RegistrationState,
}

/// Bearer-authenticated JSON client for the mail3 REST API.
#[derive(Clone)]
pub struct Mail3Api {
    client: reqwest::Client,
    base_url: Url,
    jwt: Option<String>,
}

impl Mail3Api {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(client, config.api_base(), config.jwt.clone())
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        jwt: Option<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url.trim_end_matches('/'))?,
            jwt,
        })
    }

    pub fn set_jwt(&mut self, jwt: Option<String>) {
        self.jwt = jwt;
    }

    /// Base URL with `segments` appended, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.jwt {
            Some(jwt) => request.bearer_auth(jwt),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(%url, "api: GET");
        let response = self.authorized(self.client.get(url)).send().await?;
        Ok(Self::check(response).await?.json::<T>().await?)
    }
}

#[async_trait]
impl AvatarSource for Mail3Api {
    async fn primitive_address(&self, alias: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["avatar", "primitive", alias])?;
        let resp: PrimitiveAddressResponse = self.get_json(url).await?;
        Ok(resp.eth_address)
    }

    async fn avatar(&self, address: &str) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["avatar", address])?;
        let resp: AvatarResponse = self.get_json(url).await?;
        Ok(resp.avatar.filter(|a| !a.is_empty()))
    }
}

#[async_trait]
impl FeedSource for Mail3Api {
    async fn messages(&self, cursor: Option<&str>) -> Result<FeedPage, ApiError> {
        let mut url = self.endpoint(&["subscription", "messages"])?;
        url.query_pairs_mut()
            .append_pair("cursor", cursor.unwrap_or_default());
        self.get_json(url).await
    }
}

#[async_trait]
impl RegistrationApi for Mail3Api {
    async fn registration_token_state(&self, token: &str) -> Result<RegistrationState, ApiError> {
        let url = self.endpoint(&["notification", "registration_token", token])?;
        let resp: TokenStateResponse = self.get_json(url).await?;
        Ok(resp.state)
    }

    async fn update_registration_token(
        &self,
        token: &str,
        state: RegistrationState,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["notification", "registration_token"])?;
        let response = self
            .authorized(self.client.put(url))
            .json(&TokenStateRequest { token, state })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl EligibilityReporter for Mail3Api {
    async fn report_eligibility(&self, article_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["subscription", "article", article_id, "eligibility"])?;
        let response = self.authorized(self.client.post(url)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;

    fn api(base: &str) -> Mail3Api {
        Mail3Api::with_client(reqwest::Client::new(), base, Some("token-1".into())).unwrap()
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = api("https://example.com/api/v1/");
        let url = api.endpoint(&["avatar", "a b/c.eth"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/avatar/a%20b%2Fc.eth");
    }

    #[tokio::test]
    async fn test_avatar_lookup_round_trip() {
        let app = Router::new()
            .route(
                "/api/avatar/primitive/:address",
                get(|Path(address): Path<String>| async move {
                    Json(serde_json::json!({ "eth_address": format!("0x-{}", address) }))
                }),
            )
            .route(
                "/api/avatar/:address",
                get(|Path(address): Path<String>, headers: HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(serde_json::json!({ "avatar": format!("{}|{}", address, auth) }))
                }),
            );
        let api = api(&serve(app).await);

        let canonical = api.primitive_address("alice.eth").await.unwrap();
        assert_eq!(canonical, "0x-alice.eth");
        let avatar = api.avatar(&canonical).await.unwrap();
        assert_eq!(avatar.as_deref(), Some("0x-alice.eth|Bearer token-1"));
    }

    #[tokio::test]
    async fn test_messages_passes_cursor() {
        let app = Router::new().route(
            "/api/subscription/messages",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let cursor = q.get("cursor").cloned().unwrap_or_default();
                let next = if cursor.is_empty() { Some("c1") } else { None };
                Json(serde_json::json!({
                    "messages": [{ "uuid": format!("item-{}", cursor), "seen": false }],
                    "next_cursor": next,
                }))
            }),
        );
        let api = api(&serve(app).await);

        let first = api.messages(None).await.unwrap();
        assert_eq!(first.items[0].id, "item-");
        assert_eq!(first.next_cursor.as_deref(), Some("c1"));

        let second = api.messages(Some("c1")).await.unwrap();
        assert_eq!(second.items[0].id, "item-c1");
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let app = Router::new().route(
            "/api/subscription/article/:id/eligibility",
            post(|| async { (StatusCode::FORBIDDEN, "nope") }),
        );
        let api = api(&serve(app).await);

        match api.report_eligibility("42").await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "nope");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
