//! Wire types shared by the provider client, middleware and handlers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Inbound request parameters (query string and form body, merged).
pub type Params = HashMap<String, String>;

/// An OAuth token grant forwarded to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Exchange an authorization code for tokens.
    AuthorizationCode { code: String },
    /// Exchange a refresh token for a fresh access token.
    RefreshToken { refresh_token: String },
}

impl Grant {
    /// The `grant_type` value sent to the provider.
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::AuthorizationCode { .. } => "authorization_code",
            Grant::RefreshToken { .. } => "refresh_token",
        }
    }

    /// Query parameters for the provider token endpoint.
    pub fn query<'a>(&'a self, redirect_uri: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![("grant_type", self.grant_type())];
        match self {
            Grant::AuthorizationCode { code } => {
                query.push(("redirect_uri", redirect_uri));
                query.push(("code", code.as_str()));
            }
            Grant::RefreshToken { refresh_token } => {
                query.push(("refresh_token", refresh_token.as_str()));
            }
        }
        query
    }
}

/// Token endpoint response body.
///
/// The provider's JSON object is kept as-is, so every field (including
/// `null` or non-string values) is written back unchanged. Accessors read
/// the fields the proxy cares about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenPayload(serde_json::Map<String, serde_json::Value>);

impl TokenPayload {
    /// The `access_token` field, when it is a string.
    pub fn access_token(&self) -> Option<&str> {
        self.get("access_token").and_then(serde_json::Value::as_str)
    }

    /// The `refresh_token` field, when it is a string.
    pub fn refresh_token(&self) -> Option<&str> {
        self.get("refresh_token").and_then(serde_json::Value::as_str)
    }

    /// The provider's `error` field, whatever its shape.
    pub fn error(&self) -> Option<&serde_json::Value> {
        self.get("error")
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn set_refresh_token(&mut self, token: impl Into<String>) {
        self.0.insert(
            "refresh_token".to_string(),
            serde_json::Value::String(token.into()),
        );
    }
}

/// A provider reply: its status code and parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: TokenPayload,
}

/// Uniform error envelope returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of a proxy response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SwapBody {
    Token(TokenPayload),
    Error(ErrorBody),
}

/// Status and body produced by a request handler.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapResponse {
    pub status: u16,
    pub body: SwapBody,
}

impl SwapResponse {
    /// Pass a provider status and payload through.
    pub fn token(status: u16, payload: TokenPayload) -> Self {
        Self {
            status,
            body: SwapBody::Token(payload),
        }
    }

    /// A 400 response carrying `{"error": message}`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: SwapBody::Error(ErrorBody {
                error: message.into(),
            }),
        }
    }

    /// The token payload, if this is not an error envelope.
    pub fn payload(&self) -> Option<&TokenPayload> {
        match &self.body {
            SwapBody::Token(payload) => Some(payload),
            SwapBody::Error(_) => None,
        }
    }

    /// The error message, if this is an error envelope.
    pub fn error_message(&self) -> Option<&str> {
        match &self.body {
            SwapBody::Token(_) => None,
            SwapBody::Error(body) => Some(&body.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grant_query_authorization_code() {
        let grant = Grant::AuthorizationCode {
            code: "abc".to_string(),
        };
        assert_eq!(
            grant.query("app://callback"),
            vec![
                ("grant_type", "authorization_code"),
                ("redirect_uri", "app://callback"),
                ("code", "abc"),
            ]
        );
    }

    #[test]
    fn test_grant_query_refresh_token() {
        let grant = Grant::RefreshToken {
            refresh_token: "RT".to_string(),
        };
        assert_eq!(
            grant.query("app://callback"),
            vec![("grant_type", "refresh_token"), ("refresh_token", "RT")]
        );
    }

    #[test]
    fn test_payload_keeps_unknown_fields() {
        let raw = json!({
            "access_token": "AT",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "RT",
            "scope": "user-read-private"
        });
        let payload: TokenPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.access_token(), Some("AT"));
        assert_eq!(payload.refresh_token(), Some("RT"));
        assert_eq!(payload.get("expires_in"), Some(&json!(3600)));
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_payload_error_shape_round_trips() {
        let raw = json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        });
        let payload: TokenPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.error(), Some(&json!("invalid_grant")));
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_payload_keeps_null_and_non_string_tokens() {
        let raw = json!({
            "access_token": {"value": "AT"},
            "refresh_token": null,
            "expires_in": 3600
        });
        let payload: TokenPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.access_token(), None);
        assert_eq!(payload.refresh_token(), None);
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_set_refresh_token_replaces_value() {
        let mut payload: TokenPayload =
            serde_json::from_value(json!({"access_token": "AT", "refresh_token": "RT"})).unwrap();
        payload.set_refresh_token("v1:sealed");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"access_token": "AT", "refresh_token": "v1:sealed"})
        );
    }

    #[test]
    fn test_error_response_serializes_envelope() {
        let response = SwapResponse::error("boom");
        assert_eq!(response.status, 400);
        assert_eq!(response.error_message(), Some("boom"));
        assert_eq!(
            serde_json::to_value(&response.body).unwrap(),
            json!({"error": "boom"})
        );
    }
}
