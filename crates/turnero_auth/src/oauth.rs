// --- File: crates/turnero_auth/src/oauth.rs ---
//! Google OAuth 2.0 authorization-code flow.
//!
//! 1. Redirect the browser to [`GoogleOAuth::authorize_url`]
//! 2. Exchange the returned code for tokens
//! 3. Read the user's profile from the userinfo endpoint

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{error, info};
use turnero_config::GoogleConfig;

use crate::error::AuthError;

/// Profile plus full read/write access to the user's calendars.
pub const SCOPES: &str = "openid email profile https://www.googleapis.com/auth/calendar";

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for Google's authorization, token and userinfo endpoints.
#[derive(Clone)]
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    redirect_uri: String,
    http: Client,
}

impl GoogleOAuth {
    pub fn new(google: &GoogleConfig, redirect_uri: impl Into<String>, http: Client) -> Self {
        Self {
            client_id: google.client_id.clone(),
            client_secret: google.client_secret.clone(),
            auth_url: google.auth_url.clone(),
            token_url: google.token_url.clone(),
            userinfo_url: google.userinfo_url.clone(),
            redirect_uri: redirect_uri.into(),
            http,
        }
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Consent screen URL. `access_type=offline` with `prompt=consent` makes
    /// Google return a refresh token on every sign-in.
    pub fn authorize_url(&self, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Url(format!("{}: {}", self.auth_url, e)))
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<OAuthErrorBody>().await {
                Ok(body) => body.error_description.unwrap_or(body.error),
                Err(_) => format!("token endpoint returned {}", status),
            };
            error!("Google token exchange failed ({}): {}", status, message);
            return Err(AuthError::TokenExchange(message));
        }

        let tokens: TokenResponse = response.json().await?;
        info!(
            "Exchanged authorization code (refresh token: {})",
            tokens.refresh_token.is_some()
        );
        Ok(tokens)
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Google userinfo request failed: {}", status);
            return Err(AuthError::UserInfo(format!(
                "userinfo endpoint returned {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}
