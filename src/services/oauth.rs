use chrono::{Duration, Utc};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, RedirectUrl, Scope};
use serde::Deserialize;

use crate::config::ProviderConfiguration;
use crate::error::ServerError;
use crate::models::TokenPair;

/// Raw token-endpoint response. B2C returns an id_token alongside the
/// standard authorization-code grant fields.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    expires_in: i64,
}

/// Client for the identity provider's OAuth2 endpoints: builds the PKCE
/// authorization URL and performs the code and refresh-token exchanges.
pub struct OAuthClient {
    client_id: String,
    auth_url: AuthUrl,
    token_url: String,
    redirect_uri: RedirectUrl,
    scope: String,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: &ProviderConfiguration) -> Result<Self, ServerError> {
        let auth_url = AuthUrl::new(config.authorize_endpoint())
            .map_err(|e| ServerError::Configuration(format!("Invalid authorize URL: {e}")))?;
        let redirect_uri = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| ServerError::Configuration(format!("Invalid redirect URI: {e}")))?;
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ServerError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client_id: config.client_id.clone(),
            auth_url,
            token_url: config.token_endpoint(),
            redirect_uri,
            scope: config.scope.clone(),
            http,
        })
    }

    /// Generate a PKCE challenge and build the authorization URL carrying it.
    /// Returns the URL and the code verifier, which must be held until the
    /// code exchange at the end of the login.
    pub fn authorization_request(&self) -> (String, String) {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, _state) = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_uri.clone())
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(self.scope.clone()))
            .set_pkce_challenge(challenge)
            .url();
        (url.to_string(), verifier.secret().to_string())
    }

    /// Exchange an authorization code plus the original verifier for the
    /// first-stage token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenPair, ServerError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        self.token_request(&params).await
    }

    /// Trade a refresh token for a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServerError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenPair, ServerError> {
        let response = self.http.post(&self.token_url).form(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ServerError::Upstream(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }
        let parsed: TokenEndpointResponse = serde_json::from_str(&body)
            .map_err(|e| ServerError::Protocol(format!("Malformed token response: {e}")))?;

        Ok(TokenPair {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            id_token: parsed.id_token,
            expires_at: Utc::now() + Duration::seconds(parsed.expires_in),
        })
    }
}
