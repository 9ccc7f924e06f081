use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, LOCATION, ORIGIN, REFERER};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::config::Configuration;
use crate::error::ServerError;
use crate::services::{CookieJarStore, PersistentJar};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one identity's cookie jar.
///
/// Every step of the login dance depends on cookies set by earlier
/// responses, so all requests for an identity share one jar, redirects are
/// never followed automatically, and the jar is persisted after every
/// exchange whether it succeeded or not.
pub struct Transport {
    client: Client,
    jar: Arc<PersistentJar>,
    cookie_store: Arc<CookieJarStore>,
    identity: String,
    origin: String,
}

impl Transport {
    pub fn new(
        identity: &str,
        configuration: &Configuration,
        cookie_store: Arc<CookieJarStore>,
    ) -> Result<Self, ServerError> {
        let jar = cookie_store.load(identity);
        let client = Client::builder()
            .user_agent(&configuration.provider.user_agent)
            .cookie_provider(jar.clone())
            .redirect(reqwest::redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServerError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            jar,
            cookie_store,
            identity: identity.to_string(),
            origin: configuration.provider.origin(),
        })
    }

    fn persist_jar(&self) {
        self.cookie_store.save(&self.identity, &self.jar);
    }

    /// GET a provider page, returning status and body text.
    pub async fn get_text(&self, url: &str) -> Result<(StatusCode, String), ServerError> {
        let result = self.client.get(url).send().await;
        self.persist_jar();
        let response = result?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// POST a form to the provider with the CSRF header set.
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
        csrf_token: &str,
        referer: Option<&str>,
    ) -> Result<(StatusCode, String), ServerError> {
        let mut request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header(ORIGIN, &self.origin)
            .header("x-csrf-token", csrf_token)
            .form(form);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let result = request.send().await;
        self.persist_jar();
        let response = result?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// GET a URL that is expected to answer 302; returns the Location header.
    pub async fn capture_redirect_location(&self, url: &str) -> Result<String, ServerError> {
        let result = self.client.get(url).send().await;
        self.persist_jar();
        let response = result?;

        if response.status() != StatusCode::FOUND {
            return Err(ServerError::Protocol(format!(
                "Expected redirect, got {}",
                response.status()
            )));
        }
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ServerError::Protocol("Redirect missing Location header".to_string()))
    }

    /// POST a form without CSRF headers; used for the token exchange.
    pub async fn post_token_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<(StatusCode, Value), ServerError> {
        let result = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await;
        self.persist_jar();
        let response = result?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, parse_json(&body)))
    }

    /// POST JSON to the vehicle API with a bearer token.
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        access_token: &str,
    ) -> Result<(StatusCode, Value), ServerError> {
        let result = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await;
        self.persist_jar();
        let response = result?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, parse_json(&body)))
    }

    /// GET JSON with a bearer token; used by the command poll loop.
    pub async fn get_json(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<(StatusCode, Value), ServerError> {
        let result = self.client.get(url).bearer_auth(access_token).send().await;
        self.persist_jar();
        let response = result?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, parse_json(&body)))
    }
}

// Some command responses arrive with empty or non-JSON bodies; treat those
// as null rather than failing the exchange.
fn parse_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or(Value::Null)
}
