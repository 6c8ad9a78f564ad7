//! HTTP client for the fixed-deposit portal API

use fdportal_protocol::api::{
    CustomerDashboard, CustomerSummary, FdCalculation, FdRequest, Investment, LoginRequest,
    RegisterRequest,
};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{FdError, Result};

/// Remote API surface consumed by the portal
///
/// Calls are made once; nothing here retries.
#[allow(async_fn_in_trait)]
pub trait FdApi {
    /// `POST /api/auth/login`, returns the raw credential
    async fn login(&self, request: &LoginRequest) -> Result<String>;

    /// `POST /api/auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value>;

    /// `GET /api/customer/dashboard`
    async fn customer_dashboard(&self, token: &str) -> Result<CustomerDashboard>;

    /// `GET /api/manager/customers`
    async fn manager_customers(&self, token: &str) -> Result<Vec<CustomerSummary>>;

    /// `POST /api/fd/calculate`
    async fn calculate(&self, request: &FdRequest) -> Result<FdCalculation>;

    /// `POST /api/fd/invest`
    async fn invest(&self, token: &str, request: &FdRequest) -> Result<Investment>;
}

/// Raw answer from the server
#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    body: String,
}

/// Base HTTP client for API operations
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut client_builder = Client::builder().timeout(Duration::from_secs(config.timeout));

        if !config.effective_use_proxy() {
            client_builder = client_builder.no_proxy();
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    async fn send<T>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
        bearer_token: Option<&str>,
    ) -> Result<RawResponse>
    where
        T: Serialize + ?Sized,
    {
        let url = self.config.endpoint_url(endpoint);

        let mut request_builder = self
            .client
            .request(method.clone(), &url)
            .header("Content-Type", "application/json");

        if let Some(token) = bearer_token {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", token));
        }

        if let Some(data) = payload {
            request_builder = request_builder.json(data);
        }

        let response = request_builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(%method, endpoint, status = status.as_u16(), "api call finished");
        Ok(RawResponse { status, body })
    }

    async fn authenticated_json<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
        token: &str,
        failure: &str,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(method, endpoint, payload, Some(token)).await?;
        check_authenticated(&response, failure)?;
        parse_json(&response)
    }
}

impl FdApi for HttpClient {
    async fn login(&self, request: &LoginRequest) -> Result<String> {
        let response = self
            .send(Method::POST, "/api/auth/login", Some(request), None)
            .await?;

        login_credential(&response)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value> {
        let response = self
            .send(Method::POST, "/api/auth/register", Some(request), None)
            .await?;
        check_status(&response, "Registration failed")?;

        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        parse_json(&response)
    }

    async fn customer_dashboard(&self, token: &str) -> Result<CustomerDashboard> {
        self.authenticated_json::<(), _>(
            Method::GET,
            "/api/customer/dashboard",
            None,
            token,
            "Failed to fetch customer dashboard",
        )
        .await
    }

    async fn manager_customers(&self, token: &str) -> Result<Vec<CustomerSummary>> {
        self.authenticated_json::<(), _>(
            Method::GET,
            "/api/manager/customers",
            None,
            token,
            "Failed to fetch customers for manager",
        )
        .await
    }

    async fn calculate(&self, request: &FdRequest) -> Result<FdCalculation> {
        let response = self
            .send(Method::POST, "/api/fd/calculate", Some(request), None)
            .await?;
        check_status(&response, "FD calculation failed")?;
        parse_json(&response)
    }

    async fn invest(&self, token: &str, request: &FdRequest) -> Result<Investment> {
        self.authenticated_json(
            Method::POST,
            "/api/fd/invest",
            Some(request),
            token,
            "FD investment failed",
        )
        .await
    }
}

fn error_text(response: &RawResponse, fallback: &str) -> String {
    let text = response.body.trim();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

/// Shortest body accepted as a credential
const MIN_CREDENTIAL_LEN: usize = 20;

fn login_credential(response: &RawResponse) -> Result<String> {
    if !response.status.is_success() {
        return Err(FdError::authentication(error_text(
            response,
            "Invalid username or password",
        )));
    }

    let credential = response.body.trim();
    if credential.len() < MIN_CREDENTIAL_LEN {
        return Err(FdError::malformed_credential("No valid token received"));
    }
    Ok(credential.to_string())
}

fn check_status(response: &RawResponse, failure: &str) -> Result<()> {
    if response.status.is_success() {
        return Ok(());
    }
    Err(FdError::api(
        response.status.as_u16(),
        error_text(response, failure),
    ))
}

// 401 on a bearer call means the server no longer accepts the credential.
fn check_authenticated(response: &RawResponse, failure: &str) -> Result<()> {
    if response.status == StatusCode::UNAUTHORIZED {
        return Err(FdError::session_rejected(error_text(
            response,
            "Unauthorized - please login",
        )));
    }
    check_status(response, failure)
}

fn parse_json<R: DeserializeOwned>(response: &RawResponse) -> Result<R> {
    serde_json::from_str(&response.body).map_err(|e| {
        FdError::invalid_response(
            response.status.as_u16(),
            format!("Invalid API response: {}", e),
        )
    })
}
