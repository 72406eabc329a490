//! HTTP utilities for Azure Resource Manager REST calls

use crate::error::{RemoteFailure, ResourceError, Result};
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header ARM echoes back for request correlation
pub const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decode a non-success response into the error taxonomy.
/// 404 is the only status mapped to `NotFound`.
pub fn error_from_response(status: StatusCode, body: &str) -> ResourceError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let code = envelope.as_ref().and_then(|e| e.error.code.clone());
    let message = envelope
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    if status == StatusCode::NOT_FOUND {
        return ResourceError::NotFound(message);
    }

    RemoteFailure::new(Some(status.as_u16()), code, message).into()
}

/// Raw response with the headers long-running operations need
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: StatusCode,
    pub body: String,
    /// Polling URL for accepted long-running operations
    pub location: Option<String>,
    pub retry_after: Option<Duration>,
}

impl ArmResponse {
    fn from_parts(status: StatusCode, headers: &HeaderMap, body: String) -> Self {
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        Self {
            status,
            body,
            location,
            retry_after,
        }
    }

    /// Turn a non-success status into an error, keeping the response otherwise
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            if self.status == StatusCode::NOT_FOUND {
                tracing::debug!("API returned 404 - {}", sanitize_for_log(&self.body));
            } else {
                // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
                tracing::error!("API error: {} - {}", self.status, sanitize_for_log(&self.body));
            }
            Err(error_from_response(self.status, &self.body))
        }
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            RemoteFailure::transport(format!("Failed to parse response JSON: {}", e)).into()
        })
    }
}

/// HTTP client wrapper for ARM API calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("azrg/{}", crate::VERSION))
            .build()
            .map_err(|e| RemoteFailure::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Send a request and return the raw response, whatever its status
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<ArmResponse> {
        let request_id = Uuid::new_v4();
        tracing::debug!("{} {} [{}]", method, url, request_id);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID, request_id.to_string());

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(ArmResponse::from_parts(status, &headers, body))
    }

    /// GET a JSON document
    pub async fn get<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        self.send::<()>(Method::GET, url, token, None)
            .await?
            .error_for_status()?
            .json()
    }

    /// PUT a JSON body and parse the JSON response
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> Result<T> {
        self.send(Method::PUT, url, token, Some(body))
            .await?
            .error_for_status()?
            .json()
    }

    /// DELETE, returning the response so callers can follow 202 Accepted
    pub async fn delete(&self, url: &str, token: &str) -> Result<ArmResponse> {
        self.send::<()>(Method::DELETE, url, token, None)
            .await?
            .error_for_status()
    }
}

/// Format an ARM error for display
/// Security: Avoids echoing raw API payloads back to the terminal
pub fn format_arm_error(error: &ResourceError) -> String {
    match error {
        ResourceError::InvalidArgument(msg) => format!("Invalid argument: {}", msg),
        ResourceError::NotFound(_) => "Resource group not found.".to_string(),
        ResourceError::Remote(failure) => match failure.status {
            Some(401) => "Authentication failed. Run 'az login' or set AZURE_ACCESS_TOKEN.".to_string(),
            Some(403) => "Permission denied. Check your Azure RBAC role assignments.".to_string(),
            Some(409) => "Resource conflict. The resource group may be locked or being deleted.".to_string(),
            Some(429) => "Rate limit exceeded. Please try again later.".to_string(),
            Some(400) => match &failure.code {
                Some(code) => format!("Invalid request ({}). Check your parameters.", code),
                None => "Invalid request. Check your parameters.".to_string(),
            },
            Some(status) if status >= 500 => {
                "Azure service temporarily unavailable. Please try again.".to_string()
            }
            Some(status) => format!("Request failed with status {}.", status),
            None => {
                let sanitized = failure
                    .message
                    .chars()
                    .filter(|c| c.is_ascii_graphic() || *c == ' ')
                    .take(80)
                    .collect::<String>();
                if sanitized.len() < failure.message.len() {
                    format!("{}...", sanitized)
                } else {
                    sanitized
                }
            }
        },
    }
}
