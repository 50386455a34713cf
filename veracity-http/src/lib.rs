//! Minimal HTTP client with safe logging and bearer auth.
//!
//! - JSON POST against a base URL with optional `Auth::Bearer`
//! - HEAD probes against absolute URLs for link liveness
//! - Per-request timeouts; no retries (a failed call is final)
//! - Optional *raw* request/response logging via `VERACITY_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), veracity_http::HttpError> {
//! let client = veracity_http::HttpClient::new("https://api.example.com/v1")?;
//! let got: serde_json::Value = client
//!     .post_json("items", Some("token"), &serde_json::json!({ "q": 1 }))
//!     .await?;
//! let status = client.head("https://example.org/paper.pdf", None).await?;
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/none), not the secret.
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `VERACITY_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "VERACITY_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug. The URL query is
/// omitted entirely so no secret can slip through it.
fn make_curl(method: &Method, url: &Url, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    parts.push("-H 'Authorization: Bearer <redacted>'".to_string());
    if let Some(bytes) = body {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                let mut s = s.to_string();
                if s.len() > RAW_MAX_BODY {
                    s.truncate(floor_char_boundary(&s, RAW_MAX_BODY));
                    s.push('…');
                }
                parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
            }
            Err(_) => parts.push(format!("--data-binary @- # ({} bytes)", bytes.len())),
        }
    }
    parts.push(format!("'{}{}'", host_of(url), url.path()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn is_secret_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization" | "proxy-authorization" | "cookie" | "set-cookie"
    )
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use veracity_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     Auth::None => unreachable!(),
/// }
/// ```
#[derive(Clone, Copy, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    None,
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use veracity_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Bearer("demo")),
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL. A trailing slash is added
    /// when missing so relative paths extend the base instead of replacing
    /// its last segment.
    ///
    /// ```no_run
    /// use veracity_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com/v1")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// assert_eq!(client.base().unwrap().as_str(), "https://api.example.com/v1/");
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        Self::with_redirect_limit(base, 5)
    }

    /// Like [`HttpClient::new`] with an explicit cap on followed redirects.
    pub fn with_redirect_limit(base: &str, max_redirects: usize) -> Result<Self, HttpError> {
        let mut base = base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| HttpError::Url(e.to_string()))?;
        Ok(Self {
            base: Some(base),
            inner: build_inner(max_redirects)?,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// A client with no base URL, for [`HttpClient::head`] against absolute
    /// links. JSON POSTs through it fail with [`HttpError::Url`].
    pub fn without_base(max_redirects: usize) -> Result<Self, HttpError> {
        Ok(Self {
            base: None,
            inner: build_inner(max_redirects)?,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default timeout.
    ///
    /// ```no_run
    /// use veracity_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// POST JSON using optional Bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            auth: bearer.map(Auth::Bearer),
            ..Default::default()
        };
        self.post_json_opts(path, body, opts).await
    }

    /// POST JSON with per-request options.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .as_ref()
            .ok_or_else(|| HttpError::Url(format!("no base URL to resolve `{path}` against")))?
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut rb = self
            .inner
            .request(Method::POST, url.clone())
            .timeout(timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes.clone());

        let auth_kind = match opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
                "bearer"
            }
            Some(Auth::None) | None => "none",
        };

        let req_id = new_request_id();
        tracing::debug!(
            req_id=%req_id,
            method="POST",
            host_path=%format!("{}{}", host_of(&url), url.path()),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            body_len=bytes.len(),
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&Method::POST, &url, Some(&bytes));
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = Instant::now();
        let resp = rb
            .send()
            .await
            .map_err(|err| transport_error(&req_id, err, timeout))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|err| transport_error(&req_id, err, timeout))?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let x_request_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=body.len(),
            x_request_id=%x_request_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let truncated = body.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&body[..body.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&body);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_success() {
            return serde_json::from_slice::<T>(&body).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_line=%e.line(),
                    serde_col=%e.column(),
                    serde_err=%e.to_string(),
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&body);
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%x_request_id,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id: x_request_id,
        })
    }

    /// Issue a HEAD request against an absolute URL and report the final
    /// status after redirects. Non-success statuses are returned, not raised;
    /// only transport failures are errors.
    pub async fn head(&self, url: &str, timeout: Option<Duration>) -> Result<StatusCode, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::Url(format!("unsupported scheme `{}`", url.scheme())));
        }
        let timeout = timeout.unwrap_or(self.default_timeout);
        let req_id = new_request_id();
        let host_path = format!("{}{}", host_of(&url), url.path());

        tracing::debug!(
            req_id=%req_id,
            method="HEAD",
            host_path=%host_path,
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );

        let t0 = Instant::now();
        let resp = self
            .inner
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| transport_error(&req_id, err, timeout))?;

        let status = resp.status();
        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=t0.elapsed().as_millis() as u64,
            host_path=%host_path,
            "http.head.status"
        );
        Ok(status)
    }
}

// ==============================
// Helpers
// ==============================

fn build_inner(max_redirects: usize) -> Result<Client, HttpError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .redirect(Policy::limited(max_redirects))
        .user_agent(concat!("veracity/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| HttpError::Build(e.to_string()))
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn host_of(url: &Url) -> &str {
    url.host_str().unwrap_or("-")
}

fn transport_error(req_id: &str, err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        tracing::warn!(req_id=%req_id, timeout_ms=timeout.as_millis() as u64, "http.timeout");
        return HttpError::Timeout(timeout);
    }
    let message = err.to_string();
    tracing::warn!(req_id=%req_id, message=%message, "http.network_error");
    HttpError::Network(message)
}

fn extract_error_message(body: &[u8]) -> String {
    // OpenAI style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct OpenAiEnv {
        error: OpenAiDetail,
    }
    #[derive(Deserialize)]
    struct OpenAiDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<OpenAiEnv>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        snip.truncate(floor_char_boundary(&snip, SNIPPET_MAX));
        snip.push_str("...");
    }
    snip
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
