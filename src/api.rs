// API client: wraps a `Transport` with the Scaleway conventions (the
// `X-Auth-Token` header, JSON bodies, status checking). Every endpoint
// module goes through `ApiClient::get` / `ApiClient::patch_json`.

use crate::config::{Config, Token};
use crate::error::{ApiError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use tracing::debug;

pub const AUTH_HEADER: &str = "x-auth-token";

/// Whether a request carries the token header. Token introspection and the
/// marketplace are called anonymously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anonymous,
    Authenticated,
}

/// Small API client holding the transport, the endpoint configuration and
/// an optional token for authenticated calls.
pub struct ApiClient<T: Transport = HttpTransport> {
    transport: T,
    config: Config,
    token: Option<Token>,
}

impl ApiClient<HttpTransport> {
    /// Client backed by a real blocking HTTP transport.
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(ApiClient::new(HttpTransport::new()?, config))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: Config) -> Self {
        ApiClient {
            transport,
            config,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The token, or a configuration error when the client was built
    /// without one.
    pub fn token(&self) -> Result<&Token> {
        self.token
            .as_ref()
            .ok_or_else(|| ApiError::Config("an API token is required for this call".into()))
    }

    /// Account endpoint. Each segment is percent-encoded on its own, so a
    /// `/` or `?` inside a token or user id stays inside its segment.
    pub fn account_url(&self, segments: &[&str]) -> Result<Url> {
        join(&self.config.account_url, segments)
    }

    pub fn marketplace_url(&self, segments: &[&str]) -> Result<Url> {
        join(&self.config.marketplace_url, segments)
    }

    pub fn get(&self, url: Url, access: Access) -> Result<HttpResponse> {
        self.send(Method::GET, url, access, None)
    }

    /// PATCH a JSON body. Always authenticated.
    pub fn patch_json<B: Serialize>(&self, url: Url, body: &B) -> Result<HttpResponse> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.send(Method::PATCH, url, Access::Authenticated, Some(body))
    }

    fn send(
        &self,
        method: Method,
        url: Url,
        access: Access,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        let shown = self.redact(&url);
        let headers = match access {
            Access::Anonymous => HeaderMap::new(),
            Access::Authenticated => self.auth_headers()?,
        };
        debug!(%method, url = %shown, "sending request");

        let request = HttpRequest {
            method: method.clone(),
            url,
            headers,
            body,
        };
        let res = self.transport.send(request)?;
        debug!(status = %res.status, url = %shown, "received response");

        if !res.status.is_success() {
            return Err(ApiError::Http {
                method,
                url: shown,
                status: res.status,
                body: res.body,
            });
        }
        Ok(res)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self.token()?;
        let mut value = HeaderValue::from_str(token.as_str())
            .map_err(|_| ApiError::Config("token contains characters not allowed in a header".into()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(AUTH_HEADER), value);
        Ok(headers)
    }

    /// The token never shows up in logs or error messages. It only travels
    /// in the URL as a whole path segment, and that segment is masked.
    fn redact(&self, url: &Url) -> String {
        let Some(token) = &self.token else {
            return url.to_string();
        };
        let (Some(encoded), Some(segments)) =
            (encoded_segment(url, token.as_str()), url.path_segments())
        else {
            return url.to_string();
        };
        let masked: Vec<&str> = segments
            .map(|segment| if segment == encoded { "***" } else { segment })
            .collect();

        let mut shown = url.clone();
        shown.set_path(&format!("/{}", masked.join("/")));
        shown.to_string()
    }
}

fn join(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::Config(format!("'{base}' cannot be used as an API base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `value` the way it appears once pushed as a path segment of `url`.
fn encoded_segment(url: &Url, value: &str) -> Option<String> {
    let mut scratch = url.clone();
    scratch.path_segments_mut().ok()?.push(value);
    scratch.path_segments()?.last().map(str::to_string)
}
