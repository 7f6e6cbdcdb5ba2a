//! Shared helpers for the integration tests: a `Transport` that replays
//! canned responses and records every request it was given.

#![allow(dead_code)]

use reqwest::header::{HeaderMap, HeaderValue, LINK};
use reqwest::StatusCode;
use scw_snippets::config::{Config, Token};
use scw_snippets::transport::{HttpRequest, HttpResponse, Transport};
use scw_snippets::{ApiClient, ApiError};
use std::cell::RefCell;
use std::collections::VecDeque;

pub const TOKEN: &str = "0b6f2c1e-test-token";

#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: serde_json::Value) -> Self {
        self.push(status, body, None)
    }

    /// Respond with a `Link: <next>; rel="next"` header.
    pub fn respond_with_next(self, body: serde_json::Value, next: &str) -> Self {
        self.respond_with_link(body, &format!(r#"<{next}>; rel="next""#))
    }

    /// Respond with a raw `Link` header value.
    pub fn respond_with_link(self, body: serde_json::Value, link: &str) -> Self {
        self.push(200, body, Some(link.to_string()))
    }

    fn push(self, status: u16, body: serde_json::Value, link: Option<String>) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(link) = link {
            headers.insert(LINK, HeaderValue::from_str(&link).unwrap());
        }
        self.responses.borrow_mut().push_back(HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: body.to_string(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.to_string();
        self.requests.borrow_mut().push(request);
        let response = self.responses.borrow_mut().pop_front();
        Ok(response.unwrap_or_else(|| panic!("unexpected request to {url}")))
    }
}

pub fn config(max_pages: usize) -> Config {
    let max_pages = max_pages.to_string();
    Config::from_lookup(|key| (key == "SCW_MAX_PAGES").then(|| max_pages.clone())).unwrap()
}

pub fn client(transport: &ScriptedTransport) -> ApiClient<&ScriptedTransport> {
    ApiClient::new(transport, config(1000)).with_token(Token::new(TOKEN).unwrap())
}

/// Value of the auth header on a recorded request, if any.
pub fn auth_header(request: &HttpRequest) -> Option<&str> {
    request
        .headers
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
}
