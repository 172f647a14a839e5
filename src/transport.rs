/// HTTP transport used for the token endpoint calls
///
/// The OAuth client only builds requests and interprets replies. Sending
/// them is delegated to a [`Transport`], so tests and host applications can
/// substitute their own.
use crate::config::ClientConfig;
use crate::error::{OAuthError, Result};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Canvas prefixes some JSON bodies with this guard
const JSON_GUARD: &str = "while(1);";

/// HTTP method of an API request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A request relative to the configured API host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest<'a> {
    pub method: Method,
    pub path: &'a str,
    pub params: Vec<(&'a str, &'a str)>,
    /// Access token sent as `Authorization: Bearer`
    pub bearer: Option<&'a str>,
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            params: Vec::new(),
            bearer: None,
        }
    }

    pub fn param(mut self, name: &'a str, value: &'a str) -> Self {
        self.params.push((name, value));
        self
    }

    pub fn bearer(mut self, token: &'a str) -> Self {
        self.bearer = Some(token);
        self
    }
}

/// Sends one request and returns the decoded JSON object
///
/// Implementations must return an error for transport failures (DNS,
/// timeouts, non-2xx replies). An empty successful body decodes to `{}`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &ApiRequest<'_>) -> Result<Value>;
}

/// Settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub api_host: String,
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl HttpTransportConfig {
    pub fn new(api_host: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("canvas-oauth/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Blocking transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_host: String,
}

impl HttpTransport {
    /// Create a transport for the given host with default settings
    pub fn new(api_host: impl Into<String>) -> Result<Self> {
        Self::with_config(HttpTransportConfig::new(api_host))
    }

    /// Create a transport for the host of a client configuration
    pub fn for_client(config: &ClientConfig) -> Result<Self> {
        Self::new(config.api_host())
    }

    pub fn with_config(config: HttpTransportConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_host: config.api_host.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL for a request path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.api_host, path)
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &ApiRequest<'_>) -> Result<Value> {
        let url = self.url_for(request.path);

        let builder = match request.method {
            Method::Get => self.client.get(&url).query(&request.params),
            Method::Post => self.client.post(&url).form(&request.params),
            Method::Delete => self.client.delete(&url).query(&request.params),
        };
        let builder = match request.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        debug!(method = ?request.method, path = request.path, "Sending request");
        let response = builder.header(ACCEPT, "application/json").send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            warn!(
                method = ?request.method,
                path = request.path,
                status = status.as_u16(),
                "Request failed"
            );
            return Err(OAuthError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_body(&body)
    }
}

/// Decode a response body into a JSON object
pub(crate) fn parse_body(body: &str) -> Result<Value> {
    let body = body.trim();
    let body = body.strip_prefix(JSON_GUARD).unwrap_or(body);
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(OAuthError::InvalidResponse(format!(
            "expected a JSON object, got: {}",
            value
        )));
    }

    Ok(value)
}



#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::authorize::TOKEN_PATH;
    use crate::config::ClientConfig;
    use crate::oauth::OAuthClient;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // The mock server runs on the runtime's worker threads while the blocking
    // client is driven from the test thread.
    fn start_server() -> (Runtime, MockServer) {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        (rt, server)
    }

    #[test]
    fn test_post_sends_form_body() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(TOKEN_PATH))
                .and(header("content-type", "application/x-www-form-urlencoded"))
                .and(body_string(
                    "client_id=1234&code=abc&redirect_uri=http%3A%2F%2Fwww.example.com",
                ))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": "asdf"
                })))
                .mount(&server),
        );

        let transport = HttpTransport::new(server.uri()).unwrap();
        let request = ApiRequest::new(Method::Post, TOKEN_PATH)
            .param("client_id", "1234")
            .param("code", "abc")
            .param("redirect_uri", "http://www.example.com");

        assert_eq!(
            transport.execute(&request).unwrap(),
            json!({"access_token": "asdf"})
        );

        let received = rt.block_on(server.received_requests()).unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].headers.get("authorization").is_none());
    }

    #[test]
    fn test_delete_sends_bearer_token() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("DELETE"))
                .and(path(TOKEN_PATH))
                .and(header("authorization", "Bearer token-123"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"logged_out": true})),
                )
                .mount(&server),
        );

        let transport = HttpTransport::new(server.uri()).unwrap();
        let request = ApiRequest::new(Method::Delete, TOKEN_PATH).bearer("token-123");

        assert_eq!(
            transport.execute(&request).unwrap(),
            json!({"logged_out": true})
        );
    }

    #[test]
    fn test_get_sends_query_params() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("GET"))
                .and(path("/api/v1/users/self"))
                .and(query_param("include", "email"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
                .mount(&server),
        );

        let transport = HttpTransport::new(server.uri()).unwrap();
        let request = ApiRequest::new(Method::Get, "/api/v1/users/self").param("include", "email");

        assert_eq!(transport.execute(&request).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_non_success_status_is_an_error() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(TOKEN_PATH))
                .respond_with(
                    ResponseTemplate::new(401).set_body_string("{\"error\":\"invalid_client\"}"),
                )
                .mount(&server),
        );

        let transport = HttpTransport::new(server.uri()).unwrap();
        let err = transport
            .execute(&ApiRequest::new(Method::Post, TOKEN_PATH))
            .unwrap_err();

        match err {
            OAuthError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "{\"error\":\"invalid_client\"}");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_success_body_is_empty_object() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("DELETE"))
                .and(path(TOKEN_PATH))
                .respond_with(ResponseTemplate::new(204))
                .mount(&server),
        );

        let transport = HttpTransport::new(server.uri()).unwrap();
        let request = ApiRequest::new(Method::Delete, TOKEN_PATH).bearer("token");

        assert_eq!(transport.execute(&request).unwrap(), json!({}));
    }

    #[test]
    fn test_guarded_body_end_to_end() {
        let (rt, server) = start_server();
        rt.block_on(
            Mock::given(method("DELETE"))
                .and(path(TOKEN_PATH))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string("while(1);{\"logged_out\":true}"),
                )
                .mount(&server),
        );

        let transport = HttpTransport::new(server.uri()).unwrap();
        let request = ApiRequest::new(Method::Delete, TOKEN_PATH).bearer("token");

        assert_eq!(
            transport.execute(&request).unwrap(),
            json!({"logged_out": true})
        );
    }

    #[test]
    fn test_client_flow_over_http() {
        let (rt, server) = start_server();
        rt.block_on(async {
            Mock::given(method("POST"))
                .and(path(TOKEN_PATH))
                .and(body_string(
                    "client_id=1234&client_secret=secret&code=abc\
                     &redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fcallback",
                ))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": "access",
                    "refresh_token": "refresh",
                    "user": {"id": 42}
                })))
                .mount(&server)
                .await;
            Mock::given(method("DELETE"))
                .and(path(TOKEN_PATH))
                .and(header("authorization", "Bearer access"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .mount(&server)
                .await;
        });

        let config = ClientConfig::new(server.uri())
            .with_client_id("1234")
            .with_client_secret("secret");
        let transport = Arc::new(HttpTransport::for_client(&config).unwrap());
        let mut client = OAuthClient::new(config, transport);

        let response = client
            .exchange_code(Some("abc"), Some("http://localhost:8080/callback"), None)
            .unwrap();

        assert_eq!(response.get("user"), Some(&json!({"id": 42})));
        assert_eq!(client.access_token(), Some("access"));
        assert_eq!(client.refresh_token(), Some("refresh"));
        assert!(!client.logout().unwrap());
    }
}
