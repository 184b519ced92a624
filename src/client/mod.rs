use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::Config;
use crate::error::{DriverError, Result};

/// Narrow transport seam to the chassis management API.
///
/// Implementations return the decoded JSON body (an empty object for 204) or
/// a typed error; they never retry.
#[async_trait]
pub trait ChassisClient: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value>;
    async fn put_json(&self, path: &str, body: Value) -> Result<Value>;
    async fn post_json(&self, path: &str, body: Value) -> Result<Value>;
}

/// reqwest-backed client for the chassis HTTPS API
pub struct HttpChassisClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
}

impl HttpChassisClient {
    /// Build a client for `address` (`host[:port]`, port defaulting per
    /// config). Credentials are sent as basic auth on every request.
    pub fn connect(address: &str, username: &str, password: &str, config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(address, config.default_port),
            username: username.to_string(),
            password: password.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Object(Default::default()));
        }
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(rejection_from(status.as_u16(), &body))
    }
}

#[async_trait]
impl ChassisClient for HttpChassisClient {
    async fn get_json(&self, path: &str) -> Result<Value> {
        tracing::debug!("GET {}", path);
        let resp = self
            .client
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        Self::handle(resp).await
    }

    async fn put_json(&self, path: &str, body: Value) -> Result<Value> {
        tracing::debug!("PUT {} body={}", path, body);
        let resp = self
            .client
            .put(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;
        Self::handle(resp).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        tracing::debug!("POST {} body={}", path, body);
        let resp = self
            .client
            .post(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;
        Self::handle(resp).await
    }
}

/// Normalize a device address to a base URL. A trailing `:<digits>` segment
/// is taken as the port; anything else (including the colon inside an
/// `https://` prefix) leaves the address intact and applies the default.
pub(crate) fn normalize_base_url(address: &str, default_port: u16) -> String {
    let (host, port) = match address.rsplit_once(':') {
        Some((head, tail)) => match tail.parse::<u16>() {
            Ok(port) => (head, port),
            Err(_) => (address, default_port),
        },
        None => (address, default_port),
    };
    let prefix = if host.contains("https://") { "" } else { "https://" };
    format!("{}{}:{}", prefix, host, port)
}

/// Map a non-2xx response to the error taxonomy: a structured
/// `{"Error": ...}` body wins, otherwise the bare status is surfaced.
pub(crate) fn rejection_from(status: u16, body: &str) -> DriverError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        #[serde(rename = "Error")]
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            tracing::error!("chassis error: {}", parsed.error);
            DriverError::DeviceRejected(parsed.error)
        }
        Err(_) => DriverError::TransportStatus(status),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub method: &'static str,
        pub path: String,
        pub body: Option<Value>,
    }

    /// Scripted in-memory ChassisClient. Responses are queued per
    /// (method, path) and every request is recorded for assertions.
    #[derive(Default)]
    pub(crate) struct MockClient {
        responses: Mutex<HashMap<(String, String), VecDeque<Value>>>,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl MockClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, method: &str, path: &str, body: Value) {
            self.responses
                .lock()
                .unwrap()
                .entry((method.to_string(), path.to_string()))
                .or_default()
                .push_back(body);
        }

        pub fn recorded(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }

        fn take(&self, method: &'static str, path: &str, body: Option<Value>) -> Result<Value> {
            self.requests.lock().unwrap().push(Recorded {
                method,
                path: path.to_string(),
                body,
            });
            let response = self
                .responses
                .lock()
                .unwrap()
                .get_mut(&(method.to_string(), path.to_string()))
                .and_then(|queue| queue.pop_front());
            match response {
                Some(value) => Ok(value),
                None => panic!("no scripted response for {} {}", method, path),
            }
        }
    }

    #[async_trait]
    impl ChassisClient for MockClient {
        async fn get_json(&self, path: &str) -> Result<Value> {
            self.take("GET", path, None)
        }

        async fn put_json(&self, path: &str, body: Value) -> Result<Value> {
            self.take("PUT", path, Some(body))
        }

        async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
            self.take("POST", path, Some(body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_port() {
        assert_eq!(
            normalize_base_url("192.168.42.240", 8443),
            "https://192.168.42.240:8443"
        );
    }

    #[test]
    fn base_url_explicit_port() {
        assert_eq!(
            normalize_base_url("10.0.0.1:9443", 8443),
            "https://10.0.0.1:9443"
        );
    }

    #[test]
    fn base_url_keeps_scheme() {
        assert_eq!(
            normalize_base_url("https://cf.lab", 8443),
            "https://cf.lab:8443"
        );
    }

    #[test]
    fn structured_error_body_is_device_rejection() {
        match rejection_from(409, r#"{"Error": "port busy"}"#) {
            DriverError::DeviceRejected(msg) => assert_eq!(msg, "port busy"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unparseable_error_body_is_transport_status() {
        match rejection_from(500, "<html>boom</html>") {
            DriverError::TransportStatus(status) => assert_eq!(status, 500),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
