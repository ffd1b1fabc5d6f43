//! WebDAV implementation of [`RemoteTransport`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use super::propfind::{parse_multistatus, PROPFIND_BODY};
use super::retry::{with_retry, RetryPolicy};
use super::{RemoteEntry, RemoteError, RemoteResult, RemoteTransport};
use crate::config::{SyncConfig, WebDavConfig};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// A fully read HTTP response.
///
/// Bodies are consumed inside the retried attempt so an interrupted download
/// is retried like any other transport failure.
struct Reply {
    status: StatusCode,
    body: Vec<u8>,
}

/// WebDAV client speaking `PROPFIND`, `MKCOL`, `GET`, `PUT` and `DELETE` with
/// HTTP Basic credentials.
#[derive(Clone)]
pub struct WebDavClient {
    client: Client,
    base_url: String,
    /// Decoded path component of `base_url`, used to recognise self-entries
    base_path: String,
    username: String,
    password: String,
    retry: RetryPolicy,
    propfind: Method,
    mkcol: Method,
}

impl WebDavClient {
    /// Build a client for a WebDAV endpoint with a per-request timeout.
    pub fn new(config: &WebDavConfig, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| RemoteError::ClientBuild(error.to_string()))?;

        let base_url = config.url.trim_end_matches('/').to_string();
        let base_path = reqwest::Url::parse(&base_url)
            .map_err(|error| RemoteError::ClientBuild(format!("invalid base URL: {error}")))
            .map(|url| {
                urlencoding::decode(url.path())
                    .map_or_else(|_| url.path().to_string(), |path| path.into_owned())
            })?;

        Ok(Self {
            client,
            base_url,
            base_path: base_path.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            retry: RetryPolicy::default(),
            propfind: dav_method("PROPFIND")?,
            mkcol: dav_method("MKCOL")?,
        })
    }

    /// Build a client from a full sync configuration, including its retry policy.
    pub fn from_config(config: &SyncConfig) -> RemoteResult<Self> {
        Ok(Self::new(&config.webdav, config.timeout)?.with_retry_policy(config.retry))
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, collection: bool) -> String {
        let encoded = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let mut url = format!("{}/{encoded}", self.base_url);
        if collection && !url.ends_with('/') {
            url.push('/');
        }
        url
    }

    fn request_path(&self, path: &str) -> String {
        format!("{}/{}", self.base_path, path.trim_matches('/'))
    }

    /// Send one logical request, retrying transient failures.
    ///
    /// 401 and 5xx are turned into errors here; every other status is handed
    /// back so the caller can apply operation-specific rules.
    async fn send(
        &self,
        method: &Method,
        path: &str,
        collection: bool,
        depth: Option<&'static str>,
        body: Option<(&'static str, &[u8])>,
    ) -> RemoteResult<Reply> {
        let url = &self.url(path, collection);
        let operation = format!("{method} {path}");

        with_retry(&self.retry, &operation, move || async move {
            debug!(%method, url = %url, "WebDAV request");

            let mut request = self
                .client
                .request(method.clone(), url.as_str())
                .basic_auth(&self.username, Some(&self.password));
            if let Some(depth) = depth {
                request = request.header("Depth", depth);
            }
            if let Some((content_type, bytes)) = body {
                request = request
                    .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
                    .body(bytes.to_vec());
            }

            let response = request
                .send()
                .await
                .map_err(|error| RemoteError::transport(method, path, &error))?;
            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status.is_server_error() {
                return Err(RemoteError::from_status(method, path, status));
            }

            let body = response
                .bytes()
                .await
                .map_err(|error| RemoteError::transport(method, path, &error))?;
            debug!(%method, url = %url, status = status.as_u16(), "WebDAV response");

            Ok(Reply {
                status,
                body: body.to_vec(),
            })
        })
        .await
    }

    async fn expect_success(
        &self,
        method: &Method,
        path: &str,
        body: Option<(&'static str, &[u8])>,
    ) -> RemoteResult<Vec<u8>> {
        let reply = self.send(method, path, false, None, body).await?;
        if reply.status.is_success() {
            Ok(reply.body)
        } else {
            Err(RemoteError::from_status(method, path, reply.status))
        }
    }
}

#[async_trait]
impl RemoteTransport for WebDavClient {
    async fn exists(&self, path: &str) -> bool {
        match self.send(&self.propfind, path, false, Some("0"), None).await {
            Ok(reply) => reply.status.is_success(),
            Err(error) => {
                debug!(path, %error, "Existence check failed; treating as absent");
                false
            }
        }
    }

    async fn ensure_collection(&self, path: &str) -> RemoteResult<()> {
        let reply = self.send(&self.mkcol, path, true, None, None).await?;
        // 405: the collection already exists.
        if reply.status.is_success() || reply.status == StatusCode::METHOD_NOT_ALLOWED {
            Ok(())
        } else {
            Err(RemoteError::from_status(&self.mkcol, path, reply.status))
        }
    }

    async fn list_entries(&self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let reply = self
            .send(
                &self.propfind,
                path,
                true,
                Some("1"),
                Some((XML_CONTENT_TYPE, PROPFIND_BODY.as_bytes())),
            )
            .await?;
        if !reply.status.is_success() {
            return Err(RemoteError::from_status(&self.propfind, path, reply.status));
        }

        let body = String::from_utf8(reply.body).map_err(|_| RemoteError::InvalidResponse {
            path: path.to_string(),
            message: "listing is not valid UTF-8".to_string(),
        })?;
        parse_multistatus(&body, &self.request_path(path)).map_err(|message| {
            RemoteError::InvalidResponse {
                path: path.to_string(),
                message,
            }
        })
    }

    async fn get_text(&self, path: &str) -> RemoteResult<String> {
        let body = self.expect_success(&Method::GET, path, None).await?;
        String::from_utf8(body).map_err(|_| RemoteError::InvalidResponse {
            path: path.to_string(),
            message: "body is not valid UTF-8".to_string(),
        })
    }

    async fn put_text(&self, path: &str, body: &str) -> RemoteResult<()> {
        self.expect_success(&Method::PUT, path, Some((JSON_CONTENT_TYPE, body.as_bytes())))
            .await
            .map(drop)
    }

    async fn get_binary(&self, path: &str) -> RemoteResult<Vec<u8>> {
        self.expect_success(&Method::GET, path, None).await
    }

    async fn put_binary(&self, path: &str, body: &[u8]) -> RemoteResult<()> {
        self.expect_success(&Method::PUT, path, Some((BINARY_CONTENT_TYPE, body)))
            .await
            .map(drop)
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        let reply = self.send(&Method::DELETE, path, false, None, None).await?;
        if reply.status.is_success() || reply.status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(RemoteError::from_status(&Method::DELETE, path, reply.status))
        }
    }
}

impl fmt::Debug for WebDavClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn dav_method(name: &'static str) -> RemoteResult<Method> {
    Method::from_bytes(name.as_bytes())
        .map_err(|error| RemoteError::ClientBuild(format!("invalid method {name}: {error}")))
}
