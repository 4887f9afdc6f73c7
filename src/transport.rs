//! HTTP transport for the mailbox API.
//!
//! The [`Transport`] trait is the seam between the pipeline and the network.
//! [`HttpTransport`] implements it with reqwest: JSON requests are retried
//! with exponential backoff, redirect resolution is a single attempt.

use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect, Method, StatusCode, Url};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENT_VALUE: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Safari/537.36";

/// Maximum number of response body characters kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Maximum redirects followed when resolving a link.
const MAX_REDIRECTS: usize = 10;

/// Network operations consumed by the pipeline.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and decodes the JSON body of a 200 response.
    ///
    /// Implementations retry transient failures internally; an error means
    /// the request is given up.
    async fn request_json(
        &self,
        method: Method,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value>;

    /// Follows redirects from `url` and returns the final URL.
    async fn resolve_redirects(&self, url: &str) -> Result<String>;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Builds a transport honoring the proxy, timeout and retry settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy is rejected or the client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(default_headers());

        if let Some(proxy) = &config.proxy {
            debug!(proxy = %proxy, "Routing requests through proxy");
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        let http = builder.build().map_err(|source| Error::InvalidConfig {
            message: format!("failed to build HTTP client: {source}"),
        })?;

        Ok(Self {
            http,
            retry: config.retry.clone(),
        })
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut request = self.http.request(method, url.clone());
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;

        if status != StatusCode::OK {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(name = "HttpTransport::request_json", skip(self, bearer), fields(url = %url))]
    async fn request_json(
        &self,
        method: Method,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value> {
        with_retry(&self.retry, url.as_str(), || {
            self.send_once(method.clone(), url, bearer)
        })
        .await
    }

    #[instrument(name = "HttpTransport::resolve_redirects", skip(self))]
    async fn resolve_redirects(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;

        let final_url = response.url().to_string();
        debug!(final_url = %final_url, status = response.status().as_u16(), "Resolved redirects");
        Ok(final_url)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}

/// Runs `op` until it succeeds, fails permanently, or the attempt budget is spent.
///
/// Failed attempt `n` (zero-based) is followed by a sleep of
/// [`RetryConfig::delay_for(n)`](RetryConfig::delay_for) unless it was the last one.
pub(crate) async fn with_retry<T, F, Fut>(retry: &RetryConfig, url: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = retry.max_retries.max(1);
    let mut attempt = 0;

    loop {
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        attempt += 1;

        warn!(
            attempt,
            max_attempts,
            error = %error,
            category = %error.category(),
            "Request failed"
        );

        if !error.is_retryable() || attempt >= max_attempts {
            return Err(Error::RetriesExhausted {
                url: url.to_string(),
                attempts: attempt,
                last: Box::new(error),
            });
        }

        let delay: Duration = retry.delay_for(attempt - 1);
        debug!(delay_ms = delay.as_millis(), "Backing off before retry");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted in-memory transport for pipeline tests.

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// A recorded request.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Call {
        pub method: Method,
        pub path: String,
        pub bearer: Option<String>,
    }

    /// Replies are queued per path; the last reply of a queue repeats forever.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<HashMap<String, VecDeque<Result<serde_json::Value>>>>,
        redirects: Mutex<HashMap<String, Result<String>>>,
        calls: Mutex<Vec<Call>>,
        resolved: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(self, path: &str, body: serde_json::Value) -> Self {
            self.push(path, Ok(body));
            self
        }

        pub(crate) fn fail(self, path: &str) -> Self {
            self.push(
                path,
                Err(Error::RetriesExhausted {
                    url: path.to_string(),
                    attempts: 3,
                    last: Box::new(Error::HttpStatus {
                        url: path.to_string(),
                        status: 502,
                        body: "bad gateway".into(),
                    }),
                }),
            );
            self
        }

        pub(crate) fn redirect(self, from: &str, to: &str) -> Self {
            self.redirects
                .lock()
                .unwrap()
                .insert(from.to_string(), Ok(to.to_string()));
            self
        }

        pub(crate) fn redirect_fails(self, from: &str) -> Self {
            self.redirects.lock().unwrap().insert(
                from.to_string(),
                Err(Error::InvalidUrl {
                    url: from.to_string(),
                }),
            );
            self
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn calls_to(&self, path: &str) -> usize {
            self.calls().iter().filter(|call| call.path == path).count()
        }

        pub(crate) fn resolved(&self) -> Vec<String> {
            self.resolved.lock().unwrap().clone()
        }

        fn push(&self, path: &str, reply: Result<serde_json::Value>) {
            self.replies
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(reply);
        }

        fn clone_reply(reply: &Result<serde_json::Value>) -> Result<serde_json::Value> {
            match reply {
                Ok(value) => Ok(value.clone()),
                Err(error) => Err(Error::RetriesExhausted {
                    url: error.to_string(),
                    attempts: 3,
                    last: Box::new(Error::InvalidConfig {
                        message: "scripted failure".into(),
                    }),
                }),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn request_json(
            &self,
            method: Method,
            url: &Url,
            bearer: Option<&str>,
        ) -> Result<serde_json::Value> {
            let path = url.path().to_string();
            self.calls.lock().unwrap().push(Call {
                method,
                path: path.clone(),
                bearer: bearer.map(String::from),
            });

            let mut replies = self.replies.lock().unwrap();
            let queue = replies.get_mut(&path).ok_or_else(|| Error::HttpStatus {
                url: url.to_string(),
                status: 404,
                body: "not scripted".into(),
            })?;

            let reply = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().map(Self::clone_reply)
            };
            reply.unwrap_or_else(|| {
                Err(Error::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                    body: "no replies left".into(),
                })
            })
        }

        async fn resolve_redirects(&self, url: &str) -> Result<String> {
            self.resolved.lock().unwrap().push(url.to_string());
            match self.redirects.lock().unwrap().get(url) {
                Some(Ok(target)) => Ok(target.clone()),
                Some(Err(_)) | None => Err(Error::InvalidUrl {
                    url: url.to_string(),
                }),
            }
        }
    }
}
