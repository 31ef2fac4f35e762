use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line and headers of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }
}

/// A response whose body has not been read yet.
pub struct StreamedResponse<E> {
    pub head: ResponseHead,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations report what the server said; they never turn a status
/// code into an error. `Err` means no usable response arrived at all.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - scripted clients in tests
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a HEAD request. Redirects must NOT be followed: the caller reads
    /// provider headers off the redirect itself.
    fn head(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<ResponseHead, Self::Error>> + Send;

    /// Send a GET request, following redirects, and stream the body.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<StreamedResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use reqwest::redirect::Policy;

    use super::*;
    use crate::data::Timeouts;
    use crate::error::{Error, Result};

    /// Production HTTP client implementation using reqwest.
    ///
    /// Holds two connection pools: probes never follow redirects, transfers
    /// do.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        probe: reqwest::Client,
        transfer: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new(timeouts: Timeouts) -> Result<Self> {
            let build = |policy: Policy| {
                reqwest::Client::builder()
                    .connect_timeout(timeouts.connect)
                    .read_timeout(timeouts.read)
                    .redirect(policy)
                    .build()
                    .map_err(|e| Error::Terminal(format!("failed to build HTTP client: {e}")))
            };
            Ok(Self {
                probe: build(Policy::none())?,
                transfer: build(Policy::default())?,
            })
        }

        fn request(
            client: &reqwest::Client,
            method: reqwest::Method,
            url: &str,
            headers: &[(String, String)],
        ) -> reqwest::RequestBuilder {
            // Compressed bodies would break range offsets and content hashes.
            let mut request = client
                .request(method, url)
                .header(reqwest::header::ACCEPT_ENCODING, "identity");
            for (key, value) in headers {
                request = request.header(key, value);
            }
            request
        }
    }

    fn head_of(response: &reqwest::Response) -> ResponseHead {
        ResponseHead {
            status: response.status().as_u16(),
            headers: response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect(),
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn head(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<ResponseHead, Self::Error> {
            let response = Self::request(&self.probe, reqwest::Method::HEAD, url, headers)
                .send()
                .await?;
            Ok(head_of(&response))
        }

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<StreamedResponse<Self::Error>, Self::Error> {
            let response = Self::request(&self.transfer, reqwest::Method::GET, url, headers)
                .send()
                .await?;
            Ok(StreamedResponse {
                head: head_of(&response),
                body: Box::pin(response.bytes_stream()),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
