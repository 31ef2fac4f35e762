//! Scripted HTTP client shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use hubcache::{
    BoxStream, DownloadOptions, Downloader, HttpClient, Provider, ResponseHead, RetryPolicy,
    StagingLocks, StreamedResponse,
};
use hubcache_verify::Sha256Hasher;

pub const HUB: &str = "https://hub.test";
pub const CDN: &str = "https://cdn.test";

/// Body chunk size of scripted file responses.
pub const CHUNK_SIZE: usize = 4;

#[derive(Debug)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

/// One request the client saw.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

enum GetRoute {
    /// Serves byte ranges unless `ignore_range` is set. Each queued entry
    /// makes one response drop its connection after that many body bytes.
    /// `refusals` ranged requests are answered 416 before ranges are honored.
    File {
        content: Bytes,
        ignore_range: bool,
        refusals: usize,
        drops: VecDeque<usize>,
    },
    Fixed {
        status: u16,
        body: Bytes,
    },
}

#[derive(Default)]
pub struct MockClient {
    heads: Mutex<HashMap<String, ResponseHead>>,
    gets: Mutex<HashMap<String, GetRoute>>,
    requests: Mutex<Vec<Request>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_head(&self, url: &str, head: ResponseHead) -> &Self {
        self.heads.lock().unwrap().insert(url.to_string(), head);
        self
    }

    pub fn on_get(&self, url: &str, status: u16, body: impl Into<Bytes>) -> &Self {
        self.gets.lock().unwrap().insert(
            url.to_string(),
            GetRoute::Fixed {
                status,
                body: body.into(),
            },
        );
        self
    }

    pub fn serve_file(&self, url: &str, content: impl Into<Bytes>) -> &Self {
        self.gets.lock().unwrap().insert(
            url.to_string(),
            GetRoute::File {
                content: content.into(),
                ignore_range: false,
                refusals: 0,
                drops: VecDeque::new(),
            },
        );
        self
    }

    /// Make the route at `url` answer ranged requests with the full body.
    pub fn ignore_range(&self, url: &str) -> &Self {
        if let Some(GetRoute::File { ignore_range, .. }) = self.gets.lock().unwrap().get_mut(url) {
            *ignore_range = true;
        }
        self
    }

    /// Answer the next ranged request to `url` with 416.
    pub fn refuse_range(&self, url: &str) -> &Self {
        if let Some(GetRoute::File { refusals, .. }) = self.gets.lock().unwrap().get_mut(url) {
            *refusals += 1;
        }
        self
    }

    /// The next response from `url` breaks after `after` body bytes.
    pub fn drop_connection(&self, url: &str, after: usize) -> &Self {
        if let Some(GetRoute::File { drops, .. }) = self.gets.lock().unwrap().get_mut(url) {
            drops.push_back(after);
        }
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn gets_to(&self, url: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET" && r.url == url)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record(&self, method: &'static str, url: &str, headers: &[(String, String)]) {
        self.requests.lock().unwrap().push(Request {
            method,
            url: url.to_string(),
            headers: headers.to_vec(),
        });
    }

    fn respond(&self, url: &str, headers: &[(String, String)]) -> StreamedResponse<MockError> {
        let mut gets = self.gets.lock().unwrap();
        let Some(route) = gets.get_mut(url) else {
            return streamed(ResponseHead::new(404), Vec::new());
        };

        match route {
            GetRoute::Fixed { status, body } => {
                streamed(ResponseHead::new(*status), vec![Ok(body.clone())])
            }
            GetRoute::File {
                content,
                ignore_range,
                refusals,
                drops,
            } => {
                let range = headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("range"))
                    .and_then(|(_, v)| v.strip_prefix("bytes="))
                    .and_then(|v| v.strip_suffix('-'))
                    .and_then(|v| v.parse::<usize>().ok());

                let (status, body) = match range {
                    Some(_) if *ignore_range => (200, content.clone()),
                    Some(_) if *refusals > 0 => {
                        *refusals -= 1;
                        return streamed(ResponseHead::new(416), Vec::new());
                    }
                    Some(start) if start >= content.len() => {
                        return streamed(ResponseHead::new(416), Vec::new());
                    }
                    Some(start) => (206, content.slice(start..)),
                    None => (200, content.clone()),
                };
                let head = ResponseHead::new(status)
                    .with_header("content-length", body.len().to_string());

                let cut = drops.pop_front();
                let mut chunks: Vec<Result<Bytes, MockError>> = Vec::new();
                let mut sent = 0;
                for chunk in body.chunks(CHUNK_SIZE) {
                    if let Some(cut) = cut {
                        if sent + chunk.len() > cut {
                            let keep = cut - sent;
                            if keep > 0 {
                                chunks.push(Ok(Bytes::copy_from_slice(&chunk[..keep])));
                            }
                            chunks.push(Err(MockError("connection reset".into())));
                            break;
                        }
                    }
                    sent += chunk.len();
                    chunks.push(Ok(Bytes::copy_from_slice(chunk)));
                }
                streamed(head, chunks)
            }
        }
    }
}

fn streamed(head: ResponseHead, chunks: Vec<Result<Bytes, MockError>>) -> StreamedResponse<MockError> {
    let body: BoxStream<'static, Result<Bytes, MockError>> =
        Box::pin(futures_util::stream::iter(chunks));
    StreamedResponse { head, body }
}

impl HttpClient for MockClient {
    type Error = MockError;

    fn head(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<ResponseHead, Self::Error>> + Send {
        self.record("HEAD", url, headers);
        let head = self
            .heads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| ResponseHead::new(404));
        async move { Ok(head) }
    }

    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<StreamedResponse<Self::Error>, Self::Error>> + Send {
        self.record("GET", url, headers);
        let response = self.respond(url, headers);
        async move { Ok(response) }
    }
}

/// Lower-case hex SHA-256 of `content`.
pub fn sha256(content: &[u8]) -> String {
    hex::encode(Sha256Hasher::digest(content))
}

pub fn resolve_url(repo: &str, revision: &str, path: &str) -> String {
    format!("{HUB}/{repo}/resolve/{revision}/{path}")
}

pub fn listing_url(repo: &str, revision: &str) -> String {
    format!("{HUB}/api/models/{repo}/revision/{revision}?blobs=true")
}

pub fn cdn_url(hash: &str) -> String {
    format!("{CDN}/blobs/{hash}")
}

/// Script a HuggingFace-style file: a redirect carrying the linked headers,
/// and the content behind it.
pub fn hf_file(client: &MockClient, repo: &str, revision: &str, path: &str, hash: &str, content: &[u8]) {
    client.on_head(
        &resolve_url(repo, revision, path),
        ResponseHead::new(302)
            .with_header("Location", cdn_url(hash))
            .with_header("X-Linked-Etag", format!("\"{hash}\""))
            .with_header("X-Linked-Size", content.len().to_string())
            .with_header("X-Repo-Commit", "c0ffee"),
    );
    client.serve_file(&cdn_url(hash), content.to_vec());
}

/// Script a listing with `(path, size)` entries.
pub fn hf_listing(client: &MockClient, repo: &str, revision: &str, files: &[(&str, u64)]) {
    let siblings: Vec<serde_json::Value> = files
        .iter()
        .map(|(path, size)| serde_json::json!({ "rfilename": path, "size": size }))
        .collect();
    let body = serde_json::json!({ "sha": "c0ffee", "siblings": siblings }).to_string();
    client.on_get(&listing_url(repo, revision), 200, body);
}

/// `<root>/<repo-folder>/blobs` entries, staging files excluded.
pub fn blobs(root: &Path, folder: &str) -> Vec<String> {
    let dir = root.join(folder).join("blobs");
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| !n.ends_with(".incomplete"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Three attempts, no waiting between them.
pub fn fast_options() -> DownloadOptions {
    DownloadOptions::default().retry(RetryPolicy::default().delay(Duration::ZERO))
}

/// A HuggingFace downloader against the scripted hub, with its own locks.
pub fn downloader(root: &Path, client: MockClient, options: DownloadOptions) -> Downloader<MockClient> {
    let adapter = Provider::HuggingFace.adapter_at(HUB).unwrap();
    Downloader::with_client(client, root, adapter, options).with_locks(StagingLocks::new())
}
