use tracing::{debug, trace};

use super::http::{HttpClient, ResponseHead};
use crate::core::{is_redirect, is_success, normalize_hash, resolve_location};
use crate::data::{FileEntry, FileMetadata};
use crate::error::{Error, Result};
use crate::provider::MetadataHeaders;

/// Redirect hops followed before a probe gives up.
const MAX_REDIRECTS: usize = 5;

/// Probes a remote file for size, hash, location and commit without
/// transferring its body.
pub struct MetadataResolver<'a, C> {
    client: &'a C,
    names: MetadataHeaders,
    headers: &'a [(String, String)],
}

#[derive(Default)]
struct Found {
    hash: Option<String>,
    size: Option<u64>,
    revision: Option<String>,
}

impl Found {
    fn complete(&self) -> bool {
        self.hash.is_some() && self.size.is_some()
    }

    /// Provider headers win over anything learned later in the chain.
    fn absorb_provider(&mut self, names: MetadataHeaders, head: &ResponseHead) {
        let read = |name: Option<&str>| name.and_then(|n| head.header(n)).map(str::to_string);
        if self.hash.is_none() {
            self.hash = read(names.hash);
        }
        if self.size.is_none() {
            self.size = read(names.size).and_then(|s| s.trim().parse().ok());
        }
        if self.revision.is_none() {
            self.revision = read(names.revision);
        }
    }
}

impl<'a, C: HttpClient> MetadataResolver<'a, C> {
    pub fn new(client: &'a C, names: MetadataHeaders, headers: &'a [(String, String)]) -> Self {
        Self {
            client,
            names,
            headers,
        }
    }

    /// Resolve `url`.
    ///
    /// `hint` is the listing entry for the file, when there is one; its hash
    /// and size rank below provider headers but above `ETag` and
    /// `Content-Length`. The revision id is only set when the provider names
    /// a commit.
    pub async fn resolve(&self, url: &str, hint: Option<&FileEntry>) -> Result<FileMetadata> {
        let mut found = Found::default();
        let mut location = url.to_string();

        for _ in 0..=MAX_REDIRECTS {
            let head = self
                .client
                .head(&location, self.headers)
                .await
                .map_err(|e| Error::Unreachable(format!("{location}: {e}")))?;
            trace!(url = %location, status = head.status, "metadata probe");

            found.absorb_provider(self.names, &head);
            if is_redirect(head.status) {
                let target = head.header("location").ok_or_else(|| {
                    Error::InvalidResponse(format!(
                        "{location}: redirect {} without Location",
                        head.status
                    ))
                })?;
                location = resolve_location(&location, target)?;
                if found.complete() {
                    return self.finish(found, location);
                }
                continue;
            }

            if (400..500).contains(&head.status) {
                return Err(Error::NotFound {
                    url: location,
                    status: head.status,
                });
            }
            if !is_success(head.status) {
                return Err(Error::Unreachable(format!(
                    "{location}: server answered {}",
                    head.status
                )));
            }

            if let Some(hint) = hint {
                if found.hash.is_none() {
                    found.hash = hint.content_hash.clone();
                }
                if found.size.is_none() && hint.expected_size > 0 {
                    found.size = Some(hint.expected_size);
                }
            }
            if found.hash.is_none() {
                found.hash = head.header("etag").map(str::to_string);
            }
            if found.size.is_none() {
                found.size = head.content_length();
            }
            return self.finish(found, location);
        }

        Err(Error::InvalidResponse(format!(
            "{url}: more than {MAX_REDIRECTS} redirects"
        )))
    }

    fn finish(&self, found: Found, location: String) -> Result<FileMetadata> {
        let raw_hash = found
            .hash
            .ok_or_else(|| Error::InvalidResponse(format!("{location}: no content hash")))?;
        let size = found
            .size
            .ok_or_else(|| Error::InvalidResponse(format!("{location}: no content size")))?;
        let metadata = FileMetadata {
            content_hash: normalize_hash(&raw_hash)?,
            size,
            revision_id: found.revision,
            location,
        };
        debug!(
            url = %metadata.location,
            hash = %metadata.content_hash,
            size = metadata.size,
            "metadata resolved"
        );
        Ok(metadata)
    }
}
