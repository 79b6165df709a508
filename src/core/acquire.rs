use crate::core::reference::REFERENCE_FILE;
use crate::core::registration::REGISTRATION_FILE;
use crate::domain::model::SourceFiles;
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Duration;
use zip::result::ZipError;
use zip::ZipArchive;

pub const DEFAULT_DATABASE_URL: &str = "https://registry.faa.gov/database/ReleasableAircraft.zip";

/// Upper bound for one extracted member. The registry's `MASTER.txt` is a few
/// hundred megabytes uncompressed.
pub const MAX_MEMBER_SIZE: u64 = 2 << 30;

const PREALLOC_LIMIT: u64 = 64 << 20;

/// The registry rejects requests that do not look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// Downloads the registry archive with a single GET. No retries.
pub async fn download_archive(
    client: &Client,
    url: &str,
    user_agent: &str,
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    tracing::info!("Downloading {}", url);

    let mut request = client.get(url).header(USER_AGENT, user_agent);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let fetch_error = |source| EtlError::FetchError {
        url: url.to_string(),
        source,
    };

    let mut response = request.send().await.map_err(fetch_error)?;
    tracing::debug!("Registry response status: {}", response.status());

    if !response.status().is_success() {
        return Err(EtlError::FetchStatusError {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length();
    match total {
        Some(length) => tracing::info!("Archive size: {} bytes", length),
        None => tracing::info!("Archive size not reported by the server"),
    }

    let mut body = Vec::with_capacity(total.unwrap_or(0).min(PREALLOC_LIMIT) as usize);
    let mut progress = DownloadProgress::new(total);
    while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
        body.extend_from_slice(&chunk);
        if let Some(percent) = progress.advance(chunk.len() as u64) {
            tracing::info!("Downloaded {}% ({} bytes)", percent, progress.received());
        }
    }

    tracing::info!("Downloaded {} bytes", body.len());
    Ok(body)
}

/// Tracks received bytes and reports each new 10% step of a known length.
#[derive(Debug)]
struct DownloadProgress {
    total: Option<u64>,
    received: u64,
    last_step: u64,
}

impl DownloadProgress {
    fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|&total| total > 0),
            received: 0,
            last_step: 0,
        }
    }

    fn received(&self) -> u64 {
        self.received
    }

    fn advance(&mut self, bytes: u64) -> Option<u64> {
        self.received += bytes;
        let total = self.total?;
        let step = (self.received.min(total) * 10 / total).min(10);
        if step > self.last_step {
            self.last_step = step;
            Some(step * 10)
        } else {
            None
        }
    }
}

/// Pulls `MASTER.txt` and `ACFTREF.txt` out of the registry archive.
pub fn extract_sources(archive: &[u8]) -> Result<SourceFiles> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    tracing::debug!("Archive contains {} entries", zip.len());

    let registration = read_member(&mut zip, REGISTRATION_FILE)?;
    let reference = read_member(&mut zip, REFERENCE_FILE)?;

    Ok(SourceFiles {
        registration,
        reference,
    })
}

fn read_member<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut member = match zip.by_name(name) {
        Ok(member) => member,
        Err(ZipError::FileNotFound) => {
            return Err(EtlError::ArchiveError {
                message: format!("{} not found in database zip file", name),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let declared = member.size();
    if declared > MAX_MEMBER_SIZE {
        return Err(EtlError::ArchiveError {
            message: format!("{} declares {} bytes, more than the supported maximum", name, declared),
        });
    }

    // 宣告的大小不可信，讀取時仍需設上限
    let mut data = Vec::with_capacity(declared.min(PREALLOC_LIMIT) as usize);
    (&mut member)
        .take(MAX_MEMBER_SIZE + 1)
        .read_to_end(&mut data)
        .map_err(|e| EtlError::ArchiveError {
            message: format!("failed to extract {}: {}", name, e),
        })?;

    if data.len() as u64 > MAX_MEMBER_SIZE {
        return Err(EtlError::ArchiveError {
            message: format!("{} is larger than the supported maximum", name),
        });
    }

    tracing::debug!("Extracted {} ({} bytes)", name, data.len());
    Ok(data)
}

pub async fn read_local_sources<S: Storage>(
    storage: &S,
    registration: &Path,
    reference: &Path,
) -> Result<SourceFiles> {
    tracing::info!(
        "Reading {} and {}",
        registration.display(),
        reference.display()
    );

    Ok(SourceFiles {
        registration: storage.read_file(registration).await?,
        reference: storage.read_file(reference).await?,
    })
}
