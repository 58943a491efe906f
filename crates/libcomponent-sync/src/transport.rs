// SPDX-License-Identifier: MIT OR Apache-2.0

//! capabilities the engine consumes: fetching bytes, unpacking archives and
//! reporting install results back to the host.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use crate::{Component, Config, Error, InstallError, Result, fs_utils};

const USER_AGENT: &str = concat!("component-sync/", env!("CARGO_PKG_VERSION"));
const DOWNLOAD_BUFFER_SIZE: usize = 8192;

/// url -> bytes.
pub trait Transport: Send + Sync {
    /// streams `url` into `dest`, replacing any file already there.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;

    /// fetches a small document fully into memory.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// archive -> directory.
pub trait Extractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// receives one call per install attempt.
pub trait InstallListener: Send + Sync {
    fn on_install_complete(&self, component: &Component, error: Option<&InstallError>);
}

impl<F> InstallListener for F
where
    F: Fn(&Component, Option<&InstallError>) + Send + Sync,
{
    fn on_install_complete(&self, component: &Component, error: Option<&InstallError>) {
        self(component, error)
    }
}

/// listener used when the host registers none.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl InstallListener for LogListener {
    fn on_install_complete(&self, component: &Component, error: Option<&InstallError>) {
        match error {
            None => log::info!(target: "install", "{} installed", component.id),
            Some(e) => log::warn!(target: "install", "{} failed [{}]: {}", component.id, e.tag, e.message),
        }
    }
}

/// unpacks zip archives, flattening a single wrapper folder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NestedZipExtractor;

impl Extractor for NestedZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        fs_utils::extract_nested_archive(archive, dest)
    }
}

/// blocking http transport with bounded request time.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.download_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::download(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::download(format!(
                "http status {} for {url}",
                response.status()
            )));
        }

        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs_utils::ensure_directory_exists(parent)?;
        }

        let mut reader = self.get(url)?;
        let mut file = File::create(dest)?;
        let mut buffer = [0u8; DOWNLOAD_BUFFER_SIZE];
        let mut total = 0usize;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(n) => n,
                Err(e) => {
                    drop(file);
                    fs::remove_file(dest).ok();
                    return Err(Error::download(format!("read error: {e}")));
                }
            };

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])?;
            total += bytes_read;
        }

        file.flush()?;
        log::debug!(target: "download", "{url} -> {} ({total} bytes)", dest.display());
        Ok(())
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url)?;
        let bytes = response
            .bytes()
            .map_err(|e| Error::download(format!("read error: {e}")))?;
        Ok(bytes.to_vec())
    }
}
