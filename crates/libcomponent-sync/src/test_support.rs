// SPDX-License-Identifier: MIT OR Apache-2.0

//! in-memory transport and a temp-dir backed context shared by the unit tests.

use std::{
    collections::HashMap,
    fs,
    io::{Cursor, Write},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;
use zip::write::SimpleFileOptions;

use crate::{
    Component, Config, Engine, Error, ErrorTag, InstallError, InstallListener, NestedZipExtractor,
    PackageInfo, Result, Transport, context::SyncContext,
};

pub(crate) type Events = Arc<Mutex<Vec<(String, Option<ErrorTag>)>>>;

/// serves canned responses keyed by url and counts calls.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    downloads: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn serve_raw(&self, url: &str, body: Vec<u8>) {
        self.responses.lock().insert(url.to_string(), body);
    }

    pub(crate) fn serve_json(&self, url: &str, body: &str) {
        self.serve_raw(url, body.as_bytes().to_vec());
    }

    /// serves a zip built from `files` (name, contents).
    pub(crate) fn serve_package(&self, url: &str, files: &[(&str, &str)]) {
        self.serve_raw(url, build_zip(files));
    }

    pub(crate) fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn response(&self, url: &str) -> Result<Vec<u8>> {
        self.responses
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::download(format!("http status 404 Not Found for {url}")))
    }
}

impl Transport for FakeTransport {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let body = self.response(url)?;
        fs::write(dest, body)?;
        Ok(())
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.response(url)
    }
}

pub(crate) fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, contents) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

pub(crate) fn installable(id: &str, name: &str, identifier: &str, url: &str) -> Component {
    Component::new(id, name).with_package_info(PackageInfo::new(identifier).with_download_url(url))
}

/// a package archive whose manifest declares `version`.
pub(crate) fn package_files(version: &str) -> Vec<(&'static str, String)> {
    vec![
        ("pkg/package.json", format!(r#"{{"version": "{version}"}}"#)),
        ("pkg/index.html", "<html></html>".to_string()),
    ]
}

pub(crate) struct Fixture {
    pub(crate) dir: tempfile::TempDir,
    pub(crate) ctx: SyncContext,
    pub(crate) transport: Arc<FakeTransport>,
    pub(crate) events: Events,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let events: Events = Arc::default();

        let ctx = SyncContext::new(
            Self::config_for(dir.path()),
            transport.clone(),
            Arc::new(NestedZipExtractor),
            recorder(&events),
        );

        Self {
            dir,
            ctx,
            transport,
            events,
        }
    }

    fn config_for(root: &Path) -> Config {
        Config::new().with_root(root)
    }

    pub(crate) fn serve_versioned(&self, url: &str, version: &str) {
        let files = package_files(version);
        let refs: Vec<(&str, &str)> = files.iter().map(|(n, c)| (*n, c.as_str())).collect();
        self.transport.serve_package(url, &refs);
    }

    /// an engine over the same root, transport and listener.
    pub(crate) fn engine(&self) -> Engine {
        self.engine_with(Self::config_for(self.dir.path()))
    }

    pub(crate) fn engine_with(&self, config: Config) -> Engine {
        Engine::builder(config)
            .transport(self.transport.clone())
            .listener(recorder(&self.events))
            .build()
            .unwrap()
    }

    pub(crate) fn events(&self) -> Vec<(String, Option<ErrorTag>)> {
        self.events.lock().clone()
    }
}

fn recorder(events: &Events) -> Arc<dyn InstallListener> {
    let events = Arc::clone(events);
    Arc::new(move |component: &Component, error: Option<&InstallError>| {
        events
            .lock()
            .push((component.id.clone(), error.map(|e| e.tag)));
    })
}
