// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

use parking_lot::{Condvar, Mutex};

use crate::{
    Component, Config, Error, Extractor, HttpTransport, InstallListener, LogListener, Mapping,
    NestedZipExtractor, Paths, Result, SyncTask, Transport, context::SyncContext,
    queue::TaskQueue, sync,
};

const DRAIN_THREAD_NAME: &str = "component-sync";

/// serializes sync requests from the host and reconciles them against disk.
///
/// tasks run one at a time in arrival order on a background thread that is
/// started on demand and exits once the queue is empty.
///
/// ```rust,no_run
/// use libcomponent_sync::{Component, Config, Engine, PackageInfo};
///
/// # fn main() -> libcomponent_sync::Result<()> {
/// let engine = Engine::new(Config::new())?;
/// engine.request_sync(vec![Component::new("abc", "Editor").with_package_info(
///     PackageInfo::new("org.example.editor").with_download_url("https://example.org/editor.zip"),
/// )]);
/// engine.wait_idle();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    ctx: SyncContext,
    queue: Mutex<TaskQueue>,
    idle: Condvar,
}

pub struct EngineBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    extractor: Option<Arc<dyn Extractor>>,
    listener: Option<Arc<dyn InstallListener>>,
}

impl EngineBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn InstallListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// fails only when the default http client cannot be built.
    pub fn build(self) -> Result<Engine> {
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(NestedZipExtractor));
        let listener = self.listener.unwrap_or_else(|| Arc::new(LogListener));

        log::debug!(
            target: "queue",
            "engine rooted at {}",
            self.config.root.display()
        );

        Ok(Engine {
            inner: Arc::new(Inner {
                ctx: SyncContext::new(self.config, transport, extractor, listener),
                queue: Mutex::new(TaskQueue::default()),
                idle: Condvar::new(),
            }),
        })
    }
}

impl Engine {
    /// an engine with the http transport, zip extractor and a logging listener.
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> EngineBuilder {
        EngineBuilder {
            config,
            transport: None,
            extractor: None,
            listener: None,
        }
    }

    /// enqueues one task and returns immediately.
    pub fn request_sync(&self, components: Vec<Component>) {
        self.request_sync_all(std::iter::once(components));
    }

    /// enqueues one task per batch under a single lock, so the drain thread
    /// sees all of them at once. empty batches are ignored.
    pub fn request_sync_all<I>(&self, batches: I)
    where
        I: IntoIterator<Item = Vec<Component>>,
    {
        let start_drain = {
            let mut queue = self.inner.queue.lock();
            for components in batches {
                if components.is_empty() {
                    continue;
                }
                log::debug!(
                    target: "queue",
                    "queued task with {} component{}",
                    components.len(),
                    if components.len() == 1 { "" } else { "s" }
                );
                queue.push(SyncTask::new(components));
            }
            queue.front().is_some() && queue.begin_drain()
        };

        if start_drain {
            self.spawn_drain();
        }
    }

    fn spawn_drain(&self) {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(DRAIN_THREAD_NAME.to_string())
            .spawn(move || inner.drain());

        if let Err(e) = spawned {
            log::warn!(target: "queue", "could not start drain thread ({e}), draining inline");
            self.inner.drain();
        }
    }

    /// blocks until every queued task has run and the drain thread has exited.
    ///
    /// must not be called from an [`InstallListener`], which runs on the drain thread.
    pub fn wait_idle(&self) {
        let mut queue = self.inner.queue.lock();
        while queue.is_draining() || queue.front().is_some() {
            self.inner.idle.wait(&mut queue);
        }
    }

    pub fn is_idle(&self) -> bool {
        let queue = self.inner.queue.lock();
        !queue.is_draining() && queue.front().is_none()
    }

    /// tasks waiting to run, not counting the one in flight.
    pub fn pending_tasks(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// the persisted id -> location mapping.
    pub fn installed(&self) -> Result<Mapping> {
        self.inner.ctx.mapping.read()
    }

    pub fn paths(&self) -> &Paths {
        &self.inner.ctx.paths
    }

    pub fn config(&self) -> &Config {
        &self.inner.ctx.config
    }
}

impl Inner {
    fn drain(&self) {
        loop {
            let next = {
                let mut queue = self.queue.lock();
                let next = queue.pop_front();
                if next.is_none() {
                    queue.end_drain();
                    self.idle.notify_all();
                }
                next
            };

            match next {
                Some(task) => self.run_task(&task),
                None => break,
            }
        }

        log::debug!(target: "queue", "queue drained");
    }

    fn run_task(&self, task: &SyncTask) {
        let max_attempts = self.ctx.config.max_attempts;

        for attempt in 1..=max_attempts {
            if let Some(opposite) = self.queue.lock().take_opposite(task) {
                log::info!(
                    target: "queue",
                    "{} cancelled by a queued {}",
                    describe(task),
                    describe(&opposite)
                );
                return;
            }

            let error = match self.attempt(task) {
                Ok(()) => return,
                Err(e) => e,
            };

            if attempt < max_attempts {
                if error.is_transient() {
                    log::warn!(
                        target: "queue",
                        "{} failed (attempt {attempt}/{max_attempts}), retrying: {error}",
                        describe(task)
                    );
                } else {
                    log::error!(
                        target: "queue",
                        "{} failed (attempt {attempt}/{max_attempts}), retrying: {error}",
                        describe(task)
                    );
                }
            } else {
                log::error!(
                    target: "queue",
                    "{} dropped after {max_attempts} attempts: {error}",
                    describe(task)
                );
            }
        }
    }

    fn attempt(&self, task: &SyncTask) -> Result<()> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            sync::sync_components(&self.ctx, &task.components)
        }))
        .unwrap_or_else(|payload| {
            Err(Error::other(format!(
                "task panicked: {}",
                panic_message(payload.as_ref())
            )))
        })
    }
}

fn describe(task: &SyncTask) -> String {
    match task.single() {
        Some(c) if c.deleted => format!("uninstall of {}", c.id),
        Some(c) => format!("sync of {}", c.id),
        None => format!("batch of {}", task.components.len()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
