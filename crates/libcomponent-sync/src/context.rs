// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use crate::{
    Config, Extractor, InstallListener, MappingStore, Paths, Transport,
};

/// everything an install, update or uninstall needs, shared by the drain thread.
pub(crate) struct SyncContext {
    pub(crate) config: Config,
    pub(crate) paths: Paths,
    pub(crate) mapping: MappingStore,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) extractor: Arc<dyn Extractor>,
    pub(crate) listener: Arc<dyn InstallListener>,
}

impl SyncContext {
    pub(crate) fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn Extractor>,
        listener: Arc<dyn InstallListener>,
    ) -> Self {
        let paths = Paths::new(config.root.clone());
        let mapping = MappingStore::new(paths.mapping_file_path());

        Self {
            config,
            paths,
            mapping,
            transport,
            extractor,
            listener,
        }
    }
}
