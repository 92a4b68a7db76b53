use actix::prelude::*;
use notify::{Event, RecommendedWatcher, RecursiveMode, Result, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::actors::document::{DocumentActor, ReloadCatalog, ReloadDocument};

/// Which served file an event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Changed {
    Wizard,
    Catalog,
}

/// Watches the directories holding the wizard document and the catalog
/// and asks the document actor to reload whichever changed.
pub struct FileWatcherActor {
    document_addr: Addr<DocumentActor>,
    wizard_path: PathBuf,
    catalog_path: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl FileWatcherActor {
    pub fn new(document_addr: Addr<DocumentActor>, wizard_path: PathBuf, catalog_path: PathBuf) -> Self {
        Self {
            document_addr,
            wizard_path,
            catalog_path,
            watcher: None,
        }
    }
}

fn file_name(path: &Path) -> Option<OsString> {
    path.file_name().map(|n| n.to_os_string())
}

fn watched_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn classify(event: &Event, wizard: Option<&OsString>, catalog: Option<&OsString>) -> Vec<Changed> {
    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
        return Vec::new();
    }
    let mut changed = Vec::new();
    for path in &event.paths {
        let name = path.file_name().map(|n| n.to_os_string());
        if name.is_some() && name.as_ref() == wizard && !changed.contains(&Changed::Wizard) {
            changed.push(Changed::Wizard);
        }
        if name.is_some() && name.as_ref() == catalog && !changed.contains(&Changed::Catalog) {
            changed.push(Changed::Catalog);
        }
    }
    changed
}

impl Actor for FileWatcherActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        log::debug!("File watcher is up and running!");

        let document_addr = self.document_addr.clone();
        let wizard_name = file_name(&self.wizard_path);
        let catalog_name = file_name(&self.catalog_path);

        let mut watcher = match notify::recommended_watcher(move |res: Result<Event>| match res {
            Ok(event) => {
                for changed in classify(&event, wizard_name.as_ref(), catalog_name.as_ref()) {
                    log::debug!("Detected a change in: {:?}", event.paths);
                    match changed {
                        Changed::Wizard => document_addr.do_send(ReloadDocument),
                        Changed::Catalog => document_addr.do_send(ReloadCatalog),
                    }
                }
            }
            Err(e) => log::error!("File watch error: {:?}", e),
        }) {
            Ok(watcher) => watcher,
            Err(e) => {
                log::error!("Could not create the file watcher: {:?}. Hot reload is disabled.", e);
                ctx.stop();
                return;
            }
        };

        let mut dirs = vec![watched_dir(&self.wizard_path)];
        let catalog_dir = watched_dir(&self.catalog_path);
        if !dirs.contains(&catalog_dir) {
            dirs.push(catalog_dir);
        }
        for dir in dirs {
            if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                log::error!("Could not watch {}: {:?}", dir.display(), e);
            }
        }

        self.watcher = Some(watcher);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        log::debug!("File watcher is shutting down.");
        Running::Stop
    }
}
