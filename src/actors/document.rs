use actix::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::Catalog;
use crate::errors::WizardError;
use crate::wizard::loader;
use crate::wizard::WizardDocument;

/// Holds the wizard document and the content catalog the server hands
/// out. Both are swapped whole on reload; a reload that fails leaves the
/// previous value in place.
pub struct DocumentActor {
    wizard: Arc<RwLock<Arc<WizardDocument>>>,
    catalog: Arc<RwLock<Arc<Catalog>>>,
    wizard_path: PathBuf,
    catalog_path: PathBuf,
}

impl DocumentActor {
    /// Loads both files. An invalid wizard document is an error here: the
    /// server should not start without one.
    pub fn load(wizard_path: PathBuf, catalog_path: PathBuf) -> Result<Self, WizardError> {
        let wizard = loader::load_document(&wizard_path)?;
        let catalog = Catalog::load(&catalog_path)?;
        log::debug!(
            "Loaded {} step(s), {} recommendation(s) and {} catalog entries.",
            wizard.steps.len(),
            wizard.recommendations.len(),
            catalog.entries.len()
        );
        Ok(Self::with(wizard, catalog, wizard_path, catalog_path))
    }

    pub fn with(wizard: WizardDocument, catalog: Catalog, wizard_path: PathBuf, catalog_path: PathBuf) -> Self {
        Self {
            wizard: Arc::new(RwLock::new(Arc::new(wizard))),
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            wizard_path,
            catalog_path,
        }
    }

}

impl Actor for DocumentActor {
    type Context = Context<Self>;
}

#[derive(Message)]
#[rtype(result = "Arc<WizardDocument>")]
pub struct GetDocument;

impl Handler<GetDocument> for DocumentActor {
    type Result = MessageResult<GetDocument>;

    fn handle(&mut self, _msg: GetDocument, _ctx: &mut Context<Self>) -> Self::Result {
        let wizard = self.wizard.read().unwrap_or_else(PoisonError::into_inner);
        MessageResult(Arc::clone(&wizard))
    }
}

#[derive(Message)]
#[rtype(result = "Arc<Catalog>")]
pub struct GetCatalog;

impl Handler<GetCatalog> for DocumentActor {
    type Result = MessageResult<GetCatalog>;

    fn handle(&mut self, _msg: GetCatalog, _ctx: &mut Context<Self>) -> Self::Result {
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        MessageResult(Arc::clone(&catalog))
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), WizardError>")]
pub struct ReloadDocument;

impl Handler<ReloadDocument> for DocumentActor {
    type Result = Result<(), WizardError>;

    fn handle(&mut self, _msg: ReloadDocument, _ctx: &mut Context<Self>) -> Self::Result {
        log::debug!("The wizard document changed. Reloading {}.", self.wizard_path.display());
        match loader::load_document(&self.wizard_path) {
            Ok(document) => {
                let mut wizard = self.wizard.write().unwrap_or_else(PoisonError::into_inner);
                *wizard = Arc::new(document);
                log::info!("Wizard document reloaded.");
                Ok(())
            }
            Err(e) => {
                log::error!("Keeping the previous wizard document: {}", e);
                Err(e)
            }
        }
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), WizardError>")]
pub struct ReloadCatalog;

impl Handler<ReloadCatalog> for DocumentActor {
    type Result = Result<(), WizardError>;

    fn handle(&mut self, _msg: ReloadCatalog, _ctx: &mut Context<Self>) -> Self::Result {
        match Catalog::load(&self.catalog_path) {
            Ok(fresh) => {
                let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
                *catalog = Arc::new(fresh);
                log::info!("Catalog reloaded.");
                Ok(())
            }
            Err(e) => {
                log::error!("Keeping the previous catalog: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const WIZARD: &str = r#"
steps:
  - id: size
    title: Size
    options:
      - { id: small, label: Small }
"#;

    #[actix_rt::test]
    async fn test_reload_swaps_document() {
        let dir = tempdir().unwrap();
        let wizard_path = dir.path().join("wizard.yaml");
        fs::write(&wizard_path, WIZARD).unwrap();

        let addr = DocumentActor::load(wizard_path.clone(), dir.path().join("catalog.yaml"))
            .unwrap()
            .start();
        let before = addr.send(GetDocument).await.unwrap();
        assert_eq!(before.steps[0].title, "Size");

        fs::write(&wizard_path, WIZARD.replace("title: Size", "title: Shoe size")).unwrap();
        assert!(addr.send(ReloadDocument).await.unwrap().is_ok());
        let after = addr.send(GetDocument).await.unwrap();
        assert_eq!(after.steps[0].title, "Shoe size");
        assert_eq!(before.steps[0].title, "Size");
    }

    #[actix_rt::test]
    async fn test_invalid_reload_keeps_previous_document() {
        let dir = tempdir().unwrap();
        let wizard_path = dir.path().join("wizard.yaml");
        fs::write(&wizard_path, WIZARD).unwrap();

        let addr = DocumentActor::load(wizard_path.clone(), dir.path().join("catalog.yaml"))
            .unwrap()
            .start();
        fs::write(&wizard_path, "steps: [ { id: size, title: Size, options: [] } ]").unwrap();

        let result = addr.send(ReloadDocument).await.unwrap();
        assert!(matches!(result, Err(WizardError::Authoring(_))));
        let kept = addr.send(GetDocument).await.unwrap();
        assert_eq!(kept.steps[0].options.len(), 1);
    }

    #[actix_rt::test]
    async fn test_catalog_reload() {
        let dir = tempdir().unwrap();
        let wizard_path = dir.path().join("wizard.yaml");
        let catalog_path = dir.path().join("catalog.yaml");
        fs::write(&wizard_path, WIZARD).unwrap();

        let addr = DocumentActor::load(wizard_path, catalog_path.clone()).unwrap().start();
        assert!(addr.send(GetCatalog).await.unwrap().entries.is_empty());

        fs::write(&catalog_path, "entries:\n  - { id: 4, title: Sock, url: /sock }\n").unwrap();
        addr.send(ReloadCatalog).await.unwrap().unwrap();
        assert!(addr.send(GetCatalog).await.unwrap().get(4).is_some());
    }

    #[test]
    fn test_invalid_document_refuses_to_load() {
        let dir = tempdir().unwrap();
        let wizard_path = dir.path().join("wizard.yaml");
        fs::write(&wizard_path, "steps: [ { id: a, title: '', options: [] } ]").unwrap();
        assert!(DocumentActor::load(wizard_path, dir.path().join("catalog.yaml")).is_err());
    }
}
