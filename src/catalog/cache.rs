use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::catalog::ComponentCatalog;
use crate::error::{Error, PrismResult};

#[derive(Debug, Clone)]
struct CachedCatalog {
    modified: Option<SystemTime>,
    catalog: Arc<ComponentCatalog>,
}

/// Keeps parsed catalogs around so a `components.json` is only parsed once.
///
/// A catalog is parsed again when the modification time of its file changes.
/// The cache can be shared between threads.
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: papaya::HashMap<PathBuf, CachedCatalog>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the catalog at `path`, parsing it only if it's not cached or if the file
    /// changed since it was cached.
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> PrismResult<Arc<ComponentCatalog>> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|_| Error::CatalogNotFound(path.to_path_buf()))?;
        let modified = metadata.modified().ok();

        let entries = self.entries.pin();
        if let Some(cached) = entries.get(path) {
            if cached.modified.is_some() && cached.modified == modified {
                return Ok(Arc::clone(&cached.catalog));
            }
        }

        #[cfg(feature = "debug")]
        log::debug!("[get_or_load] parsing catalog {}", path.display());
        let catalog = Arc::new(ComponentCatalog::load_from_file(path)?);
        entries.insert(
            path.to_path_buf(),
            CachedCatalog {
                modified,
                catalog: Arc::clone(&catalog),
            },
        );
        Ok(catalog)
    }

    /// Forgets the catalog at `path`, the next lookup will parse it again.
    pub fn invalidate(&self, path: impl AsRef<Path>) {
        self.entries.pin().remove(path.as_ref());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
