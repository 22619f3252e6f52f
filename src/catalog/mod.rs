//! The catalog of Prism components: languages, plugins and themes with their titles and
//! dependencies.
//!
//! The source is Prism's `components.json`, where an entry can be a bare title or an object
//! and `require` a string or an array. All of that is normalized into [`ComponentRecord`]
//! when loading, nothing downstream has to care about the source shape.

mod cache;
mod raw;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{CORE_DEPENDENCIES, Configuration};
use crate::error::{Error, PrismResult};
use raw::{META_KEY, RawCatalog, RawSection};

pub use cache::CatalogCache;

/// Style-only pseudo languages, always present in the catalog whatever the source says.
pub const PLAIN_VARIANTS: [(&str, &str); 2] = [
    ("adddarkplain", "Dark Plain"),
    ("addlightplain", "Light Plain"),
];

/// One component of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: String,
    pub title: String,
    /// Components that need to be loaded before this one. Empty if none.
    pub requires: Vec<String>,
}

/// An entry of the language picker of the block editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    pub label: String,
    pub value: String,
}

fn normalize_section(section: RawSection) -> BTreeMap<String, ComponentRecord> {
    section
        .into_iter()
        .filter(|(id, _)| id != META_KEY)
        .map(|(id, raw)| {
            let (title, requires) = raw.into_parts(&id);
            let record = ComponentRecord {
                id: id.clone(),
                title,
                requires,
            };
            (id, record)
        })
        .collect()
}

/// The normalized component catalog. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ComponentCatalog {
    languages: BTreeMap<String, ComponentRecord>,
    plugins: BTreeMap<String, ComponentRecord>,
    themes: BTreeMap<String, ComponentRecord>,
}

impl ComponentCatalog {
    fn from_raw(raw: RawCatalog) -> PrismResult<Self> {
        let languages = raw.languages.ok_or(Error::MissingLanguages)?;
        let mut catalog = Self {
            languages: normalize_section(languages),
            plugins: normalize_section(raw.plugins),
            themes: normalize_section(raw.themes),
        };

        for (id, title) in PLAIN_VARIANTS {
            catalog.languages.insert(
                id.to_string(),
                ComponentRecord {
                    id: id.to_string(),
                    title: title.to_string(),
                    requires: Vec::new(),
                },
            );
        }
        Ok(catalog)
    }

    /// Parses the content of a `components.json` file.
    pub fn from_json_str(json: &str) -> PrismResult<Self> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Reads and parses a `components.json` file.
    pub fn load_from_file(path: impl AsRef<Path>) -> PrismResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::CatalogNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn language(&self, id: &str) -> Option<&ComponentRecord> {
        self.languages.get(id)
    }

    pub fn plugin(&self, id: &str) -> Option<&ComponentRecord> {
        self.plugins.get(id)
    }

    pub fn theme(&self, id: &str) -> Option<&ComponentRecord> {
        self.themes.get(id)
    }

    /// All languages, sorted by id
    pub fn languages(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.languages.values()
    }

    /// All themes, sorted by id
    pub fn themes(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.themes.values()
    }

    /// Expands the given language ids with everything they require, directly or not, and
    /// orders the result so that every language comes after its dependencies.
    ///
    /// Ids are visited in alphabetical order so the output only depends on the set of ids
    /// given. Unknown ids are kept, they just have no dependencies.
    /// A dependency cycle is broken at the first language met twice.
    pub fn dependency_order<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut roots: Vec<&str> = ids.into_iter().collect();
        roots.sort_unstable();
        roots.dedup();

        let mut visited = HashSet::new();
        let mut ordered = Vec::with_capacity(roots.len());
        for id in roots {
            self.visit(id, &mut visited, &mut ordered);
        }
        ordered
    }

    fn visit<'a>(&'a self, id: &'a str, visited: &mut HashSet<&'a str>, ordered: &mut Vec<String>) {
        if !visited.insert(id) {
            return;
        }
        if let Some(record) = self.languages.get(id) {
            for dep in &record.requires {
                self.visit(dep, visited, ordered);
            }
        }
        ordered.push(id.to_string());
    }

    /// The languages an author can pick in the block editor: the selected ones that exist
    /// in the catalog, minus the core dependencies nobody writes code in.
    pub fn selectable_languages(&self, config: &Configuration) -> Vec<LanguageOption> {
        config
            .languages
            .iter()
            .filter(|id| !CORE_DEPENDENCIES.contains(&id.as_str()))
            .filter_map(|id| self.languages.get(id))
            .map(|record| LanguageOption {
                label: record.title.clone(),
                value: record.id.clone(),
            })
            .collect()
    }

    #[cfg(feature = "dump")]
    /// Writes the normalized catalog to a compressed binary file that loads faster than
    /// the JSON source.
    pub fn dump_to_file(&self, path: impl AsRef<Path>) -> PrismResult<()> {
        let encoded = bitcode::serialize(self)?;
        let compressed = zstd::encode_all(encoded.as_slice(), 19)?;
        std::fs::write(path, compressed)?;
        Ok(())
    }

    #[cfg(feature = "dump")]
    /// Reads a catalog written by [`ComponentCatalog::dump_to_file`]
    pub fn load_dump(path: impl AsRef<Path>) -> PrismResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::CatalogNotFound(path.to_path_buf()));
        }
        let compressed = std::fs::read(path)?;
        let encoded = zstd::decode_all(compressed.as_slice())?;
        Ok(bitcode::deserialize(&encoded)?)
    }
}
