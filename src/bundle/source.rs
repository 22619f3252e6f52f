use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::Plugin;

/// A file of the Prism distribution that can end up in a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component<'a> {
    /// A language grammar, or the engine itself for `core`
    Language(&'a str),
    PluginScript(Plugin),
    PluginStyle(Plugin),
    /// A theme stylesheet, by file name
    Theme(&'a str),
}

impl Component<'_> {
    /// The path of the minified file relative to the root of the Prism distribution.
    pub fn path(&self) -> String {
        match self {
            Component::Language(id) => format!("components/prism-{id}.min.js"),
            Component::PluginScript(plugin) => format!("plugins/{plugin}/prism-{plugin}.min.js"),
            Component::PluginStyle(plugin) => format!("plugins/{plugin}/prism-{plugin}.css"),
            Component::Theme(theme) => format!("themes/{theme}.css"),
        }
    }
}

impl fmt::Display for Component<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Where the builder gets the content of components from.
///
/// Returning `None` means the component is not available; the builder skips it.
pub trait ComponentSource {
    fn read(&self, component: &Component<'_>) -> Option<Cow<'_, str>>;
}

impl<T: ComponentSource + ?Sized> ComponentSource for &T {
    fn read(&self, component: &Component<'_>) -> Option<Cow<'_, str>> {
        (**self).read(component)
    }
}

/// Components kept in memory, keyed by their [`Component::path`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: Component<'_>, content: impl Into<String>) {
        self.files.insert(component.path(), content.into());
    }

    /// Builder style version of [`MemorySource::insert`]
    pub fn with(mut self, component: Component<'_>, content: impl Into<String>) -> Self {
        self.insert(component, content);
        self
    }
}

impl ComponentSource for MemorySource {
    fn read(&self, component: &Component<'_>) -> Option<Cow<'_, str>> {
        self.files
            .get(&component.path())
            .map(|content| Cow::Borrowed(content.as_str()))
    }
}

/// Reads components from an unpacked Prism distribution on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ComponentSource for DirectorySource {
    fn read(&self, component: &Component<'_>) -> Option<Cow<'_, str>> {
        std::fs::read_to_string(self.root.join(component.path()))
            .ok()
            .map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_paths() {
        assert_eq!(
            Component::Language("core").path(),
            "components/prism-core.min.js"
        );
        assert_eq!(
            Component::PluginScript(Plugin::ShowInvisibles).path(),
            "plugins/show-invisibles/prism-show-invisibles.min.js"
        );
        assert_eq!(
            Component::PluginStyle(Plugin::LineNumbers).path(),
            "plugins/line-numbers/prism-line-numbers.css"
        );
        assert_eq!(Component::Theme("prism-okaidia").path(), "themes/prism-okaidia.css");
    }

    #[test]
    fn memory_source_lookup() {
        let source = MemorySource::new().with(Component::Language("sql"), "sql();");
        assert_eq!(
            source.read(&Component::Language("sql")).as_deref(),
            Some("sql();")
        );
        assert!(source.read(&Component::Language("php")).is_none());
        // through a reference too
        let by_ref = &source;
        assert!(by_ref.read(&Component::Language("sql")).is_some());
    }

    #[test]
    fn directory_source_tolerates_missing_files() {
        let root = std::env::temp_dir().join(format!("prism-dir-source-{}", std::process::id()));
        std::fs::create_dir_all(root.join("themes")).unwrap();
        std::fs::write(root.join("themes/prism.css"), "pre {}").unwrap();

        let source = DirectorySource::new(&root);
        assert_eq!(
            source.read(&Component::Theme("prism")).as_deref(),
            Some("pre {}")
        );
        assert!(source.read(&Component::Theme("prism-dark")).is_none());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
