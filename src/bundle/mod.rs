//! Builds the script and style bundles for a configuration by concatenating Prism
//! components.

mod artifact;
mod source;

use std::fmt;

use crate::catalog::ComponentCatalog;
use crate::config::{BASE_ENGINE, Configuration, GRAMMAR_DEPENDENCIES, is_pseudo_language};
use crate::html::strip_tags;
use crate::processor::CONTAINER_CLASS;

pub use artifact::{BUNDLE_FILE_PREFIX, BundleArtifact};
pub use source::{Component, ComponentSource, DirectorySource, MemorySource};

/// Appended after every script fragment so concatenation is safe whatever the fragment
/// ends with.
const SCRIPT_SEPARATOR: &str = ";\n";
const STYLE_SEPARATOR: &str = "\n";

/// Something that went wrong during a build without stopping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// No catalog was available: the script bundle only has the engine.
    MissingCatalog,
    /// The source doesn't have this component, it was left out.
    MissingComponent(String),
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::MissingCatalog => {
                write!(f, "component catalog unavailable, only the engine was bundled")
            }
            BuildWarning::MissingComponent(path) => write!(f, "component '{}' not found", path),
        }
    }
}

/// The artifact of a build and what went wrong building it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildReport {
    pub artifact: BundleArtifact,
    pub warnings: Vec<BuildWarning>,
}

/// Concatenates components into bundles.
///
/// The output only depends on the configuration, the catalog and the source content: the
/// same inputs always give the same bytes so the bundles can be cached by token.
#[derive(Debug, Clone)]
pub struct BundleBuilder<'a, S> {
    source: S,
    catalog: Option<&'a ComponentCatalog>,
}

impl<'a, S: ComponentSource> BundleBuilder<'a, S> {
    /// `catalog` is `None` when it could not be loaded, in which case builds fall back
    /// to the engine alone.
    pub fn new(source: S, catalog: Option<&'a ComponentCatalog>) -> Self {
        Self { source, catalog }
    }

    /// Builds both bundles. Problems are logged, use [`BundleBuilder::build_report`] to
    /// get them.
    pub fn build(&self, config: &Configuration) -> BundleArtifact {
        let report = self.build_report(config);
        for warning in &report.warnings {
            match warning {
                BuildWarning::MissingCatalog => log::warn!("{warning}"),
                BuildWarning::MissingComponent(_) => log::debug!("{warning}"),
            }
        }
        report.artifact
    }

    /// Builds both bundles and returns them along with every problem met.
    pub fn build_report(&self, config: &Configuration) -> BuildReport {
        let mut warnings = Vec::new();
        let script = self.build_script(config, &mut warnings);
        let style = self.build_style(config, &mut warnings);
        BuildReport {
            artifact: BundleArtifact { script, style },
            warnings,
        }
    }

    fn append(
        &self,
        out: &mut String,
        component: Component<'_>,
        separator: &str,
        warnings: &mut Vec<BuildWarning>,
    ) {
        match self.source.read(&component) {
            Some(content) => {
                #[cfg(feature = "debug")]
                log::debug!("[append] {component} ({} bytes)", content.len());
                out.push_str(&content);
                out.push_str(separator);
            }
            None => warnings.push(BuildWarning::MissingComponent(component.path())),
        }
    }

    /// Engine, grammar dependencies, the other languages in dependency order and finally
    /// the enabled plugins.
    fn build_script(&self, config: &Configuration, warnings: &mut Vec<BuildWarning>) -> String {
        let mut out = String::new();
        self.append(
            &mut out,
            Component::Language(BASE_ENGINE),
            SCRIPT_SEPARATOR,
            warnings,
        );

        let Some(catalog) = self.catalog else {
            warnings.push(BuildWarning::MissingCatalog);
            return out;
        };

        let selected = config
            .languages
            .iter()
            .map(String::as_str)
            .filter(|id| *id != BASE_ENGINE && !is_pseudo_language(id));
        let languages = catalog.dependency_order(selected);

        for dep in GRAMMAR_DEPENDENCIES {
            if languages.iter().any(|id| id == dep) {
                self.append(
                    &mut out,
                    Component::Language(dep),
                    SCRIPT_SEPARATOR,
                    warnings,
                );
            }
        }

        for id in &languages {
            if id == BASE_ENGINE
                || GRAMMAR_DEPENDENCIES.contains(&id.as_str())
                || is_pseudo_language(id)
            {
                continue;
            }
            self.append(
                &mut out,
                Component::Language(id),
                SCRIPT_SEPARATOR,
                warnings,
            );
        }

        for plugin in config.enabled_plugins() {
            self.append(
                &mut out,
                Component::PluginScript(plugin),
                SCRIPT_SEPARATOR,
                warnings,
            );
        }

        out
    }

    /// Theme, plugin stylesheets, the height limit and the custom CSS.
    fn build_style(&self, config: &Configuration, warnings: &mut Vec<BuildWarning>) -> String {
        let mut out = String::new();
        self.append(
            &mut out,
            Component::Theme(config.theme_file()),
            STYLE_SEPARATOR,
            warnings,
        );

        for plugin in config.enabled_plugins().filter(|p| p.has_stylesheet()) {
            self.append(
                &mut out,
                Component::PluginStyle(plugin),
                STYLE_SEPARATOR,
                warnings,
            );
        }

        if config.max_height_px > 0 {
            out.push_str(&format!(
                "pre.{CONTAINER_CLASS} {{ max-height: {}px; }}{STYLE_SEPARATOR}",
                config.max_height_px
            ));
        }

        if config.custom_css_enabled {
            let custom = strip_tags(&config.custom_css);
            if !custom.is_empty() {
                out.push_str(&custom);
                out.push_str(STYLE_SEPARATOR);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_utils::get_catalog;
    use crate::config::Plugin;

    /// A source where every component contains its own path, so bundles are easy to read.
    struct EchoSource;

    impl ComponentSource for EchoSource {
        fn read(&self, component: &Component<'_>) -> Option<std::borrow::Cow<'_, str>> {
            Some(format!("/*{component}*/").into())
        }
    }

    fn config(languages: &[&str]) -> Configuration {
        Configuration {
            languages: languages.iter().map(|l| l.to_string()).collect(),
            gutter_enabled: false,
            auto_link_urls: false,
            show_language_label: false,
            show_hidden_chars: false,
            max_height_px: 0,
            cache_token: "token".to_string(),
            ..Configuration::default()
        }
        .normalized()
    }

    fn fragments(bundle: &str) -> Vec<&str> {
        bundle
            .split(SCRIPT_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_start_matches("/*").trim_end_matches("*/"))
            .collect()
    }

    #[test]
    fn script_order_for_php_and_sql() {
        let catalog = get_catalog();
        let config = Configuration {
            gutter_enabled: true,
            auto_link_urls: true,
            ..config(&["php", "sql"])
        };
        let report = BundleBuilder::new(EchoSource, Some(&catalog)).build_report(&config);
        assert!(report.warnings.is_empty());
        assert_eq!(
            fragments(&report.artifact.script),
            vec![
                "components/prism-core.min.js",
                "components/prism-clike.min.js",
                "components/prism-markup.min.js",
                "components/prism-markup-templating.min.js",
                "components/prism-php.min.js",
                "components/prism-sql.min.js",
                "plugins/line-numbers/prism-line-numbers.min.js",
                "plugins/autolinker/prism-autolinker.min.js",
            ]
        );
    }

    #[test]
    fn dependencies_come_before_dependents() {
        let catalog = get_catalog();
        let config = config(&["tsx", "bash", "cpp", "adddarkplain"]);
        let report = BundleBuilder::new(EchoSource, Some(&catalog)).build_report(&config);
        assert_eq!(
            fragments(&report.artifact.script),
            vec![
                "components/prism-core.min.js",
                "components/prism-clike.min.js",
                "components/prism-markup.min.js",
                "components/prism-markup-templating.min.js",
                "components/prism-bash.min.js",
                "components/prism-c.min.js",
                "components/prism-cpp.min.js",
                "components/prism-javascript.min.js",
                "components/prism-jsx.min.js",
                "components/prism-typescript.min.js",
                "components/prism-tsx.min.js",
            ]
        );
    }

    #[test]
    fn grammar_dependencies_only_when_referenced() {
        let catalog = get_catalog();
        // bypassing normalization on purpose
        let config = Configuration {
            languages: ["core", "sql", "markup"].iter().map(|l| l.to_string()).collect(),
            ..config(&[])
        };
        let script = BundleBuilder::new(EchoSource, Some(&catalog))
            .build(&config)
            .script;
        assert_eq!(
            fragments(&script),
            vec![
                "components/prism-core.min.js",
                "components/prism-markup.min.js",
                "components/prism-sql.min.js",
            ]
        );
    }

    #[test]
    fn disabled_plugins_are_left_out() {
        let catalog = get_catalog();
        let builder = BundleBuilder::new(EchoSource, Some(&catalog));

        let mut config = config(&["sql"]);
        for plugin in Plugin::ALL {
            let artifact = builder.build(&config);
            assert!(!artifact.script.contains(&format!("plugins/{plugin}/")));
            assert!(!artifact.style.contains(&format!("plugins/{plugin}/")));
        }

        config.show_hidden_chars = true;
        config.show_language_label = true;
        let artifact = builder.build(&config);
        let plugins: Vec<_> = fragments(&artifact.script)
            .into_iter()
            .filter(|f| f.starts_with("plugins/"))
            .collect();
        assert_eq!(
            plugins,
            vec![
                "plugins/show-invisibles/prism-show-invisibles.min.js",
                "plugins/show-language/prism-show-language.min.js",
            ]
        );
    }

    #[test]
    fn style_bundle() {
        let catalog = get_catalog();
        let config = Configuration {
            theme: "prism-okaidia".to_string(),
            gutter_enabled: true,
            auto_link_urls: true,
            max_height_px: 300,
            custom_css_enabled: true,
            custom_css: "<script>x()</script>code { tab-size: 2; }".to_string(),
            ..config(&["php"])
        };
        let style = BundleBuilder::new(EchoSource, Some(&catalog))
            .build(&config)
            .style;
        assert_eq!(
            style,
            concat!(
                "/*themes/prism-okaidia.css*/\n",
                "/*plugins/line-numbers/prism-line-numbers.css*/\n",
                "pre.prism-highlighter-container { max-height: 300px; }\n",
                "code { tab-size: 2; }\n",
            )
        );
    }

    #[test]
    fn default_theme_and_no_autolinker_stylesheet() {
        let catalog = get_catalog();
        let config = Configuration {
            auto_link_urls: true,
            ..config(&[])
        };
        let style = BundleBuilder::new(EchoSource, Some(&catalog))
            .build(&config)
            .style;
        assert_eq!(style, "/*themes/prism.css*/\n");
    }

    #[test]
    fn custom_css_needs_toggle() {
        let catalog = get_catalog();
        let config = Configuration {
            custom_css_enabled: false,
            custom_css: "pre { border: 0; }".to_string(),
            ..config(&[])
        };
        let style = BundleBuilder::new(EchoSource, Some(&catalog))
            .build(&config)
            .style;
        assert!(!style.contains("border"));

        let enabled = Configuration {
            custom_css_enabled: true,
            ..config
        };
        let style = BundleBuilder::new(EchoSource, Some(&catalog))
            .build(&enabled)
            .style;
        assert!(style.ends_with("pre { border: 0; }\n"));
    }

    #[test]
    fn custom_css_inside_style_element_is_kept() {
        let raw = Configuration {
            custom_css_enabled: true,
            custom_css: "<style>pre { border: 1px solid red; }</style>".to_string(),
            ..config(&[])
        };
        assert_eq!(
            raw.clone().normalized().custom_css,
            "pre { border: 1px solid red; }"
        );

        // the builder strips tags too, for configurations that were not normalized
        let style = BundleBuilder::new(MemorySource::new(), None)
            .build(&raw)
            .style;
        assert_eq!(style, "pre { border: 1px solid red; }\n");
    }

    #[test]
    fn missing_components_are_skipped() {
        let catalog = get_catalog();
        let source = MemorySource::new()
            .with(Component::Language("core"), "var Prism = {}")
            .with(Component::Language("sql"), "Prism.languages.sql = {}")
            .with(Component::Theme("prism"), "pre { color: black; }");
        let report = BundleBuilder::new(&source, Some(&catalog)).build_report(&config(&["sql"]));
        assert_eq!(
            report.artifact.script,
            "var Prism = {};\nPrism.languages.sql = {};\n"
        );
        assert_eq!(report.artifact.style, "pre { color: black; }\n");
        assert_eq!(
            report.warnings,
            vec![
                BuildWarning::MissingComponent("components/prism-clike.min.js".to_string()),
                BuildWarning::MissingComponent("components/prism-markup.min.js".to_string()),
                BuildWarning::MissingComponent(
                    "components/prism-markup-templating.min.js".to_string()
                ),
            ]
        );
    }

    #[test]
    fn missing_catalog_gives_engine_only() {
        let config = Configuration {
            gutter_enabled: true,
            ..config(&["php", "sql"])
        };
        let report = BundleBuilder::new(EchoSource, None).build_report(&config);
        assert_eq!(
            fragments(&report.artifact.script),
            vec!["components/prism-core.min.js"]
        );
        assert_eq!(report.warnings, vec![BuildWarning::MissingCatalog]);
        // styles don't need the catalog
        assert!(report.artifact.style.contains("prism-line-numbers.css"));
    }

    #[test]
    fn builds_are_deterministic() {
        let catalog = get_catalog();
        let config = Configuration {
            gutter_enabled: true,
            auto_link_urls: true,
            show_hidden_chars: true,
            max_height_px: 480,
            ..config(&["typescript", "python", "rust", "php", "json", "addlightplain"])
        };
        let builder = BundleBuilder::new(EchoSource, Some(&catalog));
        let first = builder.build(&config);
        for _ in 0..5 {
            assert_eq!(builder.build(&config), first);
            assert_eq!(
                BundleBuilder::new(EchoSource, Some(&catalog)).build(&config.clone()),
                first
            );
        }
    }
}
