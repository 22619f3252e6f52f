use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PrismResult;
use crate::html::strip_tags;

/// The Prism engine itself, always the first fragment of a script bundle.
pub const BASE_ENGINE: &str = "core";

/// Grammars other grammars build upon. They are emitted right after the engine.
pub const GRAMMAR_DEPENDENCIES: [&str; 3] = ["clike", "markup", "markup-templating"];

/// Languages that are always part of a configuration, whatever the user selected.
pub const CORE_DEPENDENCIES: [&str; 4] = [BASE_ENGINE, "clike", "markup", "markup-templating"];

/// Identifiers starting with this prefix are configuration-only entries (eg `adddarkplain`):
/// they style a block but have no grammar file.
pub const PSEUDO_LANGUAGE_PREFIX: &str = "add";

/// The theme name users pick to get the stock Prism theme.
pub const DEFAULT_THEME: &str = "default";
/// The file name of the stock Prism theme.
pub const DEFAULT_THEME_FILE: &str = "prism";

pub(crate) fn is_pseudo_language(id: &str) -> bool {
    id.starts_with(PSEUDO_LANGUAGE_PREFIX)
}

/// The Prism plugins that can be toggled in the configuration.
///
/// The order of [`Plugin::ALL`] is the order they end up in the bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plugin {
    LineNumbers,
    ShowInvisibles,
    ShowLanguage,
    Autolinker,
}

impl Plugin {
    pub const ALL: [Plugin; 4] = [
        Plugin::LineNumbers,
        Plugin::ShowInvisibles,
        Plugin::ShowLanguage,
        Plugin::Autolinker,
    ];

    /// The plugin directory name in the Prism distribution
    pub fn name(self) -> &'static str {
        match self {
            Plugin::LineNumbers => "line-numbers",
            Plugin::ShowInvisibles => "show-invisibles",
            Plugin::ShowLanguage => "show-language",
            Plugin::Autolinker => "autolinker",
        }
    }

    /// The autolinker only ships a script.
    pub fn has_stylesheet(self) -> bool {
        !matches!(self, Plugin::Autolinker)
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `true`/`false` as well as the `1`/`0` (numbers or strings) older settings
/// were stored as.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, 0/1 or a string holding one of those")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            match value.trim() {
                "" | "0" | "false" => Ok(false),
                "1" | "true" | "on" => Ok(true),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// The shared input of the processor and the builder.
///
/// Keys are camelCase; the option names used by earlier releases (`lang-used`, `gutter`,
/// `start-number`...) are still accepted when deserializing.
/// Missing keys take the default configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    /// Selected language identifiers
    #[serde(alias = "lang-used")]
    pub languages: BTreeSet<String>,
    /// Language preselected by the editor integrations
    #[serde(alias = "default-lang")]
    pub default_language: String,
    /// `default` or the file name (without extension) of a Prism theme
    pub theme: String,
    /// Line numbers, also enables the line-numbers plugin
    #[serde(alias = "gutter", deserialize_with = "deserialize_flag")]
    pub gutter_enabled: bool,
    #[serde(alias = "auto-links", deserialize_with = "deserialize_flag")]
    pub auto_link_urls: bool,
    #[serde(alias = "show-lang", deserialize_with = "deserialize_flag")]
    pub show_language_label: bool,
    #[serde(alias = "show-hidden-char", deserialize_with = "deserialize_flag")]
    pub show_hidden_chars: bool,
    /// Line number of the first line when line numbers are shown
    #[serde(alias = "start-number")]
    pub start_line: u32,
    /// Class(es) added to every highlighted block
    #[serde(alias = "class")]
    pub global_class: String,
    #[serde(alias = "add-css", deserialize_with = "deserialize_flag")]
    pub custom_css_enabled: bool,
    #[serde(alias = "add-css-value")]
    pub custom_css: String,
    /// 0 means no limit
    #[serde(alias = "max-height")]
    pub max_height_px: u32,
    /// Names the bundle files so browsers refetch them after a change
    #[serde(alias = "token")]
    pub cache_token: String,
}

impl Default for Configuration {
    fn default() -> Self {
        let languages = CORE_DEPENDENCIES
            .iter()
            .chain(["php", "css", "javascript", "sql"].iter())
            .map(|l| l.to_string())
            .collect();

        Self {
            languages,
            default_language: "php".to_string(),
            theme: DEFAULT_THEME.to_string(),
            gutter_enabled: true,
            auto_link_urls: true,
            show_language_label: false,
            show_hidden_chars: false,
            start_line: 1,
            global_class: String::new(),
            custom_css_enabled: false,
            custom_css: String::new(),
            max_height_px: 480,
            cache_token: new_cache_token(),
        }
    }
}

static LAST_CACHE_TOKEN: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the epoch, bumped when needed so that every token handed out by
/// this process is greater than the previous one.
fn new_cache_token() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default();

    let mut last = LAST_CACHE_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST_CACHE_TOKEN.compare_exchange_weak(
            last,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next.to_string(),
            Err(current) => last = current,
        }
    }
}

impl Configuration {
    /// Parses a JSON configuration and normalizes it.
    pub fn from_json_str(json: &str) -> PrismResult<Self> {
        let config: Configuration = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Reads a JSON configuration file and normalizes it.
    pub fn load_from_file(path: impl AsRef<Path>) -> PrismResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Applies the rules every saved configuration goes through:
    ///
    /// - the core dependencies are always selected
    /// - the start line is at least 1
    /// - markup is stripped from the custom CSS
    /// - global class tokens containing `:` are dropped, they would be mistaken for
    ///   annotation directives
    pub fn normalized(mut self) -> Self {
        self.languages = self
            .languages
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        for dep in CORE_DEPENDENCIES {
            self.languages.insert(dep.to_string());
        }

        self.default_language = self.default_language.trim().to_string();
        if self.default_language.is_empty() {
            self.default_language = "php".to_string();
        }
        self.theme = self.theme.trim().to_string();
        if self.theme.is_empty() {
            self.theme = DEFAULT_THEME.to_string();
        }

        self.start_line = self.start_line.max(1);
        self.global_class = self
            .global_class
            .split_whitespace()
            .filter(|c| !c.contains(':'))
            .collect::<Vec<_>>()
            .join(" ");
        self.custom_css = strip_tags(&self.custom_css);
        self
    }

    /// Returns the same configuration with a new cache token.
    /// Call it every time the configuration is saved.
    pub fn with_fresh_token(mut self) -> Self {
        self.cache_token = new_cache_token();
        self
    }

    pub fn is_selected(&self, language: &str) -> bool {
        self.languages.contains(language)
    }

    pub fn is_enabled(&self, plugin: Plugin) -> bool {
        match plugin {
            Plugin::LineNumbers => self.gutter_enabled,
            Plugin::ShowInvisibles => self.show_hidden_chars,
            Plugin::ShowLanguage => self.show_language_label,
            Plugin::Autolinker => self.auto_link_urls,
        }
    }

    /// The enabled plugins, in bundle order.
    pub fn enabled_plugins(&self) -> impl Iterator<Item = Plugin> + '_ {
        Plugin::ALL.into_iter().filter(|p| self.is_enabled(*p))
    }

    /// The file name of the theme stylesheet, without extension
    pub fn theme_file(&self) -> &str {
        if self.theme == DEFAULT_THEME {
            DEFAULT_THEME_FILE
        } else {
            &self.theme
        }
    }
}
