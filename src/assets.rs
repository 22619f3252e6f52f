use std::fmt::Write;

use crate::bundle::BundleArtifact;
use crate::config::Configuration;
use crate::html::HtmlEscaped;

/// Directory, relative to the public upload root, the bundles are written to.
pub const BUILD_DIR: &str = "prism-highlighter-build";

/// The URLs of the current bundles, to link in a page that has highlighted blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLinks {
    pub stylesheet: String,
    pub script: String,
    /// The cache token, used as the asset version
    pub version: String,
}

impl AssetLinks {
    /// `base_url` is where the bundles of `config` are served from, with or without a
    /// trailing slash.
    pub fn new(base_url: &str, config: &Configuration) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let token = &config.cache_token;
        Self {
            stylesheet: format!("{base_url}/{}", BundleArtifact::style_file_name(token)),
            script: format!("{base_url}/{}", BundleArtifact::script_file_name(token)),
            version: token.clone(),
        }
    }

    /// The links a page needs: none unless the page had at least one annotated block.
    pub fn for_page(matched: bool, base_url: &str, config: &Configuration) -> Option<Self> {
        matched.then(|| Self::new(base_url, config))
    }

    /// The `<link>` and `<script>` tags to put in the page.
    pub fn to_html(&self) -> String {
        let version = HtmlEscaped(&self.version);
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<link rel="stylesheet" href="{}?ver={version}">"#,
            HtmlEscaped(&self.stylesheet),
        );
        let _ = writeln!(
            out,
            r#"<script src="{}?ver={version}" defer></script>"#,
            HtmlEscaped(&self.script),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::AnnotationProcessor;

    fn config() -> Configuration {
        Configuration {
            cache_token: "1700000000".to_string(),
            ..Configuration::default()
        }
    }

    #[test]
    fn links_are_named_by_token() {
        let links = AssetLinks::new("https://example.com/uploads/prism-highlighter-build/", &config());
        assert_eq!(
            links.stylesheet,
            "https://example.com/uploads/prism-highlighter-build/prism-1700000000.css"
        );
        assert_eq!(
            links.script,
            "https://example.com/uploads/prism-highlighter-build/prism-1700000000.js"
        );
        assert_eq!(links.version, "1700000000");
    }

    #[test]
    fn only_pages_with_blocks_get_links() {
        let config = config();
        let processor = AnnotationProcessor::new(&config);

        let page = processor.process(r#"<pre class="lang:php">echo 1;</pre>"#);
        assert!(AssetLinks::for_page(page.matched(), "/build", &config).is_some());

        let page = processor.process("<p>No code here</p>");
        assert!(AssetLinks::for_page(page.matched(), "/build", &config).is_none());
    }

    #[test]
    fn renders_tags() {
        let links = AssetLinks::new("/build", &config());
        assert_eq!(
            links.to_html(),
            concat!(
                r#"<link rel="stylesheet" href="/build/prism-1700000000.css?ver=1700000000">"#,
                "\n",
                r#"<script src="/build/prism-1700000000.js?ver=1700000000" defer></script>"#,
                "\n",
            )
        );
    }
}
