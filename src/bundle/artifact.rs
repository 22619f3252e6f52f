use std::path::Path;

use crate::error::{Error, PrismResult};

/// Name prefix shared by every bundle file.
pub const BUNDLE_FILE_PREFIX: &str = "prism-";

/// The two files a build produces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BundleArtifact {
    pub script: String,
    pub style: String,
}

impl BundleArtifact {
    /// `prism-<token>.js`
    pub fn script_file_name(token: &str) -> String {
        format!("{BUNDLE_FILE_PREFIX}{token}.js")
    }

    /// `prism-<token>.css`
    pub fn style_file_name(token: &str) -> String {
        format!("{BUNDLE_FILE_PREFIX}{token}.css")
    }

    /// Writes both files in `dir`, named after `token`, creating the directory if needed.
    ///
    /// The token must be a plain file name part: ASCII letters, digits, `-` and `_`.
    /// Bundles from previous builds are deleted once the new pair is written, only the
    /// current token is ever linked.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>, token: &str) -> PrismResult<()> {
        if !is_valid_token(token) {
            return Err(Error::InvalidToken(token.to_string()));
        }
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let script_name = Self::script_file_name(token);
        let style_name = Self::style_file_name(token);
        std::fs::write(dir.join(&script_name), &self.script)?;
        std::fs::write(dir.join(&style_name), &self.style)?;

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let is_previous_bundle = name.starts_with(BUNDLE_FILE_PREFIX)
                && (name.ends_with(".js") || name.ends_with(".css"))
                && name != script_name
                && name != style_name;
            if is_previous_bundle && path.is_file() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
