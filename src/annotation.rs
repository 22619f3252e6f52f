//! The annotation micro-language authors put in the class attribute of a `<pre>` tag.
//!
//! An annotation is a whitespace separated list of `key:value` tokens, eg
//! `lang:php mark:1-5 gutter:true start:10 class:wide`. Parsing goes
//! tokenize -> decode each token into a [`Directive`] -> fold the directives in order,
//! so when two directives disagree the last one wins.

use std::fmt::Write;
use std::ops::RangeInclusive;

use crate::config::{Configuration, is_pseudo_language};
use crate::html::HtmlEscaped;

/// Prefix of the class given to blocks using a style-only pseudo language.
pub const STYLE_ONLY_CLASS_PREFIX: &str = "prism-highlighter-";

/// Whether a block asked for line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gutter {
    /// Nothing said, the configuration decides
    #[default]
    Unset,
    On,
    Off,
}

/// One decoded `key:value` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directive<'a> {
    Lang(&'a str),
    Mark(&'a str),
    Class(&'a str),
    Gutter(bool),
    Start(u32),
}

/// `lang : php` is accepted and means `lang:php`.
fn collapse_separators(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, part) in raw.trim().split(':').enumerate() {
        if i > 0 {
            out.truncate(out.trim_end().len());
            out.push(':');
            out.push_str(part.trim_start());
        } else {
            out.push_str(part);
        }
    }
    out
}

/// Decodes a single token, returning `None` for anything we don't understand.
///
/// Values containing another `:` are rejected: they could carry a `lang:` into the
/// rewritten markup and get it processed a second time.
pub(crate) fn decode(token: &str) -> Option<Directive<'_>> {
    let (key, value) = token.split_once(':')?;
    let value = value.trim();
    if value.is_empty() || value.contains(':') {
        return None;
    }

    let directive = match key {
        "lang" => Directive::Lang(value),
        "mark" => Directive::Mark(value),
        "class" => Directive::Class(value),
        "gutter" => match value {
            "true" => Directive::Gutter(true),
            "false" => Directive::Gutter(false),
            _ => return None,
        },
        "start" => match value.parse::<u32>() {
            Ok(start) if start >= 1 => Directive::Start(start),
            _ => return None,
        },
        _ => {
            #[cfg(feature = "debug")]
            log::debug!("[decode] ignoring unknown annotation key {key:?}");
            return None;
        }
    };
    Some(directive)
}

fn parse_range(s: &str) -> Option<RangeInclusive<usize>> {
    match s.split_once('-') {
        Some((from, to)) => {
            let mut from = from.trim().parse().ok()?;
            let mut to = to.trim().parse().ok()?;
            if to < from {
                std::mem::swap(&mut from, &mut to);
            }
            Some(from..=to)
        }
        None => {
            let val = s.trim().parse().ok()?;
            Some(val..=val)
        }
    }
}

/// The directives of one annotated block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotation {
    /// Empty if the block had no usable `lang`
    pub language: String,
    /// Raw `mark` value, in Prism's `data-line` syntax (`1-3,5`)
    pub highlight_ranges: Option<String>,
    pub gutter: Gutter,
    /// Explicit `start`, always >= 1
    pub start_line: Option<u32>,
    pub extra_classes: Vec<String>,
}

impl Annotation {
    /// Parses the content of a class attribute. This never fails: tokens that can't be
    /// decoded are skipped.
    pub fn parse(raw: &str) -> Self {
        let normalized = collapse_separators(raw);
        normalized
            .split_whitespace()
            .filter_map(decode)
            .fold(Annotation::default(), Annotation::apply)
    }

    pub(crate) fn apply(mut self, directive: Directive<'_>) -> Self {
        match directive {
            Directive::Lang(lang) => self.language = lang.to_string(),
            Directive::Mark(ranges) => {
                self.highlight_ranges = Some(ranges.to_string());
                self.gutter = Gutter::Off;
            }
            Directive::Class(class) => self.extra_classes.push(class.to_string()),
            Directive::Gutter(true) => self.gutter = Gutter::On,
            Directive::Gutter(false) => self.gutter = Gutter::Off,
            Directive::Start(start) => self.start_line = Some(start),
        }
        self
    }

    /// Creates an annotation for the given language, for authoring blocks.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    /// Lines to highlight, in Prism's `data-line` syntax.
    pub fn mark(mut self, ranges: impl Into<String>) -> Self {
        let ranges = ranges.into();
        self.highlight_ranges = if ranges.trim().is_empty() {
            None
        } else {
            Some(ranges)
        };
        self
    }

    pub fn gutter(mut self, value: bool) -> Self {
        self.gutter = if value { Gutter::On } else { Gutter::Off };
        self
    }

    /// 0 is treated as 1
    pub fn start_line(mut self, start: u32) -> Self {
        self.start_line = Some(start.max(1));
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.extra_classes.push(class.into());
        self
    }

    /// Whether the language is a style-only pseudo language such as `adddarkplain`.
    pub fn is_style_only(&self) -> bool {
        is_pseudo_language(&self.language)
    }

    /// The final gutter state: explicit directives win over the configuration default,
    /// and style-only blocks never get one.
    pub fn gutter_enabled(&self, config: &Configuration) -> bool {
        if self.is_style_only() {
            return false;
        }
        match self.gutter {
            Gutter::Unset => config.gutter_enabled,
            Gutter::On => true,
            Gutter::Off => false,
        }
    }

    /// The number of the first line. The configured start line only applies when line
    /// numbers are enabled globally.
    pub fn resolved_start_line(&self, config: &Configuration) -> u32 {
        self.start_line.unwrap_or(if config.gutter_enabled {
            config.start_line.max(1)
        } else {
            1
        })
    }

    /// `language-<id>`, the wrapper class for style-only languages or nothing if there's
    /// no language.
    pub fn language_class(&self) -> Option<String> {
        if self.language.is_empty() {
            None
        } else if self.is_style_only() {
            Some(format!("{STYLE_ONLY_CLASS_PREFIX}{}", self.language))
        } else {
            Some(format!("language-{}", self.language))
        }
    }

    /// The highlighted lines as 1-indexed ranges. Pieces that are not numbers are skipped.
    pub fn highlight_lines(&self) -> Vec<RangeInclusive<usize>> {
        self.highlight_ranges
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter_map(parse_range)
            .collect()
    }

    /// The annotation in the micro-language, as written by the editor integrations.
    ///
    /// The start line is only written when line numbers are requested.
    pub fn to_class_attribute(&self) -> String {
        let mut tokens = vec![format!("lang:{}", self.language)];
        if self.gutter == Gutter::On {
            tokens.push("gutter:true".to_string());
            if let Some(start) = self.start_line.filter(|s| *s != 1) {
                tokens.push(format!("start:{start}"));
            }
        }
        if let Some(ranges) = &self.highlight_ranges {
            tokens.push(format!("mark:{}", ranges.trim()));
        }
        for class in self.extra_classes.iter().flat_map(|c| c.split_whitespace()) {
            tokens.push(format!("class:{class}"));
        }
        tokens.join(" ")
    }

    /// Renders the annotated `<pre>` block an editor inserts in content.
    /// `code` is raw text and gets HTML-encoded exactly once here.
    pub fn to_markup(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len() + 64);
        let _ = write!(
            out,
            r#"<pre class="{}">{}</pre>"#,
            HtmlEscaped(&self.to_class_attribute()),
            HtmlEscaped(code)
        );
        out
    }
}
