//! Finds annotated `<pre>` blocks in rendered content and rewrites them into the markup
//! Prism expects.

use std::borrow::Cow;
use std::fmt::Write;
use std::sync::LazyLock;

use onig::Regex;

use crate::annotation::Annotation;
use crate::config::Configuration;
use crate::html::{AttributeEscaped, ClassList, html_regex};

/// Class every rewritten block gets, first in the class list.
pub const CONTAINER_CLASS: &str = "prism-highlighter-container";
/// Class the Prism line-numbers plugin looks for.
pub const LINE_NUMBERS_CLASS: &str = "line-numbers";

// A `<pre>` opening tag with a `lang:` somewhere after its class attribute.
static ANNOTATED_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| html_regex(r#"<pre\s[^>]*?class\s*=\s*["'][^>]*?lang\s*:[^>]*?>"#));
static CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| html_regex(r"<\s*/pre\s*>"));
// Group 2 is the attribute value.
static CLASS_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| html_regex(r#"\sclass\s*=\s*(["'])(.*?)\1"#));
static LANG_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| html_regex(r"(?:^|\s)lang\s*:"));

/// A candidate block: an annotated-looking opening tag, its body and the first closing
/// tag after it.
struct Block<'a> {
    /// Byte range of the whole block in the content
    start: usize,
    end: usize,
    open_tag: &'a str,
    body: &'a str,
}

/// Iterates over the candidate blocks of a document, in order.
///
/// Opening and closing tags are searched separately: once an opening tag has no closing
/// tag after it no later one can have one either, so the scan stops there instead of
/// rescanning the rest of the document for every unclosed tag.
struct Blocks<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> Blocks<'a> {
    fn new(content: &'a str) -> Self {
        Self { content, pos: 0 }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.content[self.pos..];
        let (open_start, open_end) = ANNOTATED_OPEN_TAG.find(rest)?;
        let after_open = &rest[open_end..];
        let Some((close_start, close_end)) = CLOSE_TAG.find(after_open) else {
            self.pos = self.content.len();
            return None;
        };

        let block = Block {
            start: self.pos + open_start,
            end: self.pos + open_end + close_end,
            open_tag: &rest[open_start..open_end],
            body: &after_open[..close_start],
        };
        self.pos = block.end;
        Some(block)
    }
}

/// The class attribute of an opening tag, if it holds a `lang:` directive.
fn annotation_source(open_tag: &str) -> Option<&str> {
    let captures = CLASS_ATTRIBUTE.captures(open_tag)?;
    let raw = captures.at(2)?;
    LANG_DIRECTIVE.find(raw).map(|_| raw)
}

/// The result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedContent<'a> {
    /// The content with every annotated block rewritten. Borrowed when nothing matched.
    pub content: Cow<'a, str>,
    /// The annotations found, in document order
    pub annotations: Vec<Annotation>,
}

impl ProcessedContent<'_> {
    /// Whether at least one annotated block was found, meaning the bundle has to be
    /// linked in the page.
    pub fn matched(&self) -> bool {
        !self.annotations.is_empty()
    }
}

/// Rewrites annotated blocks for a given configuration.
///
/// It holds no state between documents so it can be shared freely and called any number
/// of times on the same content: rewritten blocks use `language-x` and never contain a
/// `lang:` directive, so they are not matched again.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationProcessor<'c> {
    config: &'c Configuration,
}

impl<'c> AnnotationProcessor<'c> {
    pub fn new(config: &'c Configuration) -> Self {
        Self { config }
    }

    /// Quick check on raw content, without rewriting anything.
    pub fn has_annotations(content: &str) -> bool {
        Blocks::new(content).any(|block| annotation_source(block.open_tag).is_some())
    }

    /// Rewrites every annotated block of `content`.
    pub fn process<'a>(&self, content: &'a str) -> ProcessedContent<'a> {
        let mut annotations = Vec::new();
        let mut out = String::new();
        let mut last = 0;

        for Block {
            start,
            end,
            open_tag,
            body,
        } in Blocks::new(content)
        {
            // `lang:` was elsewhere in the tag, not in the class attribute
            let Some(raw) = annotation_source(open_tag) else {
                continue;
            };

            let annotation = Annotation::parse(raw);
            #[cfg(feature = "debug")]
            log::debug!("[process] block at {start}..{end}: {raw:?} -> {annotation:?}");

            if out.is_empty() {
                out.reserve(content.len() + 128);
            }
            out.push_str(&content[last..start]);
            self.render_block(&annotation, body, &mut out);
            annotations.push(annotation);
            last = end;
        }

        if annotations.is_empty() {
            return ProcessedContent {
                content: Cow::Borrowed(content),
                annotations,
            };
        }

        out.push_str(&content[last..]);
        ProcessedContent {
            content: Cow::Owned(out),
            annotations,
        }
    }

    /// Writes the Prism markup of one block. The body is already encoded and is copied
    /// as is; values taken from the class attribute are HTML too, so their character
    /// references are kept.
    fn render_block(&self, annotation: &Annotation, body: &str, out: &mut String) {
        let config = self.config;
        let language_class = annotation.language_class();

        let mut classes = ClassList::default();
        classes.push(CONTAINER_CLASS);
        for class in config.global_class.split_whitespace() {
            if !class.contains(':') {
                classes.push(class);
            }
        }
        if annotation.gutter_enabled(config) {
            classes.push(LINE_NUMBERS_CLASS);
        }
        if let Some(class) = &language_class {
            classes.push(class);
        }
        for class in &annotation.extra_classes {
            classes.push(class);
        }

        let _ = write!(out, r#"<pre class="{}""#, AttributeEscaped(&classes.to_string()));
        let start = annotation.resolved_start_line(config);
        if start != 1 {
            let _ = write!(out, r#" data-start="{start}""#);
        }
        if let Some(ranges) = &annotation.highlight_ranges {
            let _ = write!(out, r#" data-line="{}""#, AttributeEscaped(ranges));
        }
        let _ = write!(
            out,
            r#"><code rel="{}" class="{}">{body}</code></pre>"#,
            AttributeEscaped(&annotation.language),
            AttributeEscaped(language_class.as_deref().unwrap_or("")),
        );
    }
}
