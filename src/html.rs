use std::fmt;
use std::sync::LazyLock;

use onig::{Regex, RegexOptions, Syntax};

/// Case insensitive, `.` also matches newlines.
pub(crate) fn html_regex(pattern: &str) -> Regex {
    Regex::with_options(
        pattern,
        RegexOptions::REGEX_OPTION_IGNORECASE | RegexOptions::REGEX_OPTION_MULTILINE,
        Syntax::default(),
    )
    .expect("built-in HTML pattern should compile")
}

static SCRIPT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| html_regex(r"<script[^>]*?>.*?</script\s*>"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| html_regex(r"<[^>]*>"));

/// Removes every markup tag from `input` but keeps the text between them, so CSS pasted
/// inside a `<style>` element survives. `<script>` elements are dropped whole.
pub(crate) fn strip_tags(input: &str) -> String {
    let without_scripts = SCRIPT_ELEMENT.replace_all(input, "");
    ANY_TAG.replace_all(&without_scripts, "").trim().to_string()
}

/// Whether `s`, which follows a `&`, is the rest of a character reference such as
/// `amp;`, `#39;` or `#x27;`.
fn is_entity_tail(s: &str) -> bool {
    // the longest named references are around 30 characters
    let Some(end) = s.bytes().take(40).position(|b| b == b';') else {
        return false;
    };
    let name = &s[..end];
    if let Some(num) = name.strip_prefix('#') {
        match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
            None => !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()),
        }
    } else {
        name.starts_with(|c: char| c.is_ascii_alphabetic())
            && name.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

// From syntect
pub(crate) struct HtmlEscaped<'a>(pub &'a str);
impl fmt::Display for HtmlEscaped<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Because the internet is always right, turns out there's not that many
        // characters to escape: http://stackoverflow.com/questions/7381974
        let Self(s) = *self;
        let mut last = 0;
        for (i, ch) in s.bytes().enumerate() {
            let escaped = match ch {
                b'>' => "&gt;",
                b'<' => "&lt;",
                b'&' => "&amp;",
                b'\'' => "&#39;",
                b'"' => "&quot;",
                _ => continue,
            };
            fmt.write_str(&s[last..i])?;
            fmt.write_str(escaped)?;
            last = i + 1;
        }

        if last < s.len() {
            fmt.write_str(&s[last..])?;
        }
        Ok(())
    }
}

/// Escapes text that is already HTML, for use in an attribute value: character
/// references are kept as they are, only a bare `&` gets encoded.
pub(crate) struct AttributeEscaped<'a>(pub &'a str);
impl fmt::Display for AttributeEscaped<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(s) = *self;
        let mut last = 0;
        for (i, ch) in s.bytes().enumerate() {
            let escaped = match ch {
                b'>' => "&gt;",
                b'<' => "&lt;",
                b'&' if is_entity_tail(&s[i + 1..]) => continue,
                b'&' => "&amp;",
                b'\'' => "&#39;",
                b'"' => "&quot;",
                _ => continue,
            };
            fmt.write_str(&s[last..i])?;
            fmt.write_str(escaped)?;
            last = i + 1;
        }

        if last < s.len() {
            fmt.write_str(&s[last..])?;
        }
        Ok(())
    }
}

/// An ordered list of CSS classes where the first occurrence of a class wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClassList(Vec<String>);

impl ClassList {
    pub fn push(&mut self, class: impl AsRef<str>) {
        for class in class.as_ref().split_whitespace() {
            if !self.0.iter().any(|c| c == class) {
                self.0.push(class.to_string());
            }
        }
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}
