//! Pre-emission text formatting.
//!
//! This is textual hygiene, not a real code formatter: no language is ever
//! parsed.  Plain text loses its trailing newlines; code languages lose
//! trailing whitespace per line while keeping indentation and blank lines
//! intact, so the replayed keystrokes reproduce the snippet faithfully in
//! editors that auto-trim.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Formatting profile selected in the UI language dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    /// Plain text — no per-line processing.
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "c++")]
    Cpp,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "javascript")]
    JavaScript,
    #[serde(rename = "c#")]
    CSharp,
}

impl Default for Language {
    fn default() -> Self {
        Language::Text
    }
}

impl Language {
    /// All selectable languages, in UI dropdown order.
    pub const ALL: [Language; 6] = [
        Language::Text,
        Language::Python,
        Language::Cpp,
        Language::Java,
        Language::JavaScript,
        Language::CSharp,
    ];

    /// Label shown in the language dropdown (matches the serialized form).
    pub fn label(&self) -> &'static str {
        match self {
            Language::Text => "text",
            Language::Python => "python",
            Language::Cpp => "c++",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::CSharp => "c#",
        }
    }
}

// ---------------------------------------------------------------------------
// format_text
// ---------------------------------------------------------------------------

/// Normalize `text` for emission according to `language`.
///
/// * `Text` — strips trailing newlines only.
/// * Any code language — strips trailing whitespace from every line,
///   preserving leading indentation and blank lines.
///
/// Total: never fails, never drops non-whitespace content.
pub fn format_text(text: &str, language: Language) -> String {
    match language {
        Language::Text => text.trim_end_matches('\n').to_string(),
        _ => strip_trailing_per_line(text),
    }
}

/// Strip trailing whitespace from each line, keeping the line structure.
///
/// `split('\n')` rather than `lines()`: the latter swallows a final empty
/// line, which would silently drop the trailing newline (and its Enter
/// keystroke) from code that ends with one.
fn strip_trailing_per_line(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_strips_trailing_newlines_only() {
        assert_eq!(format_text("hello\n\n", Language::Text), "hello");
        assert_eq!(format_text("a\nb\n", Language::Text), "a\nb");
    }

    #[test]
    fn text_keeps_interior_whitespace() {
        assert_eq!(format_text("a  \nb", Language::Text), "a  \nb");
    }

    #[test]
    fn code_strips_trailing_whitespace_per_line() {
        let src = "def f():   \n    return 1  ";
        assert_eq!(format_text(src, Language::Python), "def f():\n    return 1");
    }

    #[test]
    fn code_keeps_trailing_newlines() {
        assert_eq!(format_text("a\n", Language::Python), "a\n");
        assert_eq!(format_text("a\n\n", Language::Python), "a\n\n");
        // Whitespace on the final line still goes; the line itself stays.
        assert_eq!(format_text("a\n   ", Language::Python), "a\n");
    }

    #[test]
    fn code_preserves_indentation() {
        let src = "int main() {\n    return 0;\n}";
        assert_eq!(format_text(src, Language::Cpp), src);
    }

    #[test]
    fn code_keeps_blank_lines() {
        let src = "a\n\nb";
        for lang in [Language::Java, Language::JavaScript, Language::CSharp] {
            assert_eq!(format_text(src, lang), "a\n\nb");
        }
    }

    #[test]
    fn empty_input_is_total() {
        for lang in Language::ALL {
            assert_eq!(format_text("", lang), "");
        }
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for lang in Language::ALL {
            let value = toml::Value::try_from(lang).unwrap();
            assert_eq!(value.as_str(), Some(lang.label()));
            let back: Language = value.try_into().unwrap();
            assert_eq!(back, lang);
        }
    }
}
