/// Phrase-book grammar model — categories, weighted alternatives, templates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Name of the reserved metadata entry.
pub const PREAMBLE_KEY: &str = "%preamble";

/// Default playback duration in seconds.
pub const DEFAULT_DURATION: f64 = 2.0;

/// Error raised while splitting an alternative into segments.
///
/// `offset` is a character offset into the alternative text, which the
/// parser turns into a line/column when it can.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TemplateError {
    pub offset: usize,
    pub message: String,
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Literal text, emitted as-is (markup included).
    Literal(String),
    /// Reference to a category: `{{ name }}`.
    Placeholder(String),
}

/// A parsed template — a sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{{ name }}` → `Placeholder` (whitespace inside the delimiters is ignored)
    /// - Everything else, including lone `{`, `}` and stray `}}` → `Literal`
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' && i + 1 < len && chars[i + 1] == '{' {
                let open = i;
                let start = i + 2;
                let mut end = start;
                while end + 1 < len && !(chars[end] == '}' && chars[end + 1] == '}') {
                    end += 1;
                }
                if end + 1 >= len {
                    return Err(TemplateError {
                        offset: open,
                        message: "unterminated placeholder: expected '}}'".to_string(),
                    });
                }

                let content: String = chars[start..end].iter().collect();
                let name = content.trim();
                if !is_valid_name(name) {
                    let message = if name.is_empty() {
                        "empty placeholder".to_string()
                    } else {
                        format!("invalid placeholder name '{}'", name)
                    };
                    return Err(TemplateError {
                        offset: open,
                        message,
                    });
                }

                if !literal_buf.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal_buf)));
                }
                segments.push(Segment::Placeholder(name.to_string()));
                i = end + 2;
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(Segment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    /// Names referenced by this template, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// Whether `name` is usable as a category or placeholder name:
/// `[A-Za-z_][A-Za-z0-9_-]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A weighted text alternative within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub weight: f64,
    pub template: Template,
}

/// A named group of interchangeable alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub alternatives: Vec<Alternative>,
}

impl Category {
    /// Sum of all alternative weights.
    pub fn total_weight(&self) -> f64 {
        self.alternatives.iter().map(|a| a.weight).sum()
    }
}

/// How a playing sketch advances once `duration` has elapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Loop forever.
    #[default]
    Bounce,
    /// Stop after one pass.
    Once,
}

impl AnimationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationMode::Bounce => "bounce",
            AnimationMode::Once => "once",
        }
    }

    pub fn from_name(name: &str) -> Option<AnimationMode> {
        match name {
            "bounce" => Some(AnimationMode::Bounce),
            "once" => Some(AnimationMode::Once),
            _ => None,
        }
    }
}

impl fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation-wide settings from the `%preamble` block.
///
/// The engine never reads these; they drive the caller's playback loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preamble {
    pub duration: f64,
    pub animation: AnimationMode,
}

impl Default for Preamble {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            animation: AnimationMode::Bounce,
        }
    }
}

/// A parsed grammar. Immutable once built: a new source text means a new
/// `PhraseBook`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhraseBook {
    categories: FxHashMap<String, Category>,
    preamble: Preamble,
}

impl PhraseBook {
    pub(crate) fn new(categories: FxHashMap<String, Category>, preamble: Preamble) -> Self {
        Self {
            categories,
            preamble,
        }
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Category names, sorted for stable presentation.
    pub fn category_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    pub fn duration(&self) -> f64 {
        self.preamble.duration
    }

    pub fn animation(&self) -> AnimationMode {
        self.preamble.animation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.").unwrap();
        assert_eq!(t.segments, vec![Segment::Literal("Hello, world.".to_string())]);
    }

    #[test]
    fn parse_placeholder() {
        let t = Template::parse("Dear {{ giver }}, thanks").unwrap();
        assert_eq!(
            t.segments,
            vec![
                Segment::Literal("Dear ".to_string()),
                Segment::Placeholder("giver".to_string()),
                Segment::Literal(", thanks".to_string()),
            ]
        );
    }

    #[test]
    fn placeholder_whitespace_is_insignificant() {
        let a = Template::parse("{{giver}}").unwrap();
        let b = Template::parse("{{   giver\t}}").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn adjacent_placeholders() {
        let t = Template::parse("{{a}}{{ b }}").unwrap();
        assert_eq!(t.placeholders().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(t.segments.len(), 2);
    }

    #[test]
    fn single_braces_are_literal() {
        let t = Template::parse("<style>p { color: red; }</style> }}").unwrap();
        assert_eq!(
            t.segments,
            vec![Segment::Literal("<style>p { color: red; }</style> }}".to_string())]
        );
    }

    #[test]
    fn unterminated_placeholder_error() {
        let err = Template::parse("Hi {{ name").unwrap_err();
        assert_eq!(err.offset, 3);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn empty_placeholder_error() {
        assert!(Template::parse("Bad {{ }} here").is_err());
    }

    #[test]
    fn invalid_placeholder_name_error() {
        let err = Template::parse("x {{ two words }}").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(err.message.contains("two words"));
        assert!(Template::parse("{{ 9lives }}").is_err());
    }

    #[test]
    fn name_rules() {
        assert!(is_valid_name("root"));
        assert!(is_valid_name("_x-1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("-x"));
        assert!(!is_valid_name("%preamble"));
    }

    #[test]
    fn preamble_defaults() {
        let book = PhraseBook::default();
        assert_eq!(book.duration(), 2.0);
        assert_eq!(book.animation(), AnimationMode::Bounce);
    }

    #[test]
    fn total_weight_sums_alternatives() {
        let cat = Category {
            name: "c".to_string(),
            alternatives: vec![
                Alternative {
                    weight: 1.5,
                    template: Template::parse("a").unwrap(),
                },
                Alternative {
                    weight: 0.0,
                    template: Template::parse("b").unwrap(),
                },
            ],
        };
        assert_eq!(cat.total_weight(), 1.5);
    }

    #[test]
    fn phrase_book_ron_round_trip() {
        let mut categories = FxHashMap::default();
        categories.insert(
            "root".to_string(),
            Category {
                name: "root".to_string(),
                alternatives: vec![Alternative {
                    weight: 2.0,
                    template: Template::parse("Hello {{ name }}.").unwrap(),
                }],
            },
        );
        let book = PhraseBook::new(
            categories,
            Preamble {
                duration: 3.5,
                animation: AnimationMode::Once,
            },
        );

        let serialized = ron::to_string(&book).unwrap();
        let deserialized: PhraseBook = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, book);
    }
}
