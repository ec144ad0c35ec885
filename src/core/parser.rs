/// Phrase-book parser — indentation-structured grammar text to `PhraseBook`.
///
/// ```text
/// %preamble:
///   duration: 4
///   animation: once
///
/// root:
/// - Dear {{ giver }}, thank you for the {{ object }}.
/// - 3x Hey {{ giver }}, thanks for the {{ object }}!
/// ```
///
/// Placeholder targets are not checked here; categories may be defined
/// after their first reference, and cycles are the generator's concern.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::core::grammar::{
    is_valid_name, Alternative, AnimationMode, Category, PhraseBook, Preamble, Template,
    PREAMBLE_KEY,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Indentation { line: usize, message: String },
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: duplicate category '{name}' (first defined on line {first_line})")]
    DuplicateCategory {
        name: String,
        line: usize,
        first_line: usize,
    },
    #[error("line {line}: category '{name}' has no alternatives")]
    EmptyCategory { name: String, line: usize },
    #[error("line {line}{}: {message} in category '{category}'", column_suffix(.column))]
    Placeholder {
        category: String,
        line: usize,
        column: Option<usize>,
        message: String,
    },
    #[error("line {line}: %preamble: {message}")]
    Preamble { line: usize, message: String },
}

fn column_suffix(column: &Option<usize>) -> String {
    match column {
        Some(c) => format!(", column {}", c),
        None => String::new(),
    }
}

impl ParseError {
    /// 1-based line the error was detected on.
    pub fn line(&self) -> usize {
        match self {
            ParseError::Indentation { line, .. }
            | ParseError::Syntax { line, .. }
            | ParseError::DuplicateCategory { line, .. }
            | ParseError::EmptyCategory { line, .. }
            | ParseError::Placeholder { line, .. }
            | ParseError::Preamble { line, .. } => *line,
        }
    }

    /// 1-based column, when it can be pinned down.
    pub fn column(&self) -> Option<usize> {
        match self {
            ParseError::Placeholder { column, .. } => *column,
            _ => None,
        }
    }
}

/// Parse grammar text into a `PhraseBook`.
pub fn parse_phrase_book(text: &str) -> Result<PhraseBook, ParseError> {
    let book = Parser::default().parse(text)?;
    debug!(
        categories = book.len(),
        duration = book.duration(),
        animation = %book.animation(),
        "parsed phrase book"
    );
    Ok(book)
}

/// An alternative as written, before weight/quote/placeholder handling.
struct RawItem {
    line: usize,
    /// 1-based column of the first content character after the list marker.
    column: usize,
    text: String,
    /// Continuation lines were folded in; columns no longer map to the source.
    folded: bool,
}

struct CategoryBlock {
    name: String,
    line: usize,
    indent: Option<usize>,
    items: Vec<RawItem>,
}

struct PreambleBlock {
    indent: Option<usize>,
    duration: Option<f64>,
    animation: Option<AnimationMode>,
}

enum Block {
    Category(CategoryBlock),
    Preamble(PreambleBlock),
}

#[derive(Default)]
struct Parser {
    categories: FxHashMap<String, Category>,
    first_lines: FxHashMap<String, usize>,
    preamble: Option<Preamble>,
    current: Option<Block>,
}

impl Parser {
    fn parse(mut self, text: &str) -> Result<PhraseBook, ParseError> {
        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

            let body = line.trim_start_matches([' ', '\t']);
            if body.trim().is_empty() || body.starts_with('#') {
                continue;
            }
            let leading = &line[..line.len() - body.len()];
            if leading.contains('\t') {
                return Err(ParseError::Indentation {
                    line: line_no,
                    message: "tab characters are not allowed in indentation".to_string(),
                });
            }
            let indent = leading.len();

            if is_list_item(body) {
                self.item_line(line_no, indent, body)?;
            } else if indent == 0 {
                self.key_line(line_no, body)?;
            } else {
                self.indented_line(line_no, indent, body)?;
            }
        }
        self.finish_block()?;

        Ok(PhraseBook::new(
            self.categories,
            self.preamble.unwrap_or_default(),
        ))
    }

    fn key_line(&mut self, line: usize, body: &str) -> Result<(), ParseError> {
        self.finish_block()?;

        let trimmed = body.trim_end();
        let key = match trimmed.strip_suffix(':') {
            Some(key) => key.trim_end(),
            None => {
                let message = if trimmed.contains(':') {
                    "expected a category name followed by ':' with alternatives on the following lines"
                } else {
                    "expected a category name followed by ':'"
                };
                return Err(ParseError::Syntax {
                    line,
                    message: message.to_string(),
                });
            }
        };

        if key != PREAMBLE_KEY && !is_valid_name(key) {
            return Err(ParseError::Syntax {
                line,
                message: format!("invalid category name '{}'", key),
            });
        }
        if let Some(&first_line) = self.first_lines.get(key) {
            return Err(ParseError::DuplicateCategory {
                name: key.to_string(),
                line,
                first_line,
            });
        }
        self.first_lines.insert(key.to_string(), line);

        self.current = Some(if key == PREAMBLE_KEY {
            Block::Preamble(PreambleBlock {
                indent: None,
                duration: None,
                animation: None,
            })
        } else {
            Block::Category(CategoryBlock {
                name: key.to_string(),
                line,
                indent: None,
                items: Vec::new(),
            })
        });
        Ok(())
    }

    fn item_line(&mut self, line: usize, indent: usize, body: &str) -> Result<(), ParseError> {
        let block = match self.current.as_mut() {
            Some(Block::Category(block)) => block,
            Some(Block::Preamble(_)) => {
                return Err(ParseError::Preamble {
                    line,
                    message: "expected 'key: value' settings, found a list item".to_string(),
                });
            }
            None => {
                return Err(ParseError::Syntax {
                    line,
                    message: "list item outside of any category".to_string(),
                });
            }
        };

        check_indent(&mut block.indent, line, indent)?;

        let after_marker = &body[1..];
        let content = after_marker.trim_start_matches([' ', '\t']);
        let gap = after_marker.chars().count() - content.chars().count();
        block.items.push(RawItem {
            line,
            column: indent + 1 + gap + 1,
            text: content.trim_end().to_string(),
            folded: false,
        });
        Ok(())
    }

    fn indented_line(&mut self, line: usize, indent: usize, body: &str) -> Result<(), ParseError> {
        match self.current.as_mut() {
            Some(Block::Category(block)) => {
                let item_indent = block.indent.unwrap_or(0);
                match block.items.last_mut() {
                    Some(item) if indent > item_indent => {
                        if !item.text.is_empty() {
                            item.text.push(' ');
                        }
                        item.text.push_str(body.trim_end());
                        item.folded = true;
                        Ok(())
                    }
                    _ => Err(ParseError::Indentation {
                        line,
                        message: format!(
                            "expected a list item ('- ...') in category '{}'",
                            block.name
                        ),
                    }),
                }
            }
            Some(Block::Preamble(block)) => {
                check_indent(&mut block.indent, line, indent)?;
                preamble_setting(block, line, body.trim_end())
            }
            None => Err(ParseError::Indentation {
                line,
                message: "indented line outside of any category".to_string(),
            }),
        }
    }

    fn finish_block(&mut self) -> Result<(), ParseError> {
        match self.current.take() {
            Some(Block::Category(block)) => {
                if block.items.is_empty() {
                    return Err(ParseError::EmptyCategory {
                        name: block.name,
                        line: block.line,
                    });
                }
                let mut alternatives = Vec::with_capacity(block.items.len());
                for item in &block.items {
                    alternatives.push(build_alternative(&block.name, item)?);
                }
                self.categories.insert(
                    block.name.clone(),
                    Category {
                        name: block.name,
                        alternatives,
                    },
                );
            }
            Some(Block::Preamble(block)) => {
                let defaults = Preamble::default();
                self.preamble = Some(Preamble {
                    duration: block.duration.unwrap_or(defaults.duration),
                    animation: block.animation.unwrap_or(defaults.animation),
                });
            }
            None => {}
        }
        Ok(())
    }
}

fn is_list_item(body: &str) -> bool {
    let mut chars = body.chars();
    chars.next() == Some('-') && chars.next().map_or(true, |c| c == ' ' || c == '\t')
}

fn check_indent(expected: &mut Option<usize>, line: usize, indent: usize) -> Result<(), ParseError> {
    match *expected {
        None => {
            *expected = Some(indent);
            Ok(())
        }
        Some(e) if e == indent => Ok(()),
        Some(e) => Err(ParseError::Indentation {
            line,
            message: format!(
                "inconsistent indentation: expected {} spaces, found {}",
                e, indent
            ),
        }),
    }
}

fn preamble_setting(block: &mut PreambleBlock, line: usize, body: &str) -> Result<(), ParseError> {
    let (key, value) = body.split_once(':').ok_or_else(|| ParseError::Preamble {
        line,
        message: format!("expected 'key: value', found '{}'", body),
    })?;
    let key = key.trim();
    let value = unquote_setting(value.trim());

    match key {
        "duration" => {
            if block.duration.is_some() {
                return Err(duplicate_setting(line, key));
            }
            let duration = value
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d > 0.0)
                .ok_or_else(|| ParseError::Preamble {
                    line,
                    message: format!(
                        "duration must be a positive number of seconds, got '{}'",
                        value
                    ),
                })?;
            block.duration = Some(duration);
        }
        "animation" => {
            if block.animation.is_some() {
                return Err(duplicate_setting(line, key));
            }
            let mode = AnimationMode::from_name(value).ok_or_else(|| ParseError::Preamble {
                line,
                message: format!("animation must be 'bounce' or 'once', got '{}'", value),
            })?;
            block.animation = Some(mode);
        }
        other => {
            return Err(ParseError::Preamble {
                line,
                message: format!("unrecognized setting '{}'", other),
            });
        }
    }
    Ok(())
}

fn duplicate_setting(line: usize, key: &str) -> ParseError {
    ParseError::Preamble {
        line,
        message: format!("setting '{}' given more than once", key),
    }
}

fn unquote_setting(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn build_alternative(category: &str, item: &RawItem) -> Result<Alternative, ParseError> {
    let (weight, rest, prefix_chars) = split_weight(&item.text).map_err(|message| {
        ParseError::Syntax {
            line: item.line,
            message,
        }
    })?;

    let (text, quoted) = unquote_item(rest).map_err(|message| ParseError::Syntax {
        line: item.line,
        message,
    })?;

    let template = Template::parse(&text).map_err(|e| ParseError::Placeholder {
        category: category.to_string(),
        line: item.line,
        column: (!item.folded && !quoted).then(|| item.column + prefix_chars + e.offset),
        message: e.message,
    })?;

    Ok(Alternative { weight, template })
}

/// Split a leading `Nx` weight token off an item.
///
/// Returns the weight (1 when absent), the remaining text and the number of
/// characters consumed.
fn split_weight(text: &str) -> Result<(f64, &str, usize), String> {
    let Some(token_end) = text.find([' ', '\t']) else {
        return Ok((1.0, text, 0));
    };
    let token = &text[..token_end];
    let Some(number) = token.strip_suffix('x') else {
        return Ok((1.0, text, 0));
    };
    if !is_decimal(number) {
        return Ok((1.0, text, 0));
    }

    let weight: f64 = number
        .parse()
        .map_err(|_| format!("invalid weight '{}'", token))?;
    if !weight.is_finite() {
        return Err(format!("weight '{}' is out of range", token));
    }

    let rest = text[token_end..].trim_start_matches([' ', '\t']);
    let consumed = text.chars().count() - rest.chars().count();
    Ok((weight, rest, consumed))
}

fn is_decimal(s: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for c in s.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// Strip surrounding quotes, if any. Returns the text and whether it was quoted.
fn unquote_item(text: &str) -> Result<(String, bool), String> {
    if let Some(inner) = text.strip_prefix('"') {
        let inner = inner
            .strip_suffix('"')
            .ok_or_else(|| "unterminated double-quoted string".to_string())?;
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => return Err(format!("unknown escape sequence '\\{}'", other)),
                None => return Err("unterminated double-quoted string".to_string()),
            }
        }
        return Ok((out, true));
    }

    if let Some(inner) = text.strip_prefix('\'') {
        let inner = inner
            .strip_suffix('\'')
            .ok_or_else(|| "unterminated single-quoted string".to_string())?;
        return Ok((inner.replace("''", "'"), true));
    }

    Ok((text.to_string(), false))
}
