/// Live sketch blocks inside markdown documentation.
///
/// Fenced code blocks tagged `seed` are replaced by an HTML block showing
/// the escaped source next to its generated output. Everything else is
/// passed through untouched for a downstream markdown renderer.

use crate::core::config::EngineConfig;
use crate::core::generator::Generator;
use crate::core::parser::parse_phrase_book;
use crate::core::pipeline::SketchError;
use crate::core::seed::Seed;

/// Info string that marks a fenced block as a sketch.
pub const SEED_LANG: &str = "seed";

/// Turns the source of one sketch block into its output.
pub trait BlockRenderer {
    fn render_block(&self, source: &str) -> Result<String, SketchError>;
}

impl<F> BlockRenderer for F
where
    F: Fn(&str) -> Result<String, SketchError>,
{
    fn render_block(&self, source: &str) -> Result<String, SketchError> {
        self(source)
    }
}

/// Parses and generates each block with the engine at `t = 0`.
#[derive(Debug, Clone)]
pub struct EngineRenderer {
    generator: Generator,
    seed: Seed,
}

impl EngineRenderer {
    pub fn new(seed: Seed) -> Self {
        Self::with_config(EngineConfig::default(), seed)
    }

    pub fn with_config(config: EngineConfig, seed: Seed) -> Self {
        Self {
            generator: Generator::new(config),
            seed,
        }
    }
}

impl BlockRenderer for EngineRenderer {
    fn render_block(&self, source: &str) -> Result<String, SketchError> {
        let book = parse_phrase_book(source)?;
        Ok(self.generator.generate_default(&book, &self.seed, 0.0)?)
    }
}

struct Fence {
    marker: char,
    len: usize,
    /// Spaces before the opening fence; removed from each content line.
    indent: usize,
}

/// Opening fence: up to three spaces, then three or more backticks or tildes.
fn opening_fence(line: &str) -> Option<(Fence, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some((Fence { marker, len, indent }, info))
}

/// Remove up to `indent` leading spaces.
fn strip_fence_indent(line: &str, indent: usize) -> &str {
    let spaces = line.bytes().take(indent).take_while(|b| *b == b' ').count();
    &line[spaces..]
}

fn is_closing_fence(line: &str, fence: &Fence) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    let len = rest.chars().take_while(|c| *c == fence.marker).count();
    len >= fence.len && rest[len..].trim().is_empty()
}

/// Replace every `seed` fenced block in `markdown` with live output.
pub fn render_markdown(markdown: &str, renderer: &dyn BlockRenderer) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut lines = markdown.split_inclusive('\n');

    while let Some(line) = lines.next() {
        let Some((fence, info)) = opening_fence(line.trim_end_matches(['\n', '\r'])) else {
            out.push_str(line);
            continue;
        };
        let lang = info.split_whitespace().next().unwrap_or("");

        let mut body: Vec<&str> = Vec::new();
        let mut closing = None;
        for inner in lines.by_ref() {
            if is_closing_fence(inner.trim_end_matches(['\n', '\r']), &fence) {
                closing = Some(inner);
                break;
            }
            body.push(inner);
        }

        if lang != SEED_LANG {
            out.push_str(line);
            body.iter().for_each(|l| out.push_str(l));
            if let Some(closing) = closing {
                out.push_str(closing);
            }
            continue;
        }

        let code: String = body
            .iter()
            .map(|l| strip_fence_indent(l, fence.indent))
            .collect();
        let code = code.strip_suffix('\n').unwrap_or(&code);
        out.push_str(&render_block_html(code, renderer));
        out.push('\n');
    }
    out
}

fn render_block_html(code: &str, renderer: &dyn BlockRenderer) -> String {
    // Newlines in the escaped source become entities so the whole block stays
    // on one line and survives as a single markdown HTML block.
    let source = escape_html(code).replace('\n', "&#10;");
    let result = match renderer.render_block(code) {
        Ok(text) => format!("<div class=\"code-result\">{}</div>", text),
        Err(e) => format!(
            "<div class=\"code-result error\">{}</div>",
            escape_html(&e.to_string())
        ),
    };
    format!(
        "<div class=\"code-wrap\"><pre><code>{}</code></pre>{}</div>",
        source, result
    )
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generator::GenerationError;

    fn renderer() -> EngineRenderer {
        EngineRenderer::new(Seed::from("otter42"))
    }

    #[test]
    fn text_without_fences_is_unchanged() {
        let md = "# Title\n\nSome *text*.\n";
        assert_eq!(render_markdown(md, &renderer()), md);
    }

    #[test]
    fn other_fences_pass_through() {
        let md = "```rust\nfn main() {}\n```\nafter\n";
        assert_eq!(render_markdown(md, &renderer()), md);
    }

    #[test]
    fn seed_fence_is_replaced() {
        let md = "intro\n\n```seed\nroot:\n- <b>hi</b>\n```\n\nafter\n";
        let html = render_markdown(md, &renderer());
        assert_eq!(
            html,
            "intro\n\n<div class=\"code-wrap\"><pre><code>root:&#10;- &lt;b&gt;hi&lt;/b&gt;</code></pre>\
             <div class=\"code-result\"><b>hi</b></div></div>\n\nafter\n"
        );
    }

    #[test]
    fn indented_fence_content_is_dedented() {
        let md = "  ```seed\n  root:\n  - hi\n    there\n  ```\n";
        let html = render_markdown(md, &renderer());
        assert!(!html.contains("code-result error"), "{}", html);
        assert!(html.contains("<pre><code>root:&#10;- hi&#10;  there</code></pre>"), "{}", html);
        assert!(html.contains("<div class=\"code-result\">hi there</div>"), "{}", html);
    }

    #[test]
    fn dedent_stops_at_content() {
        assert_eq!(strip_fence_indent("   x", 2), " x");
        assert_eq!(strip_fence_indent(" x", 3), "x");
        assert_eq!(strip_fence_indent("x", 3), "x");
    }

    #[test]
    fn tilde_fence_and_info_words() {
        let md = "~~~~ seed extra\nroot:\n- x\n~~~~\n";
        let html = render_markdown(md, &renderer());
        assert!(html.contains("<div class=\"code-result\">x</div>"));
        assert!(!html.contains("~~~~"));
    }

    #[test]
    fn shorter_fence_does_not_close() {
        let md = "````seed\nroot:\n- ```\n````\n";
        let html = render_markdown(md, &renderer());
        assert!(html.contains("<div class=\"code-result\">```</div>"), "{}", html);
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let md = "```seed\nroot:\n- tail\n";
        let html = render_markdown(md, &renderer());
        assert!(html.contains("<div class=\"code-result\">tail</div>"));
    }

    #[test]
    fn errors_are_escaped_in_place() {
        let md = "```seed\nroot:\n- {{ <nope> }}\n```\n";
        let html = render_markdown(md, &renderer());
        assert!(html.contains("code-result error"));
        assert!(html.contains("&lt;nope&gt;"));
        assert!(!html.contains("<nope>"));
    }

    #[test]
    fn injected_renderer_is_used() {
        let calls = std::cell::Cell::new(0);
        let fake = |source: &str| -> Result<String, SketchError> {
            calls.set(calls.get() + 1);
            Ok(format!("{} bytes", source.len()))
        };
        let md = "```seed\nabc\n```\n```seed\nde\n```\n";
        let html = render_markdown(md, &fake);
        assert_eq!(calls.get(), 2);
        assert!(html.contains("3 bytes"));
        assert!(html.contains("2 bytes"));
    }

    #[test]
    fn injected_failure_is_reported() {
        let failing = |_: &str| -> Result<String, SketchError> {
            Err(GenerationError::NoPositiveWeight {
                category: "root".to_string(),
            }
            .into())
        };
        let html = render_markdown("```seed\nx\n```\n", &failing);
        assert!(html.contains("no alternative with positive weight"));
    }

    #[test]
    fn escape_html_covers_specials() {
        assert_eq!(escape_html("<a href='x'>&\"</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&quot;&lt;/a&gt;");
    }
}
