//! WASM bindings for seed-engine — powers the browser sketch editor.

use wasm_bindgen::prelude::*;

use seed_engine::core::config::EngineConfig;
use seed_engine::core::grammar::Preamble;
use seed_engine::docs::markdown::{render_markdown, EngineRenderer};
use seed_engine::{
    generate_string, next_text_seed, parse_phrase_book, prev_text_seed, random_text_seed,
    GenerationContext, Seed, Sketch,
};

// ---------------------------------------------------------------------------
// Embedded sample sketches — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const THANK_YOU: &str = include_str!("../../sketches/thank_you.seed");
    pub const SHAPES: &str = include_str!("../../sketches/shapes.seed");
    pub const PULSE: &str = include_str!("../../sketches/pulse.seed");
    pub const COUNTDOWN: &str = include_str!("../../sketches/countdown.seed");
    pub const RECURSION: &str = include_str!("../../sketches/recursion.seed");

    pub const SAMPLES: &[(&str, &str)] = &[
        ("thank_you", THANK_YOU),
        ("shapes", SHAPES),
        ("pulse", PULSE),
        ("countdown", COUNTDOWN),
        ("recursion", RECURSION),
    ];
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct PreambleInfo {
    duration: f64,
    animation: String,
}

impl From<&Preamble> for PreambleInfo {
    fn from(p: &Preamble) -> Self {
        PreambleInfo {
            duration: p.duration,
            animation: p.animation.as_str().to_string(),
        }
    }
}

#[derive(serde::Serialize)]
struct Variant {
    seed: String,
    text: String,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Parse `source` and render it once from its `root` category.
#[wasm_bindgen]
pub fn generate(source: &str, seed: &str, t: f64) -> Result<String, JsError> {
    let book = parse_phrase_book(source).map_err(|e| JsError::new(&e.to_string()))?;
    let context = GenerationContext::new();
    generate_string(
        &book,
        &EngineConfig::default().start_category,
        &context,
        &Seed::from(seed),
        t,
    )
    .map_err(|e| JsError::new(&e.to_string()))
}

#[wasm_bindgen]
pub fn random_seed() -> String {
    random_text_seed().to_string()
}

#[wasm_bindgen]
pub fn next_seed(seed: &str) -> String {
    next_text_seed(&Seed::from(seed)).to_string()
}

#[wasm_bindgen]
pub fn prev_seed(seed: &str) -> String {
    prev_text_seed(&Seed::from(seed)).to_string()
}

/// Return the preamble of `source` as JSON: `{"duration": 2.0, "animation": "bounce"}`.
#[wasm_bindgen]
pub fn preamble(source: &str) -> Result<String, JsError> {
    let book = parse_phrase_book(source).map_err(|e| JsError::new(&e.to_string()))?;
    serde_json::to_string(&PreambleInfo::from(book.preamble()))
        .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

/// Replace `seed` fenced blocks in `markdown` with live output.
#[wasm_bindgen]
pub fn render_docs(markdown: &str, seed: &str) -> String {
    render_markdown(markdown, &EngineRenderer::new(Seed::from(seed)))
}

/// Return JSON array of embedded sample names.
#[wasm_bindgen]
pub fn sample_names() -> String {
    let names: Vec<&str> = data::SAMPLES.iter().map(|(name, _)| *name).collect();
    serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
}

/// Source text of an embedded sample.
#[wasm_bindgen]
pub fn sample_source(name: &str) -> Result<String, JsError> {
    data::SAMPLES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, src)| src.to_string())
        .ok_or_else(|| JsError::new(&format!("Unknown sample: {name}")))
}

// ---------------------------------------------------------------------------
// SketchHandle — an editor session
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct SketchHandle {
    sketch: Sketch,
}

#[wasm_bindgen]
impl SketchHandle {
    /// Create a session. An empty `seed` picks a random one.
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str, seed: &str) -> Result<SketchHandle, JsError> {
        let mut builder = Sketch::builder().source(source);
        if !seed.trim().is_empty() {
            builder = builder.seed(Seed::from(seed));
        }
        let sketch = builder
            .build()
            .map_err(|e| JsError::new(&format!("Sketch build error: {e}")))?;
        Ok(SketchHandle { sketch })
    }

    /// Replace the source. On a parse error the previous output is kept and
    /// the error is returned.
    pub fn set_source(&mut self, source: &str) -> Result<String, JsError> {
        self.sketch
            .set_source(source)
            .map(str::to_string)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn set_seed(&mut self, seed: &str) -> Result<String, JsError> {
        self.sketch
            .set_seed(Seed::from(seed))
            .map(str::to_string)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn next_seed(&mut self) -> Result<String, JsError> {
        self.sketch
            .next_seed()
            .map(str::to_string)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn prev_seed(&mut self) -> Result<String, JsError> {
        self.sketch
            .prev_seed()
            .map(str::to_string)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn render_frame(&mut self, t: f64) -> Result<String, JsError> {
        self.sketch
            .render_frame(t)
            .map(str::to_string)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Frame for `elapsed_secs` since playback started; `undefined` once a
    /// `once` animation has finished.
    pub fn play_frame(&mut self, elapsed_secs: f64) -> Result<Option<String>, JsError> {
        self.sketch
            .play_frame(elapsed_secs)
            .map(|frame| frame.map(str::to_string))
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Render `count` successive seeds. Returns a JSON array of `{seed, text}`.
    pub fn variants(&self, count: usize) -> Result<String, JsError> {
        let variants: Vec<Variant> = self
            .sketch
            .variants(count)
            .map_err(|e| JsError::new(&e.to_string()))?
            .into_iter()
            .map(|(seed, text)| Variant {
                seed: seed.to_string(),
                text,
            })
            .collect();
        serde_json::to_string(&variants)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    pub fn output(&self) -> String {
        self.sketch.output().to_string()
    }

    pub fn last_error(&self) -> Option<String> {
        self.sketch.last_error().map(str::to_string)
    }

    pub fn seed(&self) -> String {
        self.sketch.seed().to_string()
    }

    pub fn duration(&self) -> f64 {
        self.sketch.playback().duration()
    }

    pub fn animation(&self) -> String {
        self.sketch.playback().animation().as_str().to_string()
    }
}
