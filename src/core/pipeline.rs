/// The sketch pipeline: source text + seed → rendered output.
///
/// Holds the state an editing surface needs between render requests: the
/// current source and seed, the phrase book parsed from the last good
/// source, the last good output and the last error message. Parsing
/// happens once per source change; seed changes and animation frames reuse
/// the parsed book.

use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::core::config::{ConfigError, EngineConfig};
use crate::core::generator::{GenerationError, Generator};
use crate::core::grammar::{AnimationMode, PhraseBook, Preamble, DEFAULT_DURATION};
use crate::core::parser::{parse_phrase_book, ParseError};
use crate::core::seed::{next_text_seed, prev_text_seed, random_text_seed, Seed};

#[derive(Debug, Error)]
pub enum SketchError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("the source has not parsed successfully yet")]
    NoPhraseBook,
}

/// Playback policy derived from a preamble.
///
/// Maps elapsed seconds since "play" to the time parameter. Holds no clock;
/// the caller measures elapsed time. The duration is always positive and
/// finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    duration: f64,
    animation: AnimationMode,
}

impl Default for Playback {
    fn default() -> Self {
        Self::from_preamble(&Preamble::default())
    }
}

impl Playback {
    /// A duration that is not positive and finite falls back to the default.
    pub fn new(duration: f64, animation: AnimationMode) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            DEFAULT_DURATION
        };
        Self {
            duration,
            animation,
        }
    }

    pub fn from_preamble(preamble: &Preamble) -> Self {
        Self::new(preamble.duration, preamble.animation)
    }

    /// Seconds per cycle.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn animation(&self) -> AnimationMode {
        self.animation
    }

    /// Time parameter for a frame `elapsed_secs` after playback started, or
    /// `None` once a `once` animation has run its course.
    pub fn t_at(&self, elapsed_secs: f64) -> Option<f64> {
        let elapsed = if elapsed_secs.is_finite() {
            elapsed_secs.max(0.0)
        } else {
            0.0
        };
        if self.is_finished(elapsed) {
            return None;
        }
        Some((elapsed / self.duration) % 1.0)
    }

    pub fn is_finished(&self, elapsed_secs: f64) -> bool {
        self.animation == AnimationMode::Once && elapsed_secs >= self.duration
    }
}

/// An editing session over one sketch.
pub struct Sketch {
    generator: Generator,
    source: String,
    seed: Seed,
    book: Option<PhraseBook>,
    /// Source text `book` was parsed from.
    parsed_source: Option<String>,
    output: String,
    last_error: Option<String>,
    parse_count: u64,
}

/// Builder for constructing a `Sketch`.
pub struct SketchBuilder {
    source: Option<String>,
    seed: Option<Seed>,
    config: Option<EngineConfig>,
    config_path: Option<String>,
}

impl Sketch {
    pub fn builder() -> SketchBuilder {
        SketchBuilder {
            source: None,
            seed: None,
            config: None,
            config_path: None,
        }
    }

    /// Replace the source text, re-parsing only if it changed, then render
    /// at `t = 0`.
    ///
    /// A parse failure keeps the previous phrase book and output.
    #[instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn set_source(&mut self, source: &str) -> Result<&str, SketchError> {
        if self.source != source {
            self.source = source.to_string();
        }
        if self.parsed_source.as_deref() != Some(source) {
            self.parse_count += 1;
            match parse_phrase_book(source) {
                Ok(book) => {
                    self.book = Some(book);
                    self.parsed_source = Some(source.to_string());
                }
                Err(e) => {
                    debug!(error = %e, "source rejected");
                    self.last_error = Some(e.to_string());
                    return Err(e.into());
                }
            }
        }
        self.render(0.0)
    }

    /// Change the seed and render at `t = 0` without re-parsing.
    #[instrument(level = "debug", skip_all, fields(seed = %seed))]
    pub fn set_seed(&mut self, seed: Seed) -> Result<&str, SketchError> {
        self.seed = seed;
        self.render(0.0)
    }

    pub fn next_seed(&mut self) -> Result<&str, SketchError> {
        let seed = next_text_seed(&self.seed);
        self.set_seed(seed)
    }

    pub fn prev_seed(&mut self) -> Result<&str, SketchError> {
        let seed = prev_text_seed(&self.seed);
        self.set_seed(seed)
    }

    /// Render one animation frame at time `t`.
    pub fn render_frame(&mut self, t: f64) -> Result<&str, SketchError> {
        self.render(t)
    }

    /// Render the frame `elapsed_secs` into playback. `Ok(None)` means a
    /// `once` animation has finished and the caller should stop.
    pub fn play_frame(&mut self, elapsed_secs: f64) -> Result<Option<&str>, SketchError> {
        match self.playback().t_at(elapsed_secs) {
            Some(t) => self.render(t).map(Some),
            None => Ok(None),
        }
    }

    /// Render `count` outputs for successive seeds starting at the current
    /// one. Session state is left unchanged.
    pub fn variants(&self, count: usize) -> Result<Vec<(Seed, String)>, SketchError> {
        let book = self.book.as_ref().ok_or(SketchError::NoPhraseBook)?;
        let mut seed = self.seed.clone();
        let mut results = Vec::with_capacity(count);
        for _ in 0..count {
            let text = self.generator.generate_default(book, &seed, 0.0)?;
            let next = next_text_seed(&seed);
            results.push((seed, text));
            seed = next;
        }
        Ok(results)
    }

    fn render(&mut self, t: f64) -> Result<&str, SketchError> {
        let book = self.book.as_ref().ok_or(SketchError::NoPhraseBook)?;
        match self.generator.generate_default(book, &self.seed, t) {
            Ok(text) => {
                self.output = text;
                self.last_error = None;
                Ok(&self.output)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn playback(&self) -> Playback {
        self.book
            .as_ref()
            .map(|b| Playback::from_preamble(b.preamble()))
            .unwrap_or_default()
    }

    /// Last successfully rendered output.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Message of the most recent failure, cleared by the next good render.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn book(&self) -> Option<&PhraseBook> {
        self.book.as_ref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn config(&self) -> &EngineConfig {
        self.generator.config()
    }

    /// How many times source text has been parsed.
    pub fn parse_count(&self) -> u64 {
        self.parse_count
    }
}

impl SketchBuilder {
    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide the engine config directly.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the engine config from a RON file at build time.
    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Build the session and attempt a first render. A source that fails to
    /// parse or generate does not fail the build; the error is available
    /// from `last_error`.
    pub fn build(self) -> Result<Sketch, SketchError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => EngineConfig::load_from_ron(Path::new(&path))?,
            (None, None) => EngineConfig::default(),
        };

        let mut sketch = Sketch {
            generator: Generator::new(config),
            source: String::new(),
            seed: self.seed.unwrap_or_else(random_text_seed),
            book: None,
            parsed_source: None,
            output: String::new(),
            last_error: None,
            parse_count: 0,
        };

        if let Some(source) = self.source {
            if let Err(e) = sketch.set_source(&source) {
                debug!(error = %e, "initial render failed");
            }
        }
        Ok(sketch)
    }
}
