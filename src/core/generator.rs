/// Generator — weighted, seed-reproducible expansion of a phrase book.
///
/// Expansion runs on an explicit stack of frames rather than native
/// recursion, so the depth limit is the only bound on nesting.

use thiserror::Error;
use tracing::{debug, trace};

use crate::core::config::EngineConfig;
use crate::core::context::GenerationContext;
use crate::core::draw::{select_weighted, DrawSource};
use crate::core::grammar::{PhraseBook, Segment};
use crate::core::seed::Seed;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("unknown category '{name}'{}", referenced_from_suffix(.referenced_from))]
    UnknownCategory {
        name: String,
        referenced_from: Option<String>,
    },
    #[error("recursion depth limit of {max_depth} exceeded while expanding '{category}'")]
    DepthExceeded { category: String, max_depth: usize },
    #[error("category '{category}' has no alternative with positive weight")]
    NoPositiveWeight { category: String },
    #[error("expansion limit of {limit} exceeded while expanding '{category}'")]
    ExpansionLimit { category: String, limit: usize },
}

fn referenced_from_suffix(referenced_from: &Option<String>) -> String {
    match referenced_from {
        Some(parent) => format!(" (referenced from '{}')", parent),
        None => String::new(),
    }
}

impl GenerationError {
    /// The category the error is about.
    pub fn category(&self) -> &str {
        match self {
            GenerationError::UnknownCategory { name, .. } => name,
            GenerationError::DepthExceeded { category, .. }
            | GenerationError::NoPositiveWeight { category }
            | GenerationError::ExpansionLimit { category, .. } => category,
        }
    }
}

/// Expand `start` with the default engine configuration.
pub fn generate_string(
    book: &PhraseBook,
    start: &str,
    context: &GenerationContext,
    seed: &Seed,
    t: f64,
) -> Result<String, GenerationError> {
    Generator::default().generate(book, start, context, seed, t)
}

/// Expands phrase books under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: EngineConfig,
}

impl Generator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Expand the configured start category with an empty context.
    pub fn generate_default(
        &self,
        book: &PhraseBook,
        seed: &Seed,
        t: f64,
    ) -> Result<String, GenerationError> {
        self.generate(
            book,
            &self.config.start_category,
            &GenerationContext::default(),
            seed,
            t,
        )
    }

    /// Expand `start` into a string. A pure function of its arguments.
    ///
    /// On failure nothing is returned but the error; partial output is
    /// discarded.
    pub fn generate(
        &self,
        book: &PhraseBook,
        start: &str,
        context: &GenerationContext,
        seed: &Seed,
        t: f64,
    ) -> Result<String, GenerationError> {
        let mut expander = Expander {
            book,
            context,
            draws: DrawSource::new(seed.state(), t),
            config: &self.config,
            stack: Vec::new(),
            path: Vec::new(),
            expansions: 0,
            out: String::new(),
        };

        match expander.run(start) {
            Ok(()) => {
                trace!(
                    start,
                    seed = %seed,
                    t,
                    expansions = expander.expansions,
                    "generated"
                );
                Ok(expander.out)
            }
            Err(e) => {
                debug!(start, seed = %seed, t, error = %e, "generation failed");
                Err(e)
            }
        }
    }
}

/// One category expansion in progress.
struct Frame<'a> {
    name: &'a str,
    segments: &'a [Segment],
    next: usize,
    selection: u32,
    placeholder: u32,
    /// Path length to restore when this frame completes.
    parent_path_len: usize,
}

struct Expander<'a> {
    book: &'a PhraseBook,
    context: &'a GenerationContext,
    draws: DrawSource,
    config: &'a EngineConfig,
    stack: Vec<Frame<'a>>,
    path: Vec<u32>,
    expansions: usize,
    out: String,
}

impl<'a> Expander<'a> {
    fn run(&mut self, start: &'a str) -> Result<(), GenerationError> {
        self.push(start, None, 0)?;

        while let Some(frame) = self.stack.last_mut() {
            let segments = frame.segments;
            let Some(segment) = segments.get(frame.next) else {
                let parent_path_len = frame.parent_path_len;
                self.stack.pop();
                self.path.truncate(parent_path_len);
                continue;
            };
            frame.next += 1;

            match segment {
                Segment::Literal(text) => self.out.push_str(text),
                Segment::Placeholder(target) => {
                    let position = frame.placeholder;
                    frame.placeholder += 1;
                    if let Some(bound) = self.context.get(target) {
                        self.out.push_str(bound);
                        continue;
                    }

                    let parent = frame.name;
                    let parent_path_len = self.path.len();
                    self.path.push(frame.selection);
                    self.path.push(position);
                    self.push(target, Some(parent), parent_path_len)?;
                }
            }
        }
        Ok(())
    }

    /// Select an alternative for `name` at the current path and push it.
    fn push(
        &mut self,
        name: &'a str,
        referenced_from: Option<&str>,
        parent_path_len: usize,
    ) -> Result<(), GenerationError> {
        let category = self
            .book
            .category(name)
            .ok_or_else(|| GenerationError::UnknownCategory {
                name: name.to_string(),
                referenced_from: referenced_from.map(str::to_string),
            })?;

        if self.stack.len() >= self.config.max_depth {
            return Err(GenerationError::DepthExceeded {
                category: name.to_string(),
                max_depth: self.config.max_depth,
            });
        }

        self.expansions += 1;
        if self.expansions > self.config.max_expansions {
            return Err(GenerationError::ExpansionLimit {
                category: name.to_string(),
                limit: self.config.max_expansions,
            });
        }

        let draw = self.draws.at(&self.path);
        let index = select_weighted(category.alternatives.iter().map(|a| a.weight), draw)
            .ok_or_else(|| GenerationError::NoPositiveWeight {
                category: name.to_string(),
            })?;

        self.stack.push(Frame {
            name: &category.name,
            segments: &category.alternatives[index].template.segments,
            next: 0,
            selection: index as u32,
            placeholder: 0,
            parent_path_len,
        });
        Ok(())
    }
}
