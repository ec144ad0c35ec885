//! Seed engine — procedural text from small weighted grammars.
//!
//! An author writes a phrase book: named categories of weighted
//! alternatives that reference each other through `{{ placeholders }}`.
//! The engine parses it once and renders concrete text from a
//! human-readable seed and a time parameter, reproducibly.

pub mod core;
pub mod docs;

pub use crate::core::context::GenerationContext;
pub use crate::core::generator::{generate_string, GenerationError, Generator};
pub use crate::core::grammar::{AnimationMode, PhraseBook, Preamble};
pub use crate::core::parser::{parse_phrase_book, ParseError};
pub use crate::core::pipeline::{Playback, Sketch, SketchError};
pub use crate::core::seed::{next_text_seed, prev_text_seed, random_text_seed, Seed};
