/// Phrase-book parsing and expansion integration tests over the sample sketches.

use seed_engine::core::grammar::{AnimationMode, Segment};
use seed_engine::core::parser::parse_phrase_book;
use seed_engine::{generate_string, GenerationContext, PhraseBook, Seed};

const SKETCHES: [&str; 5] = [
    "sketches/thank_you.seed",
    "sketches/shapes.seed",
    "sketches/pulse.seed",
    "sketches/countdown.seed",
    "sketches/recursion.seed",
];

fn load(path: &str) -> PhraseBook {
    let text = std::fs::read_to_string(path).unwrap();
    parse_phrase_book(&text).unwrap_or_else(|e| panic!("{}: {}", path, e))
}

#[test]
fn all_sample_sketches_parse() {
    for path in &SKETCHES {
        let book = load(path);
        assert!(book.contains("root"), "{} has no root category", path);
    }
}

#[test]
fn no_broken_references_in_sample_sketches() {
    for path in &SKETCHES {
        let book = load(path);
        for category in book.categories() {
            for alt in &category.alternatives {
                for segment in &alt.template.segments {
                    if let Segment::Placeholder(target) = segment {
                        assert!(
                            book.contains(target),
                            "Category '{}' in {} references non-existent category '{}'",
                            category.name,
                            path,
                            target
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn sample_sketches_generate_for_many_seeds() {
    for path in &SKETCHES {
        let book = load(path);
        let mut seed = Seed::from("acorn0");
        for _ in 0..100 {
            for t in [0.0, 0.37, 0.99] {
                let out = generate_string(&book, "root", &GenerationContext::default(), &seed, t)
                    .unwrap_or_else(|e| panic!("{} with seed {}: {}", path, seed, e));
                assert!(!out.is_empty());
                assert!(!out.contains("{{"), "unexpanded placeholder in {}", out);
            }
            seed = seed_engine::next_text_seed(&seed);
        }
    }
}

#[test]
fn sample_preambles() {
    let pulse = load("sketches/pulse.seed");
    assert_eq!(pulse.duration(), 3.0);
    assert_eq!(pulse.animation(), AnimationMode::Bounce);

    let countdown = load("sketches/countdown.seed");
    assert_eq!(countdown.duration(), 5.0);
    assert_eq!(countdown.animation(), AnimationMode::Once);

    let plain = load("sketches/thank_you.seed");
    assert_eq!(plain.duration(), 2.0);
    assert_eq!(plain.animation(), AnimationMode::Bounce);
}

#[test]
fn shapes_emit_svg_markup() {
    let book = load("sketches/shapes.seed");
    let out = generate_string(
        &book,
        "root",
        &GenerationContext::default(),
        &Seed::from("otter42"),
        0.0,
    )
    .unwrap();
    assert!(out.starts_with("<svg viewBox=\"0 0 300 100\""));
    assert_eq!(out.matches("<circle ").count(), 3);
    assert!(out.ends_with("</svg>"));
}

#[test]
fn weighted_alternatives_follow_weights() {
    let book = parse_phrase_book("root:\n- 1x a\n- 3x b\n").unwrap();
    let mut b_count = 0;
    let n = 4000;
    for state in 0..n {
        let out = generate_string(
            &book,
            "root",
            &GenerationContext::default(),
            &Seed::from_state(state),
            0.0,
        )
        .unwrap();
        if out == "b" {
            b_count += 1;
        }
    }
    let freq = b_count as f64 / n as f64;
    assert!((freq - 0.75).abs() < 0.04, "b selected {:.3}", freq);
}
