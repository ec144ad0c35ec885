/// Grammar Linter — validates sketch sources.
///
/// Usage: grammar_linter <path> [--start <category>] [--min-alternatives <n>]
///
/// `path` is a `.seed` file or a directory searched recursively. Each file is
/// its own phrase book. Exits with status 1 when any file has errors.

use clap::Parser;
use rustc_hash::FxHashSet;
use seed_engine::core::config::DEFAULT_START_CATEGORY;
use seed_engine::core::grammar::PhraseBook;
use seed_engine::parse_phrase_book;
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "grammar_linter", version, about = "Validate sketch sources")]
struct Cli {
    /// A `.seed` file or a directory of them.
    path: PathBuf,

    /// Category generation starts from; used for reachability.
    #[arg(long, default_value = DEFAULT_START_CATEGORY)]
    start: String,

    /// Warn about categories with fewer alternatives than this.
    #[arg(long, default_value_t = 2)]
    min_alternatives: usize,
}

#[derive(Default)]
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut files = Vec::new();
    if cli.path.is_file() {
        files.push(cli.path.clone());
    } else if cli.path.is_dir() {
        collect_sources(&cli.path, &mut files);
        files.sort();
    } else {
        eprintln!("ERROR: Path '{}' does not exist", cli.path.display());
        process::exit(1);
    }

    println!("Found {} sketch files", files.len());

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for path in &files {
        let report = lint_file(path, &cli);
        println!("\n=== {} ===", path.display());
        if report.errors.is_empty() && report.warnings.is_empty() {
            println!("All checks passed!");
        }
        for warning in &report.warnings {
            println!("WARNING: {}", warning);
        }
        for error in &report.errors {
            println!("ERROR: {}", error);
        }
        total_errors += report.errors.len();
        total_warnings += report.warnings.len();
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        total_errors,
        total_warnings
    );

    if total_errors > 0 {
        process::exit(1);
    }
}

fn collect_sources(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_sources(&path, files);
            } else if path.extension().and_then(|s| s.to_str()) == Some("seed") {
                files.push(path);
            }
        }
    }
}

fn lint_file(path: &Path, cli: &Cli) -> Report {
    let mut report = Report::default();
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            report.errors.push(format!("cannot read file: {}", e));
            return report;
        }
    };
    match parse_phrase_book(&source) {
        Ok(book) => lint_book(&book, cli, &mut report),
        Err(e) => report.errors.push(e.to_string()),
    }
    report
}

fn lint_book(book: &PhraseBook, cli: &Cli, report: &mut Report) {
    if !book.contains(&cli.start) {
        report
            .errors
            .push(format!("start category '{}' is not defined", cli.start));
    }

    for name in book.category_names() {
        let Some(category) = book.category(name) else {
            continue;
        };

        if category.total_weight() <= 0.0 {
            report.errors.push(format!(
                "Category '{}' has no alternative with positive weight",
                name
            ));
        }

        if category.alternatives.len() < cli.min_alternatives {
            report.warnings.push(format!(
                "Category '{}' has only {} alternatives (minimum {} recommended)",
                name,
                category.alternatives.len(),
                cli.min_alternatives
            ));
        }

        let mut missing = BTreeSet::new();
        for alt in &category.alternatives {
            for reference in alt.template.placeholders() {
                if !book.contains(reference) {
                    missing.insert(reference);
                }
            }
        }
        for reference in missing {
            report.errors.push(format!(
                "Category '{}' references undefined category '{}'",
                name, reference
            ));
        }

        let all_self_ref = category
            .alternatives
            .iter()
            .filter(|a| a.weight > 0.0)
            .all(|a| a.template.placeholders().any(|p| p == name));
        if all_self_ref && category.total_weight() > 0.0 {
            report.errors.push(format!(
                "Category '{}' has no non-recursive alternative (infinite recursion)",
                name
            ));
        }
    }

    if book.contains(&cli.start) {
        let reachable = reachable_from(book, &cli.start);
        for name in book.category_names() {
            if !reachable.contains(name) {
                report.warnings.push(format!(
                    "Category '{}' is unreachable from '{}'",
                    name, cli.start
                ));
            }
        }
    }
}

fn reachable_from<'a>(book: &'a PhraseBook, start: &'a str) -> FxHashSet<&'a str> {
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([start]);
    while let Some(name) = queue.pop_front() {
        if !seen.insert(name) {
            continue;
        }
        let Some(category) = book.category(name) else {
            continue;
        };
        for alt in &category.alternatives {
            for reference in alt.template.placeholders() {
                if !seen.contains(reference) {
                    queue.push_back(reference);
                }
            }
        }
    }
    seen
}
