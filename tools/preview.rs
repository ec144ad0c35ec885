/// Preview — interactive generation shell for testing sketches.
///
/// Usage: preview <sketch.seed> [--seed <seed>] [--config <engine.ron>] [--print]
///
/// Commands:
///   next / prev     — step the seed
///   seed [<seed>]   — show or set the seed
///   frame <t>       — render at time t in [0, 1)
///   play [<fps>]    — print one playback cycle
///   bulk <n>        — render n successive seeds with variety stats
///   reload          — re-read the sketch file (re-parses only if changed)
///   dump            — print the parsed phrase book as RON
///   help            — list commands
///   quit            — exit

use anyhow::Context as _;
use clap::Parser;
use seed_engine::core::config::EngineConfig;
use seed_engine::{Seed, Sketch, SketchError};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "preview", version, about = "Interactive generation shell for sketches")]
struct Cli {
    /// Sketch source file.
    sketch: PathBuf,

    /// Initial seed (random when omitted).
    #[arg(long)]
    seed: Option<String>,

    /// Engine config in RON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print one render and exit.
    #[arg(long)]
    print: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_ron(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let source = std::fs::read_to_string(&cli.sketch)
        .with_context(|| format!("reading {}", cli.sketch.display()))?;

    let mut builder = Sketch::builder().source(&source).config(config);
    if let Some(seed) = cli.seed {
        builder = builder.seed(Seed::from(seed));
    }
    let mut sketch = builder.build()?;

    if cli.print {
        if let Some(err) = sketch.last_error() {
            anyhow::bail!("{}", err);
        }
        println!("{}", sketch.output());
        return Ok(());
    }

    if let Some(book) = sketch.book() {
        println!("Loaded {} categories", book.len());
    }
    println!("Seed: {}", sketch.seed());
    print_render(&sketch);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "next" | "n" => {
                let result = sketch.next_seed().map(str::to_string);
                println!("Seed: {}", sketch.seed());
                show(result);
            }
            "prev" | "p" => {
                let result = sketch.prev_seed().map(str::to_string);
                println!("Seed: {}", sketch.seed());
                show(result);
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {} (state {})", sketch.seed(), sketch.seed().state());
                    continue;
                }
                let seed = Seed::from(line["seed".len()..].trim());
                let result = sketch.set_seed(seed).map(str::to_string);
                println!("Seed set to {}", sketch.seed());
                show(result);
            }
            "frame" => {
                let t = match parts.get(1).map(|s| s.parse::<f64>()) {
                    Some(Ok(t)) => t,
                    _ => {
                        println!("Usage: frame <t>");
                        continue;
                    }
                };
                match sketch.render_frame(t) {
                    Ok(text) => println!("[t={:.3}] {}", t, text),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "play" => {
                let fps: u32 = match parts.get(1).map(|s| s.parse()) {
                    None => 10,
                    Some(Ok(n)) if n > 0 => n,
                    _ => {
                        println!("Usage: play [<fps>]");
                        continue;
                    }
                };
                play(&mut sketch, fps);
            }
            "bulk" => {
                let count: usize = match parts.get(1).map(|s| s.parse()) {
                    Some(Ok(n)) if n > 0 => n,
                    _ => {
                        println!("Usage: bulk <n>");
                        continue;
                    }
                };
                bulk(&sketch, count);
            }
            "reload" => match std::fs::read_to_string(&cli.sketch) {
                Ok(source) => {
                    let before = sketch.parse_count();
                    let result = sketch.set_source(&source).map(str::to_string);
                    if sketch.parse_count() == before {
                        println!("Source unchanged.");
                    }
                    show(result);
                }
                Err(e) => println!("ERROR reading {}: {}", cli.sketch.display(), e),
            },
            "dump" => match sketch.book() {
                Some(book) => {
                    let pretty = ron::ser::PrettyConfig::default();
                    match ron::ser::to_string_pretty(book, pretty) {
                        Ok(text) => println!("{}", text),
                        Err(e) => println!("ERROR: {}", e),
                    }
                }
                None => println!("No phrase book parsed yet."),
            },
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
    Ok(())
}

fn print_render(sketch: &Sketch) {
    if let Some(err) = sketch.last_error() {
        println!("ERROR: {}", err);
    }
    println!("\n--- Output ---");
    println!("{}", sketch.output());
    println!("--- End ---\n");
}

fn show(result: Result<String, SketchError>) {
    match result {
        Ok(text) => {
            println!("\n--- Output ---");
            println!("{}", text);
            println!("--- End ---\n");
        }
        Err(e) => println!("ERROR: {}", e),
    }
}

fn play(sketch: &mut Sketch, fps: u32) {
    let playback = sketch.playback();
    println!(
        "Playing {:.2}s ({}) at {} fps",
        playback.duration(),
        playback.animation(),
        fps
    );
    let frames = (playback.duration() * fps as f64).ceil() as u32;
    for frame in 0..frames {
        let elapsed = frame as f64 / fps as f64;
        match sketch.play_frame(elapsed) {
            Ok(Some(text)) => println!("[{:6.2}s] {}", elapsed, text),
            Ok(None) => break,
            Err(e) => {
                println!("ERROR: {}", e);
                break;
            }
        }
    }
}

fn bulk(sketch: &Sketch, count: usize) {
    let variants = match sketch.variants(count) {
        Ok(v) => v,
        Err(e) => {
            println!("ERROR: {}", e);
            return;
        }
    };

    println!("\n=== Bulk Generation: {} seeds ===\n", variants.len());

    let unique: std::collections::HashSet<&String> = variants.iter().map(|(_, t)| t).collect();
    println!("Unique outputs: {} / {}", unique.len(), variants.len());

    let avg_len: f64 = if variants.is_empty() {
        0.0
    } else {
        variants.iter().map(|(_, t)| t.len() as f64).sum::<f64>() / variants.len() as f64
    };
    println!("Average length: {:.0} chars", avg_len);

    let mut word_counts: HashMap<String, u32> = HashMap::new();
    for (_, text) in &variants {
        for word in text.split_whitespace() {
            let clean = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if clean.len() > 3 {
                *word_counts.entry(clean).or_insert(0) += 1;
            }
        }
    }
    let mut word_freq: Vec<(String, u32)> = word_counts.into_iter().collect();
    word_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    println!("\nTop 10 words:");
    for (word, count) in word_freq.iter().take(10) {
        println!("  {}: {}", word, count);
    }

    println!("\nSamples:");
    for (seed, text) in variants.iter().take(5) {
        println!("  {:>14}  {}", seed.to_string(), text);
    }
    println!();
}

fn print_help() {
    println!("Commands:");
    println!("  next | prev       Step the seed forward or back");
    println!("  seed [<seed>]     Show or set the seed");
    println!("  frame <t>         Render at time t in [0, 1)");
    println!("  play [<fps>]      Print one playback cycle (default 10 fps)");
    println!("  bulk <n>          Render n successive seeds with variety statistics");
    println!("  reload            Re-read the sketch file");
    println!("  dump              Print the parsed phrase book as RON");
    println!("  help              Show this help");
    println!("  quit              Exit");
}
