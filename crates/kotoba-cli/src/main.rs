use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use kotoba_config::AnalyzerConfig;
use kotoba_core::preprocess::{DefaultPreprocessor, Preprocessor};
use kotoba_lang_japanese::{Definitions, JapaneseAnalyzer, loader};
use tracing_subscriber::EnvFilter;

/// Look up Japanese text against a local dictionary data directory
#[derive(Parser)]
#[command(name = "kotoba", version)]
struct Args {
    /// Text to analyze; reads lines from stdin when omitted
    text: Option<String>,

    /// Data directory (overrides KOTOBA_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Dictionary entries shown per matched prefix
    #[arg(long)]
    depth: Option<usize>,

    /// Also print the kana rendering and furigana placements
    #[arg(long)]
    furigana: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AnalyzerConfig::new();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(depth) = args.depth {
        config.depth = depth;
    }

    let analyzer = loader::load_dir(&config.data_dir)
        .with_context(|| format!("loading data from {}", config.data_dir.display()))?;
    tracing::info!("data directory {} ready", config.data_dir.display());

    if let Some(text) = args.text {
        analyze(&analyzer, &config, &text, args.furigana);
    } else {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            analyze(&analyzer, &config, &line?, args.furigana);
            io::stdout().flush()?;
        }
    }

    Ok(())
}

fn analyze(analyzer: &JapaneseAnalyzer, config: &AnalyzerConfig, text: &str, furigana: bool) {
    let text = DefaultPreprocessor.process(text);
    if text.is_empty() {
        return;
    }

    let analysis = analyzer.find_definitions_in_text(&text);

    if analysis.results.is_empty() {
        println!("no matches for {text}");
        return;
    }

    for definitions in &analysis.results {
        print_definitions(definitions, config.depth);
    }

    if furigana {
        println!("kana: {}", analysis.kana_text);
        for f in &analysis.furigana {
            println!("furigana: {} → {} @ {}", f.original, f.reading, f.start);
        }
    }
}

fn print_definitions(definitions: &Definitions, limit: usize) {
    println!("{}:", definitions.matched_text);

    for entry in definitions.entries.iter().take(limit) {
        let headword = entry
            .spellings
            .first()
            .or_else(|| entry.readings.first())
            .map(|e| e.text.as_str())
            .unwrap_or("?");
        let readings: Vec<&str> = entry.readings.iter().map(|r| r.text.as_str()).collect();
        let glosses: Vec<&str> = entry
            .senses
            .iter()
            .flat_map(|s| s.gloss.iter().map(String::as_str))
            .collect();

        print!("  {headword}");
        if !readings.is_empty() {
            print!(" [{}]", readings.join("・"));
        }
        println!(": {}", glosses.join("; "));

        if let Some(hypothesis) = entry.deconj.iter().find(|h| !h.process.is_empty()) {
            println!("    ({} ← {})", hypothesis.text, hypothesis.process.join(" ← "));
        }
        if let Some(freq) = &entry.frequency {
            println!("    freq #{} ({})", freq.rank, freq.surface);
        }
    }
}
