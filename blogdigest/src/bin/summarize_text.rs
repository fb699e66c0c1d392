// Prints the extractive summary of a text file (or stdin) without touching the network.

use anyhow::{Context, Result};
use blogdigest::nlp::{split_sentences, ExtractiveSummarizer, StopwordFilter};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "summarize_text", about = "Extractive summary of a plain-text document")]
struct Args {
    /// Text file to summarize; stdin when omitted
    file: Option<PathBuf>,

    /// Number of sentences to keep
    #[arg(long, default_value_t = 3)]
    sentences: usize,

    /// Stopword language code
    #[arg(long, default_value = "en")]
    language: String,

    /// Custom stopword list, one word per line
    #[arg(long, value_name = "FILE")]
    stopwords_file: Option<PathBuf>,

    /// Also print the indices of the chosen sentences
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let stopwords = StopwordFilter::load(&args.language, args.stopwords_file.as_deref());
    let summarizer = ExtractiveSummarizer::new(stopwords, args.sentences);

    if args.verbose {
        let total = split_sentences(&text).len();
        eprintln!("sentences: {}, selected: {:?}", total, summarizer.select(&text));
    }
    println!("{}", summarizer.summarize(&text));
    Ok(())
}
