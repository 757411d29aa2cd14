use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use perceptag::{Corpus, Trainer};

#[derive(Parser, Debug)]
#[command(about = "A program to train models of Perceptag.")]
struct Args {
    /// A labeled training corpus: one "<token> <tag>" per line, sentences separated by a blank
    /// line
    #[arg(long, required = true)]
    corpus: Vec<PathBuf>,

    /// The file to write the trained model to
    #[arg(long)]
    model: PathBuf,

    /// The number of passes over the training corpus
    #[arg(long, default_value = "5")]
    epochs: usize,

    /// The number of workers for zstd (0 means multithreaded will be disabled)
    #[arg(long, default_value = "0")]
    zstd_workers: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    log::info!("Loading dataset...");
    let mut corpus = Corpus::default();
    for path in &args.corpus {
        log::info!("Loading {path:?} ...");
        let f = BufReader::new(File::open(path)?);
        corpus.append(Corpus::from_reader(f)?);
    }
    corpus.close_sentence();
    log::info!(
        "# of tokens: {}, # of lines: {}",
        corpus.n_tokens(),
        corpus.len()
    );

    let trainer = Trainer::new(&corpus);
    log::info!(
        "# of tags: {}, # of words: {}",
        trainer.n_tags(),
        trainer.n_words()
    );

    log::info!("Start training...");
    let (model, report) = trainer.train(args.epochs)?;
    for (i, n) in report.mismatches.iter().enumerate() {
        log::info!("Epoch {}: {} mismatches", i + 1, n);
    }
    log::info!("Finish training.");

    let mut f = zstd::Encoder::new(File::create(&args.model)?, 19)?;
    f.multithread(args.zstd_workers)?;
    model.write(&mut f)?;
    f.finish()?;
    log::info!("Model written to {:?}", args.model);

    Ok(())
}
