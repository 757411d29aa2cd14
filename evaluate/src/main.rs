use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use perceptag::{Corpus, Evaluation};

#[derive(Parser, Debug)]
#[command(
    name = "evaluate",
    about = "A program to evaluate the accuracy of Perceptag."
)]
struct Args {
    /// A labeled reference corpus
    #[arg(long)]
    gold: PathBuf,

    /// The output of `predict` for the same tokens
    #[arg(long)]
    predicted: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    log::info!("Loading {:?} ...", args.gold);
    let gold = Corpus::from_reader(BufReader::new(File::open(&args.gold)?))?;
    log::info!("Loading {:?} ...", args.predicted);
    let predicted = Corpus::from_reader(BufReader::new(File::open(&args.predicted)?))?;

    let mut evaluation = Evaluation::default();
    let mut gold_sentences = gold.sentences();
    let mut predicted_sentences = predicted.sentences();
    loop {
        let (rs, hs) = match (gold_sentences.next(), predicted_sentences.next()) {
            (None, None) => break,
            (rs, hs) => (rs.unwrap_or_default(), hs.unwrap_or_default()),
        };
        if rs.len() != hs.len() {
            log::warn!(
                "Sentence lengths differ: {} in gold, {} in prediction",
                rs.len(),
                hs.len()
            );
        }
        let rs: Vec<&str> = rs.iter().map(|t| t.tag.as_str()).collect();
        let hs: Vec<&str> = hs.iter().map(|t| t.tag.as_str()).collect();
        evaluation.accumulate(&rs, &hs);
    }

    println!("{evaluation}");

    Ok(())
}
