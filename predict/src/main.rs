use std::fs::File;
use std::io::{prelude::*, stdin, stdout, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgGroup, Parser};
use perceptag::{Corpus, Model, Tagger, Trainer};

#[derive(Parser, Debug)]
#[command(
    name = "predict",
    about = "A program to assign part-of-speech tags.",
    group = ArgGroup::new("source").required(true),
)]
struct Args {
    /// The model file to use when tagging text
    #[arg(long, group = "source")]
    model: Option<PathBuf>,

    /// A labeled corpus to train a model on before tagging
    #[arg(long, group = "source")]
    train: Option<PathBuf>,

    /// The number of training passes when --train is given
    #[arg(long, default_value = "5")]
    epochs: usize,

    /// Unlabeled input with one token per line (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// The file to write tagged tokens to (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn load_model(args: &Args) -> Result<Model, Box<dyn std::error::Error>> {
    if let Some(path) = &args.model {
        log::info!("Loading model file...");
        let mut f = zstd::Decoder::new(File::open(path)?)?;
        return Ok(Model::read(&mut f)?);
    }
    let Some(path) = &args.train else {
        return Err("either --model or --train is required".into());
    };
    log::info!("Loading {path:?} ...");
    let mut corpus = Corpus::from_reader(BufReader::new(File::open(path)?))?;
    corpus.close_sentence();
    log::info!("Start training...");
    let (model, _) = Trainer::new(&corpus).train(args.epochs)?;
    log::info!("Finish training.");
    Ok(model)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let tagger = Tagger::new(load_model(&args)?);

    let rdr: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(stdin().lock()),
    };
    let mut wtr: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(stdout().lock())),
    };

    log::info!("Start tagging");
    let start = Instant::now();
    let n_tokens = tagger.tag_stream(rdr, &mut wtr)?;
    wtr.flush()?;
    let duration = start.elapsed();
    log::info!("Elapsed: {} [sec]", duration.as_secs_f64());
    log::info!(
        "Speed: {} [tokens/sec]",
        n_tokens as f64 / duration.as_secs_f64()
    );
    if let Some(path) = &args.output {
        log::info!("Output: {path:?}");
    }

    Ok(())
}
