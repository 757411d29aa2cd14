use std::fs;
use std::path::PathBuf;

use clap::Parser;
use perceptag::{Model, ScoreValue, START_TAG, STOP_TAG};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "manipulate_model",
    about = "A program to manipulate trained models."
)]
struct Args {
    /// Input path of the model file
    #[arg(long)]
    model_in: PathBuf,

    /// Output path of the model file
    #[arg(long)]
    model_out: Option<PathBuf>,

    /// Output transition scores as CSV.
    #[arg(long)]
    dump_transitions: Option<PathBuf>,

    /// Output emission scores as CSV.
    #[arg(long)]
    dump_emissions: Option<PathBuf>,

    /// Overwrite transition scores listed in the CSV file.
    #[arg(long)]
    replace_transitions: Option<PathBuf>,

    /// Overwrite emission scores listed in the CSV file.
    #[arg(long)]
    replace_emissions: Option<PathBuf>,
}

#[derive(Deserialize, Serialize)]
struct TransitionRecord {
    from: String,
    to: String,
    score: ScoreValue,
}

#[derive(Deserialize, Serialize)]
struct EmissionRecord {
    tag: String,
    word: String,
    score: ScoreValue,
}

fn dump_transitions(model: &Model, path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(fs::File::create(path)?);
    let froms = model.tags().iter().chain([START_TAG]);
    for from in froms {
        for to in model.tags().iter().chain([STOP_TAG]) {
            let Some(score) = model.transition_score(from, to) else {
                continue;
            };
            wtr.serialize(TransitionRecord {
                from: from.to_string(),
                to: to.to_string(),
                score,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn dump_emissions(model: &Model, path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(fs::File::create(path)?);
    for tag in model.tags().iter() {
        for word in model.vocabulary().iter() {
            let Some(score) = model.emission_score(tag, word) else {
                continue;
            };
            wtr.serialize(EmissionRecord {
                tag: tag.to_string(),
                word: word.to_string(),
                score,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    log::info!("Loading model file...");
    let mut f = zstd::Decoder::new(fs::File::open(args.model_in)?)?;
    let mut model = Model::read(&mut f)?;

    if let Some(path) = args.dump_transitions {
        log::info!("Saving transition scores...");
        dump_transitions(&model, path)?;
    }

    if let Some(path) = args.dump_emissions {
        log::info!("Saving emission scores...");
        dump_emissions(&model, path)?;
    }

    if let Some(path) = args.replace_transitions {
        log::info!("Loading transition scores...");
        let mut rdr = csv::Reader::from_reader(fs::File::open(path)?);
        for result in rdr.deserialize() {
            let record: TransitionRecord = result?;
            model.set_transition_score(&record.from, &record.to, record.score)?;
        }
    }

    if let Some(path) = args.replace_emissions {
        log::info!("Loading emission scores...");
        let mut rdr = csv::Reader::from_reader(fs::File::open(path)?);
        for result in rdr.deserialize() {
            let record: EmissionRecord = result?;
            model.set_emission_score(&record.tag, &record.word, record.score)?;
        }
    }

    if let Some(path) = args.model_out {
        log::info!("Saving model file...");
        let mut f = zstd::Encoder::new(fs::File::create(path)?, 19)?;
        model.write(&mut f)?;
        f.finish()?;
    }

    Ok(())
}
