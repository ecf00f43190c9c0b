use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use tracing::info;
use uniqset::{ExecutablePipeline, LocalPipeline, Mapper, UniqueValuesReducer};

/// Distinct words spoken by each character of a movie script.
#[derive(Parser, Debug)]
struct Args {
    /// Input directory
    #[arg(long)]
    input: String,
    /// Output directory
    #[arg(long)]
    output: String,
    /// Fold words to lower case before deduplicating
    #[arg(long)]
    lowercase: bool,
}

/// Maps `SPEAKER: dialogue` lines to `(SPEAKER, word)` pairs.
struct ScriptMapper {
    speaker_re: Regex,
    word_re: Regex,
    lowercase: bool,
}

impl ScriptMapper {
    fn new(lowercase: bool) -> Result<Self> {
        Ok(Self {
            speaker_re: Regex::new(r"^\s*([A-Z][A-Z .'-]*?)\s*:\s*(.+)$").context("speaker regex")?,
            word_re: Regex::new(r"[A-Za-z0-9_']+").context("word regex")?,
            lowercase,
        })
    }
}

impl Mapper for ScriptMapper {
    type Input = String;
    type Key = String;
    type Value = String;

    fn do_map<I, F>(&self, input: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::Input>,
        F: FnMut(Self::Key, Self::Value),
    {
        for line in input {
            let Some(caps) = self.speaker_re.captures(&line) else { continue };
            let speaker = &caps[1];
            for m in self.word_re.find_iter(&caps[2]) {
                let word = if self.lowercase { m.as_str().to_lowercase() } else { m.as_str().to_string() };
                emit(speaker.to_string(), word);
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let mapper = ScriptMapper::new(args.lowercase)?;
    let mut pipeline = LocalPipeline::new();
    pipeline.add_input(&args.input);
    pipeline.add_output(&args.output);
    let summary = pipeline.map_reduce(mapper, UniqueValuesReducer::<String>::new())?;
    info!(speakers = summary.groups(), output = %args.output, "unique words written");
    Ok(())
}
