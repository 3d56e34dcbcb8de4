//! Convert Garmin FIT activity files to GPX tracks.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::info;
use rayon::prelude::*;

use fit2gpx::{
    Options, Track,
    gpx::{self, GpxOptions},
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[clap(flatten)]
    verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one FIT file
    Convert {
        /// FIT file to read
        input: PathBuf,

        /// GPX file to write, by default the input path with a `.gpx`
        /// extension
        output: Option<PathBuf>,

        /// Read the input record by record instead of loading it whole
        #[arg(long)]
        stream: bool,

        /// Value of the GPX `creator` attribute
        #[arg(long)]
        creator: Option<String>,

        /// Skip header and file CRC verification
        #[arg(long)]
        no_crc: bool,
    },
    /// Convert many FIT files in parallel, each to a GPX file beside it
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Skip header and file CRC verification
        #[arg(long)]
        no_crc: bool,
    },
}

struct Job<'a> {
    input: &'a Path,
    output: Option<&'a Path>,
    stream: bool,
    options: Options,
    creator: Option<&'a str>,
}

fn options(no_crc: bool) -> Options {
    Options {
        verify_header_crc: !no_crc,
        verify_file_crc: !no_crc,
    }
}

fn convert(job: &Job) -> anyhow::Result<PathBuf> {
    let input = job.input;

    if !input.is_file() {
        bail!("file not found: {}", input.display());
    }

    let (track, summary) = if job.stream {
        let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
        Track::from_reader(&mut BufReader::new(file), job.options)
            .with_context(|| format!("decoding {}", input.display()))?
    } else {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        Track::from_slice(&bytes, job.options)
            .with_context(|| format!("decoding {}", input.display()))?
    };

    info!(
        "{}: {} records, {} track points, {} warnings",
        input.display(),
        summary.records,
        track.len(),
        summary.warnings.len()
    );

    let output = match job.output {
        Some(output) => output.to_path_buf(),
        None => input.with_extension("gpx"),
    };

    let mut gpx_options = GpxOptions {
        name: input.file_stem().map(|s| s.to_string_lossy().into_owned()),
        ..GpxOptions::default()
    };
    if let Some(creator) = job.creator {
        gpx_options.creator = creator.to_owned();
    }

    let file = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    let mut w = BufWriter::new(file);
    gpx::write(&mut w, &track.points, &gpx_options)
        .and_then(|()| w.flush())
        .with_context(|| format!("writing {}", output.display()))?;

    Ok(output)
}

fn report(input: &Path, result: anyhow::Result<PathBuf>) -> bool {
    match result {
        Ok(output) => {
            println!("Done -> {}", output.display());
            true
        }
        Err(err) => {
            eprintln!("Error: {}: {:#}", input.display(), err);
            false
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let ok = match &cli.command {
        Command::Convert {
            input,
            output,
            stream,
            creator,
            no_crc,
        } => {
            let job = Job {
                input,
                output: output.as_deref(),
                stream: *stream,
                options: options(*no_crc),
                creator: creator.as_deref(),
            };
            report(input, convert(&job))
        }
        Command::Batch { inputs, no_crc } => {
            let failed = inputs
                .par_iter()
                .map(|input| {
                    let job = Job {
                        input,
                        output: None,
                        stream: false,
                        options: options(*no_crc),
                        creator: None,
                    };
                    report(input, convert(&job))
                })
                .filter(|ok| !ok)
                .count();

            if failed > 0 {
                eprintln!("{} of {} files failed", failed, inputs.len());
            }
            failed == 0
        }
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
