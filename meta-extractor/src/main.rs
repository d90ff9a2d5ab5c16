// Copyright 2025 Janek Bevendorff
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! meta-extractor - Extract URL metadata from WARC files into CSV rows
//!
//! Reads a WARC stream, skips malformed records and writes one CSV row per
//! record with the decomposed target URI and its public suffix.

mod extract;
mod suffix;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use warcreader::{HttpContent, NoContent, ReaderConfig, WarcReader, WarcRecordType};

use extract::{Columns, Extractor, Stats};
use suffix::PublicSuffixList;

/// Extract URL metadata from WARC files into CSV rows
#[derive(Parser, Debug)]
#[command(name = "meta-extractor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input WARC file (reads stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output CSV file (writes stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Public suffix list file: https://publicsuffix.org/list/
    #[arg(short = 's', long, env = "META_EXTRACTOR_SUFFIX_LIST")]
    public_suffixes: PathBuf,

    /// Output includes CSV header
    #[arg(long)]
    print_header: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only emit records of these types (comma separated, default: all)
    #[arg(long, value_delimiter = ',', value_parser = parse_record_type)]
    types: Vec<WarcRecordType>,

    /// Parse embedded HTTP messages and add HTTP columns
    #[arg(long)]
    extended: bool,

    /// Give up after this many consecutive malformed records
    #[arg(long)]
    max_skipped: Option<usize>,
}

/// Failure categories, each with its own exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Usage = 1,
    Input = 2,
    Output = 3,
    SuffixList = 4,
    Processing = 10,
}

impl From<Failure> for ExitCode {
    fn from(failure: Failure) -> Self {
        ExitCode::from(failure as u8)
    }
}

#[derive(Debug)]
struct Fatal {
    failure: Failure,
    error: anyhow::Error,
}

trait FailWith<T> {
    fn fail_with(self, failure: Failure) -> std::result::Result<T, Fatal>;
}

impl<T> FailWith<T> for Result<T> {
    fn fail_with(self, failure: Failure) -> std::result::Result<T, Fatal> {
        self.map_err(|error| Fatal { failure, error })
    }
}

fn parse_record_type(s: &str) -> std::result::Result<WarcRecordType, String> {
    WarcRecordType::try_from(s).map_err(|_| format!("unknown record type '{}'", s))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                Failure::Usage.into()
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(stats) => {
            info!(
                "{} records processed, {} records ignored, {} malformed records skipped",
                stats.processed, stats.ignored, stats.skipped
            );
            ExitCode::SUCCESS
        }
        Err(fatal) => {
            error!("{:#}", fatal.error);
            fatal.failure.into()
        }
    }
}

fn run(cli: &Cli) -> std::result::Result<Stats, Fatal> {
    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("input file not found: {}", path.display()))
                .fail_with(Failure::Input)?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let output: Box<dyn Write> = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file: {}", path.display()))
                .fail_with(Failure::Output)?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    let suffixes = PublicSuffixList::from_path(&cli.public_suffixes)
        .with_context(|| {
            format!(
                "cannot read public suffix list: {}",
                cli.public_suffixes.display()
            )
        })
        .fail_with(Failure::SuffixList)?;
    info!("Loaded {} public suffix rules", suffixes.len());

    let config = ReaderConfig::new().max_skipped(cli.max_skipped);
    let mut reader = WarcReader::with_config(input, config);
    let extractor = Extractor::new(output, &suffixes).record_types(&cli.types);

    let stats = if cli.extended {
        extract_all::<_, _, HttpContent>(cli, extractor, &mut reader)
    } else {
        extract_all::<_, _, NoContent>(cli, extractor, &mut reader)
    };
    stats.fail_with(Failure::Processing)
}

fn extract_all<R: BufRead, W: Write, C: Columns>(
    cli: &Cli,
    mut extractor: Extractor<'_, W>,
    reader: &mut WarcReader<R>,
) -> Result<Stats> {
    if cli.print_header {
        extractor.write_header::<C>()?;
    }
    extractor.process::<R, C>(reader)
}
