//! Message extraction binary - collects translatable strings into a .pot file
//!
//! Usage:
//!   extract-messages [--method spline-python|spline-mako] [-k KEYWORD]... [--json] FILE...
//!
//! Without `--method`, `.py` files are read as Python and everything else as
//! compiled template source. `-k` adds a keyword to the default set
//! (`_`, `gettext`, `ugettext`, `ngettext`, `ungettext`, `N_`). The result is
//! printed to stdout as a `.pot` file, or as JSON records with `--json`.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use spline::extract::{write_pot, ExtractMethod, ExtractedMessage, Keywords, Occurrence};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const USAGE: &str = "Usage: extract-messages [--method spline-python|spline-mako] [-k KEYWORD]... [--json] FILE...";

#[derive(Debug)]
struct Options {
    method: Option<ExtractMethod>,
    keywords: Keywords,
    json: bool,
    files: Vec<PathBuf>,
}

#[derive(Debug)]
enum Command {
    Extract(Options),
    Help,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    file: &'a Path,
    #[serde(flatten)]
    message: &'a ExtractedMessage,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut options = Options {
        method: None,
        keywords: Keywords::default(),
        json: false,
        files: Vec::new(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--method" | "-m" => {
                let name = iter.next().context("--method needs a value")?;
                let method = ExtractMethod::from_name(name)
                    .with_context(|| format!("Unknown extraction method: {}", name))?;
                options.method = Some(method);
            }
            "--keyword" | "-k" => {
                let keyword = iter.next().context("-k needs a value")?;
                options.keywords.insert(keyword.as_str());
            }
            "--json" => options.json = true,
            "--help" | "-h" => return Ok(Command::Help),
            other if other.starts_with('-') => bail!("Unknown option: {}\n{}", other, USAGE),
            file => options.files.push(PathBuf::from(file)),
        }
    }

    if options.files.is_empty() {
        bail!("No input files\n{}", USAGE);
    }
    Ok(Command::Extract(options))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("spline=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args)? {
        Command::Extract(options) => options,
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let mut occurrences = Vec::new();
    for file in &options.files {
        let method = options.method.unwrap_or_else(|| ExtractMethod::for_path(file));
        debug!("Extracting {:?} with {}", file, method.name());

        let source = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
        let messages = method
            .extract(&source, &options.keywords)
            .with_context(|| format!("Failed to extract messages from {:?}", file))?;

        let before = occurrences.len();
        occurrences.extend(messages.map(|message| Occurrence {
            path: file.clone(),
            message,
        }));
        info!("{:?}: {} messages", file, occurrences.len() - before);
    }

    if options.json {
        let records: Vec<JsonRecord<'_>> = occurrences
            .iter()
            .map(|occurrence| JsonRecord {
                file: &occurrence.path,
                message: &occurrence.message,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", write_pot(&occurrences));
    }

    Ok(())
}
