//! Extract layout-aware text from a PDF file.
//!
//! Usage:
//!   cargo run --release --bin extract_text -- book.pdf
//!   cargo run --release --bin extract_text -- book.pdf --config cfg.json --output book.txt
//!
//! Progress goes to stderr, text to stdout unless `--output` is given.
//! Set `RUST_LOG=debug` to see decoder diagnostics.

use pdf_layout_text::{extract_text_from_bytes_with_config, ExtractionConfig, Language};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

struct CliArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl CliArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut input = None;
        let mut config = None;
        let mut output = None;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    i += 1;
                    config = Some(PathBuf::from(args.get(i).ok_or("--config needs a path")?));
                },
                "--output" | "-o" => {
                    i += 1;
                    output = Some(PathBuf::from(args.get(i).ok_or("--output needs a path")?));
                },
                flag if flag.starts_with('-') => return Err(format!("unknown option {}", flag)),
                path => {
                    if input.replace(PathBuf::from(path)).is_some() {
                        return Err("only one input file is accepted".to_string());
                    }
                },
            }
            i += 1;
        }

        Ok(Self {
            input: input.ok_or("missing input file")?,
            config,
            output,
        })
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ExtractionConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(ExtractionConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(ExtractionConfig::default()),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match CliArgs::from_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Usage: extract_text <file.pdf> [--config cfg.json] [--output out.txt]");
            return ExitCode::from(2);
        },
    };

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: cannot load config: {}", e);
            return ExitCode::from(2);
        },
    };

    let bytes = match fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", args.input.display(), e);
            return ExitCode::FAILURE;
        },
    };

    let start = Instant::now();
    let result = extract_text_from_bytes_with_config(&bytes, &config, |percent| {
        eprint!("\rExtracting... {:>3}%", percent);
    });
    eprintln!();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            log::error!("{}: {}", args.input.display(), e);
            eprintln!("{}", e.user_message(Language::English));
            return ExitCode::FAILURE;
        },
    };
    log::info!(
        "{} pages, {} chars in {:.2?}",
        result.page_count,
        result.text.chars().count(),
        start.elapsed()
    );

    let written = match &args.output {
        Some(path) => fs::write(path, &result.text),
        None => std::io::stdout().lock().write_all(result.text.as_bytes()),
    };
    if let Err(e) = written {
        eprintln!("Error: cannot write output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
