use anyhow::{Context, Result, bail};
use markflow_config::Config;
use markflow_engine::{MarkdownPrinter, ProcessError, Processor, VFile, builtin};
use std::{
    env,
    io::{self, Read, Write},
    path::PathBuf,
    process,
};

const USAGE: &str = "Usage: markflow [--config PATH] [--strict] [--check] [FILE]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    /// Fail on warnings too
    strict: bool,
    /// Report whether the input is already formatted instead of printing it
    check: bool,
    /// Read stdin when absent or `-`
    file: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--strict" => parsed.strict = true,
            "--check" => parsed.check = true,
            "-" => {}
            flag if flag.starts_with("--") => bail!("Unknown option {flag}"),
            path => {
                if parsed.file.is_some() {
                    bail!("Only one input file can be given");
                }
                parsed.file = Some(PathBuf::from(path));
            }
        }
    }

    Ok(parsed)
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("Config file '{}' does not exist", path.display())),
        None => {
            let config = Config::load()?;
            if config.is_none() {
                log::debug!(
                    "No config file at {}, using defaults",
                    Config::config_path().display()
                );
            }
            Ok(config.unwrap_or_default())
        }
    }
}

/// A frozen processor running the configured built-in plugins.
fn build_processor(config: &Config) -> Result<Processor> {
    let mut processor =
        Processor::new().with_printer(MarkdownPrinter::new(config.format.clone()));

    for entry in &config.plugins {
        let plugin = builtin::find(&entry.name).with_context(|| {
            let known: Vec<_> = builtin::registry().into_keys().collect();
            format!(
                "Unknown plugin `{}` (available: {})",
                entry.name,
                known.join(", ")
            )
        })?;
        processor = processor.use_shared_plugin(plugin, entry.plugin_options()?)?;
    }

    log::info!("Pipeline: {}", processor.plugins().join(" → "));
    Ok(processor.freeze()?)
}

fn read_input(args: &Args) -> Result<(String, Vec<u8>)> {
    match &args.file {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            Ok((path.display().to_string(), bytes))
        }
        None => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            Ok(("<stdin>".to_string(), bytes))
        }
    }
}

fn report(file: &VFile) {
    eprint!("{}", file.report());
}

/// Process the input and return the exit code.
fn run(args: &Args) -> Result<i32> {
    let config = load_config(args)?;
    let processor = build_processor(&config)?;
    let (label, input) = read_input(args)?;

    let file = match processor.process_bytes_from(label.as_str(), &input) {
        Ok(file) => file,
        Err(ProcessError::Configuration(error)) => return Err(error.into()),
        Err(error) => {
            if let Some(file) = error.file() {
                report(file);
            }
            if !error.is_fatal() {
                eprintln!("{label}:1:1: error: {error}");
            }
            return Ok(1);
        }
    };
    report(&file);

    let mut code = 0;
    if args.strict && file.has_warnings() {
        code = 1;
    }

    if args.check {
        if file.text().as_bytes() != input.as_slice() {
            eprintln!("{label}: not formatted");
            code = 1;
        }
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(file.text().as_bytes())?;
        stdout.flush()?;
    }

    Ok(code)
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    match run(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
