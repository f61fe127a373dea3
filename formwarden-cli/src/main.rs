//! Interactive driver for the form validator.
//!
//! Binds a validator to an in-memory sign-up form and reads commands from
//! stdin:
//!
//! ```text
//! username=ana        set a field and fire an input event
//! blur email          fire a blur event
//! submit              run the submit protocol
//! status              print every field state
//! reset               reset validation state
//! quit
//! ```

mod demo;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use formwarden_lib::submit::SubmitOptions;
use formwarden_lib::{
    FormEvent, FormValidator, SubmitOutcome, ValidatorEvent, ValidatorOptions, ValidatorSettings,
};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "formwarden")]
#[command(version)]
#[command(about = "Drive a form validator from the command line")]
struct Cli {
    /// JSON settings file (debounce_timeout_ms, cache_ttl_ms, unexpected_error_message)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Write debug logs to this file instead of warnings to stderr
    #[arg(long)]
    log: Option<PathBuf>,

    /// POST the form values here after a valid submit
    #[arg(long)]
    post: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(path: Option<&PathBuf>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            WriteLogger::init(LevelFilter::Debug, Config::default(), file)?;
        }
        None => TermLogger::init(
            LevelFilter::Warn,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.log.as_ref())?;

    let mut options = ValidatorOptions::default().on_valid_submit(|values| {
        match serde_json::to_string_pretty(&values) {
            Ok(json) => println!("submitted:\n{json}"),
            Err(e) => log::error!("Failed to serialize form values: {e}"),
        }
    });
    if let Some(path) = &cli.config {
        let settings = ValidatorSettings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?;
        options = options.with_settings(&settings);
    }

    let form = Arc::new(demo::form());
    let validator = FormValidator::new(form.clone(), demo::rules(), options)?;
    validator.subscribe(print_event);
    validator.init();
    log::info!("validator bound: {validator:?}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            _ if line.is_empty() => {}
            _ if line == "quit" => break,
            _ if line == "status" => {
                for state in validator.field_states() {
                    let verdict = if state.is_valid { "ok" } else { "invalid" };
                    match &state.message {
                        Some(message) => println!("  {}: {verdict} ({message})", state.field_name),
                        None => println!("  {}: {verdict}", state.field_name),
                    }
                }
            }
            _ if line == "reset" => validator.reset(),
            _ if line == "submit" => {
                let outcome = validator.handle_submit().await;
                if let (SubmitOutcome::Valid(_), Some(url)) = (&outcome, &cli.post) {
                    post(&validator, url).await;
                }
            }
            Some(("blur", field)) => validator.dispatch(FormEvent::blur(field.trim())),
            _ => match line.split_once('=') {
                Some((field, value)) => {
                    let field = field.trim();
                    form.set_value(field, value);
                    validator.dispatch(FormEvent::input(field));
                }
                None => eprintln!("unrecognized command: {line}"),
            },
        }
    }

    validator.destroy();
    Ok(())
}

async fn post(validator: &FormValidator, url: &str) {
    match validator.submit(url, SubmitOptions::default()).await {
        Ok(response) if response.is_success() => println!("posted: HTTP {}", response.status),
        Ok(response) => eprintln!("server rejected submit: HTTP {}", response.status),
        Err(e) => eprintln!("submit failed: {e}"),
    }
}

fn print_event(event: &ValidatorEvent) {
    match event {
        ValidatorEvent::FieldInvalid { field, message } => println!("  x {field}: {message}"),
        ValidatorEvent::FieldValid { field } => println!("  v {field}"),
        ValidatorEvent::FormValidityChanged(true) => println!("form is valid; submit enabled"),
        ValidatorEvent::FormValidityChanged(false) => println!("form is invalid; submit disabled"),
        ValidatorEvent::ValidSubmit => {}
        ValidatorEvent::InvalidSubmit { errors } => {
            println!("submit blocked by {} error(s)", errors.len());
        }
    }
}
