use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use semform::config::EditorConfig;
use semform::upload::DirectoryUploader;
use semform::{widgets, Form};
use semform_core::Input;
use semform_types::{parse_semantics, UploadFile};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// semform - Build a form from semantics, apply edits and validate params
#[derive(Parser, Debug, Clone)]
#[command(name = "semform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Semantics file (JSON array of fields)
    #[arg(value_name = "SEMANTICS")]
    semantics: PathBuf,

    /// Existing params to edit
    #[arg(short = 'p', long = "params", value_name = "FILE")]
    params: Option<PathBuf>,

    /// Type text into the field at PATH (e.g., --set meta/author=Ann)
    #[arg(short = 's', long = "set", value_name = "PATH=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Upload a file into the field at PATH (e.g., --upload image=cat.png)
    #[arg(short = 'u', long = "upload", value_name = "PATH=FILE", value_parser = parse_assignment)]
    upload: Vec<(String, String)>,

    /// Config file to use instead of the default location
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

/// Parse "PATH=VALUE" into its two halves
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (path, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected format: PATH=VALUE, got: {}", s))?;
    if path.trim().is_empty() {
        return Err(format!("Missing field path in: {}", s));
    }
    Ok((path.trim().to_string(), value.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting semform v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Build, edit and validate the form; true if the result is valid
fn run(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::load()?,
    };

    widgets::register_all();

    let semantics = std::fs::read_to_string(&cli.semantics)
        .with_context(|| format!("Failed to read {}", cli.semantics.display()))?;
    let semantics = parse_semantics(&semantics).context("Invalid semantics")?;
    let params = match &cli.params {
        Some(path) => read_params(path)?,
        None => json!({}),
    };

    let mut form = Form::with_registry(
        semantics,
        params,
        semform_core::global_registry(),
        config.form_options(),
    )?;

    let uploader = DirectoryUploader::new(&config.upload_dir);
    let completions = uploader.completions();
    form.set_uploader(Box::new(uploader));

    for (path, value) in &cli.set {
        form.input_at(path, Input::Text(value.clone()))?;
    }
    for (path, file) in &cli.upload {
        let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file))?;
        let name = Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file.as_str());
        form.input_at(path, Input::Upload(UploadFile::new(name, data)))?;
        completions.deliver(&mut form)?;
    }

    let valid = form.validate();
    for (path, error) in form.errors() {
        eprintln!("{}: {}", path, error);
    }
    if valid || !config.strict_params {
        println!("{}", serde_json::to_string_pretty(form.params())?);
    } else {
        info!("Not printing params of an invalid form");
    }
    Ok(valid)
}

fn read_params(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let params = serde_json::from_str(&content)
        .with_context(|| format!("Invalid params in {}", path.display()))?;
    Ok(params)
}
