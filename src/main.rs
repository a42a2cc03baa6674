use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::Local;
use clap::Parser;

use rowcast::utils::{logger, validation::Validate};
use rowcast::{convert_tagged, CliConfig, ConvertOptions};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    if let Err(err) = config.validate() {
        tracing::error!("configuration validation failed: {err}");
        eprintln!("error: {err}");
        std::process::exit(2);
    }

    match run(&config) {
        Ok(path) => {
            tracing::info!("conversion completed, output written to {path}");
            println!("{path}");
            Ok(())
        }
        Err(err) => {
            tracing::error!("conversion failed: {err:#}");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(config: &CliConfig) -> anyhow::Result<String> {
    let input = read_input(&config.input)?;
    tracing::debug!("read {} bytes from {}", input.len(), config.input);

    let options = ConvertOptions {
        delimiter: config.delimiter,
        pretty: !config.compact,
    };
    let from = resolve_input_tag(config);
    tracing::info!("converting {} -> {}", from, config.to);

    let output = convert_tagged(&input, &from, &config.to, options)?;
    tracing::info!("generated {} bytes of {}", output.bytes.len(), output.mime_type);

    let path = output_path(config, output.extension);
    fs::write(&path, &output.bytes).with_context(|| format!("failed to write {path}"))?;
    Ok(path)
}

fn read_input(path: &str) -> anyhow::Result<Vec<u8>> {
    if path == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read(path).with_context(|| format!("failed to read {path}"))
}

/// When no explicit format is given, the input file's extension is tried
/// before falling back to content detection.
fn resolve_input_tag(config: &CliConfig) -> String {
    if !config.from.eq_ignore_ascii_case("auto") {
        return config.from.clone();
    }
    Path::new(&config.input)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .filter(|ext| matches!(ext.as_str(), "json" | "csv" | "tsv" | "xml" | "yaml" | "yml"))
        .unwrap_or_else(|| "auto".to_string())
}

fn output_path(config: &CliConfig, extension: &str) -> String {
    config.output.clone().unwrap_or_else(|| {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        format!("converted_data_{timestamp}{extension}")
    })
}
