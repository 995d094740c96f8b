mod aspect_ratio;
mod cli;
mod config;
mod convert;
mod dedup;
mod error;
mod exporter;
mod metadata;
mod metadata_source;
mod metadata_sources;
mod organizer;
mod report;
mod tools;
mod walker;

use crate::aspect_ratio::{check_aspect_ratio, get_by_aspect_ratio};
use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::convert::{convert_directory, DngConverter, EmbeddedJpegExtractor};
use crate::organizer::Transfer;
use crate::report::BatchReport;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::process::ExitCode;

/// The command finished but at least one file could not be handled.
const EXIT_PARTIAL: u8 = 2;

fn run(cli: Cli) -> Result<BatchReport> {
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize env_logger based on config.log_level
    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .format_timestamp(None)
        .init();

    info!("Starting photo-utils");
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let report = match cli.command {
        Command::CleanDupes { src_dir, dry_run } => {
            dedup::clean_dupes(&src_dir, &config.duplicates_dir, dry_run)?
        }
        Command::Arw2Jpg { src_dir, dest_dir } => {
            let converter = EmbeddedJpegExtractor::new(&config.exiftool_path)?;
            convert_directory(&converter, &src_dir, &dest_dir, &config.raw_extension)?
        }
        Command::Arw2Dng { src_dir, dest_dir } => {
            let converter = DngConverter::new(&config.dng_converter_path)?;
            convert_directory(&converter, &src_dir, &dest_dir, &config.raw_extension)?
        }
        Command::Exif2Json {
            src_dir,
            dest_file,
            filter,
        } => {
            let source = metadata_sources::from_config(&config)?;
            let extension = filter.resolve(&config.raw_extension);
            let count = exporter::export_exif_to_json(
                source.as_ref(),
                &src_dir,
                &dest_file,
                extension.as_deref(),
            )?;
            println!("EXIF metadata written to: {}", dest_file.display());
            BatchReport {
                processed: count,
                ..BatchReport::default()
            }
        }
        Command::Organize {
            src_dir,
            dest_dir,
            copy,
        } => {
            let source = metadata_sources::from_config(&config)?;
            let transfer = if copy { Transfer::Copy } else { Transfer::Move };
            organizer::organize(source.as_ref(), &src_dir, &dest_dir, transfer)?
        }
        Command::CheckAspectRatio {
            src_dir,
            aspect_ratio,
            mode,
            filter,
        } => {
            let source = metadata_sources::from_config(&config)?;
            let extension = filter.resolve(&config.raw_extension);
            let summary = check_aspect_ratio(
                source.as_ref(),
                &src_dir,
                aspect_ratio,
                extension.as_deref(),
                mode.resolve(),
                &mut out,
            )?;
            BatchReport {
                processed: summary.matched.len() + summary.not_matched.len(),
                skipped: summary.unreadable,
                ..BatchReport::default()
            }
        }
        Command::GetByAspectRatio {
            src_dir,
            aspect_ratio,
            dest_dir,
            filter,
        } => {
            let source = metadata_sources::from_config(&config)?;
            let extension = filter.resolve(&config.raw_extension);
            get_by_aspect_ratio(
                source.as_ref(),
                &src_dir,
                aspect_ratio,
                extension.as_deref(),
                dest_dir.as_deref(),
                &mut out,
            )?
        }
    };

    info!("photo-utils finished: {}", report);
    Ok(report)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(report) if report.has_failures() => ExitCode::from(EXIT_PARTIAL),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
