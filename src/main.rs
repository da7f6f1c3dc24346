//! Replay accelerometer recordings through the motion pipeline.
//!
//! Input is CSV, one sample per line: `t,x,y,z[,alpha,beta,gamma]`.
//! Events are printed to stdout as JSON lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use motion_sense::fingerprint::FileStore;
use motion_sense::{Config, MotionEvent, MotionPipeline, Sample};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to replay (stdin when omitted)
    #[arg(short, long)]
    input: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Directory to load and save the motion fingerprint
    #[arg(short, long)]
    store_dir: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

/// Parse one CSV record. `Ok(None)` for comments, blanks and the header.
fn parse_line(line: &str) -> Result<Option<Sample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('t') {
        return Ok(None);
    }

    let fields = line
        .split(',')
        .map(|field| field.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid number in line: {line}"))?;

    match fields.as_slice() {
        [t, x, y, z] => Ok(Some(Sample::new(*x, *y, *z, *t))),
        [t, x, y, z, alpha, beta, gamma] => Ok(Some(Sample::new(*x, *y, *z, *t).with_orientation(*alpha, *beta, *gamma))),
        _ => anyhow::bail!("Expected 4 or 7 fields, got {}: {line}", fields.len()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Motion Sense");

    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    config.validate().context("Invalid configuration")?;

    let storage_key = config.fingerprint.storage_key.clone();
    let (tx, rx) = std::sync::mpsc::channel::<MotionEvent>();
    let mut pipeline = MotionPipeline::new(config)?.with_sink(tx);
    if let Some(dir) = &args.store_dir {
        let store = FileStore::new(dir, &storage_key);
        info!("Fingerprint store: {}", store.path().display());
        pipeline = pipeline.with_store(store)?;
    }
    pipeline.init();

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input: {path}"))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut samples = 0_u64;
    let mut events = 0_u64;

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let sample = match parse_line(&line) {
            Ok(Some(sample)) => sample,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping line {}: {e}", number + 1);
                continue;
            }
        };

        pipeline.process(&sample);
        samples += 1;

        for event in rx.try_iter() {
            serde_json::to_writer(&mut out, &event)?;
            writeln!(out)?;
            events += 1;
        }
    }
    out.flush()?;
    pipeline.flush();

    let signature = pipeline.signature();
    info!("Processed {samples} samples, {events} events");
    info!(
        "Void state {} (depth {:.3}, stillness {:.2}s)",
        pipeline.void_state(),
        pipeline.void_depth(),
        pipeline.void_stillness_time()
    );
    info!(
        "Fingerprint: energy {:.3}, frequency {:.2} Hz, preferred axis {:?}, returning {}",
        signature.avg_energy, signature.avg_frequency, signature.preferred_axis, signature.is_returning
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_arguments() {
        let args = Args::try_parse_from(["motion-sense"]).unwrap();
        // Reads stdin, default config, no persistence
        assert!(args.input.is_none());
        assert!(args.config.is_none());
        assert!(args.store_dir.is_none());
        assert!(!args.debug);
    }

    #[test]
    fn test_all_arguments() {
        let args = Args::try_parse_from([
            "motion-sense",
            "--input",
            "walk.csv",
            "-C",
            "motion.yaml",
            "--store-dir",
            "/tmp/profiles",
            "-d",
        ])
        .unwrap();
        assert_eq!(args.input.as_deref(), Some("walk.csv"));
        assert_eq!(args.config.as_deref(), Some("motion.yaml"));
        assert_eq!(args.store_dir.as_deref(), Some("/tmp/profiles"));
        assert!(args.debug);
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from(["motion-sense", "-i", "a.csv", "-s", "store"]).unwrap();
        assert_eq!(args.input.as_deref(), Some("a.csv"));
        assert_eq!(args.store_dir.as_deref(), Some("store"));
    }

    #[test]
    fn test_help_and_bad_arguments() {
        let err = Args::try_parse_from(["motion-sense", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(Args::try_parse_from(["motion-sense", "--camera", "0"]).is_err());
        assert!(Args::try_parse_from(["motion-sense", "--input"]).is_err());
    }

    #[test]
    fn test_parse_line() {
        assert!(parse_line("# recorded at 60 Hz").unwrap().is_none());
        assert!(parse_line("t,x,y,z").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());

        let sample = parse_line("0.5, 1.0, 2.0, 9.8").unwrap().unwrap();
        assert_eq!(sample.timestamp, 0.5);
        assert_eq!(sample.z, 9.8);
        assert!(sample.orientation.is_none());

        let sample = parse_line("1,0,0,9.8,10,20,30").unwrap().unwrap();
        assert_eq!(sample.orientation.unwrap().gamma, 30.0);

        assert!(parse_line("1,2,3").is_err());
        assert!(parse_line("1,a,3,4").is_err());
    }
}
