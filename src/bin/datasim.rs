use chrono::{DateTime, Duration, Utc};
use clap::{App, Arg, ArgMatches, SubCommand};
use colored::*;
use datasim::{LayoutConfig, Simulation};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_COUNT: &str = "1";
const DEFAULT_PERIOD_MS: &str = "1000";

fn main() {
    let matches = App::new("datasim")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  Telemetry Data Simulator - deterministic frame and packet streams")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("📡 Generate a telemetry stream from a layout")
                .arg(
                    Arg::with_name("config")
                        .short("c")
                        .long("config")
                        .value_name("FILE")
                        .help("JSON layout file")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("count")
                        .short("n")
                        .long("count")
                        .value_name("SAMPLES")
                        .help("Number of samples to generate")
                        .takes_value(true)
                        .default_value(DEFAULT_COUNT)
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Count must be a non-negative integer".into()),
                        }),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("FILE")
                        .help("Output file (default: stdout)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("start")
                        .long("start")
                        .value_name("RFC3339")
                        .help("Timestamp of the first sample (default: now)")
                        .takes_value(true)
                        .validator(|v| match DateTime::parse_from_rfc3339(&v) {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Start must be an RFC 3339 timestamp".into()),
                        }),
                )
                .arg(
                    Arg::with_name("period")
                        .long("period-ms")
                        .value_name("MS")
                        .help("Time between samples in milliseconds")
                        .takes_value(true)
                        .default_value(DEFAULT_PERIOD_MS)
                        .validator(|v| match v.parse::<i64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Period must be an integer".into()),
                        }),
                )
                .arg(
                    Arg::with_name("format")
                        .short("f")
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output encoding")
                        .takes_value(true)
                        .possible_values(&["raw", "hex"])
                        .default_value("raw"),
                ),
        )
        .subcommand(
            SubCommand::with_name("inspect")
                .about("🔍 Validate a layout and describe its output")
                .arg(
                    Arg::with_name("config")
                        .short("c")
                        .long("config")
                        .value_name("FILE")
                        .help("JSON layout file")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();

    let result = match matches.subcommand() {
        ("generate", Some(sub)) => generate(sub),
        ("inspect", Some(sub)) => inspect(sub),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("{} {}", "❌".red(), e.to_string().bright_red());
        std::process::exit(1);
    }
}

fn generate(matches: &ArgMatches) -> datasim::Result<()> {
    // Validators above guarantee these parse.
    let count: u64 = matches.value_of("count").unwrap_or(DEFAULT_COUNT).parse().unwrap_or(1);
    let period_ms: i64 = matches
        .value_of("period")
        .unwrap_or(DEFAULT_PERIOD_MS)
        .parse()
        .unwrap_or(1000);
    let start = matches
        .value_of("start")
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let hex = matches.value_of("format") == Some("hex");

    let layout = LayoutConfig::load(matches.value_of("config").unwrap_or_default())?;
    let generator = layout.build()?;
    let mut sim = Simulation::new(generator, start, Duration::milliseconds(period_ms));

    let sink: Box<dyn Write> = match matches.value_of("output") {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = BufWriter::new(sink);

    let stats = if hex {
        let mut hex_sink = HexWriter { inner: &mut sink };
        sim.run(count, &mut hex_sink)?
    } else {
        sim.run(count, &mut sink)?
    };
    sink.flush()?;

    info!(
        samples = stats.samples,
        bytes = stats.bytes_written,
        "generation complete"
    );
    if let Some(path) = matches.value_of("output") {
        eprintln!(
            "{} wrote {} samples ({} bytes) to {}",
            "✅".green(),
            stats.samples.to_string().bright_cyan(),
            stats.bytes_written.to_string().bright_cyan(),
            path.bright_white()
        );
    }
    Ok(())
}

fn inspect(matches: &ArgMatches) -> datasim::Result<()> {
    let layout = LayoutConfig::load(matches.value_of("config").unwrap_or_default())?;
    let generator = layout.build()?;

    println!("{}", "🛰️  Layout".bright_blue().bold());
    println!("  {}", generator.describe().bright_white());
    match generator.output_len() {
        Some(len) => println!("  output: {} bytes per sample", len.to_string().bright_cyan()),
        None => println!("  output: {}", "variable length".yellow()),
    }
    println!("{} {}", "✅".green(), "Layout is valid".bright_green());
    Ok(())
}

/// Writes each sample as one line of lowercase hex.
struct HexWriter<'a, W: Write> {
    inner: &'a mut W,
}

impl<W: Write> Write for HexWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut line = String::with_capacity(buf.len() * 2 + 1);
        for byte in buf {
            line.push_str(&format!("{byte:02x}"));
        }
        line.push('\n');
        self.inner.write_all(line.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
