mod session;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use session::{Scenario, Simulation, SimulationConfig, TranscriptLogger, format_line};

const USAGE: &str = "Usage: dcf77-emulator [--scenario <clean|parity|dropout|outage|noise>] \
                     [--minutes <n>] [--transcript <path>]";

struct Options {
    config: SimulationConfig,
    transcript: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let mut transcript = options
        .transcript
        .as_deref()
        .map(|path| TranscriptLogger::new(path, options.config.scenario.header()))
        .transpose()?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    writeln!(writer, "{}", options.config.scenario.header())?;

    let summary = Simulation::new(options.config).run(|at_ms, line| {
        writeln!(writer, "{}", format_line(at_ms, line))?;
        match transcript.as_mut() {
            Some(logger) => logger.append_line(at_ms, line),
            None => Ok(()),
        }
    })?;

    if let Some(logger) = transcript {
        logger.finish()?;
    }

    if summary.decoded.is_empty() {
        eprintln!("No minute decoded.");
        process::exit(1);
    }
    Ok(())
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        config: SimulationConfig::new(Scenario::Clean),
        transcript: None,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--scenario=") {
            options.config.scenario = Scenario::from_tag(value)?;
        } else if arg == "--scenario" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --scenario".to_string())?;
            options.config.scenario = Scenario::from_tag(&value)?;
        } else if let Some(value) = arg.strip_prefix("--minutes=") {
            options.config.minutes = parse_minutes(value)?;
        } else if arg == "--minutes" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --minutes".to_string())?;
            options.config.minutes = parse_minutes(&value)?;
        } else if let Some(value) = arg.strip_prefix("--transcript=") {
            options.transcript = Some(PathBuf::from(value));
        } else if arg == "--transcript" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --transcript".to_string())?;
            options.transcript = Some(PathBuf::from(value));
        } else {
            options.config.scenario = Scenario::from_tag(&arg)?;
        }
    }

    Ok(options)
}

fn parse_minutes(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(format!("Invalid minute count `{value}`")),
    }
}
