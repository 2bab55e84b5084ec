use std::io;
use std::path::Path;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Scenario, Simulation, SimulationConfig, TranscriptLogger};

fn main() -> io::Result<()> {
    for scenario in Scenario::ALL {
        record_scenario(scenario)?;
    }
    Ok(())
}

fn record_scenario(scenario: Scenario) -> io::Result<()> {
    let mut config = SimulationConfig::new(scenario);
    if scenario == Scenario::Outage {
        // Leave room for the re-sync after the carrier returns.
        config.minutes = 7;
    }

    let mut logger = TranscriptLogger::new(Path::new(scenario.log_path()), scenario.header())?;
    let summary = Simulation::new(config).run(|at_ms, line| logger.append_line(at_ms, line))?;
    logger.finish()?;

    println!(
        "{}: {} decoded, {} rejected -> {}",
        scenario.log_path(),
        summary.decoded.len(),
        summary.rejected.len(),
        summary.time_sync
    );
    Ok(())
}
