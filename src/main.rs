use std::io::{BufReader, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use allping::args::{Args, SummaryFormat};
use allping::config::{epoch_from_unix_secs, EngineConfig};
use allping::engine::Engine;
use allping::summary::Report;

fn print_report(report: &Report, format: SummaryFormat) -> anyhow::Result<()> {
    let output = match format {
        SummaryFormat::Text => report.as_text()?,
        SummaryFormat::Json => report.as_json()?,
        SummaryFormat::Csv => report.as_csv()?,
    };
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    eprintln!(
        "intended start time: {}, id: {}, # of addresses: {}",
        args.start_time, args.self_id, args.peers
    );

    let addresses = match &args.addresses {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("cannot open address file {}", path.display()))?;
            allping::addresses::load_addresses(BufReader::new(file), args.peers)?
        }
        None => allping::addresses::load_addresses(std::io::stdin().lock(), args.peers)?,
    };

    let mut config = EngineConfig::new(args.self_id, epoch_from_unix_secs(args.start_time)?);
    config.base_port = args.base_port;
    config.stagger = args.stagger;
    config.write_eager_registration = args.busy_wait;
    config.report_interval = args.report_interval;
    config.grace = args.grace;

    let mut engine = Engine::new(config, &addresses).context("failed to set up sockets and timers")?;
    let outcome = engine.run();
    let status = engine.recorder().status();
    let report = engine.report();
    // closes every socket and timer before anything is printed
    drop(engine);

    match outcome {
        Ok(()) => {
            info!("run complete");
            eprint!("{}", status);
            print_report(&report, args.summary)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("run failed: {}", e);
            eprint!("{}", status);
            print_report(&report, args.summary)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    allping::trace::init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
