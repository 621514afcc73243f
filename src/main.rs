//! BroadVoice harness - encode/decode test driver

use anyhow::Context;
use clap::Parser;
use std::process;
use bvharness::codec::AdpcmCodec;
use bvharness::{init_logging, Args, HarnessError, RunConfig, RunOptions};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        let code = e.downcast_ref::<HarnessError>()
            .map(HarnessError::exit_code)
            .unwrap_or(1);
        process::exit(code);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.verbose {
        println!("{}", bvharness::harness_info());
        println!();
    }

    let config = RunConfig::from_args(&args)?;
    let options = RunOptions::from_args(&args, &config)?;

    println!("{}", config);
    println!();

    let report = bvharness::run(&config, &options, &AdpcmCodec)?;
    println!("{}", report);

    if let Some(path) = &args.report {
        report.save_to_file(path, &config, &options)
            .with_context(|| format!("writing report {}", path.display()))?;
        if args.verbose {
            println!("Report: {}", path.display());
        }
    }

    Ok(())
}
