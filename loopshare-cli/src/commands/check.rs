//! `loopshare check`: report preflight results

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use loopshare_smbd::{PreflightResult, check_binary, check_nofile_limit};

use crate::config::ConfigLoader;

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to the smbd binary (overrides config)
    #[arg(long, value_name = "PATH")]
    pub smbd: Option<PathBuf>,
}

/// Run the check command
pub fn run(args: CheckArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?.smbd;
    if let Some(smbd) = args.smbd {
        config = config.with_binary_path(smbd);
    }

    let binary = check_binary(&config);
    let nofile = check_nofile_limit();

    print_result("smbd binary", &binary);
    print_result("open file limit", &nofile);

    if !binary.passed {
        anyhow::bail!("smbd binary not found");
    }
    Ok(())
}

fn print_result(name: &str, result: &PreflightResult) {
    let mark = if result.passed { "ok" } else { "FAIL" };
    println!(
        "[{mark}] {name}: {} (required: {})",
        result.current, result.required
    );
    if let Some(help) = &result.help {
        println!();
        println!("{help}");
        println!();
    }
}
