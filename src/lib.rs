pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use clap::Parser;

/// Entry point of the `redmine-gamification` binary.
pub fn run() {
    if let Err(error) = try_run() {
        tracing::error!(target: "app", %error, "redmine-gamification failed");
        eprintln!("redmine-gamification failed: {error}");
        std::process::exit(1);
    }
}

fn try_run() -> Result<(), Box<dyn std::error::Error>> {
    let args = crate::cli::CliArguments::parse();
    crate::utils::logger::init_logging(args.log_dir.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(args.op.run())?;

    tracing::info!(target: "app", "finished.");
    Ok(())
}
