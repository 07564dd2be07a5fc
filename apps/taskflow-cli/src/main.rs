//! TaskFlow CLI - command line client for a TaskFlow record service

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use taskflow_cli::{logging::init_logging, run, Cli};
use taskflow_core::{
    ActionOutcome, HttpRecordClient, ProjectService, RecordClient, TaskBoard, TaskService,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = cli
        .config_loader()
        .load()
        .context("Failed to load configuration")?;
    init_logging(&config.log_level, cli.json_logs)?;

    let client: Arc<dyn RecordClient> = Arc::new(HttpRecordClient::new(&config)?);
    let board = TaskBoard::new(
        TaskService::new(Arc::clone(&client)).with_page_size(config.task_page_size),
        ProjectService::new(client).with_page_size(config.project_page_size),
    );

    let outcome = run(&board, &cli.command, cli.json, &mut std::io::stdout()).await?;
    Ok(if outcome == ActionOutcome::Applied {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
