use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::post_process::handle_post_process;
use commands::upload::handle_upload;
use logging::setup_logging;

#[derive(Parser)]
#[command(author, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload benchmark result files to S3
    #[command(about = "Upload benchmark result files to S3")]
    Upload {
        /// S3 path prefix
        #[arg(long = "s3-prefix", help = "S3 path prefix")]
        s3_prefix: String,

        /// Name of the userbenchmark
        #[arg(long, help = "Name of the userbenchmark")]
        userbenchmark: String,

        /// Workflow Run ID
        #[arg(long = "workflow-run-id", help = "Workflow Run ID")]
        workflow_run_id: String,

        /// Workflow attempt
        #[arg(long = "workflow-run-attempt", help = "Workflow attempt")]
        workflow_run_attempt: String,

        /// Local directory containing files to upload
        #[arg(
            long = "upload-path",
            help = "Local directory contains files to upload"
        )]
        upload_path: PathBuf,

        /// Filename regex matched to upload
        #[arg(long = "match-filename", help = "Filename regex matched to upload")]
        match_filename: String,
    },

    /// Decorate perf CSV files with CI run metadata
    #[command(about = "Decorate perf CSV files with CI run metadata")]
    PostProcess {
        /// Perf CSV file to decorate; may be given multiple times
        #[arg(
            long = "test-file",
            required = true,
            help = "Perf CSV file to decorate; repeat the flag for multiple files"
        )]
        test_file: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Upload {
            s3_prefix,
            userbenchmark,
            workflow_run_id,
            workflow_run_attempt,
            upload_path,
            match_filename,
        } => {
            handle_upload(
                &s3_prefix,
                &userbenchmark,
                &workflow_run_id,
                &workflow_run_attempt,
                &upload_path,
                &match_filename,
            )
            .await?;
        }
        Command::PostProcess { test_file } => {
            handle_post_process(&test_file)?;
        }
    }
    Ok(())
}
