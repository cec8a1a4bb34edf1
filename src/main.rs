use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nebuia_flow::{
    config, logging,
    polling::Cancellation,
    resources::{JobQuery, NebuiaApi, NebuiaClient, Page, RecordFilter},
    shaping::extract_document_entities,
    workflow::{DocumentWorkflow, WorkflowOptions},
};
use serde::Serialize;
use serde_json::json;

#[derive(Parser)]
#[command(
    name = "nebuia-flow",
    about = "Create Nebuia records, upload PDFs, verify them and run processing jobs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload documents into a new record and process it.
    Process {
        /// Configuration the record is created for.
        #[arg(long = "config")]
        configuration: String,
        /// Document to upload as `<type>=<path>`; repeat for several documents.
        #[arg(long = "document", value_parser = parse_document, required = true)]
        documents: Vec<(String, PathBuf)>,
        /// Return right after the job is created.
        #[arg(long)]
        no_wait: bool,
        /// Verify document types but do not create the job.
        #[arg(long)]
        no_auto_process: bool,
        /// Completion wait budget in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// List configurations.
    Configurations {
        #[command(flatten)]
        page: PageArgs,
    },
    /// List records.
    Records {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "config")]
        configuration: Option<String>,
        #[arg(long)]
        date_from: Option<String>,
        #[arg(long)]
        date_to: Option<String>,
    },
    /// Show a record together with its documents.
    Record { record_id: String },
    /// Show job metrics.
    Jobs {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        detailed: bool,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        date_from: Option<String>,
        #[arg(long)]
        date_to: Option<String>,
    },
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 50)]
    page_size: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page {
            page: args.page,
            page_size: args.page_size,
        }
    }
}

fn parse_document(raw: &str) -> Result<(String, PathBuf), String> {
    let (document_type, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <type>=<path>, got `{raw}`"))?;
    if document_type.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected <type>=<path>, got `{raw}`"));
    }
    Ok((document_type.trim().to_string(), PathBuf::from(path.trim())))
}

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = logging::init_tracing();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "nebuia-flow failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config().context("Failed to load configuration")?;
    let client = NebuiaClient::new(&config).context("Failed to build API client")?;

    match cli.command {
        Command::Process {
            configuration,
            documents,
            no_wait,
            no_auto_process,
            timeout,
        } => {
            let options = WorkflowOptions {
                wait_for_completion: !no_wait,
                auto_process: !no_auto_process,
                completion_timeout: Duration::from_secs(timeout),
                ..WorkflowOptions::default()
            };
            let documents: BTreeMap<String, PathBuf> = documents.into_iter().collect();
            process(client, &configuration, &documents, options).await
        }
        Command::Configurations { page } => {
            print_json(&client.list_configurations(page.into()).await?)
        }
        Command::Records {
            page,
            status,
            configuration,
            date_from,
            date_to,
        } => {
            let filter = RecordFilter {
                status,
                configuration_ref: configuration,
                date_from,
                date_to,
            };
            print_json(&client.list_records(page.into(), &filter).await?)
        }
        Command::Record { record_id } => {
            print_json(&client.get_record_summary(&record_id).await?)
        }
        Command::Jobs {
            page,
            detailed,
            status,
            date_from,
            date_to,
        } => {
            let query = JobQuery {
                detailed,
                status,
                date_from,
                date_to,
            };
            print_json(&client.get_jobs_status(page.into(), &query).await?)
        }
    }
}

async fn process(
    client: NebuiaClient,
    configuration: &str,
    documents: &BTreeMap<String, PathBuf>,
    options: WorkflowOptions,
) -> Result<()> {
    let (cancel_handle, cancel) = Cancellation::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            cancel_handle.cancel();
        }
    });

    let api: Arc<dyn NebuiaApi> = Arc::new(client);
    let workflow = DocumentWorkflow::new(api)
        .with_options(options)
        .with_cancellation(cancel);

    let record = workflow
        .process_documents(configuration, documents)
        .await
        .context("Document workflow produced no record")?;
    tracing::info!(metrics = ?workflow.metrics_snapshot(), "Workflow finished");

    print_json(&json!({
        "record_id": record.id,
        "status": record.status,
        "verification_results": record.verification_results,
        "failed_uploads": record.failed_uploads,
        "entities": extract_document_entities(&record),
    }))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_arguments_split_on_first_equals() {
        assert_eq!(
            parse_document("deed=./files/a=b.pdf"),
            Ok(("deed".to_string(), PathBuf::from("./files/a=b.pdf")))
        );
        assert!(parse_document("deed").is_err());
        assert!(parse_document("=a.pdf").is_err());
    }

    #[test]
    fn process_command_parses_flags() {
        let cli = Cli::try_parse_from([
            "nebuia-flow",
            "process",
            "--config",
            "mortgage",
            "--document",
            "deed=deed.pdf",
            "--document",
            "id_card=id.pdf",
            "--no-wait",
        ])
        .expect("parse");

        match cli.command {
            Command::Process {
                configuration,
                documents,
                no_wait,
                no_auto_process,
                timeout,
            } => {
                assert_eq!(configuration, "mortgage");
                assert_eq!(documents.len(), 2);
                assert!(no_wait);
                assert!(!no_auto_process);
                assert_eq!(timeout, 300);
            }
            _ => panic!("expected process command"),
        }
    }
}
