//! Command definitions and execution
//!
//! This module defines the command-line interface structure using clap
//! and wires each command to the engine.

use crate::blob::{
    create_azure_backends, BatchReport, ContainerCreation, ContainerEntry, ContainerManager,
    FileEntry, ListOptions, ListRequest, Listing, ListingResolver, OutcomeStatus, TransferManager,
    UploadReceipt,
};
use crate::config::Settings;
use crate::error::Result;
use crate::utils::format::{format_table, format_timestamp, OutputFormat};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};

#[derive(Parser)]
#[command(name = "blobcli")]
#[command(about = "CLI utility for working with Azure Blob Storage")]
#[command(version)]
pub struct Cli {
    /// YAML configuration file (defaults to ./config.yaml)
    #[arg(long, global = true, env = "BLOBCLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging, response dumps and verbose listings
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored table headers
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Creates container in blob storage
    CreateContainer {
        /// The name of the container
        #[arg(short, long)]
        name: String,
    },
    /// Deletes container from the blob storage
    DeleteContainer {
        /// The name of the container
        #[arg(short, long)]
        name: String,
    },
    /// Uploads file to the blob storage at the provided path within the container
    Upload {
        /// The name of the container
        #[arg(short, long)]
        name: String,
        /// Path of file to upload
        #[arg(short, long)]
        file: PathBuf,
        /// Blob key to upload under; the file name is appended to it
        #[arg(short, long, default_value = "")]
        blob: String,
    },
    /// Downloads files from the blob storage. Drop -f to download all files in the config file list
    Download {
        /// Name of the container
        #[arg(short, long)]
        name: String,
        /// Blob key the files live under
        #[arg(short, long)]
        blob: Option<String>,
        /// File to download
        #[arg(short, long)]
        file: Option<String>,
        /// Directory to store downloaded file(s) in; must already exist
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Lists containers, folders in a container, or files in a folder
    #[command(alias = "ls")]
    List {
        /// The name of the container
        #[arg(short, long)]
        name: Option<String>,
        /// The prefix/folder of the blob
        #[arg(short, long)]
        prefix: Option<String>,
    },
}

/// How results are written to stdout
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub no_color: bool,
    pub verbose: bool,
}

impl Cli {
    pub fn output_options(&self, settings: &Settings) -> OutputOptions {
        OutputOptions {
            format: self.format,
            no_color: self.no_color,
            verbose: self.debug || settings.debug,
        }
    }

    pub async fn execute(self, settings: Settings) -> Result<()> {
        let output = self.output_options(&settings);
        let storage = Arc::new(settings.storage_config()?);
        let (store, tokens) = create_azure_backends(storage.clone())?;

        match self.command {
            Commands::CreateContainer { name } => {
                let manager = ContainerManager::new(store);
                execute_create_container(&manager, &name).await
            }
            Commands::DeleteContainer { name } => {
                let manager = ContainerManager::new(store);
                execute_delete_container(&manager, &name).await
            }
            Commands::Upload { name, file, blob } => {
                let transfers = TransferManager::new(store, tokens, &storage);
                execute_upload(&transfers, &name, file, &blob, &output).await
            }
            Commands::Download {
                name,
                blob,
                file,
                output: output_dir,
            } => {
                let transfers = TransferManager::new(store, tokens, &storage)
                    .with_manifest(settings.manifest().map(<[String]>::to_vec));
                execute_download(&transfers, &name, blob, file, output_dir, &output).await
            }
            Commands::List { name, prefix } => {
                let resolver = ListingResolver::new(store);
                let request = ListRequest::from_args(name, prefix);
                execute_list(&resolver, &request, &output).await
            }
        }
    }
}

async fn execute_create_container(manager: &ContainerManager, name: &str) -> Result<()> {
    match manager.create(name).await? {
        ContainerCreation::Created => println!("Container '{name}' created"),
        ContainerCreation::AlreadyExists => println!("Container '{name}' already exists"),
    }
    Ok(())
}

async fn execute_delete_container(manager: &ContainerManager, name: &str) -> Result<()> {
    manager.delete(name).await?;
    println!("Container '{name}' deleted");
    Ok(())
}

async fn execute_upload(
    transfers: &TransferManager,
    container: &str,
    file: PathBuf,
    blob: &str,
    output: &OutputOptions,
) -> Result<()> {
    let receipt = transfers.upload(container, &file, blob).await?;

    match output.format {
        OutputFormat::Json => print_json(&receipt)?,
        OutputFormat::Table => print_upload_receipt(&receipt, output.verbose),
    }
    Ok(())
}

fn print_upload_receipt(receipt: &UploadReceipt, verbose: bool) {
    println!("Uploaded '{}'", receipt.blob_name);
    println!("   Size: {} bytes", receipt.size);
    println!("   Content-Type: {}", receipt.content_type);
    if verbose {
        println!("   ETag: {}", receipt.etag);
        println!("   Last-Modified: {}", format_timestamp(&receipt.last_modified));
    }
}

async fn execute_download(
    transfers: &TransferManager,
    container: &str,
    blob: Option<String>,
    file: Option<String>,
    output_dir: PathBuf,
    output: &OutputOptions,
) -> Result<()> {
    let blob = blob.as_deref();

    match file {
        Some(file) => {
            let receipt = transfers
                .download_one(container, blob, &file, &output_dir)
                .await?;
            match output.format {
                OutputFormat::Json => print_json(&receipt)?,
                OutputFormat::Table => println!(
                    "Downloaded '{}' to '{}'",
                    receipt.blob_name,
                    receipt.local_path.display()
                ),
            }
        }
        None => {
            let report = transfers.download_all(container, blob, &output_dir).await?;
            match output.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => print_batch_report(&report, output.no_color),
            }
        }
    }
    Ok(())
}

fn print_batch_report(report: &BatchReport, no_color: bool) {
    #[derive(Tabled)]
    struct OutcomeRow {
        #[tabled(rename = "File")]
        file: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Detail")]
        detail: String,
    }

    let rows: Vec<OutcomeRow> = report
        .outcomes()
        .iter()
        .map(|outcome| match &outcome.status {
            OutcomeStatus::Succeeded(receipt) => OutcomeRow {
                file: outcome.name.clone(),
                status: "downloaded".to_string(),
                detail: receipt.local_path.display().to_string(),
            },
            OutcomeStatus::Failed { error } => OutcomeRow {
                file: outcome.name.clone(),
                status: "failed".to_string(),
                detail: error.clone(),
            },
        })
        .collect();

    println!("{}", format_table(Table::new(&rows), no_color));
    println!(
        "\nReports download operation completed: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
}

async fn execute_list(
    resolver: &ListingResolver,
    request: &ListRequest,
    output: &OutputOptions,
) -> Result<()> {
    let options = ListOptions {
        verbose: output.verbose,
        max_pages: None,
    };
    let listing = resolver.resolve(request, options).await?;

    if output.format == OutputFormat::Json {
        return print_json(&listing);
    }

    if listing.is_empty() {
        println!("Nothing found");
        return Ok(());
    }

    let table = match &listing {
        Listing::Containers(entries) => container_table(entries, output.verbose),
        Listing::Folders(folders) => folder_table(folders),
        Listing::Files(entries) => file_table(entries, output.verbose),
    };
    println!("{}", format_table(table, output.no_color));
    println!("\nTotal: {}", listing.len());
    Ok(())
}

fn container_table(entries: &[ContainerEntry], verbose: bool) -> Table {
    #[derive(Tabled)]
    struct ContainerRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Last Modified")]
        last_modified: String,
    }

    #[derive(Tabled)]
    struct ContainerDetailRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Last Modified")]
        last_modified: String,
        #[tabled(rename = "ETag")]
        etag: String,
        #[tabled(rename = "Lease Status")]
        lease_status: String,
        #[tabled(rename = "Legal Hold")]
        legal_hold: bool,
        #[tabled(rename = "Public Access")]
        public_access_level: String,
    }

    if verbose {
        let rows: Vec<ContainerDetailRow> = entries
            .iter()
            .map(|entry| {
                let details = entry.details.clone();
                ContainerDetailRow {
                    name: entry.name.clone(),
                    last_modified: format_timestamp(&entry.last_modified),
                    etag: details.as_ref().map(|d| d.etag.clone()).unwrap_or_default(),
                    lease_status: details
                        .as_ref()
                        .map(|d| d.lease_status.clone())
                        .unwrap_or_default(),
                    legal_hold: details.as_ref().is_some_and(|d| d.legal_hold),
                    public_access_level: details
                        .map(|d| d.public_access_level)
                        .unwrap_or_default(),
                }
            })
            .collect();
        Table::new(&rows)
    } else {
        let rows: Vec<ContainerRow> = entries
            .iter()
            .map(|entry| ContainerRow {
                name: entry.name.clone(),
                last_modified: format_timestamp(&entry.last_modified),
            })
            .collect();
        Table::new(&rows)
    }
}

fn folder_table(folders: &[String]) -> Table {
    #[derive(Tabled)]
    struct FolderRow {
        #[tabled(rename = "Folder")]
        name: String,
    }

    let rows: Vec<FolderRow> = folders
        .iter()
        .map(|name| FolderRow { name: name.clone() })
        .collect();
    Table::new(&rows)
}

fn file_table(entries: &[FileEntry], verbose: bool) -> Table {
    #[derive(Tabled)]
    struct FileRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Created")]
        created: String,
        #[tabled(rename = "Last Modified")]
        last_modified: String,
        #[tabled(rename = "Content-Type")]
        content_type: String,
        #[tabled(rename = "Size")]
        content_length: u64,
    }

    #[derive(Tabled)]
    struct FileDetailRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Created")]
        created: String,
        #[tabled(rename = "Last Modified")]
        last_modified: String,
        #[tabled(rename = "ETag")]
        etag: String,
        #[tabled(rename = "Content-Type")]
        content_type: String,
        #[tabled(rename = "Size")]
        content_length: u64,
        #[tabled(rename = "Lease Status")]
        lease_status: String,
        #[tabled(rename = "Type")]
        blob_type: String,
    }

    if verbose {
        let rows: Vec<FileDetailRow> = entries
            .iter()
            .map(|entry| {
                let details = entry.details.clone();
                FileDetailRow {
                    name: entry.name.clone(),
                    created: format_timestamp(&entry.created),
                    last_modified: format_timestamp(&entry.last_modified),
                    etag: details.as_ref().map(|d| d.etag.clone()).unwrap_or_default(),
                    content_type: entry.content_type.clone(),
                    content_length: entry.content_length,
                    lease_status: details
                        .as_ref()
                        .and_then(|d| d.lease_status.clone())
                        .unwrap_or_else(|| "-".to_string()),
                    blob_type: details.map(|d| d.blob_type).unwrap_or_default(),
                }
            })
            .collect();
        Table::new(&rows)
    } else {
        let rows: Vec<FileRow> = entries
            .iter()
            .map(|entry| FileRow {
                name: entry.name.clone(),
                created: format_timestamp(&entry.created),
                last_modified: format_timestamp(&entry.last_modified),
                content_type: entry.content_type.clone(),
                content_length: entry.content_length,
            })
            .collect();
        Table::new(&rows)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
