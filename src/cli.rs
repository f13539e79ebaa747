use crate::config::{
    BackendRole, TransferConfig, load_backend_config, load_transfer_config_file,
    staging_dir_from_env,
};
use crate::error::Result;
use crate::logging::LogSink;
use crate::storage::utils::size::format_size;
use crate::storage::{Backend, StorageBackend};
use crate::transfer::{TransferManager, TransferReport};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "filetransfer",
    version,
    about = "Move files between Azure Data Lake Storage and network folders"
)]
pub struct Args {
    /// JSON file describing the source and destination backends.
    /// Without it, backends are read from SOURCE_* / DEST_* environment variables.
    #[arg(long, global = true, env = "FILETRANSFER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every file under a path
    Ls {
        /// Backend to list
        #[arg(long, value_enum, default_value_t = Side::Source)]
        on: Side,
        /// Print the listing as a JSON object
        #[arg(long)]
        json: bool,
        path: String,
    },
    /// Download a file from the source backend
    Get { remote: String, local: PathBuf },
    /// Upload a local file to the destination backend
    Put { local: PathBuf, remote: String },
    /// Copy from the source backend to the destination backend
    Cp {
        /// Copy every file under SRC
        #[arg(short = 'R', long)]
        recursive: bool,
        src: String,
        dest: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl From<Side> for BackendRole {
    fn from(side: Side) -> Self {
        match side {
            Side::Source => BackendRole::Source,
            Side::Destination => BackendRole::Destination,
        }
    }
}

/// Where backend definitions come from for this invocation.
struct Settings {
    file: Option<TransferConfig>,
}

impl Settings {
    fn load(config: Option<&Path>) -> Result<Self> {
        let file = config.map(load_transfer_config_file).transpose()?;
        Ok(Self { file })
    }

    async fn backend(&self, role: BackendRole) -> Result<Backend> {
        match &self.file {
            Some(file) => file.backend(role).build(LogSink::global()).await,
            None => load_backend_config(role)?.build(LogSink::global()).await,
        }
    }

    fn staging_dir(&self) -> PathBuf {
        self.file
            .as_ref()
            .and_then(|file| file.staging_dir.clone())
            .or_else(staging_dir_from_env)
            .unwrap_or_else(std::env::temp_dir)
    }
}

pub async fn run(args: Args) -> Result<()> {
    let settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Ls { on, json, path } => {
            let backend = settings.backend(on.into()).await?;
            let files = backend.list_files(&path).await?;
            if json {
                let output = serde_json::json!({
                    "backend": backend.backend_type().as_str(),
                    "path": path,
                    "files": files,
                });
                println!("{output}");
            } else {
                for file in files {
                    println!("{file}");
                }
            }
        }
        Command::Get { remote, local } => {
            let backend = settings.backend(BackendRole::Source).await?;
            backend.download_file(&remote, &local).await?;
            println!("Downloaded: {remote} → {}", local.display());
        }
        Command::Put { local, remote } => {
            let backend = settings.backend(BackendRole::Destination).await?;
            backend.upload_file(&local, &remote).await?;
            println!("Uploaded: {} → {remote}", local.display());
        }
        Command::Cp {
            recursive,
            src,
            dest,
        } => {
            let source = settings.backend(BackendRole::Source).await?;
            let destination = settings.backend(BackendRole::Destination).await?;
            let manager =
                TransferManager::new(source, destination).staging_root(settings.staging_dir());

            if recursive {
                let reports = manager.transfer_files(&src, &dest).await?;
                reports.iter().for_each(print_report);
                println!("Transferred {} file(s)", reports.len());
            } else {
                print_report(&manager.transfer_file(&src, &dest).await?);
            }
        }
    }

    Ok(())
}

fn print_report(report: &TransferReport) {
    println!(
        "Transferred: {} → {} ({})",
        report.source_path,
        report.dest_path,
        format_size(report.bytes)
    );
}
