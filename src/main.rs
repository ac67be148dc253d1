use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod identity;
mod upload;

use api::{Backend, ClassifierBackend};
use identity::IdentityStore;
use upload::{
    collect_image_files, BatchConfig, BatchPhase, BatchUploadOrchestrator, ClassSelection,
    FsImageReader, UploadForm,
};

/// Seedscope CLI - batch image uploads for a seed classification backend
#[derive(Parser)]
#[command(name = "seedscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "SEEDSCOPE_BACKEND_URL")]
    backend_url: String,

    /// Destination storage container
    #[arg(long, env = "SEEDSCOPE_CONTAINER", default_value = "seedscope")]
    container: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the classification labels the backend knows
    Classes,
    /// Batch-upload image files with shared metadata
    Upload {
        /// Destination folder name (defaults to a timestamped name)
        #[arg(long)]
        folder: Option<String>,

        /// Classification label for the whole batch
        #[arg(long)]
        class: String,

        /// Expected specimen count per image
        #[arg(long)]
        seed_count: u32,

        /// Microscope magnification level
        #[arg(long)]
        zoom: u32,

        /// Image files or directories to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the stored uploader identity and configuration
    Identity,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Classes => run_classes(&cli).await,
        Commands::Upload {
            folder,
            class,
            seed_count,
            zoom,
            paths,
        } => {
            run_upload(
                &cli,
                folder.clone(),
                class.clone(),
                *seed_count,
                *zoom,
                paths.clone(),
            )
            .await
        }
        Commands::Identity => run_identity(&cli),
    }
}

async fn run_classes(cli: &Cli) -> Result<()> {
    let backend = Backend::new(cli.backend_url.clone());
    let response = backend.request_class_list().await?;

    if response.seeds.is_empty() {
        println!("The backend knows no classification labels yet.");
        return Ok(());
    }

    println!("Known classification labels:");
    for entry in &response.seeds {
        println!("  🌱 {} ({})", entry.seed_name, entry.seed_id);
    }

    Ok(())
}

async fn run_upload(
    cli: &Cli,
    folder: Option<String>,
    class_label: String,
    seed_count: u32,
    zoom: u32,
    paths: Vec<PathBuf>,
) -> Result<()> {
    let files = collect_image_files(&paths)?;
    let folder_name = folder.unwrap_or_else(default_folder_name);

    let backend = Backend::new(cli.backend_url.clone());
    let class = resolve_class(&backend, &class_label).await;
    let owner_id = IdentityStore::new(None)?.owner_id()?;

    let orchestrator = BatchUploadOrchestrator::new(
        backend,
        FsImageReader,
        BatchConfig {
            container_name: cli.container.clone(),
            owner_id,
        },
        UploadForm {
            folder_name: folder_name.clone(),
            class: Some(class),
            seed_count,
            zoom,
        },
    );

    orchestrator.select_files(files.clone()).await;
    println!(
        "📤 Uploading {} file(s) to folder '{}'...",
        files.len(),
        folder_name
    );
    orchestrator.submit().await;

    let snapshot = orchestrator.snapshot().await;
    for (path, done) in files.iter().zip(snapshot.file_status.iter()) {
        if *done {
            println!("  ✅ {}", path.display());
        } else {
            println!("  ❌ {}", path.display());
        }
    }

    match snapshot.phase {
        BatchPhase::Succeeded => {
            println!(
                "✅ Uploaded {}/{} file(s)",
                snapshot.completed, snapshot.file_count
            );
            Ok(())
        }
        _ => {
            if let Some(error) = &snapshot.error {
                anyhow::bail!("{}", error);
            }
            anyhow::bail!(
                "upload incomplete: {}/{} file(s) transferred; re-run to retry the rest",
                snapshot.completed,
                snapshot.file_count
            )
        }
    }
}

fn run_identity(cli: &Cli) -> Result<()> {
    let store = IdentityStore::new(None)?;
    let owner_id = store.owner_id()?;

    println!("Uploader identity");
    println!("   Owner id: {}", owner_id);
    println!("   Identity file: {:?}", store.identity_path());
    println!("   Backend URL: {}", cli.backend_url);
    println!("   Container: {}", cli.container);

    Ok(())
}

/// Match the requested label against the backend's class list.
///
/// Unknown labels are submitted as freeform selections with an empty class
/// id; the backend decides how new labels are persisted.
async fn resolve_class(backend: &Backend, label: &str) -> ClassSelection {
    match backend.request_class_list().await {
        Ok(response) => {
            if let Some(entry) = response
                .seeds
                .iter()
                .find(|entry| entry.seed_name.eq_ignore_ascii_case(label))
            {
                return ClassSelection {
                    class_id: entry.seed_id.clone(),
                    label: entry.seed_name.clone(),
                };
            }
            info!("Class '{}' is not in the backend list, submitting as a new label", label);
            ClassSelection {
                class_id: String::new(),
                label: label.to_string(),
            }
        }
        Err(err) => {
            warn!("Could not fetch class list: {}", err);
            ClassSelection {
                class_id: String::new(),
                label: label.to_string(),
            }
        }
    }
}

fn default_folder_name() -> String {
    format!("upload-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"))
}
