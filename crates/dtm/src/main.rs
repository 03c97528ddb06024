use clap::{Args, Parser, Subcommand};
use dtm::config::Config;
use dtm::persist::{load_store, save_store};
use dtm::{ExportSelection, Handler, ImportRequest, PluginMessage, UiMessage};
use dtm_core::{CollectionId, ModeId};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dtm")]
#[command(version, about = "Import design-token documents into a variable store and export them back", long_about = None)]
struct Cli {
    /// Variable store snapshot (defaults to the configured path)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Configuration file (defaults to <config dir>/dtm/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import token documents, one collection per document
    Import(ImportArgs),
    /// Export collections as token documents
    Export(ExportArgs),
    /// List collections and their modes
    Collections,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Token documents to import
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Documents are base64-encoded
    #[arg(long)]
    base64: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Collection id to export (all collections if omitted)
    #[arg(long, value_name = "ID")]
    collection: Option<String>,

    /// Mode id of the selected collection (repeatable; all modes if omitted)
    #[arg(long, value_name = "ID", requires = "collection")]
    mode: Vec<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store_path = cli.store.clone().unwrap_or_else(|| config.store.path.clone());
    let store = load_store(&store_path)?;
    let handler = Handler::new(&store, config.import_options());

    match cli.command {
        Command::Import(args) => {
            let mut failures = 0;
            for file in &args.files {
                let body = fs::read_to_string(file)
                    .map_err(|e| format!("Cannot read {}: {}", file.display(), e))?;
                let request = ImportRequest::text(file_name(file), body).base64(args.base64);
                let handled = handler.handle(UiMessage::Import(request)).await?;

                if let Some(notification) = &handled.notification {
                    eprintln!("{notification}");
                }
                if matches!(handled.reply, PluginMessage::ImportFailed(_)) {
                    failures += 1;
                }
                println!("{}", serde_json::to_string_pretty(&handled.reply)?);
            }
            // Writes acknowledged before a failure are kept.
            save_store(&store, &store_path)?;
            if failures > 0 {
                return Err(format!("{failures} of {} imports failed", args.files.len()).into());
            }
        }
        Command::Export(args) => {
            let selections = args
                .collection
                .map(|id| {
                    vec![ExportSelection {
                        collection_id: CollectionId::from(id),
                        mode_ids: args.mode.into_iter().map(ModeId::from).collect(),
                    }]
                })
                .unwrap_or_default();
            let handled = handler
                .handle(UiMessage::Export {
                    selections: Some(selections),
                })
                .await?;

            if let PluginMessage::ExportResult { files } = handled.reply {
                fs::create_dir_all(&args.out)?;
                for file in files {
                    let path = args.out.join(&file.file_name);
                    fs::write(&path, serde_json::to_string_pretty(&file.body)?)?;
                    println!("{}", path.display());
                }
            }
        }
        Command::Collections => {
            let handled = handler.handle(UiMessage::GetCollections).await?;
            println!("{}", serde_json::to_string_pretty(&handled.reply)?);
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
