//! CLI entry point for `emlvfs`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use emlvfs::config::Config;
use emlvfs::vfs::{
    index_name, ContainerKind, EmailFileSystem, FileSystemProvider, FileType, LocalWorkspace,
    VirtualUri, Workspace,
};

#[derive(Parser)]
#[command(
    name = "emlvfs",
    version,
    about = "Browse .eml files as read-only virtual directories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root directory (defaults to the current directory)
    #[arg(short, long, global = true, value_name = "DIR", env = "EMLVFS_ROOT")]
    root: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show metadata of a virtual entry
    Stat {
        uri: String,
        #[arg(long)]
        json: bool,
    },
    /// List a container's virtual directory
    Ls {
        uri: String,
        #[arg(long)]
        json: bool,
    },
    /// Write a virtual file's bytes to stdout
    Cat { uri: String },
    /// Print the preview URI of an email file in the workspace root
    Open { path: PathBuf },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = emlvfs::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Stat { uri, json } => {
            let fs = EmailFileSystem::new(open_workspace(cli.root)?, &config);
            cmd_stat(&fs, &uri, json).await
        }
        Commands::Ls { uri, json } => {
            let fs = EmailFileSystem::new(open_workspace(cli.root)?, &config);
            cmd_ls(&fs, &uri, json).await
        }
        Commands::Cat { uri } => {
            let fs = EmailFileSystem::new(open_workspace(cli.root)?, &config);
            cmd_cat(&fs, &uri).await
        }
        Commands::Open { path } => {
            let workspace = open_workspace(cli.root)?;
            cmd_open(workspace.as_ref(), &config, &path)
        }
        Commands::Config { init } => cmd_config(&config, init),
    }
}

/// The workspace rooted at `root`, or at the current directory.
fn open_workspace(root: Option<PathBuf>) -> anyhow::Result<Arc<dyn Workspace>> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let root = std::fs::canonicalize(&root)
        .map_err(|e| anyhow::anyhow!("Cannot open workspace '{}': {e}", root.display()))?;
    Ok(Arc::new(LocalWorkspace::new(root)))
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_path = emlvfs::config::log_file_path(config);
    let log_dir = emlvfs::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_name = log_path
            .file_name()
            .unwrap_or(std::ffi::OsStr::new("emlvfs.log"));
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

async fn cmd_stat(fs: &EmailFileSystem, uri: &str, json: bool) -> anyhow::Result<()> {
    let uri = VirtualUri::parse(uri)?;
    let stat = fs.stat(&uri).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stat)?);
        return Ok(());
    }

    let kind = match stat.file_type {
        FileType::Directory => "directory",
        FileType::File => "file",
        FileType::Unknown => "unknown",
    };
    println!("  Type:     {kind}");
    println!(
        "  Size:     {} ({} bytes)",
        humansize::format_size(stat.size, humansize::BINARY),
        stat.size
    );
    println!("  Created:  {}", stat.ctime.format("%Y-%m-%d %H:%M:%S"));
    println!("  Modified: {}", stat.mtime.format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}

async fn cmd_ls(fs: &EmailFileSystem, uri: &str, json: bool) -> anyhow::Result<()> {
    let uri = VirtualUri::parse(uri)?;
    let entries = fs.read_directory(&uri).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("  No entries.");
        return Ok(());
    }

    for entry in &entries {
        let stat = fs.stat(&uri.join(&entry.name)).await;
        println!(
            "  {:>10}  {}",
            humansize::format_size(stat.size, humansize::BINARY),
            entry.name
        );
    }
    Ok(())
}

async fn cmd_cat(fs: &EmailFileSystem, uri: &str) -> anyhow::Result<()> {
    let uri = VirtualUri::parse(uri)?;
    let bytes = fs.read_file(&uri).await?;
    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&bytes).and_then(|()| stdout.flush()) {
        Ok(()) => Ok(()),
        // Piped into `head` and the like
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Print the URI an editor would open to preview `path`.
fn cmd_open(workspace: &dyn Workspace, config: &Config, path: &Path) -> anyhow::Result<()> {
    let path = std::fs::canonicalize(path)
        .map_err(|e| anyhow::anyhow!("Cannot open '{}': {e}", path.display()))?;

    let kind = ContainerKind::from_path(&path)
        .ok_or_else(|| anyhow::anyhow!("Not an email file: {}", path.display()))?;
    if kind != ContainerKind::Eml {
        anyhow::bail!("Only .eml files can be previewed: {}", path.display());
    }

    let root = workspace
        .root()
        .ok_or_else(|| anyhow::anyhow!("No workspace root"))?;
    if path.parent() != Some(root.as_path()) {
        anyhow::bail!(
            "Email files must be directly inside the workspace root '{}'",
            root.display()
        );
    }

    let container = VirtualUri::new(
        config.filesystem.eml_scheme.as_str(),
        &workspace.as_relative_path(&path),
    );
    println!("{}", container.join(&index_name(&path)));
    Ok(())
}

fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    if init {
        emlvfs::config::save_config(config)?;
    }
    match emlvfs::config::config_file_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file location"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
