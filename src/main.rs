mod cli;

use vidshelf::{
    config,
    manifest::ManifestStore,
    scanner::{sync_library, Scanner},
    server,
};
use vidshelf_av::ToolRegistry;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use cli::{Cli, Commands};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting vidshelf server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

async fn scan(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);

    let store = ManifestStore::open(&config.library.manifest_path).with_context(|| {
        format!(
            "Failed to load manifest {}",
            config.library.manifest_path.display()
        )
    })?;
    let store = Arc::new(store);
    let scanner = Scanner::new(config.library.clone(), &tools);
    let summary = sync_library(&store, &scanner).await?;

    println!("Videos found: {}", summary.found);
    println!("  Added: {}", summary.added);
    println!("  Removed: {}", summary.removed);
    println!("  Codecs probed: {}", summary.probed);
    println!("  Thumbnails created: {}", summary.thumbnails_created);
    if summary.thumbnails_failed > 0 {
        println!("  Thumbnails failed: {}", summary.thumbnails_failed);
    }
    println!("Manifest: {}", store.path().display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidshelf=trace,vidshelf_av=trace,vidshelf_common=debug,tower_http=debug".to_string()
        } else {
            "vidshelf=debug,vidshelf_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Scan => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan(cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidshelf {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Transcoding, thumbnails and codec probing need ffmpeg and ffprobe.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Manifest: {}", config.library.manifest_path.display());
    println!("  Library roots: {}", config.library.roots.len());
    println!("  Native codec: {}", config.delivery.native_codec);
    match &config.transcode.program {
        Some(program) => println!("  Transcoder: {}", program.display()),
        None => println!("  Transcoder: ffmpeg (discovered)"),
    }

    Ok(())
}
