use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabsql::config::Config;
use tabsql::integration::Engine;
use tabsql::server::Server;

/// Flat-file SQL engine with an interactive shell and a TCP server.
#[derive(Parser, Debug)]
#[command(name = "tabsql", version, about)]
struct Args {
    /// JSON configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the databases
    #[arg(short = 'd', long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Address to listen on with --serve
    #[arg(short = 'l', long, value_name = "ADDR")]
    listen: Option<String>,

    /// Serve TCP clients instead of reading statements from stdin
    #[arg(long)]
    serve: bool,

    /// Log filter directive (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config);

    let engine = Engine::open(&config.data_dir)
        .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;

    if args.serve {
        let mut server = Server::bind(config.listen_addr.as_str(), engine)
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;
        server.run().context("server stopped")?;
        return Ok(());
    }
    repl(engine)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).context("failed to load config file")?,
        None => Config::default(),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(addr) = &args.listen {
        config.listen_addr = addr.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_filter = level.clone();
    }
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn repl(mut engine: Engine) -> Result<()> {
    info!(data_dir = %engine.storage().root().display(), "interactive shell started");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("sql> ");
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        println!("{}", engine.handle_command(query));
    }
    Ok(())
}
