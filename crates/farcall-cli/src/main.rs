//! # farcall CLI Entry Point
//!
//! Thin binary around the farcall server and client crates.
//!
//! ## Usage
//!
//! ```bash
//! # Start a server exposing the demo procedures
//! farcall serve -b 127.0.0.1:4444
//!
//! # Make a call (raw JSON on stdout, pipeable to jq)
//! farcall call 127.0.0.1:4444 add 2 3
//!
//! # List the server's procedures with their documentation
//! farcall procedures 127.0.0.1:4444
//! ```
//!
//! `call` and `procedures` never initialize tracing so their stdout stays
//! clean for unix pipelines; `serve` logs to stdout or, with `--log-file`,
//! appends to the given file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use serde_json::{json, Value};

use farcall_client::RpcClient;
use farcall_server::{Registry, Server, ServerConfig};

#[derive(FromArgs)]
/// farcall - minimal introspectable RPC over TCP
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available subcommands: serve a demo registry, make one call, or list a
/// server's procedures.
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
    Procedures(ProceduresArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start a farcall server with the demo procedures
struct ServeArgs {
    /// address to bind to
    #[argh(option, short = 'b', default = "\"127.0.0.1:4444\".into()")]
    bind: String,

    /// number of accept workers
    #[argh(option, short = 'w', default = "farcall_server::server::DEFAULT_WORKERS")]
    workers: usize,

    /// listen backlog
    #[argh(option, default = "farcall_server::server::DEFAULT_BACKLOG")]
    backlog: i32,

    /// per-connection timeout in seconds
    #[argh(option, short = 't', default = "30")]
    timeout_secs: u64,

    /// log file to append to instead of stdout
    #[argh(option, short = 'l')]
    log_file: Option<PathBuf>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// invoke a remote procedure and print the raw JSON result
struct CallArgs {
    /// server address, e.g. 127.0.0.1:4444
    #[argh(positional)]
    addr: String,

    /// procedure name
    #[argh(positional)]
    procedure: String,

    /// positional arguments; each is parsed as JSON, falling back to a
    /// bare string
    #[argh(positional)]
    args: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "procedures")]
/// list the server's procedures with signatures and documentation
struct ProceduresArgs {
    /// server address, e.g. 127.0.0.1:4444
    #[argh(positional)]
    addr: String,
}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        Commands::Serve(args) => serve(args),
        Commands::Call(args) => call(args),
        Commands::Procedures(args) => procedures(args),
    }
}

fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.log_file.as_deref())?;

    let config = ServerConfig {
        bind_addr: args.bind,
        workers: args.workers,
        backlog: args.backlog,
        timeout: Duration::from_secs(args.timeout_secs),
        ..ServerConfig::default()
    };

    let handle = Server::new(demo_registry(), config).serve()?;
    tracing::info!("serving on {}", handle.local_addr());
    handle.wait();
    Ok(())
}

fn call(args: CallArgs) -> Result<()> {
    let client = RpcClient::connect(args.addr.as_str())
        .with_context(|| format!("connecting to {}", args.addr))?;

    let call_args = args.args.iter().map(|raw| parse_arg(raw)).collect();
    let result = client.call(&args.procedure, call_args)?;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn procedures(args: ProceduresArgs) -> Result<()> {
    let client = RpcClient::connect(args.addr.as_str())
        .with_context(|| format!("connecting to {}", args.addr))?;

    println!("{}", client.procedures_help());
    Ok(())
}

/// Arguments are JSON when they parse as JSON, bare strings otherwise, so
/// `farcall call .. greet world` and `farcall call .. add 2 3` both read
/// naturally.
fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `INFO` by default, `RUST_LOG` to override; with `--log-file` every event
/// is appended there instead of stdout.
fn init_tracing(log_file: Option<&std::path::Path>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_writer(Arc::new(file)).with_ansi(false).init();
        }
        None => builder.init(),
    }
    Ok(())
}

/// The procedures exposed by `farcall serve`.
fn demo_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register("add", &["x", "y"], Some("Add two numbers."), |args| {
        // Integer inputs stay integers on the wire; anything else goes
        // through f64.
        let ints = (
            args.first().and_then(Value::as_i64),
            args.get(1).and_then(Value::as_i64),
        );
        if let (Some(x), Some(y)) = ints {
            return Ok(json!(x + y));
        }
        let x = number(args, 0)?;
        let y = number(args, 1)?;
        Ok(json!(x + y))
    });

    registry.register(
        "greet",
        &["name"],
        Some("Greet someone by name."),
        |args| {
            let name = args
                .first()
                .and_then(Value::as_str)
                .unwrap_or("world");
            Ok(json!(format!("hello, {}", name)))
        },
    );

    registry.register("echo", &["value"], None, |args| {
        Ok(args.first().cloned().unwrap_or(Value::Null))
    });

    registry
}

fn number(args: &[Value], index: usize) -> Result<f64> {
    args.get(index)
        .and_then(Value::as_f64)
        .with_context(|| format!("argument {} must be a number", index))
}
