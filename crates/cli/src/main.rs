use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use flowsh_rpc::{GatewaySession, ShellConfig, default_config_path};
use flowsh_shell::{AnsiOutput, ShellOutput, VERBS, dispatch, lex_line};
use tokio::io::AsyncBufReadExt;

/// Manage flows on a remote node through its RPC gateway.
#[derive(Debug, Parser)]
#[command(name = "flowsh", version, about)]
struct Cli {
    /// Gateway address as host:port, or a full URL.
    #[arg(long, env = "FLOWSH_ADDR")]
    addr: Option<String>,

    /// Gateway user for basic authentication.
    #[arg(long, env = "FLOWSH_USER")]
    user: Option<String>,

    /// Gateway password for basic authentication.
    #[arg(long, env = "FLOWSH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Allow plain HTTP for non-localhost gateways.
    #[arg(long)]
    insecure: bool,

    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Flow command to run one-shot; omit it for the interactive prompt.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let session = GatewaySession::new(config);
    let mut out = AnsiOutput::stdout();

    // One-shot => dispatch and exit with the transport error, if any
    if let Some((verb, args)) = cli.command.split_first() {
        let gateway = session.ops().await?;
        return dispatch(gateway, &mut out, verb, args).await;
    }

    run_interactive(&session, &mut out).await
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Resolve session settings: config file first, then flags and environment
/// on top. A file named with `--config` must load; the default file is
/// optional.
fn resolve_config(cli: &Cli) -> Result<ShellConfig> {
    let mut config = match &cli.config {
        Some(path) => ShellConfig::load_file(path)?,
        None => {
            let path = default_config_path();
            if path.exists() {
                ShellConfig::load_file(&path)?
            } else {
                ShellConfig::default()
            }
        }
    };
    if let Some(addr) = &cli.addr {
        config.address = addr.clone();
    }
    if let Some(user) = &cli.user {
        config.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.password = password.clone();
    }
    if cli.insecure {
        config.insecure = true;
    }
    Ok(config)
}

async fn run_interactive(session: &GatewaySession, out: &mut AnsiOutput<io::Stdout>) -> Result<()> {
    out.line("Flow shell. Type 'help' for commands, 'quit' to leave.");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let tokens = lex_line(&line);
        let Some((verb, args)) = tokens.split_first() else {
            continue;
        };
        match verb.as_str() {
            "quit" | "exit" => break,
            "help" => print_help(out),
            _ => {
                // Session errors and transport errors end the command, not
                // the shell.
                let gateway = match session.ops().await {
                    Ok(gateway) => gateway,
                    Err(e) => {
                        out.failure(&format!("{e:#}"));
                        continue;
                    }
                };
                if let Err(e) = dispatch(gateway, out, verb, args).await {
                    out.failure(&format!("{e:#}"));
                }
            }
        }
    }
    Ok(())
}

fn prompt() -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "flow> ")?;
    stdout.flush()?;
    Ok(())
}

fn print_help(out: &mut dyn ShellOutput) {
    out.line("Available commands:");
    for spec in VERBS {
        out.line(&format!("  {}", spec.usage));
    }
    out.line("  help - show this list");
    out.line("  quit - leave the shell");
}
