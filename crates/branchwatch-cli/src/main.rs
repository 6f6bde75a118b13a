mod cmd_check;
mod cmd_in;

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use branchwatch_core::ResourceInput;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "branchwatch",
    version,
    about = "Track Bitbucket Server branches and pull requests as a Concourse resource"
)]
struct Cli {
    /// HTTP timeout for each request to the server, in seconds
    #[arg(
        long,
        global = true,
        env = "BRANCHWATCH_HTTP_TIMEOUT",
        default_value_t = 30
    )]
    timeout_secs: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read {source, version} on stdin and print the new versions
    Check,
    /// Read {source, version} on stdin and materialize the version into DEST
    #[command(name = "in", alias = "get")]
    In {
        /// Destination directory for the working copy
        dest: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let input = read_input()?;
    let output = match cli.cmd {
        Command::Check => {
            cmd_check::execute(&input, Duration::from_secs(cli.timeout_secs))?
        }
        Command::In { dest } => cmd_in::execute(&input, &dest)?,
    };
    println!("{output}");
    Ok(())
}

/// Logs go to stderr; stdout carries the protocol JSON only.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("BRANCHWATCH_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input() -> anyhow::Result<ResourceInput> {
    let mut stdin_buf = String::new();
    std::io::stdin()
        .read_to_string(&mut stdin_buf)
        .context("reading resource input from stdin")?;
    if stdin_buf.trim().is_empty() {
        anyhow::bail!("no input received on stdin");
    }
    ResourceInput::from_json(&stdin_buf).context("parsing resource input")
}
