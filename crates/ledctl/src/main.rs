//! ledctl — toggle keyboard indicator LEDs from the command line.
//!
//! Commands are `+` or `-` followed by `scroll`, `num`, `caps` or `all`,
//! given after `--` or read from stdin with `-i`.

use clap::{CommandFactory, Parser};

use ledctl_lib::source::CommandSource;

mod cli;

const COMMANDS_HELP: &str = "\
Commands start with '+' (turn on) or '-' (turn off), followed by the LED name:
scroll, num, caps or all.

Examples:
  ledctl -S -- +caps -num
  echo '+scroll -all' | ledctl -S -i
  ledctl -Q --json";

#[derive(Parser)]
#[command(
    name = "ledctl",
    version,
    about = "Controls keyboard LEDs",
    after_help = COMMANDS_HELP
)]
struct Args {
    /// Set LED status
    #[arg(short = 'S', long = "set", required_unless_present = "query")]
    set: bool,

    /// Read commands from stdin
    #[arg(short = 'i', long = "stdin", requires = "set")]
    interactive: bool,

    /// Show the current LED state
    #[arg(short = 'Q', long, conflicts_with = "set")]
    query: bool,

    #[command(flatten)]
    backend: cli::BackendArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// LED commands, after `--`
    #[arg(
        last = true,
        value_name = "COMMAND",
        requires = "set",
        conflicts_with = "interactive"
    )]
    commands: Vec<String>,
}

impl Args {
    /// Split into the requested mode and the backend selection.
    fn into_mode(self) -> (cli::Mode, cli::BackendArgs) {
        let mode = if self.query {
            cli::Mode::Query
        } else if self.interactive {
            cli::Mode::Set(CommandSource::stdin())
        } else {
            cli::Mode::Set(CommandSource::Batch(self.commands))
        };
        (mode, self.backend)
    }
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if args.set && !args.interactive && args.commands.is_empty() {
        Args::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "-S needs commands after `--`, or -i to read them from stdin",
            )
            .exit();
    }

    log::debug!(
        "backend {:?} on {}",
        args.backend.backend,
        args.backend.target()
    );

    let json = args.json;
    let (mode, backend) = args.into_mode();
    if let Err(e) = cli::run(mode, &backend, json) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
