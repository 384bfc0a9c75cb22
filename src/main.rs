mod cli;

use clap::{Parser, Subcommand};
use cli::app::Shell;
use cli::scenarios::Scenario;
use rustmemkv::{DatabaseConfig, IsolationLevel};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rustmemkv", version, about = "In-memory MVCC key-value engine")]
struct Cli {
    /// Log engine decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the isolation level walkthroughs
    Demo {
        #[arg(long, value_enum, default_value_t = Scenario::All)]
        scenario: Scenario,
    },
    /// Read `<session> <command> [args..]` lines from stdin
    Shell {
        #[arg(long, default_value = "read-committed")]
        isolation: IsolationLevel,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Mode::Demo { scenario } => {
            for report in scenario.run()? {
                println!("{}", report);
            }
        }
        Mode::Shell { isolation } => {
            let config = DatabaseConfig::default().isolation_level(isolation);
            let mut shell = Shell::new(config)?;
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            shell.run(stdin.lock(), stdout.lock())?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
