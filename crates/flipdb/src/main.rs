mod commands;
mod context;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flipdb")]
#[command(
    about = "Blue-green deployment for RDS instances behind a DNSimple record",
    long_about = None
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the descriptor for a new deployment
    New(commands::new::NewArgs),
    /// Restore the idle instance from the source and switch DNS to it
    Deploy {
        /// Deployment name
        name: String,
    },
    /// Switch DNS back to the previous instance
    Rollback {
        /// Deployment name
        name: String,
    },
    /// Print the stored descriptor with secrets masked
    Show {
        /// Deployment name
        name: String,
    },
    /// Delete the idle instance of a deployment
    Retire {
        /// Deployment name
        name: String,
        /// Actually delete; without it only the plan is printed
        #[arg(short, long)]
        yes: bool,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Version => {
            println!("flipdb {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::New(args) => {
            commands::new::handle(args).await?;
        }
        Commands::Deploy { name } => {
            commands::deploy::handle(&name, false).await?;
        }
        Commands::Rollback { name } => {
            commands::deploy::handle(&name, true).await?;
        }
        Commands::Show { name } => {
            commands::show::handle(&name).await?;
        }
        Commands::Retire { name, yes } => {
            commands::retire::handle(&name, yes).await?;
        }
    }

    Ok(())
}
