pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod services;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::commands::{cmd_init, cmd_search};
use cli::{Cli, Commands};
pub use config::Config;

pub async fn run(config: Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Search(args)) => {
            config.validate()?;
            info!(event = "cli_search", terms = ?args.terms, pages = args.pages);
            cmd_search(&config, &args).await
        }
        Some(Commands::Init) => cmd_init(),
        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Cardgrid - Trading card image search");
    println!();
    println!("USAGE:");
    println!("  cardgrid <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  search <terms>    Search cards (comma-separate several names)");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("SEARCH OPTIONS:");
    println!("  --cameo --trainer             Match cameo / trainer cards");
    println!("  --illustrator                 Search by illustrator");
    println!("  --set                         List a whole set in collector order");
    println!("  --descending                  Reverse the sort order");
    println!("  --pages <n>                   Number of pages to load (default: 1)");
    println!("  --json                        Print results as JSON");
    println!();
    println!("EXAMPLES:");
    println!("  cardgrid search \"Pikachu, Blastoise\"");
    println!("  cardgrid search base set --set --pages 5");
}
