// List the servers of one Scaleway compute region, following pagination.

use clap::Parser;
use scw_snippets::config::{Config, Region, Token};
use scw_snippets::instances::list_all;
use scw_snippets::{logging, ui, ApiClient};
use tracing::info;

#[derive(Parser)]
#[command(name = "scw-list-instances")]
#[command(version, about = "List the servers of a Scaleway compute region", long_about = None)]
struct Cli {
    /// Region to list servers from
    #[arg(short, long, value_enum)]
    region: Region,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    ui::exit_on_setup_error(run(cli))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let token = Token::from_env()?;
    let config = Config::from_env()?;
    let client = ApiClient::from_config(config)?.with_token(token);

    let servers = list_all(&client, cli.region)?;
    let count = ui::write_instances(&mut std::io::stdout().lock(), servers)?;
    info!(count, region = %cli.region, "listed servers");
    Ok(())
}
