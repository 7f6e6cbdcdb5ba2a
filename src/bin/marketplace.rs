// Find public marketplace images and print the local image identifiers to
// use when creating a server. No token needed.

use clap::Parser;
use scw_snippets::config::{Arch, Config};
use scw_snippets::marketplace::{list_images, NameFilter};
use scw_snippets::{logging, ui, ApiClient};
use tracing::info;

#[derive(Parser)]
#[command(name = "scw-marketplace")]
#[command(version, about = "Look up the identifiers of Scaleway marketplace images", long_about = None)]
struct Cli {
    /// Architecture of the local images to show
    #[arg(long, value_enum, default_value_t = Arch::X86_64)]
    arch: Arch,

    /// Case-insensitive pattern matched against image names
    #[arg(long, default_value = "")]
    name: String,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    ui::exit_on_setup_error(run(cli))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let filter = NameFilter::new(&cli.name)?;
    let config = Config::from_env()?;
    let client = ApiClient::from_config(config)?;

    let images = list_images(&client, cli.arch, filter)?;
    let count = ui::write_images(&mut std::io::stdout().lock(), images, cli.arch)?;
    info!(count, arch = %cli.arch, "listed images");
    Ok(())
}
