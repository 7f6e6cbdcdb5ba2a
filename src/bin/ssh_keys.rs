// List, add or remove the SSH keys of a Scaleway account.
// The token comes from `SCW_TOKEN`; it is read once here and handed to the
// client explicitly.

use clap::Parser;
use scw_snippets::account::{read_public_key, run_keys, KeyEdit};
use scw_snippets::config::{Config, Token};
use scw_snippets::{logging, ui, ApiClient};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scw-ssh-keys")]
#[command(version, about = "List, add or remove the SSH keys of a Scaleway account", long_about = None)]
struct Cli {
    /// List SSH key fingerprints (after any add/remove)
    #[arg(short, long)]
    list: bool,

    /// Add the public key stored in FILE
    #[arg(short, long, value_name = "FILE")]
    add: Option<PathBuf>,

    /// Remove every key whose fingerprint contains this text
    #[arg(short, long, value_name = "FINGERPRINT")]
    remove: Option<String>,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    ui::exit_on_setup_error(run(cli))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let token = Token::from_env()?;
    let config = Config::from_env()?;
    let new_key = cli.add.as_deref().map(read_public_key).transpose()?;
    let edit = KeyEdit::new(new_key, cli.remove);

    let client = ApiClient::from_config(config)?.with_token(token);
    run_keys(&client, &edit, cli.list, &mut std::io::stdout().lock())?;
    Ok(())
}
