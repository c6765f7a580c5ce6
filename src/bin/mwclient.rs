//! Command-line client for the MediaWiki Action API
//!
//! Logs in when credentials are configured, runs one command and prints the
//! result to stdout. Errors go to stderr with exit status 1.
//!
//! # Usage
//!
//! ```bash
//! MEDIAWIKI_URL=https://wiki.example.org/w/api.php mwclient page "Main Page"
//! mwclient --config bot.toml edit --title Sandbox --text "Hello" --summary test
//! ```

use clap::Parser;
use mediawiki_client::cli::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run(Cli::parse()).await
}
