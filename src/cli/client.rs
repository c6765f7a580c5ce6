//! Client mode CLI logic
//!
//! Parses `mwclient` arguments, builds a session from the layered
//! configuration and runs one command against the wiki.

use crate::{
    SessionManager, Settings,
    config::ConfigLoader,
    session::TokenKind,
    types::Envelope,
    utils::version,
};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line client for the MediaWiki Action API
#[derive(Parser, Debug)]
#[command(name = "mwclient", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// API endpoint, overriding configuration and environment
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch an action token
    Token {
        /// csrf, login, patrol, rollback, userrights, watch, ...
        kind: TokenKind,
    },
    /// Print the content of the latest revision of a page
    Page { title: String },
    /// Replace the text of a page
    Edit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        minor: bool,
    },
    /// Delete a page
    Delete {
        #[arg(long)]
        title: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Rename a page
    Move {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Print site information as JSON
    Siteinfo {
        /// general, namespaces, statistics, usergroups, ...
        #[arg(long, value_delimiter = ',', default_value = "general")]
        prop: Vec<String>,
    },
    /// List every member of a category, one title per line
    Members { category: String },
}

/// Load settings with the CLI's overrides applied last
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = ConfigLoader::new().load_or_default_path(cli.config.as_deref())?;

    if let Some(endpoint) = &cli.endpoint {
        settings.api.endpoint = endpoint.clone();
    }
    if cli.verbose {
        settings.logging.verbose = true;
    }

    settings.validate()?;
    Ok(settings)
}

/// Install the stderr subscriber
pub fn init_logging(settings: &Settings) {
    let default_level = if settings.logging.verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Run one command and print its result to stdout
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    init_logging(&settings);

    debug!("mwclient v{} using {}", version::get_version(), settings.api.endpoint);

    let credentials = settings.credentials();
    let login_mode = settings.session.login_mode;
    let session = SessionManager::new(settings)?;

    if let Some(credentials) = credentials {
        info!("Logging in as {}", credentials.username());
        session
            .login(credentials, login_mode)
            .await
            .context("login failed")?;
    }

    let output = execute(&session, cli.command).await?;
    println!("{}", output);
    Ok(())
}

/// Execute `command` on `session`, returning what should be printed
pub async fn execute(session: &SessionManager, command: Command) -> Result<String> {
    match command {
        Command::Token { kind } => {
            session.ensure_alive().await?;
            Ok(session.get_token(kind).await?)
        }
        Command::Page { title } => {
            let response = session
                .revisions()
                .titles([title.as_str()])
                .prop(["content"])
                .redirects(true)
                .send()
                .await?;
            match response.content(&title) {
                Some(content) => Ok(content.to_string()),
                None => bail!("page {:?} not found: {}", title, response.raw),
            }
        }
        Command::Edit {
            title,
            text,
            summary,
            minor,
        } => {
            let mut edit = session.edit().title(title).text(text).minor(minor);
            if let Some(summary) = summary {
                edit = edit.summary(summary);
            }
            Ok(edit.send().await?.raw)
        }
        Command::Delete { title, reason } => {
            let mut delete = session.delete().title(title);
            if let Some(reason) = reason {
                delete = delete.reason(reason);
            }
            Ok(delete.send().await?.raw)
        }
        Command::Move { from, to, reason } => {
            let mut moving = session.move_page().from(from).to(to);
            if let Some(reason) = reason {
                moving = moving.reason(reason);
            }
            Ok(moving.send().await?.raw)
        }
        Command::Siteinfo { prop } => Ok(session.siteinfo().prop(prop).send().await?.raw),
        Command::Members { category } => {
            let mut titles = Vec::new();
            let mut next = None;
            loop {
                let mut request = session.categorymembers().title(category.as_str()).limit_max();
                if let Some(next) = &next {
                    request = request.continue_with(next);
                }
                let response = request.send().await?;
                titles.extend(response.members().iter().map(|m| m.title.clone()));
                match response.continuation() {
                    Some(more) => next = Some(more.clone()),
                    None => break,
                }
            }
            debug!("{} has {} members", category, titles.len());
            Ok(titles.join("\n"))
        }
    }
}
