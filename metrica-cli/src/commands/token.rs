//! Token command - manage the cached token.

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use metrica_fetch::{AuthorizationFlow, PresetFlow};
use metrica_store::CredentialStore;

use super::{context_builder, load_settings};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Characters of the token shown by `token show` without `--reveal`.
const VISIBLE_PREFIX: usize = 6;

/// Arguments for the token command.
#[derive(Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub action: TokenAction,
}

/// Token subcommands.
#[derive(Subcommand)]
pub enum TokenAction {
    /// Authorize again, replacing any cached token.
    Login {
        /// Token to store without opening the browser.
        #[arg(long)]
        code: Option<String>,

        /// Save the token given with --code.
        #[arg(long, requires = "code")]
        save: bool,
    },

    /// Show the cached token.
    Show {
        /// Print the whole token.
        #[arg(long)]
        reveal: bool,
    },

    /// Remove the cached token.
    Logout,
}

/// Runs the token command.
pub async fn run(args: &TokenArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        TokenAction::Login { code, save } => login(code.as_deref(), *save, cli).await,
        TokenAction::Show { reveal } => show(*reveal, cli).await,
        TokenAction::Logout => logout(cli).await,
    }
}

async fn login(code: Option<&str>, save: bool, cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await?;

    let flow = code.map(|c| Arc::new(PresetFlow::new(c.trim(), save)) as Arc<dyn AuthorizationFlow>);
    let ctx = context_builder(&settings, flow).build()?;

    let token = ctx.auth.login(&settings.token_path).await?;
    let stored = ctx.auth.store().load(&settings.token_path).await?;
    let stored = stored.as_deref() == Some(token.as_str());

    if !cli.quiet {
        if stored {
            println!("Token saved ({} chars)", token.chars().count());
        } else {
            println!("Token obtained but not saved");
        }
    }
    Ok(())
}

async fn show(reveal: bool, cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await?;
    let ctx = context_builder(&settings, None).build()?;
    let store = ctx.auth.store();

    let token = store.load(&settings.token_path).await?;
    let display = token.as_deref().map(|t| if reveal { t.to_string() } else { mask(t) });

    match cli.format {
        OutputFormat::Csv => match display {
            Some(t) => println!("{t}"),
            None => println!("No token cached at {}", settings.token_path.display()),
        },
        OutputFormat::Json => {
            let value = serde_json::json!({
                "backend": store.backend(),
                "path": settings.token_path.display().to_string(),
                "token": display,
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&value)?);
        }
    }
    Ok(())
}

async fn logout(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli).await?;
    let ctx = context_builder(&settings, None).build()?;

    ctx.auth.forget(&settings.token_path).await?;
    if !cli.quiet {
        println!("Token removed");
    }
    Ok(())
}

/// Hides all but the first few characters of a token.
fn mask(token: &str) -> String {
    let total = token.chars().count();
    if total <= VISIBLE_PREFIX * 2 {
        return "*".repeat(total);
    }
    let prefix: String = token.chars().take(VISIBLE_PREFIX).collect();
    format!("{prefix}... ({total} chars)")
}
