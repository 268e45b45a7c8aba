use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use maskdeck::editor::DetailEditor;
use maskdeck::embed::embed_snippet;
use maskdeck::gateway::HttpGateway;
use maskdeck::model::{MaskId, UserId};
use maskdeck::preview::{DEFAULT_POLL_INTERVAL, PreviewLoop, PreviewState};
use maskdeck::roster::MaskRoster;
use maskdeck::session::SessionContext;

#[derive(Parser)]
#[command(name = "maskdeck")]
#[command(about = "Mask workbench client", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    server: String,

    /// Acting user id (exact string form)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List masks
    List {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a mask
    Create { name: String },

    /// Rename a mask
    Rename { id: String, name: String },

    /// Delete a mask
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show a mask's detail record
    Describe {
        id: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or update a mask through the detail editor
    Save {
        /// Mask id to update (omit to create)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Source URL (repeatable, order preserved)
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Credential key (repeatable, order preserved)
        #[arg(long = "key")]
        keys: Vec<String>,
    },

    /// Poll the rendering preview for a mask
    Preview {
        id: String,

        /// Poll once and exit instead of waiting for a render
        #[arg(long)]
        once: bool,

        /// Keep polling after the first render
        #[arg(long)]
        watch: bool,
    },

    /// Print the embed snippet for a mask
    Embed {
        id: String,

        /// Display title for the iframe
        #[arg(long)]
        title: Option<String>,
    },

    /// Resolve the acting user's profile
    Whoami,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let gateway = Arc::new(HttpGateway::new(&cli.server).context("build gateway")?);
    let session = match &cli.user {
        Some(id) => SessionContext::for_user(UserId(id.clone())),
        None => SessionContext::anonymous(),
    };

    match cli.command {
        Commands::List { json } => {
            let roster = MaskRoster::new(gateway, session);
            roster.refresh().context("list masks")?;
            let rows = roster.store().list();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&rows).context("serialize masks")?
                );
            } else if rows.is_empty() {
                println!("No masks found");
            } else {
                for row in rows {
                    println!("{} {}", row.id, row.mask_name);
                }
            }
        }

        Commands::Create { name } => {
            let roster = MaskRoster::new(gateway, session);
            let created = roster.create(&name).context("create mask")?;
            println!("{}", created.id);
        }

        Commands::Rename { id, name } => {
            let roster = MaskRoster::new(gateway, session);
            roster.refresh().context("list masks")?;
            roster
                .rename(&MaskId(id), &name)
                .context("rename mask")?;
            println!("Renamed");
        }

        Commands::Delete { id, yes } => {
            if !yes && !confirm_delete(&id)? {
                println!("Aborted");
                return Ok(());
            }
            let roster = MaskRoster::new(gateway, session);
            roster.refresh().context("list masks")?;
            roster.delete(&MaskId(id.clone())).context("delete mask")?;
            println!("Deleted {}", id);
        }

        Commands::Describe { id, json } => {
            let editor = DetailEditor::load(gateway, session, MaskId(id))
                .context("load mask detail")?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "title": editor.title(),
                        "description": editor.description(),
                        "site_url": editor.source_urls(),
                    })
                );
            } else {
                println!("title: {}", editor.title());
                if !editor.description().is_empty() {
                    println!("description: {}", editor.description());
                }
                for url in editor.source_urls() {
                    println!("url: {}", url);
                }
            }
        }

        Commands::Save {
            id,
            title,
            description,
            urls,
            keys,
        } => {
            let mut editor = match id {
                Some(id) => DetailEditor::load(gateway, session, MaskId(id))
                    .context("load mask detail")?,
                None => DetailEditor::create(gateway, session),
            };
            editor.set_title(title);
            editor.set_description(description);
            for url in urls {
                editor.stage_url(url);
                editor.add_url().context("add source URL")?;
            }
            for key in keys {
                editor.stage_key(key);
                editor.add_key().context("add credential key")?;
            }
            match editor.save().context("save mask")? {
                maskdeck::editor::SaveOutcome::Created(mask) => println!("{}", mask.id),
                maskdeck::editor::SaveOutcome::Updated => println!("Saved"),
            }
        }

        Commands::Preview { id, once, watch } => {
            let mut preview =
                PreviewLoop::start(gateway, MaskId(id), DEFAULT_POLL_INTERVAL);
            let mut last_shown = PreviewState::Idle;
            loop {
                preview.pump();
                let state = preview.state().clone();
                if state != last_shown {
                    match &state {
                        PreviewState::Polling => println!("polling..."),
                        PreviewState::NotReady => println!("still processing"),
                        PreviewState::Ready => {
                            println!("{}", preview.html().unwrap_or_default());
                            if !watch {
                                preview.stop();
                                return Ok(());
                            }
                        }
                        PreviewState::Error(message) => println!("error: {}", message),
                        PreviewState::Idle => {}
                    }
                    last_shown = state;
                }
                if once && !matches!(last_shown, PreviewState::Polling | PreviewState::Idle) {
                    preview.stop();
                    return Ok(());
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }

        Commands::Embed { id, title } => {
            println!(
                "{}",
                embed_snippet(&cli.server, &MaskId(id), title.as_deref())
            );
        }

        Commands::Whoami => {
            let profile = session
                .resolve_profile(gateway.as_ref())
                .context("resolve profile")?;
            match profile.id {
                Some(id) => println!("{} ({})", profile.username, id),
                None => println!("{}", profile.username),
            }
        }
    }

    Ok(())
}

fn confirm_delete(id: &str) -> Result<bool> {
    eprint!("Delete mask {}? This cannot be undone. [y/N] ", id);
    io::stderr().flush().context("flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
