//! Command-line interface parsing and handling

pub mod setup;

use std::error::Error;
use std::io::{self, IsTerminal};
use std::process;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::cli::setup::{run_setup, TerminalPrompter};
use crate::core::config::{mask_secret, ConfigStore, SettingKey};
use crate::core::history::{list_sessions, HistoryStore, DEFAULT_SESSION};
use crate::core::paths::{path_display, AppPaths};
use crate::core::providers::{find_provider, resolve};
use crate::core::session::ChatSession;
use crate::ui::chat_loop::{run_chat_loop, spawn_interrupt_watcher, ChatLoopOptions};

#[derive(Parser, Debug)]
#[command(name = "kodeka", version)]
#[command(about = "A command-line chat client for local and hosted language models")]
#[command(
    long_about = "Kodeka is a line-oriented chat client. Conversations are saved per session \
and the most recent messages are sent as context with every request.\n\n\
Environment Variables:\n\
  KODEKA_HOME       Directory for config.json and history/ (optional)\n\
  KODEKA_LOG        Log filter, e.g. debug (defaults to RUST_LOG, then warn)\n\
  OLLAMA_HOST       Ollama daemon address (defaults to http://localhost:11434)\n\
  OPENAI_API_KEY    API key used when none is stored\n\
  OPENAI_BASE_URL   Custom API base URL (defaults to https://api.openai.com/v1)\n\n\
Commands inside a chat:\n\
  /help             Show available commands\n\
  /clear            Erase this session's history\n\
  /config           Show the provider in use and the stored configuration\n\
  /exit             End the session (also exit, quit, :q)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Conversation to continue
    #[arg(short = 's', long, global = true, value_name = "NAME", default_value = DEFAULT_SESSION)]
    pub session: String,

    /// Provider to use for this run instead of the stored one
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model to use for this run instead of the stored one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Run the first-run setup prompts again
    Setup,
    /// Print the stored configuration with the API key masked
    Config,
    /// Set configuration values
    Set {
        /// Configuration key to set (provider, api-key, model, theme)
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Erase the selected session's history
    Clear,
    /// List saved sessions
    Sessions,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    crate::logging::init();

    let paths = AppPaths::resolve()?;
    let store = ConfigStore::new(&paths.config_file);

    match args.command.as_ref().unwrap_or(&Commands::Chat) {
        Commands::Chat => run_chat(&args, &paths, &store),
        Commands::Setup => {
            let mut config = store.load();
            run_setup(&store, &mut config, &mut TerminalPrompter, &mut io::stdout())?;
            Ok(())
        }
        Commands::Config => {
            println!("{}", store.load().redacted_json());
            println!("({})", path_display(store.path()));
            Ok(())
        }
        Commands::Set { key, value } => {
            let key = SettingKey::parse(key)?;
            let value = value.join(" ");
            let mut config = store.load();
            config.set(key, &value)?;
            store.save(&config)?;
            let shown = match key {
                SettingKey::ApiKey => mask_secret(value.trim()),
                _ => value.trim().to_string(),
            };
            println!("✅ Set {} to: {}", key.as_str(), shown);
            Ok(())
        }
        Commands::Unset { key } => {
            let key = SettingKey::parse(key)?;
            let mut config = store.load();
            config.unset(key);
            store.save(&config)?;
            println!("✅ Unset {}", key.as_str());
            Ok(())
        }
        Commands::Clear => {
            let mut history = HistoryStore::open(&paths.history_dir, &args.session)?;
            history.clear()?;
            println!("Cleared session '{}'.", history.session_name());
            Ok(())
        }
        Commands::Sessions => {
            let sessions = list_sessions(&paths.history_dir);
            if sessions.is_empty() {
                println!("No saved sessions.");
            }
            for name in sessions {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_chat(args: &Args, paths: &AppPaths, store: &ConfigStore) -> Result<(), Box<dyn Error>> {
    if let Err(err) = store.ensure_exists() {
        warn!(error = %err, "could not create default config");
    }
    let mut config = store.load();

    if config.needs_setup() && args.provider.is_none() {
        run_setup(store, &mut config, &mut TerminalPrompter, &mut io::stdout())?;
    }

    let identifier = args
        .provider
        .as_deref()
        .or(config.provider_id())
        .unwrap_or_default();
    let credential = match find_provider(identifier) {
        Some(spec) => spec.credential_from(&config.api_key),
        None => config.api_key.clone(),
    };

    let binding = match resolve(identifier, &credential) {
        Ok(binding) => binding,
        Err(err) => {
            eprintln!("Error initializing provider: {err}");
            for fix in err.quick_fixes() {
                eprintln!("  {fix}");
            }
            process::exit(err.exit_code());
        }
    };

    let history = match HistoryStore::open(&paths.history_dir, &args.session) {
        Ok(history) => history,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(2);
        }
    };

    let model = args.model.as_deref().or(config.model_name());
    let mut session = ChatSession::new(history, binding, model);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if let Err(err) =
        spawn_interrupt_watcher(tokio::signal::ctrl_c(), io::stdout(), || process::exit(0))
    {
        warn!(error = %err, "Ctrl-C will end the process without a farewell");
    }

    // Stdout stays unlocked between writes so the interrupt watcher can print.
    let stdout = io::stdout();
    let options = ChatLoopOptions {
        clear_screen: stdout.is_terminal(),
    };
    run_chat_loop(
        &rt,
        &mut session,
        &config,
        io::stdin().lock(),
        stdout,
        options,
    )?;
    Ok(())
}
