//! parley CLI: command-line interface for the parley messaging client

use clap::{Parser, Subcommand};
use parley_engine::{Config, ConversationApi, HttpConversationApi, SyncState};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Two-pane terminal messenger
#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Act as this user (overrides the configured name)
    #[arg(long, global = true)]
    name: Option<String>,

    /// Conversation service base URL (overrides the configured URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// Initialize .parley/ directory and config
    Init,

    /// List conversations for the current user
    Conversations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the messages of a conversation
    Messages {
        /// Conversation id
        conversation_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a message to a conversation
    Send {
        /// Conversation id
        conversation_id: String,

        /// Message text
        text: String,
    },
}

const PARLEY_DIR: &str = ".parley";

fn config_path() -> PathBuf {
    Path::new(PARLEY_DIR).join("config.json")
}

fn load_config() -> Config {
    Config::load(&config_path()).unwrap_or_default()
}

/// Initialize logging for headless commands (stderr, env-filtered).
fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize logging for the TUI. The terminal belongs to the UI, so
/// events go to `.parley/parley.log` instead.
fn init_file_logging() {
    let _ = std::fs::create_dir_all(PARLEY_DIR);
    let Ok(file) = std::fs::File::create(Path::new(PARLEY_DIR).join("parley.log")) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();
}

fn main() {
    let Cli { name, url, command } = Cli::parse();

    let config = load_config();
    let base_url = url.clone().unwrap_or_else(|| config.base_url.clone());
    let user = config.resolve_user(name.as_deref());

    match command {
        None | Some(Commands::Tui) => {
            init_file_logging();
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            if let Err(e) = rt.block_on(parley_tui::run_tui(&base_url, &user)) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Init) => {
            init_stderr_logging();
            cmd_init(url, name);
        }
        Some(Commands::Conversations { json }) => {
            init_stderr_logging();
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(cmd_conversations(&base_url, &user, json));
        }
        Some(Commands::Messages {
            conversation_id,
            json,
        }) => {
            init_stderr_logging();
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(cmd_messages(&base_url, &user, &conversation_id, json));
        }
        Some(Commands::Send {
            conversation_id,
            text,
        }) => {
            init_stderr_logging();
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(cmd_send(&base_url, &user, &conversation_id, &text));
        }
    }
}

fn cmd_init(url: Option<String>, name: Option<String>) {
    let path = config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return;
    }

    let config = Config {
        base_url: url.unwrap_or_else(|| Config::default().base_url),
        user_name: name,
    };

    match config.save(&path) {
        Ok(()) => {
            println!("Created {}", path.display());
            if config.user_name.is_none() {
                println!("Set your name with `parley init --name <you>` or pass --name per run");
            }
        }
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

/// Build an API client, exiting with a message when the URL is unusable.
fn api_client(base_url: &str) -> HttpConversationApi {
    match HttpConversationApi::new(base_url) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Failed to create client for {base_url}: {e}");
            std::process::exit(1);
        }
    }
}

/// Load the conversation list into a fresh sync state, or exit.
async fn load_state(api: &HttpConversationApi, user: &str) -> SyncState {
    let mut state = SyncState::new(user);
    let Some(request) = state.begin_conversations_load() else {
        eprintln!("No user name configured. Pass --name or run `parley init --name <you>`.");
        std::process::exit(1);
    };

    let result = api.list_conversations(&request.user).await;
    if let Err(e) = &result {
        eprintln!("Failed to fetch conversations: {e}");
        std::process::exit(1);
    }
    state.apply_conversations(result);
    state
}

async fn cmd_conversations(base_url: &str, user: &str, json: bool) {
    let api = api_client(base_url);
    let state = load_state(&api, user).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(state.conversations()).expect("failed to serialize")
        );
        return;
    }

    if state.conversations().is_empty() {
        println!("No conversations found");
        return;
    }

    println!("Conversations for {user}\n");
    for conversation in state.conversations() {
        let contact = conversation.contact(user).unwrap_or("(unknown)");
        println!(
            "  {}  {}  {} · {}",
            conversation.conversation_id,
            contact,
            conversation.last_message.content.trim(),
            conversation.last_message.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
}

async fn cmd_messages(base_url: &str, user: &str, conversation_id: &str, json: bool) {
    let api = api_client(base_url);
    let mut state = load_state(&api, user).await;

    let Some(request) = state.begin_select(conversation_id) else {
        eprintln!("Unknown conversation: {conversation_id}");
        std::process::exit(1);
    };
    let result = api.list_messages(&request.conversation_id).await;
    if let Err(e) = &result {
        eprintln!("Failed to fetch messages: {e}");
        std::process::exit(1);
    }
    state.apply_thread(&request, result);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(state.messages()).expect("failed to serialize")
        );
        return;
    }

    for message in state.visible_messages() {
        println!(
            "  [{}] {}: {}",
            message.timestamp.format("%Y-%m-%d %H:%M"),
            message.from,
            message.content
        );
    }
}

async fn cmd_send(base_url: &str, user: &str, conversation_id: &str, text: &str) {
    let api = api_client(base_url);
    let mut state = load_state(&api, user).await;

    if state.begin_select(conversation_id).is_none() {
        eprintln!("Unknown conversation: {conversation_id}");
        std::process::exit(1);
    }

    state.set_composer(text);
    let Some(pending) = state.begin_send(chrono::Utc::now()) else {
        eprintln!("Nothing to send (empty text or no recipient)");
        std::process::exit(1);
    };

    let result = api
        .send_message(&pending.conversation_id, &pending.message)
        .await;
    if state.apply_send(&pending, result) {
        println!("Sent to {}", pending.message.to_name);
    } else {
        eprintln!("Send failed");
        std::process::exit(1);
    }
}
