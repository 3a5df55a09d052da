mod ai;
mod command;
mod config;
mod constants;
mod scratchpad;
mod settings;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::{Action, AiService};
use crate::config::Config;
use crate::settings::{Settings, open_store};

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ai_scratchpad=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .and_then(|dir| fs::create_dir_all(&dir).ok().map(|_| dir))
        .map(|dir| dir.join("ai-scratchpad.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"ai-scratchpad - Summarize, bullet-point and tidy text with an LLM

Usage: ai-scratchpad [command]

Commands:
    (none)              Start the interactive scratchpad
    summarize [FILE]    Summarize FILE (or stdin)
    bullets [FILE]      Convert FILE (or stdin) into bullet points
    tidy [FILE]         Fix spelling, grammar and formatting of FILE (or stdin)
    set-key             Store the OpenRouter API key
    set-base-url URL    Use an OpenAI-compatible endpoint other than OpenRouter
    settings            Show the current settings
    help                Show this help message

Configuration file: ~/.config/ai-scratchpad/config.toml
"#
    );
}

fn build_service(config: &Config) -> Result<AiService> {
    config.ensure_dirs()?;
    let store = open_store(config.storage.backend, &Config::config_dir()?)
        .context("Failed to open settings store")?;
    tracing::info!("Settings backend: {}", store.backend());
    Ok(AiService::new(Settings::new(store), config.ai.model.clone()))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Read the text for a one-shot action, refusing empty input.
fn action_input(action: Action, path: Option<&str>) -> Result<String> {
    let text = read_input(path)?;
    if text.trim().is_empty() {
        anyhow::bail!("Cannot run {}: input is empty", action);
    }
    Ok(text)
}

fn run_set_key(service: &AiService) -> Result<()> {
    print!("OpenRouter API key: ");
    io::stdout().flush()?;
    let api_key = rpassword_read()?;
    println!();

    if api_key.is_empty() {
        anyhow::bail!("No API key entered");
    }

    service.set_api_key(&api_key)?;
    println!("API key stored in {}.", service.storage_backend());
    Ok(())
}

fn run_set_base_url(service: &AiService, url: Option<&str>) -> Result<()> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .context("Usage: ai-scratchpad set-base-url URL")?;

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("Base URL must start with http:// or https://");
    }

    service.set_base_url(url)?;
    println!("Base URL set to {}", url);
    Ok(())
}

fn run_show_settings(service: &AiService, config: &Config) -> Result<()> {
    let api_key = service.api_key()?;
    println!("Storage:  {}", service.storage_backend());
    println!(
        "API key:  {}",
        api_key.as_deref().map_or("not set".to_string(), mask_key)
    );
    println!("Base URL: {}", service.base_url()?);
    println!("Model:    {}", config.ai.model);
    Ok(())
}

/// Show only the first and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn rpassword_read() -> Result<String> {
    // Echo can only be disabled on a terminal; piped input is read as-is
    let _guard = if io::stdin().is_terminal() {
        Some(DisableEcho::new()?)
    } else {
        None
    };

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    Ok(password.trim().to_string())
}

struct DisableEcho {
    #[cfg(unix)]
    original: libc::termios,
}

impl DisableEcho {
    #[cfg(unix)]
    fn new() -> Result<Self> {
        use std::mem::MaybeUninit;
        use std::os::unix::io::AsRawFd;

        let fd = std::io::stdin().as_raw_fd();
        let mut termios = MaybeUninit::<libc::termios>::uninit();

        unsafe {
            if libc::tcgetattr(fd, termios.as_mut_ptr()) != 0 {
                anyhow::bail!("Failed to get terminal attributes");
            }
            let original = termios.assume_init();
            let mut new = original;
            new.c_lflag &= !libc::ECHO;
            if libc::tcsetattr(fd, libc::TCSANOW, &new) != 0 {
                anyhow::bail!("Failed to set terminal attributes");
            }
            Ok(Self { original })
        }
    }

    #[cfg(not(unix))]
    fn new() -> Result<Self> {
        Ok(Self {})
    }
}

#[cfg(unix)]
impl Drop for DisableEcho {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        let fd = std::io::stdin().as_raw_fd();
        unsafe {
            libc::tcsetattr(fd, libc::TCSANOW, &self.original);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str());
    let arg = args.get(2).map(|s| s.as_str());

    if matches!(command, Some("help") | Some("--help") | Some("-h")) {
        print_usage();
        return Ok(());
    }

    setup_logging();

    let config = Config::load()?;
    let service = build_service(&config)?;

    match command {
        None | Some("scratch") => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            scratchpad::run(&service, stdin, &mut io::stdout()).await
        }
        Some("summarize") => {
            let text = action_input(Action::Summarize, arg)?;
            println!("{}", service.summarize(&text).await?);
            Ok(())
        }
        Some("bullets") => {
            let text = action_input(Action::BulletPoints, arg)?;
            println!("{}", service.bullet_points(&text).await?);
            Ok(())
        }
        Some("tidy") => {
            let text = action_input(Action::Tidy, arg)?;
            println!("{}", service.tidy(&text).await?);
            Ok(())
        }
        Some("set-key") => run_set_key(&service),
        Some("set-base-url") => run_set_base_url(&service, arg),
        Some("settings") => run_show_settings(&service, &config),
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
    }
}
