//! gara-search: storefront header search from the terminal
//!
//! Usage:
//!   gara-search                      - Interactive search session
//!   gara-search search <term> [-c N] - One-shot search
//!   gara-search categories           - List categories
//!   gara-search status               - Check the storefront backend
//!   gara-search help                 - Show help

use std::env;
use std::sync::Arc;

use gara_search::app::Key;
use gara_search::backend::api::BackendClient;
use gara_search::backend::{CategoryProvider, SearchProvider};
use gara_search::commands::Command;
use gara_search::routing::StdoutNavigator;
use gara_search::ui::results_panel;
use gara_search::{logging, Collaborators, Config, SearchError, SearchSession, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    logging::init();

    // Parse CLI arguments
    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).map(String::as_str);

    match cmd {
        Some("help") | Some("--help") | Some("-h") => {
            print_help();
            return Ok(());
        }
        None | Some("interactive" | "i" | "search" | "s" | "categories" | "cats" | "status") => {}
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'gara-search help' for usage");
            return Ok(());
        }
    }

    // Only commands that talk to the backend need a valid config
    let config = Config::load()?;
    tracing::debug!("Using backend at {}", config.api_base_url);

    let rt = tokio::runtime::Runtime::new()?;

    match cmd {
        Some("search") | Some("s") => rt.block_on(search_once(config, &args[2..])),
        Some("categories") | Some("cats") => rt.block_on(list_categories(config)),
        Some("status") => {
            let client = BackendClient::new(&config.api_base_url);
            match rt.block_on(client.health_check()) {
                Ok(health) => {
                    println!("Backend at {} is up ({})", client.base_url(), health.status)
                }
                Err(e) => println!("Backend at {} is not reachable: {}", client.base_url(), e),
            }
            Ok(())
        }
        _ => rt.block_on(interactive(config)),
    }
}

fn print_help() {
    println!("gara-search - UTE Gara storefront search\n");
    println!("Usage: gara-search [command]\n");
    println!("Commands:");
    println!("  (none), interactive         Start an interactive search session");
    println!("  search <term> [-c <id>]     Run one search and print the first page");
    println!("  categories                  List product categories");
    println!("  status                      Check that the backend is reachable");
    println!("  help                        Show this help message");
    println!("\nBackend URL: GARA_API_URL or ~/.config/gara-search/config.json");
}

async fn interactive(config: Config) -> Result<(), BoxError> {
    let client = Arc::new(BackendClient::new(&config.api_base_url));
    let collaborators = Collaborators {
        categories: client.clone(),
        search: client,
        navigator: Arc::new(StdoutNavigator),
    };
    let (handle, session) = SearchSession::spawn(&config, collaborators, None);
    tracing::info!("Session {} started", handle.id());
    let renderer = tokio::spawn(render_loop(handle.clone()));

    println!("{}", Command::help_text());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let delivered = match Command::parse(&line) {
            Command::Type { term } => handle.type_term(term),
            Command::Category { id } => handle.select_category(id),
            Command::Enter => handle.press(Key::Enter),
            Command::Escape => handle.press(Key::Escape),
            Command::Focus => handle.focus(),
            Command::Open { index } => handle.open_result(index),
            Command::Clear => handle.type_term(String::new()),
            Command::Categories => {
                print!("{}", results_panel::render_categories(&handle.view().categories));
                true
            }
            Command::Help => {
                println!("{}", Command::help_text());
                true
            }
            Command::Quit => break,
            Command::Invalid { message } => {
                println!("{}", message);
                true
            }
        };
        if !delivered {
            tracing::warn!("Search session stopped unexpectedly");
            break;
        }
    }

    drop(handle);
    session.await?;
    renderer.abort();
    Ok(())
}

/// Print the panel whenever it changes
async fn render_loop(handle: SessionHandle) {
    let mut views = handle.subscribe();
    drop(handle);

    let mut last = None;
    while views.changed().await.is_ok() {
        let rendered = results_panel::render(&views.borrow_and_update());
        if rendered != last {
            if let Some(panel) = &rendered {
                print!("{}", panel);
            }
            last = rendered;
        }
    }
}

async fn search_once(config: Config, args: &[String]) -> Result<(), BoxError> {
    let mut category_id = gara_search::app::ALL_CATEGORIES;
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--category" => {
                let value = iter.next().ok_or("--category needs a value")?;
                category_id = value.parse()?;
            }
            _ => words.push(arg.as_str()),
        }
    }

    let term = words.join(" ");
    if term.trim().is_empty() {
        eprintln!("Usage: gara-search search <term> [--category <id>]");
        return Ok(());
    }

    let client = BackendClient::new(&config.api_base_url);
    let timeout = config.request_timeout();
    let page = tokio::time::timeout(
        timeout,
        client.search_products(&term, category_id, 1, config.page_size),
    )
    .await
    .map_err(|_| SearchError::Timeout(timeout))??;

    println!("{} products found", page.total);
    for (i, product) in page.products.iter().enumerate() {
        println!(
            "  {}. {}  {}  (/product/{})",
            i + 1,
            product.name,
            product.display_price(),
            product.path
        );
    }
    Ok(())
}

async fn list_categories(config: Config) -> Result<(), BoxError> {
    let client = BackendClient::new(&config.api_base_url);
    let categories = client.list_categories().await?;
    print!("{}", results_panel::render_categories(&categories));
    Ok(())
}
