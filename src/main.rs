use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use openduck::error_display::user_message_from_persistence;
use openduck::logging::{self, LoggingConfig};
use openduck::{
    App, AppConfig, AppEvent, CacheManager, ConfigManager, DuckDbEngine, QueryStore, Theme,
    APP_NAME,
};
use openduck_cli::Args;
use ratatui::DefaultTerminal;
use std::sync::{mpsc::channel, Arc};
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: AppConfig, theme: Theme) -> Result<()> {
    let store_path = match &args.store {
        Some(path) => path.clone(),
        None => CacheManager::new(APP_NAME)?.store_file(),
    };
    let (store, load_error) = QueryStore::load(store_path);
    let store = store.with_history_limit(config.query.history_limit);
    let engine = DuckDbEngine::in_memory().map_err(|e| eyre!("Could not start DuckDB: {}", e))?;

    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), theme, &config, store, Arc::new(engine));
    if args.debug || config.debug.enabled {
        app.enable_debug();
    }
    if let Some(e) = load_error {
        app.warn(user_message_from_persistence(&e));
    }

    if let Some(path) = &args.path {
        if path.is_dir() {
            app.set_browser_root(path);
        } else {
            if let Some(parent) = path.parent().filter(|p| p.is_dir()) {
                app.set_browser_root(parent);
            }
            app.open_path(path, args.format);
        }
    }
    render(&mut terminal, &mut app)?;

    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let mut updated = false;
        loop {
            match rx.try_recv() {
                Ok(AppEvent::Exit) => return Ok(()),
                Ok(AppEvent::Crash(msg)) => return Err(eyre!(msg)),
                Ok(event) => {
                    if let Some(event) = app.event(&event) {
                        tx.send(event)?;
                    }
                    updated = true;
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => break,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => return Ok(()),
            }
        }

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        let cache = CacheManager::new(APP_NAME)?;
        match cache.clear_all() {
            Ok(removed) if removed.is_empty() => {
                println!("Nothing to clear in {}", cache.cache_dir().display())
            }
            Ok(removed) => {
                for path in removed {
                    println!("Removed {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Error clearing cache: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(Some(()));
    }

    if args.clear_history {
        let path = match &args.store {
            Some(path) => path.clone(),
            None => CacheManager::new(APP_NAME)?.store_file(),
        };
        let (mut store, load_error) = QueryStore::load(&path);
        if let Some(e) = load_error {
            eprintln!("Warning: {}", user_message_from_persistence(&e));
        }
        if let Err(e) = store.clear_history() {
            eprintln!("Error clearing history: {}", user_message_from_persistence(&e));
            std::process::exit(1);
        }
        println!("History cleared in {}", path.display());
        return Ok(Some(()));
    }

    if args.write_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => println!("Wrote default configuration to {}", path.display()),
            Err(e) => {
                eprintln!("Error writing configuration: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(Some(()));
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let mut config = AppConfig::load(APP_NAME)?;
    if let Some(limit) = args.preview_limit {
        config.query.preview_limit = limit;
    }
    config.validate()?;
    let theme = Theme::from_config(&config.theme)?;

    // Logging is best effort; the interface works without it.
    let _log_guard = match CacheManager::new(APP_NAME) {
        Ok(cache) => {
            let logging = LoggingConfig::new(
                cache.cache_dir(),
                &config.debug.log_level,
                args.debug || config.debug.enabled,
            );
            logging::init(&logging)
                .map_err(|e| eprintln!("Warning: {}", e))
                .ok()
        }
        Err(_) => None,
    };

    let terminal = ratatui::init();
    let result = run(terminal, &args, config, theme);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
