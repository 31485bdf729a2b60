// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod commands;
mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use runtime::StoreRuntime;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use taskgrid_app::{APP_NAME, UiState};
use taskgrid_db::Store;
use time::{OffsetDateTime, UtcOffset};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Read before anything else runs; the lookup is refused once threads exist.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match options.action {
        Action::Help => {
            print!("{}", help_text());
            return Ok(());
        }
        Action::PrintConfigPath => {
            println!("{}", options.config_path.display());
            return Ok(());
        }
        Action::PrintExampleConfig => {
            print!("{}", Config::example_config(&options.config_path));
            return Ok(());
        }
        Action::PrintDbPath | Action::Launch => {}
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `taskgrid --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.action == Action::PrintDbPath {
        println!("{}", db_path.display());
        return Ok(());
    }

    let level = if options.verbose {
        LevelFilter::Debug
    } else {
        config.log_level()?
    };
    let log_file = init_logging(level)?;
    log::info!(
        "{APP_NAME} {} starting, logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_file.display()
    );
    log::info!("config {}", options.config_path.display());

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or TASKGRID_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    log::info!("opened store {}", db_path.display());
    if options.demo {
        store.seed_demo_data(OffsetDateTime::now_utc().to_offset(offset))?;
    }

    let binds = config.binds()?;
    let filter = config.view_filter()?;
    let mut runtime = StoreRuntime::load(&store, config.display_settings(), offset)?;
    if options.check_only {
        return Ok(());
    }

    let mut ui = UiState::new(binds, filter);
    taskgrid_tui::run_app(&mut ui, &mut runtime)
}

fn init_logging(level: LevelFilter) -> Result<PathBuf> {
    let path = default_log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    WriteLogger::init(level, log_config, file).context("install logger")?;
    Ok(path)
}

fn default_log_path() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory for the log file"))?;
    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(log_file_in(&app_dir))
}

fn log_file_in(dir: &Path) -> PathBuf {
    dir.join(format!("{APP_NAME}.log"))
}

/// What the invocation does. When several flags ask for different actions
/// the highest one wins, so `--help` beats everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Action {
    Launch,
    PrintDbPath,
    PrintExampleConfig,
    PrintConfigPath,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    action: Action,
    demo: bool,
    check_only: bool,
    verbose: bool,
}

const FLAGS: &[(&str, &str)] = &[
    ("--config <path>", "Read settings from <path> (also --config=<path>)"),
    ("--print-config-path", "Print the resolved config path"),
    ("--print-path", "Print the resolved database path"),
    ("--print-example-config", "Print a commented config template"),
    ("--demo", "Start on an in-memory database seeded with sample tasks"),
    ("--check", "Load config and database, then exit"),
    ("--verbose", "Log at debug level"),
    ("-h, --help", "Show this help"),
];

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        action: Action::Launch,
        demo: false,
        check_only: false,
        verbose: false,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let arg = arg.as_ref();
        if let Some(path) = arg.strip_prefix("--config=") {
            options.config_path = config_path_value(path)?;
            continue;
        }

        let requested = match arg {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config expects a path after it"))?;
                options.config_path = config_path_value(path.as_ref())?;
                continue;
            }
            "--demo" => {
                options.demo = true;
                continue;
            }
            "--check" => {
                options.check_only = true;
                continue;
            }
            "--verbose" => {
                options.verbose = true;
                continue;
            }
            "--print-path" => Action::PrintDbPath,
            "--print-example-config" => Action::PrintExampleConfig,
            "--print-config-path" => Action::PrintConfigPath,
            "-h" | "--help" => Action::Help,
            other => bail!("unrecognized option {other:?} (see {APP_NAME} --help)"),
        };
        options.action = options.action.max(requested);
    }

    Ok(options)
}

fn config_path_value(raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        bail!("--config expects a path after it");
    }
    Ok(PathBuf::from(raw))
}

fn help_text() -> String {
    let width = FLAGS.iter().map(|(flag, _)| flag.len()).max().unwrap_or(0);
    let mut text = format!(
        "{APP_NAME} {}\nUsage: {APP_NAME} [options]\n\n",
        env!("CARGO_PKG_VERSION")
    );
    for (flag, about) in FLAGS {
        text.push_str(&format!("  {flag:<width$}  {about}\n"));
    }
    text
}
