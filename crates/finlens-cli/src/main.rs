use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

use finlens_api::FinancialApi;
use finlens_api::FixtureFinancialApi;
use finlens_api::HttpFinancialApi;
use finlens_core::config::Config;
use finlens_core::error::ValidationError;
use finlens_core::forecast::merge_direction;
use finlens_core::forecast::ChartData;
use finlens_core::model::ForecastQuery;
use finlens_core::persistence::detect_system_theme;
use finlens_core::persistence::ThemeStore;
use finlens_core::render::render;
use finlens_core::render::to_plain_text;
use finlens_core::state::Route;
use finlens_core::state::ShellState;
use finlens_core::state::ThemeMode;
use finlens_core::tickers::find_ticker;
use finlens_core::tickers::parse_days;
use finlens_core::tickers::DEFAULT_TICKER;
use finlens_core::tickers::TICKERS;

mod logging;
mod report;
mod ui;

/// Terminal dashboard for a financial-analysis API
#[derive(Parser, Debug)]
#[command(name = "finlens", version, about = "Terminal dashboard for a financial-analysis API")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "FINLENS_API_URL")]
    api_url: Option<String>,

    /// Config file (defaults to <config dir>/finlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the built-in fixture backend instead of HTTP
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive dashboard (default)
    Tui {
        #[arg(long, default_value = "query", value_parser = parse_route)]
        route: Route,
    },
    /// Submit one prompt and print the rendered analysis
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List past queries, or print one stored analysis
    History {
        /// 1-based row number from the listing
        #[arg(long)]
        select: Option<usize>,
    },
    /// Print forecast metrics and the price table
    Forecast {
        #[arg(long, default_value = DEFAULT_TICKER)]
        ticker: String,
        #[arg(long)]
        days: Option<String>,
    },
    /// List known tickers
    Tickers,
    /// Show or change the persisted theme
    Theme { mode: Option<ThemeArg> },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ThemeArg {
    Dark,
    Light,
    Toggle,
}

fn parse_route(raw: &str) -> Result<Route, String> {
    Route::parse(raw).ok_or_else(|| format!("unknown route '{raw}' (query, history, forecast)"))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui {
        route: Route::Query,
    });

    let target = match command {
        Command::Tui { .. } => logging::LogTarget::File,
        _ => logging::LogTarget::Stderr,
    };
    let _log_guard = logging::init(target);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load_default(),
    }
    .context("loading configuration")?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    tracing::debug!(base_url = %config.api.base_url, offline = cli.offline, "configuration loaded");

    match command {
        Command::Tui { route } => run_dashboard(&config, cli.offline, route),
        Command::Query { text } => {
            let api = build_api(&config, cli.offline)?;
            run_query(api.as_ref(), &text.join(" "))
        }
        Command::History { select } => {
            let api = build_api(&config, cli.offline)?;
            run_history(api.as_ref(), select)
        }
        Command::Forecast { ticker, days } => {
            let api = build_api(&config, cli.offline)?;
            let days = days.unwrap_or_else(|| config.forecast.default_days.to_string());
            run_forecast(api.as_ref(), &ticker, &days)
        }
        Command::Tickers => print_tickers(),
        Command::Theme { mode } => run_theme(mode),
    }
}

fn build_api(config: &Config, offline: bool) -> anyhow::Result<Arc<dyn FinancialApi>> {
    if offline {
        return Ok(Arc::new(FixtureFinancialApi::default()));
    }
    let api = HttpFinancialApi::from_config(&config.api).context("building HTTP client")?;
    Ok(Arc::new(api))
}

fn run_dashboard(config: &Config, offline: bool, route: Route) -> anyhow::Result<()> {
    let api = build_api(config, offline)?;
    let theme_store = ThemeStore::open_default();
    let theme = theme_store
        .as_ref()
        .map(ThemeStore::resolve)
        .unwrap_or_else(detect_system_theme);

    let mut state = ShellState::new(config, theme);
    state.route = route;
    if offline {
        state.api_base_url = "offline fixture".to_string();
    }
    tracing::info!(route = route.label(), theme = theme.label(), "starting dashboard");
    ui::run(state, api, theme_store, config.ui.tick_ms).context("running dashboard")
}

fn run_query(api: &dyn FinancialApi, text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        bail!(ValidationError::EmptyQuery);
    }
    let data = api.submit_query(text).context("Error processing the query")?;
    let rendered = to_plain_text(&render(&data));

    let mut out = io::stdout().lock();
    if rendered.trim().is_empty() {
        writeln!(out, "No analysis generated yet.")?;
    } else {
        write!(out, "{rendered}")?;
    }
    Ok(())
}

fn run_history(api: &dyn FinancialApi, select: Option<usize>) -> anyhow::Result<()> {
    let records = api.fetch_history().context("Unable to fetch data")?;
    let mut out = io::stdout().lock();

    let Some(row) = select else {
        if records.is_empty() {
            writeln!(out, "No records.")?;
        } else {
            write!(out, "{}", report::history_listing(&records))?;
        }
        return Ok(());
    };

    let Some(record) = row.checked_sub(1).and_then(|idx| records.get(idx)) else {
        bail!("no history row {row} ({} records)", records.len());
    };
    writeln!(out, "User Query: {}", record.user_query)?;
    writeln!(out)?;
    let rendered = to_plain_text(&render(&record.ai_response));
    if rendered.trim().is_empty() {
        writeln!(out, "No analysis generated yet.")?;
    } else {
        write!(out, "{rendered}")?;
    }
    Ok(())
}

fn run_forecast(api: &dyn FinancialApi, ticker: &str, days: &str) -> anyhow::Result<()> {
    let ticker = find_ticker(ticker)?;
    let days = parse_days(days)?;
    let query = ForecastQuery::for_ticker(ticker, days);

    let response = api
        .fetch_forecast(&query)
        .context("Error fetching forecast data")?;
    let chart =
        ChartData::from_forecast(&response.forecast).context("Error fetching forecast data")?;
    let mut metrics = response.metrics;
    merge_direction(&mut metrics, &response.forecast);

    let title = format!("{} ({}) - {} days", ticker.name, ticker.symbol, days);
    write!(
        io::stdout().lock(),
        "{}",
        report::forecast_report(&title, &chart, &metrics)
    )?;
    Ok(())
}

fn print_tickers() -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    for ticker in TICKERS.iter() {
        let marker = if ticker.symbol == DEFAULT_TICKER { "*" } else { " " };
        writeln!(
            out,
            "{marker} {:<15} {:<28} news: {}",
            ticker.symbol, ticker.name, ticker.news
        )?;
    }
    Ok(())
}

fn run_theme(mode: Option<ThemeArg>) -> anyhow::Result<()> {
    let store = ThemeStore::open_default().context("no config directory for the theme file")?;
    let current = store.resolve();
    let next = match mode {
        None => {
            println!("{}", current.label());
            return Ok(());
        }
        Some(ThemeArg::Dark) => ThemeMode::Dark,
        Some(ThemeArg::Light) => ThemeMode::Light,
        Some(ThemeArg::Toggle) => current.toggle(),
    };
    store
        .save(next)
        .with_context(|| format!("writing {}", store.path().display()))?;
    println!("{}", next.label());
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn no_subcommand_means_dashboard() {
        let cli = Cli::try_parse_from(["finlens"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(!cli.offline);
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "finlens",
            "forecast",
            "--ticker",
            "TCS.NS",
            "--days",
            "14",
            "--offline",
            "--api-url",
            "http://10.0.0.5:8000",
        ])
        .expect("parse");
        assert!(cli.offline);
        assert_eq!(cli.api_url.as_deref(), Some("http://10.0.0.5:8000"));
        match cli.command {
            Some(Command::Forecast { ticker, days }) => {
                assert_eq!(ticker, "TCS.NS");
                assert_eq!(days.as_deref(), Some("14"));
            }
            other => panic!("expected forecast, got {other:?}"),
        }
    }

    #[test]
    fn route_flag_accepts_known_routes_only() {
        let cli = Cli::try_parse_from(["finlens", "tui", "--route", "history"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::Tui {
                route: Route::History
            })
        ));
        assert!(Cli::try_parse_from(["finlens", "tui", "--route", "settings"]).is_err());
    }

    #[test]
    fn query_words_are_joined() {
        let cli = Cli::try_parse_from(["finlens", "query", "is", "ITC", "cheap?"]).expect("parse");
        match cli.command {
            Some(Command::Query { text }) => assert_eq!(text.join(" "), "is ITC cheap?"),
            other => panic!("expected query, got {other:?}"),
        }
    }

    #[test]
    fn offline_commands_succeed_against_fixture() {
        let api = FixtureFinancialApi::default();
        run_query(&api, "How is Infosys placed?").expect("query");
        run_history(&api, None).expect("listing");
        run_history(&api, Some(1)).expect("select");
        assert!(run_history(&api, Some(99)).is_err());
        run_forecast(&api, "infy.ns", "5").expect("forecast");
    }

    #[test]
    fn invalid_forecast_input_is_rejected_before_any_request() {
        let api = FixtureFinancialApi::unavailable();
        let err = run_forecast(&api, "RELIANCE.NS", "0").expect_err("zero days");
        assert!(err.to_string().contains("positive"));
        let err = run_forecast(&api, "AAPL", "5").expect_err("unknown ticker");
        assert!(err.to_string().contains("AAPL"));
        assert!(run_query(&api, "   ").is_err());
    }
}
