use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "aporte")]
#[command(about = "Contribution backtests with dividend reinvestment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate recurring or lump-sum contributions per ticker and sum them
    Backtest {
        #[command(flatten)]
        common: CommonArgs,

        /// recurring | lump_sum
        #[arg(long)]
        mode: Option<String>,

        /// Per-month (recurring) or one-time (lump sum) amount
        #[arg(long)]
        amount: Option<String>,

        /// First date considered, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,

        /// Last date considered, YYYY-MM-DD (default: today)
        #[arg(long)]
        end: Option<String>,

        /// reinvest | ignore
        #[arg(long)]
        dividends: Option<String>,
    },

    /// Convert annual net income at the annual mean exchange rate
    Income {
        #[command(flatten)]
        common: CommonArgs,

        /// FX series symbol (local currency per target unit)
        #[arg(long)]
        fx_symbol: Option<String>,

        #[arg(long)]
        start_year: Option<i32>,

        #[arg(long)]
        end_year: Option<i32>,
    },

    /// Annual inflation (BCB SGS series, IPCA by default) and its compounded total
    Inflation {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long)]
        start_year: Option<i32>,

        #[arg(long)]
        end_year: Option<i32>,

        /// SGS series number (default: 433, monthly IPCA)
        #[arg(long)]
        series: Option<u32>,

        /// Print JSON instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Fail on config keys this command does not read
        #[arg(long, default_value_t = false)]
        strict_keys: bool,
    },

    /// List each ticker's most recent cash dividends and their sum
    Dividends {
        #[command(flatten)]
        common: CommonArgs,

        /// First date considered, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,

        /// Last date considered, YYYY-MM-DD (default: today)
        #[arg(long)]
        end: Option<String>,

        /// How many of the most recent payments to sum (default: 48)
        #[arg(long)]
        last: Option<usize>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> local -> ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

/// Flags shared by the data-fetching commands.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Layered config paths in merge order
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Whitespace-separated ticker list (overrides config)
    #[arg(long)]
    pub tickers: Option<String>,

    /// yahoo | csv
    #[arg(long)]
    pub source: Option<String>,

    /// Directory holding <SYMBOL>.csv files (csv source)
    #[arg(long)]
    pub csv_dir: Option<String>,

    /// Print JSON instead of key=value lines
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Fail on config keys this command does not read
    #[arg(long, default_value_t = false)]
    pub strict_keys: bool,
}

fn init_tracing() {
    // stderr keeps stdout parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Backtest {
            common,
            mode,
            amount,
            start,
            end,
            dividends,
        } => {
            commands::backtest::run_backtest(
                common,
                commands::backtest::BacktestFlags {
                    mode,
                    amount,
                    start,
                    end,
                    dividends,
                },
            )
            .await?;
        }

        Commands::Income {
            common,
            fx_symbol,
            start_year,
            end_year,
        } => {
            commands::income::run_income(
                common,
                commands::income::IncomeFlags {
                    fx_symbol,
                    start_year,
                    end_year,
                },
            )
            .await?;
        }

        Commands::Inflation {
            config_paths,
            start_year,
            end_year,
            series,
            json,
            strict_keys,
        } => {
            commands::inflation::run_inflation(
                CommonArgs {
                    config_paths,
                    json,
                    strict_keys,
                    ..CommonArgs::default()
                },
                commands::inflation::InflationFlags {
                    start_year,
                    end_year,
                    series,
                },
            )
            .await?;
        }

        Commands::Dividends {
            common,
            start,
            end,
            last,
        } => {
            commands::dividends::run_dividends(
                common,
                commands::dividends::DividendFlags { start, end, last },
            )
            .await?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = aporte_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}
