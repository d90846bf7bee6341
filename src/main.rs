use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use permutest::data::import;
use permutest::engine::{montecarlo, optimizer, strategy};
use permutest::logging;
use permutest::models::params::StrategyParams;
use permutest::utils::export;

#[derive(Parser, Debug)]
#[command(author, version, about = "Monte Carlo permutation testing for an RSI trading rule")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Backtest the RSI rule on real data and write a comparison chart
    Backtest {
        /// CSV file with date/open/high/low/close columns
        #[arg(short, long)]
        data: PathBuf,

        /// Instrument display name (e.g. BTC-USD)
        #[arg(short, long, default_value = "TICKER")]
        ticker: String,

        /// RSI lookback value
        #[arg(long, default_value = "14")]
        rsi_lookback: usize,

        /// RSI buy threshold
        #[arg(long, default_value = "30")]
        rsi_buy: f64,

        /// RSI sell threshold
        #[arg(long, default_value = "70")]
        rsi_sell: f64,

        /// Grid-optimize the parameters before the final run
        #[arg(long)]
        optimize: bool,

        /// Strategy display name for the chart
        #[arg(long, default_value = "RSI")]
        strategy_name: String,

        /// Output HTML file for the comparison chart
        #[arg(short, long)]
        output_file: PathBuf,
    },

    /// Run the permutation significance test and write a JSON report
    McTest {
        /// CSV file with date/open/high/low/close columns
        #[arg(short, long)]
        data: PathBuf,

        /// Instrument display name (e.g. BTC-USD)
        #[arg(short, long, default_value = "TICKER")]
        ticker: String,

        /// RSI lookback value
        #[arg(long, default_value = "14")]
        rsi_lookback: usize,

        /// RSI buy threshold
        #[arg(long, default_value = "30")]
        rsi_buy: f64,

        /// RSI sell threshold
        #[arg(long, default_value = "70")]
        rsi_sell: f64,

        /// Number of random simulations
        #[arg(long, default_value = "100")]
        simulations: usize,

        /// Stationary-bootstrap restart probability
        #[arg(long, default_value = "0.1")]
        probability: f64,

        /// Bars up to and including this index are kept unpermuted
        #[arg(long, default_value = "0")]
        start_index: usize,

        /// Master seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Re-optimize parameters on every permuted series
        #[arg(long)]
        optimize_each: bool,

        /// Output JSON file for the full report
        #[arg(short, long)]
        output_file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let job_id = logging::init_run_logging(Path::new("logs"))?;
    info!("Job {} started", job_id);

    match cli.command {
        Command::Backtest {
            data,
            ticker,
            rsi_lookback,
            rsi_buy,
            rsi_sell,
            optimize,
            strategy_name,
            output_file,
        } => {
            let bars = import::read_bars_csv(&data)?;

            let params = if optimize {
                let best = optimizer::optimize(&bars)?;
                println!("Optimization complete: {}", best);
                best
            } else {
                StrategyParams::new(rsi_lookback, rsi_buy, rsi_sell)
            };

            let curves = strategy::simulate(&bars, &params)?;
            print!(
                "{}",
                export::format_summary(&ticker, &params, curves.total_strategy_return())
            );

            export::write_comparison_html(&curves, &ticker, &strategy_name, &output_file)?;
            info!("Comparison chart written to {}", output_file.display());
        }

        Command::McTest {
            data,
            ticker,
            rsi_lookback,
            rsi_buy,
            rsi_sell,
            simulations,
            probability,
            start_index,
            seed,
            optimize_each,
            output_file,
        } => {
            let bars = import::read_bars_csv(&data)?;
            let params = StrategyParams::new(rsi_lookback, rsi_buy, rsi_sell);
            let config = montecarlo::MonteCarloConfig {
                trials: simulations,
                probability,
                start_index,
                seed,
                optimize_each,
            };

            let report = montecarlo::run_permutation_test(&bars, &params, &config)?;
            print!("{}", export::format_mc_summary(&ticker, &report));

            export::write_mc_report_json(&report, &output_file)?;
            info!("Permutation report written to {}", output_file.display());
        }
    }

    Ok(())
}
