mod config;
mod market_data;
mod wiring;

use anyhow::Context;
use core_sim::{load_seeds, UniformResampler};
use runtime::{shutdown_channel, RunOutcome, SimulationClock, SimulationEngine, TracingRunLogWriter};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{config::Config, market_data::YahooChartSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        addr = %config.listen_addr,
        symbols = config.symbols.len(),
        total_steps = config.sim.total_steps,
        tick_interval_ms = config.sim.tick_interval.as_millis() as u64,
        "starting price simulation"
    );

    let source = YahooChartSource::new(&config.data_base_url, &config.history_range)
        .context("failed to build market data client")?;
    let seeds = load_seeds(&source, &config.symbols)
        .await
        .context("historical returns are unavailable")?;

    let mut engine = SimulationEngine::new(
        seeds,
        config.sim.total_steps,
        build_sampler(config.seed),
        TracingRunLogWriter,
    );
    let reader = engine.reader();
    let clock = SimulationClock::from_config(&config.sim);
    let (trigger, shutdown) = shutdown_channel();

    let simulation = tokio::spawn(async move { engine.run(clock, shutdown).await });

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "serving market snapshots");

    axum::serve(
        listener,
        wiring::build_app(reader, config.chart_poll_interval),
    )
    .with_graceful_shutdown(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for ctrl-c");
        }
        info!("shutdown requested");
        trigger.trigger();
    })
    .await
    .context("server error")?;

    let summary = simulation.await.context("simulation task panicked")?;
    match summary.outcome {
        RunOutcome::HorizonReached { steps } => info!(steps, "simulation complete"),
        RunOutcome::Stopped { last_step } => info!(last_step, "simulation stopped early"),
        RunOutcome::Aborted { last_step, error } => {
            return Err(anyhow::Error::new(error)
                .context(format!("simulation aborted after step {last_step}")));
        }
    }

    Ok(())
}

fn build_sampler(seed: Option<u64>) -> UniformResampler {
    match seed {
        Some(seed) => {
            info!(seed, "using seeded resampler");
            UniformResampler::seeded(seed)
        }
        None => UniformResampler::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use core_sim::{HistoricalReturns, ReturnSampler, Symbol};

    use super::build_sampler;

    #[test]
    fn seeded_samplers_repeat_their_draws() {
        let symbol = Symbol::from("AAPL");
        let returns =
            HistoricalReturns::new(&symbol, vec![-0.02, -0.01, 0.0, 0.01, 0.02, 0.03]).unwrap();
        let mut first = build_sampler(Some(7));
        let mut second = build_sampler(Some(7));

        let a: Vec<f64> = (0..32).map(|_| first.draw(&symbol, &returns)).collect();
        let b: Vec<f64> = (0..32).map(|_| second.draw(&symbol, &returns)).collect();

        assert_eq!(a, b);
    }

    #[test]
    fn unseeded_samplers_still_draw_from_history() {
        let symbol = Symbol::from("GOOG");
        let returns = HistoricalReturns::new(&symbol, vec![0.5]).unwrap();
        let mut sampler = build_sampler(None);

        assert_eq!(sampler.draw(&symbol, &returns), 0.5);
    }
}
