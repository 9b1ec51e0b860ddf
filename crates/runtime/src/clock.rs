use std::time::Duration;

use core_sim::SimConfig;
use tokio::sync::watch;

/// Fires the stop request observed by [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the trigger fires. Never resolves if the trigger is dropped unfired.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// Emits steps `1..=total_steps`, each after waiting `tick_interval` from the moment
/// the previous step was handed out and processed. No drift compensation.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    tick_interval: Duration,
    total_steps: u64,
    next_step: u64,
    stopped: bool,
}

impl SimulationClock {
    pub fn new(tick_interval: Duration, total_steps: u64) -> Self {
        Self {
            tick_interval,
            total_steps,
            next_step: 1,
            stopped: false,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.tick_interval, config.total_steps)
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_step > self.total_steps
    }

    /// Waits out the interval and returns the next step, or `None` once the horizon
    /// is reached or shutdown was requested. The wait is the only cancellation point.
    pub async fn next_tick(&mut self, shutdown: &mut ShutdownSignal) -> Option<u64> {
        if self.stopped || self.is_exhausted() {
            return None;
        }
        if shutdown.is_triggered() {
            self.stopped = true;
            return None;
        }

        tokio::select! {
            biased;
            _ = shutdown.triggered() => {
                self.stopped = true;
                return None;
            }
            _ = tokio::time::sleep(self.tick_interval) => {}
        }

        let step = self.next_step;
        self.next_step += 1;
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::{shutdown_channel, SimulationClock};

    #[tokio::test(start_paused = true)]
    async fn fires_exactly_total_steps_then_stops() {
        let (_trigger, mut shutdown) = shutdown_channel();
        let mut clock = SimulationClock::new(Duration::from_secs(5), 3);

        let mut steps = Vec::new();
        while let Some(step) = clock.next_tick(&mut shutdown).await {
            steps.push(step);
        }

        assert_eq!(steps, vec![1, 2, 3]);
        assert!(clock.is_exhausted());
        assert_eq!(clock.next_tick(&mut shutdown).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn each_step_waits_a_full_interval() {
        let (_trigger, mut shutdown) = shutdown_channel();
        let mut clock = SimulationClock::new(Duration::from_secs(5), 2);
        let started = Instant::now();

        clock.next_tick(&mut shutdown).await;
        assert!(started.elapsed() >= Duration::from_secs(5));

        clock.next_tick(&mut shutdown).await;
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_steps_never_ticks() {
        let (_trigger, mut shutdown) = shutdown_channel();
        let mut clock = SimulationClock::new(Duration::from_secs(5), 0);
        let started = Instant::now();

        assert_eq!(clock.next_tick(&mut shutdown).await, None);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_wait() {
        let (trigger, mut shutdown) = shutdown_channel();
        let mut clock = SimulationClock::new(Duration::from_secs(60), 10);
        let started = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.trigger();
        });

        assert_eq!(clock.next_tick(&mut shutdown).await, None);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_clock_stays_stopped() {
        let (trigger, mut shutdown) = shutdown_channel();
        let mut clock = SimulationClock::new(Duration::from_secs(1), 10);
        assert_eq!(clock.next_tick(&mut shutdown).await, Some(1));

        trigger.trigger();

        assert_eq!(clock.next_tick(&mut shutdown).await, None);
        assert_eq!(clock.next_tick(&mut shutdown).await, None);
        assert!(!clock.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_trigger_does_not_stop_the_clock() {
        let (trigger, mut shutdown) = shutdown_channel();
        drop(trigger);
        let mut clock = SimulationClock::new(Duration::from_secs(1), 2);

        assert_eq!(clock.next_tick(&mut shutdown).await, Some(1));
        assert_eq!(clock.next_tick(&mut shutdown).await, Some(2));
    }
}
