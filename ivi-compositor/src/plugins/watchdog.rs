//! Periodic health check of the running plugins.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ivi_layermanager::{CommandExecutor, HealthMonitor, HealthState, Plugin, PluginContext, PluginError};
use tracing::{debug, error, info, warn};

pub const NAME: &str = "watchdog";

struct Worker {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

/// Polls [`CommandExecutor::health`] on its own thread and logs every change.
/// The last observed state is what the monitor itself reports.
pub struct WatchdogMonitor {
    executor: Weak<dyn CommandExecutor>,
    interval: Duration,
    observed: Arc<Mutex<HealthState>>,
    worker: Mutex<Option<Worker>>,
}

impl WatchdogMonitor {
    pub fn new(context: &PluginContext) -> Self {
        let interval = Duration::from_millis(context.config().health.watchdog_interval_ms);
        Self::with_interval(context.executor_weak(), interval)
    }

    pub fn with_interval(executor: Weak<dyn CommandExecutor>, interval: Duration) -> Self {
        Self { executor, interval, observed: Arc::new(Mutex::new(HealthState::Running)), worker: Mutex::new(None) }
    }

    pub fn last_observed(&self) -> HealthState {
        *self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn worker(&self) -> std::sync::MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run(executor: Weak<dyn CommandExecutor>, interval: Duration, observed: Arc<Mutex<HealthState>>, stop: mpsc::Receiver<()>) {
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            // Sender dropped or an explicit stop.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let Some(executor) = executor.upgrade() else {
            debug!("Layer manager gone, watchdog exits");
            break;
        };
        let state = executor.health();
        drop(executor);

        let mut last = observed.lock().unwrap_or_else(PoisonError::into_inner);
        if *last == state {
            continue;
        }
        match state {
            HealthState::Running => info!(previous = %*last, "Plugins healthy again"),
            HealthState::Degraded => warn!(previous = %*last, "Plugin health degraded"),
            HealthState::Error => error!(previous = %*last, "Plugin reported an error"),
        }
        *last = state;
    }
}

impl Plugin for WatchdogMonitor {
    fn name(&self) -> &str {
        NAME
    }

    fn health(&self) -> HealthState {
        // A failing plugin is reported through the executor already.
        HealthState::Running
    }
}

impl HealthMonitor for WatchdogMonitor {
    fn start(&self) -> Result<(), PluginError> {
        let mut worker = self.worker();
        if worker.is_some() {
            return Err(PluginError::new("watchdog already running"));
        }
        if self.interval.is_zero() {
            return Err(PluginError::new("watchdog interval must be positive"));
        }
        let (stop, receiver) = mpsc::channel();
        let executor = self.executor.clone();
        let observed = Arc::clone(&self.observed);
        let interval = self.interval;
        let thread = thread::Builder::new()
            .name("ivi-watchdog".to_string())
            .spawn(move || run(executor, interval, observed, receiver))
            .map_err(|e| PluginError::new(format!("cannot spawn watchdog thread: {}", e)))?;
        debug!(interval_ms = interval.as_millis() as u64, "Watchdog started");
        *worker = Some(Worker { stop, thread });
        Ok(())
    }

    fn stop(&self) -> Result<(), PluginError> {
        let Some(Worker { stop, thread }) = self.worker().take() else {
            return Err(PluginError::new("watchdog not running"));
        };
        drop(stop);
        thread.join().map_err(|_| PluginError::new("watchdog thread panicked"))?;
        debug!("Watchdog stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::context_for;
    use ivi_core::DisplayConfig;
    use ivi_layermanager::{Layermanager, PluginHandle};
    use std::time::Instant;

    struct Sick;

    impl Plugin for Sick {
        fn name(&self) -> &str {
            "sick"
        }

        fn health(&self) -> HealthState {
            HealthState::Degraded
        }
    }

    impl HealthMonitor for Sick {
        fn start(&self) -> Result<(), PluginError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), PluginError> {
            Ok(())
        }
    }

    fn wait_for(monitor: &WatchdogMonitor, state: HealthState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if monitor.last_observed() == state {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_observes_degraded_plugin() {
        let lm = Arc::new(Layermanager::new(DisplayConfig::default()));
        lm.install_plugins([PluginHandle::HealthMonitor(Arc::new(Sick))]);
        let watchdog = WatchdogMonitor::with_interval(context_for(&lm).executor_weak(), Duration::from_millis(10));

        watchdog.start().unwrap();
        assert!(wait_for(&watchdog, HealthState::Degraded));
        watchdog.stop().unwrap();
    }

    #[test]
    fn test_start_stop_pairing() {
        let lm = Arc::new(Layermanager::new(DisplayConfig::default()));
        let watchdog = WatchdogMonitor::with_interval(context_for(&lm).executor_weak(), Duration::from_secs(60));

        assert!(watchdog.stop().is_err());
        watchdog.start().unwrap();
        assert!(watchdog.start().is_err());
        // Stop must not wait for the interval to elapse.
        let begun = Instant::now();
        watchdog.stop().unwrap();
        assert!(begun.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_zero_interval_is_refused() {
        let lm = Arc::new(Layermanager::new(DisplayConfig::default()));
        let watchdog = WatchdogMonitor::with_interval(context_for(&lm).executor_weak(), Duration::ZERO);
        assert!(watchdog.start().is_err());
    }
}
