//! Tick observers
//!
//! Status reporting is a side effect hung off the tick loop, never part of
//! the dynamics. Any `FnMut(&TickReport)` closure is an observer.

use crate::federation::TickReport;

/// Called once after every completed tick
pub trait TickObserver: Send {
    fn on_tick(&mut self, report: &TickReport);
}

impl<F> TickObserver for F
where
    F: FnMut(&TickReport) + Send,
{
    fn on_tick(&mut self, report: &TickReport) {
        self(report)
    }
}

/// Emits an aggregate status event every `interval` ticks
#[derive(Debug, Clone)]
pub struct TracingObserver {
    interval: u64,
}

impl TracingObserver {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    fn due(&self, tick: u64) -> bool {
        tick % self.interval == 0
    }
}

impl TickObserver for TracingObserver {
    fn on_tick(&mut self, report: &TickReport) {
        if !self.due(report.tick) {
            return;
        }
        tracing::info!(
            tick = report.tick,
            average_integration = report.average_integration,
            average_coherence = report.average_coherence,
            global_coherence = report.global_coherence,
            external_input = report.external_input,
            mode = %report.mode,
            "Federation status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_observer_schedule() {
        let observer = TracingObserver::new(10);
        assert!(observer.due(10));
        assert!(observer.due(20));
        assert!(!observer.due(15));
        assert_eq!(TracingObserver::new(0).interval(), 1);
    }
}
