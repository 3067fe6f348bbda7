//! Operation timing owned by whoever drives the engine.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct OperationToken {
    name: &'static str,
    started_at: Instant,
}

impl OperationToken {
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            started_at: Instant::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationOutcome {
    Success,
    Failure,
}

pub trait TelemetrySink: Send {
    fn start_operation(&mut self, name: &'static str) -> OperationToken {
        OperationToken::start(name)
    }

    fn end_operation(&mut self, token: OperationToken, outcome: OperationOutcome);
}

/// Emits one `tracing` event per finished operation.
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn end_operation(&mut self, token: OperationToken, outcome: OperationOutcome) {
        let elapsed = token.elapsed();
        tracing::debug!(
            operation = token.name(),
            elapsed_us = elapsed.as_micros() as u64,
            ?outcome,
            "operation finished"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub name: &'static str,
    pub duration: Duration,
    pub outcome: OperationOutcome,
}

/// Keeps every finished operation in memory.
#[derive(Debug, Default)]
pub struct OperationLog {
    records: Vec<OperationRecord>,
}

impl OperationLog {
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    pub fn count(&self, name: &str) -> usize {
        self.records.iter().filter(|r| r.name == name).count()
    }
}

impl TelemetrySink for OperationLog {
    fn end_operation(&mut self, token: OperationToken, outcome: OperationOutcome) {
        self.records.push(OperationRecord {
            name: token.name(),
            duration: token.elapsed(),
            outcome,
        });
    }
}

/// Lets a caller keep a handle on a sink it hands to the engine.
/// A poisoned lock drops the record rather than failing the operation.
impl<T: TelemetrySink> TelemetrySink for Arc<Mutex<T>> {
    fn start_operation(&mut self, name: &'static str) -> OperationToken {
        match self.lock() {
            Ok(mut sink) => sink.start_operation(name),
            Err(_) => OperationToken::start(name),
        }
    }

    fn end_operation(&mut self, token: OperationToken, outcome: OperationOutcome) {
        if let Ok(mut sink) = self.lock() {
            sink.end_operation(token, outcome);
        }
    }
}

pub fn outcome_of<T, E>(result: &Result<T, E>) -> OperationOutcome {
    if result.is_ok() {
        OperationOutcome::Success
    } else {
        OperationOutcome::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_records_outcomes_in_order() {
        let mut log = OperationLog::default();
        let first = log.start_operation("generate");
        let second = log.start_operation("strategy.debt");
        log.end_operation(second, OperationOutcome::Success);
        log.end_operation(first, OperationOutcome::Failure);

        let names: Vec<&str> = log.records().iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["strategy.debt", "generate"]);
        assert_eq!(log.records()[1].outcome, OperationOutcome::Failure);
        assert_eq!(log.count("generate"), 1);
    }

    #[test]
    fn token_reports_its_operation() {
        let token = OperationToken::start("advice.generate");
        assert_eq!(token.name(), "advice.generate");
        assert!(token.elapsed() >= Duration::ZERO);
    }

    #[test]
    fn shared_log_sees_records_from_a_cloned_handle() {
        let shared = Arc::new(Mutex::new(OperationLog::default()));
        let mut handle = Arc::clone(&shared);
        let token = handle.start_operation("compare");
        handle.end_operation(token, outcome_of::<(), ()>(&Ok(())));

        let log = shared.lock().expect("log lock");
        assert_eq!(log.count("compare"), 1);
        assert_eq!(log.records()[0].outcome, OperationOutcome::Success);
    }
}
