//! Per-request traces and the bounded history they are kept in.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};

use crate::error::ErrorKind;

/// Number of characters in a trace identifier.
pub const TRACE_ID_LENGTH: usize = 8;

/// A short random token identifying one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// The first eight hex digits of a random UUID.
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(TRACE_ID_LENGTH);
        TraceId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed(ErrorKind),
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed(kind) => kind.as_str(),
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A finalized record of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub trace_id: TraceId,
    pub timestamp: DateTime<Utc>,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub latency_ms: u64,
    pub row_count: usize,
}

/// A trace whose request is still running. The coordinator fills it in at
/// each stage boundary.
#[derive(Debug)]
pub struct PendingTrace {
    trace_id: TraceId,
    timestamp: DateTime<Utc>,
    started: Instant,
    question: String,
    enhanced_query: Option<String>,
    sql: Option<String>,
    row_count: usize,
}

impl PendingTrace {
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    pub fn set_enhanced_query(&mut self, enhanced_query: impl Into<String>) {
        self.enhanced_query = Some(enhanced_query.into());
    }

    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = Some(sql.into());
    }

    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
    }

    /// Stop the clock and produce the finalized record.
    pub fn finish(&self, outcome: Outcome, error_message: Option<String>) -> Trace {
        let latency_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Trace {
            trace_id: self.trace_id.clone(),
            timestamp: self.timestamp,
            question: self.question.clone(),
            enhanced_query: self.enhanced_query.clone(),
            sql: self.sql.clone(),
            outcome,
            error_message,
            latency_ms,
            row_count: self.row_count,
        }
    }
}

/// Aggregate statistics over the retained history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub error: usize,
    /// Percentage of successful requests, rounded to one decimal.
    pub success_rate: f64,
    pub avg_latency_ms: u64,
}

/// The process-wide trace history.
///
/// Holds at most `capacity` traces; recording into a full history evicts the
/// oldest trace. All mutation goes through [`Recorder::record`].
#[derive(Debug)]
pub struct Recorder {
    capacity: usize,
    history: RwLock<VecDeque<Trace>>,
}

impl Recorder {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Recorder {
            capacity,
            history: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.read().is_empty()
    }

    /// Begin tracing a request. The identifier is unique within the
    /// retained history.
    pub fn start(&self, question: impl Into<String>) -> PendingTrace {
        let trace_id = {
            let history = self.history.read();
            loop {
                let candidate = TraceId::generate();
                if !history.iter().any(|trace| trace.trace_id == candidate) {
                    break candidate;
                }
            }
        };
        PendingTrace {
            trace_id,
            timestamp: Utc::now(),
            started: Instant::now(),
            question: question.into(),
            enhanced_query: None,
            sql: None,
            row_count: 0,
        }
    }

    /// Append a finalized trace, evicting the oldest when full.
    pub fn record(&self, trace: Trace) {
        let mut history = self.history.write();
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(trace);
    }

    pub fn get(&self, trace_id: &str) -> Option<Trace> {
        self.history
            .read()
            .iter()
            .find(|trace| trace.trace_id.as_str() == trace_id)
            .cloned()
    }

    /// Up to `limit` traces, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Trace> {
        self.history.read().iter().rev().take(limit).cloned().collect()
    }

    /// Identifiers of every retained trace, oldest first.
    pub fn trace_ids(&self) -> Vec<TraceId> {
        self.history
            .read()
            .iter()
            .map(|trace| trace.trace_id.clone())
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let history = self.history.read();
        let total = history.len();
        let success = history
            .iter()
            .filter(|trace| trace.outcome.is_success())
            .count();
        let latency_total: u64 = history.iter().map(|trace| trace.latency_ms).sum();

        #[allow(clippy::cast_precision_loss)]
        let success_rate = if total == 0 {
            0.0
        } else {
            (success as f64 / total as f64 * 1000.0).round() / 10.0
        };

        Summary {
            total,
            success,
            error: total - success,
            success_rate,
            avg_latency_ms: if total == 0 {
                0
            } else {
                latency_total / total as u64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(recorder: &Recorder, question: &str, outcome: Outcome, latency_ms: u64) -> Trace {
        let mut trace = recorder.start(question).finish(outcome, None);
        trace.latency_ms = latency_ms;
        recorder.record(trace.clone());
        trace
    }

    #[test]
    fn trace_ids_are_eight_hex_characters() {
        for _ in 0..100 {
            let id = TraceId::generate();
            assert_eq!(id.as_str().len(), TRACE_ID_LENGTH);
            assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn history_is_bounded_and_evicts_the_oldest() {
        let recorder = Recorder::new(3);
        let first = finished(&recorder, "one", Outcome::Success, 1);
        for question in ["two", "three", "four"] {
            finished(&recorder, question, Outcome::Success, 1);
        }

        assert_eq!(recorder.len(), 3);
        assert!(recorder.get(first.trace_id.as_str()).is_none());
        let questions: Vec<String> = recorder
            .recent(10)
            .into_iter()
            .map(|trace| trace.question)
            .collect();
        assert_eq!(questions, vec!["four", "three", "two"]);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let recorder = Recorder::new(10);
        for question in ["a", "b", "c"] {
            finished(&recorder, question, Outcome::Success, 1);
        }
        let recent = recorder.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question, "c");
        assert_eq!(recent[1].question, "b");
    }

    #[test]
    fn traces_can_be_found_by_id() {
        let recorder = Recorder::new(10);
        let trace = finished(&recorder, "a", Outcome::Failed(ErrorKind::CompletionEmpty), 5);
        assert_eq!(recorder.get(trace.trace_id.as_str()), Some(trace.clone()));
        assert_eq!(recorder.trace_ids(), vec![trace.trace_id]);
        assert_eq!(recorder.get("missing!"), None);
    }

    #[test]
    fn summary_counts_outcomes() {
        let recorder = Recorder::new(10);
        finished(&recorder, "a", Outcome::Success, 10);
        finished(&recorder, "b", Outcome::Success, 20);
        finished(&recorder, "c", Outcome::Failed(ErrorKind::ExecutionError), 31);

        assert_eq!(
            recorder.summary(),
            Summary {
                total: 3,
                success: 2,
                error: 1,
                success_rate: 66.7,
                avg_latency_ms: 20,
            }
        );
    }

    #[test]
    fn an_empty_history_has_a_zero_summary() {
        let summary = Recorder::new(5).summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.avg_latency_ms, 0);
    }

    #[test]
    fn outcomes_serialize_as_kind_names() {
        assert_eq!(
            serde_json::to_value(Outcome::Failed(ErrorKind::SanitizerEmpty)).unwrap(),
            "sanitizer-empty"
        );
        assert_eq!(serde_json::to_value(Outcome::Success).unwrap(), "success");
    }

    #[test]
    fn concurrent_recording_keeps_every_trace() {
        let recorder = std::sync::Arc::new(Recorder::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|thread| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    for index in 0..50 {
                        let trace = recorder
                            .start(format!("{thread}-{index}"))
                            .finish(Outcome::Success, None);
                        recorder.record(trace);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(recorder.len(), 400);
    }
}
