//! The pipeline coordinator.
//!
//! One question moves through a closed set of states:
//!
//! ```text
//! received -> enhancing -> schema-fetch -> prompting -> completing
//!          -> sanitizing -> executing -> recorded -> done
//! ```
//!
//! Each state advances only when its component succeeds. Any failure moves
//! straight to `failed`, which still finalizes and records the trace. No
//! state is entered twice and nothing is retried.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use enum_iterator::Sequence;
use serde::Serialize;
use tracing::{info_span, Instrument};

use nl_sql_configuration::version1::DEFAULT_MODEL;
use query_engine_completion::{invoke, CompletionCapability};
use query_engine_execution::metrics::Metrics;
use query_engine_execution::{ExecutionResult, RelationalEngine};
use query_engine_metadata::metadata::SchemaDescription;
use query_engine_translation::translation::{
    build_prompt, enhance, enhancer, sanitize, EnhancedQuery, Prompt, PromptSettings, Question,
    RawCompletion, SanitizedSql,
};

use crate::error::{ErrorKind, PipelineError, StageError};
use crate::observability::{Outcome, PendingTrace, Recorder, Trace};
use crate::schema::SchemaProvider;

/// Where a question is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Sequence)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineState {
    Received,
    Enhancing,
    SchemaFetch,
    Prompting,
    Completing,
    Sanitizing,
    Executing,
    Recorded,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Received => "received",
            PipelineState::Enhancing => "enhancing",
            PipelineState::SchemaFetch => "schema-fetch",
            PipelineState::Prompting => "prompting",
            PipelineState::Completing => "completing",
            PipelineState::Sanitizing => "sanitizing",
            PipelineState::Executing => "executing",
            PipelineState::Recorded => "recorded",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }

    /// The state entered when this one succeeds.
    pub fn next(self) -> Option<PipelineState> {
        match self {
            PipelineState::Received => Some(PipelineState::Enhancing),
            PipelineState::Enhancing => Some(PipelineState::SchemaFetch),
            PipelineState::SchemaFetch => Some(PipelineState::Prompting),
            PipelineState::Prompting => Some(PipelineState::Completing),
            PipelineState::Completing => Some(PipelineState::Sanitizing),
            PipelineState::Sanitizing => Some(PipelineState::Executing),
            PipelineState::Executing => Some(PipelineState::Recorded),
            PipelineState::Recorded => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a caller gets back for a successful question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub enhanced_query: String,
    pub sql: String,
    pub result: ExecutionResult,
    pub trace: Trace,
}

/// A state together with the data produced so far.
enum Stage {
    Received(String),
    Enhancing(Question),
    SchemaFetch(EnhancedQuery),
    Prompting {
        enhanced: EnhancedQuery,
        schema: SchemaDescription,
    },
    Completing {
        enhanced: EnhancedQuery,
        prompt: Prompt,
    },
    Sanitizing {
        enhanced: EnhancedQuery,
        raw: RawCompletion,
    },
    Executing {
        enhanced: EnhancedQuery,
        sql: SanitizedSql,
    },
    Recorded {
        enhanced: EnhancedQuery,
        sql: SanitizedSql,
        result: ExecutionResult,
    },
    Done(ResponsePayload),
}

impl Stage {
    fn state(&self) -> PipelineState {
        match self {
            Stage::Received(_) => PipelineState::Received,
            Stage::Enhancing(_) => PipelineState::Enhancing,
            Stage::SchemaFetch(_) => PipelineState::SchemaFetch,
            Stage::Prompting { .. } => PipelineState::Prompting,
            Stage::Completing { .. } => PipelineState::Completing,
            Stage::Sanitizing { .. } => PipelineState::Sanitizing,
            Stage::Executing { .. } => PipelineState::Executing,
            Stage::Recorded { .. } => PipelineState::Recorded,
            Stage::Done(_) => PipelineState::Done,
        }
    }
}

/// Sequences the components for each question.
pub struct Pipeline {
    schema_provider: Arc<dyn SchemaProvider>,
    completion: Arc<dyn CompletionCapability>,
    engine: Arc<dyn RelationalEngine>,
    recorder: Arc<Recorder>,
    metrics: Option<Metrics>,
    model: String,
    prompt_settings: PromptSettings,
    today: Option<NaiveDate>,
}

impl Pipeline {
    pub fn new(
        schema_provider: Arc<dyn SchemaProvider>,
        completion: Arc<dyn CompletionCapability>,
        engine: Arc<dyn RelationalEngine>,
        recorder: Arc<Recorder>,
    ) -> Self {
        Pipeline {
            schema_provider,
            completion,
            engine,
            recorder,
            metrics: None,
            model: DEFAULT_MODEL.to_string(),
            prompt_settings: PromptSettings::default(),
            today: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_prompt_settings(mut self, prompt_settings: PromptSettings) -> Self {
        self.prompt_settings = prompt_settings;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Use a fixed date instead of the local calendar when adding date context.
    #[must_use]
    pub fn with_fixed_date(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn recorder(&self) -> &Arc<Recorder> {
        &self.recorder
    }

    pub fn engine(&self) -> &Arc<dyn RelationalEngine> {
        &self.engine
    }

    /// Answer one question.
    pub async fn run(&self, question: &str) -> Result<ResponsePayload, PipelineError> {
        self.run_observed(question, |_| {}).await
    }

    /// Answer one question, reporting every state entered to `observer`.
    pub async fn run_observed<F>(
        &self,
        question: &str,
        mut observer: F,
    ) -> Result<ResponsePayload, PipelineError>
    where
        F: FnMut(PipelineState) + Send,
    {
        let mut trace = self.recorder.start(question);
        let span = info_span!("Answer question", trace_id = %trace.trace_id());

        async {
            let mut stage = Stage::Received(question.to_string());
            observer(PipelineState::Received);
            loop {
                let state = stage.state();
                let started = Instant::now();
                let next = match stage {
                    Stage::Done(payload) => return Ok(payload),
                    stage => self.advance(stage, &mut trace).await,
                };
                match next {
                    Ok(next) => {
                        tracing::debug!(
                            from = %state,
                            to = %next.state(),
                            latency_ms = started.elapsed().as_millis(),
                            "Stage finished"
                        );
                        observer(next.state());
                        stage = next;
                    }
                    Err(error) => {
                        observer(PipelineState::Failed);
                        return Err(self.fail(state, &error, &trace));
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn advance(&self, stage: Stage, trace: &mut PendingTrace) -> Result<Stage, StageError> {
        match stage {
            Stage::Received(text) => Ok(Stage::Enhancing(Question::new(text)?)),
            Stage::Enhancing(question) => {
                let enhanced = info_span!("Enhance question").in_scope(|| match self.today {
                    Some(today) => enhance(&question, today),
                    None => enhancer::enhance_now(&question),
                });
                tracing::info!(
                    normalized = enhanced.normalized(),
                    date_context = ?enhanced.date_context(),
                    enhanced_query = enhanced.as_str(),
                    "Enhanced question"
                );
                trace.set_enhanced_query(enhanced.as_str());
                Ok(Stage::SchemaFetch(enhanced))
            }
            Stage::SchemaFetch(enhanced) => {
                let schema = self
                    .schema_provider
                    .schema()
                    .instrument(info_span!(
                        "Fetch schema",
                        strategy = self.schema_provider.strategy()
                    ))
                    .await?;
                Ok(Stage::Prompting { enhanced, schema })
            }
            Stage::Prompting { enhanced, schema } => {
                let prompt = info_span!("Build prompt")
                    .in_scope(|| build_prompt(&enhanced, &schema, &self.prompt_settings))?;
                Ok(Stage::Completing { enhanced, prompt })
            }
            Stage::Completing { enhanced, prompt } => {
                let raw = invoke(self.completion.as_ref(), &self.model, &prompt)
                    .instrument(info_span!(
                        "Invoke completion",
                        capability = self.completion.name(),
                        model = %self.model
                    ))
                    .await?;
                Ok(Stage::Sanitizing { enhanced, raw })
            }
            Stage::Sanitizing { enhanced, raw } => {
                let sql = info_span!("Sanitize completion").in_scope(|| sanitize(raw.as_str()))?;
                tracing::info!(sql = sql.as_str(), "Generated statement");
                trace.set_sql(sql.as_str());
                Ok(Stage::Executing { enhanced, sql })
            }
            Stage::Executing { enhanced, sql } => {
                let result = self
                    .engine
                    .execute(sql.as_str())
                    .instrument(info_span!("Execute statement"))
                    .await?;
                trace.set_row_count(result.row_count());
                Ok(Stage::Recorded {
                    enhanced,
                    sql,
                    result,
                })
            }
            Stage::Recorded {
                enhanced,
                sql,
                result,
            } => {
                let finished = trace.finish(Outcome::Success, None);
                self.recorder.record(finished.clone());
                if let Some(metrics) = &self.metrics {
                    metrics.record_query();
                    metrics.observe_latency(Duration::from_millis(finished.latency_ms));
                }
                tracing::info!(
                    latency_ms = finished.latency_ms,
                    row_count = finished.row_count,
                    "Question answered"
                );
                Ok(Stage::Done(ResponsePayload {
                    enhanced_query: enhanced.into_string(),
                    sql: sql.into_string(),
                    result,
                    trace: finished,
                }))
            }
            Stage::Done(payload) => Ok(Stage::Done(payload)),
        }
    }

    /// The single failure sink: finalize the trace and build the caller's error.
    fn fail(&self, state: PipelineState, error: &StageError, trace: &PendingTrace) -> PipelineError {
        let kind = error.kind();
        let message = error.to_string();

        let finished = trace.finish(Outcome::Failed(kind), Some(message.clone()));
        self.recorder.record(finished.clone());
        if let Some(metrics) = &self.metrics {
            metrics.record_error(kind.as_str());
            metrics.observe_latency(Duration::from_millis(finished.latency_ms));
        }

        tracing::error!(
            meta.signal_type = "log",
            event.domain = "nl-sql",
            event.name = "Pipeline error",
            name = "Pipeline error",
            body = %error,
            error = true,
            kind = kind.as_str(),
            state = %state,
        );

        PipelineError {
            kind,
            category: kind.category(),
            message,
            failed_in: state,
            sql: if kind == ErrorKind::ExecutionError {
                trace.sql().map(str::to_string)
            } else {
                None
            },
            trace: finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_advance_in_a_single_line() {
        let mut state = PipelineState::Received;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            visited.push(next);
            state = next;
        }
        assert_eq!(
            visited,
            enum_iterator::all::<PipelineState>()
                .filter(|state| *state != PipelineState::Failed)
                .collect::<Vec<_>>()
        );
        assert!(state.is_terminal());
    }

    #[test]
    fn only_done_and_failed_are_terminal() {
        for state in enum_iterator::all::<PipelineState>() {
            assert_eq!(state.is_terminal(), state.next().is_none(), "{state}");
        }
    }

    #[test]
    fn states_serialize_in_kebab_case() {
        assert_eq!(
            serde_json::to_value(PipelineState::SchemaFetch).unwrap(),
            "schema-fetch"
        );
    }
}
