use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::db::types::QuestionKind;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_answer_scored(kind: QuestionKind, is_correct: Option<bool>) {
    let outcome = match is_correct {
        Some(true) => "correct",
        Some(false) => "incorrect",
        None => "manual",
    };
    metrics::counter!(
        "answers_submitted_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub(crate) fn record_question_served(kind: Option<QuestionKind>) {
    let kind = kind.map(QuestionKind::as_str).unwrap_or("exhausted");
    metrics::counter!("questions_served_total", "kind" => kind).increment(1);
}

pub(crate) fn record_revocation_lookup_unavailable(reason: &'static str) {
    metrics::counter!("token_revocation_lookup_unavailable_total", "reason" => reason)
        .increment(1);
}
