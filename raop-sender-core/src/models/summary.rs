use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::audio_models::{AudioFormat, PipelineDiagnostics};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum SessionOutcome {
    /// The operator asked to quit while capturing.
    Quit,
    /// The operator declined to proceed without receivers.
    Aborted,
    /// A fatal error ended the session; teardown still ran.
    Failed(String),
}

/// Report produced once a session reaches `Stopped`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub service_type: String,
    /// Display names of the receivers found by discovery.
    pub devices: Vec<String>,
    pub format: Option<AudioFormat>,
    pub source_device: Option<String>,
    pub diagnostics: PipelineDiagnostics,
    /// Loudest reading seen during the session.
    pub max_peak: f32,
    pub outcome: SessionOutcome,
}

impl SessionSummary {
    pub fn new(service_type: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            stopped_at: now,
            service_type: service_type.to_string(),
            devices: Vec::new(),
            format: None,
            source_device: None,
            diagnostics: PipelineDiagnostics::default(),
            max_peak: 0.0,
            outcome: SessionOutcome::Quit,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        (self.stopped_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_carries_outcome_and_format() {
        let mut summary = SessionSummary::new("_raop._tcp.local.");
        summary.format = Some(AudioFormat::new(44100, 32, 2));
        summary.outcome = SessionOutcome::Failed("capture fault: device lost".into());

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["service_type"], "_raop._tcp.local.");
        assert_eq!(json["format"]["sample_rate_hz"], 44100);
        assert_eq!(json["outcome"]["kind"], "failed");
        assert_eq!(json["outcome"]["detail"], "capture fault: device lost");
    }

    #[test]
    fn fresh_summary_has_zero_duration() {
        let summary = SessionSummary::new("_raop._tcp.local.");
        assert_eq!(summary.duration_secs(), 0.0);
        assert!(summary.devices.is_empty());
    }
}
