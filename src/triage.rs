//! Symptom triage through a hosted generative model.
//!
//! [`TriageAdvisor::analyze`] always produces a report. Transport, HTTP and parsing
//! failures from the [`TriageModel`] are logged and replaced by [`fallback_report`].

use crate::models::{Severity, TriageReport};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

const SYSTEM_INSTRUCTION: &str = "You are MedX AI, a medical triage assistant. \
Analyze the user's symptoms and categorize them into one of three severity levels: \
1. 'normal': Mild issues like common cold, slight headache. Suggest home remedies. \
2. 'moderate': Persisting issues requiring professional look. Suggest doctor consultation. \
3. 'severe': Critical issues like chest pain, severe breathing trouble, major trauma. \
Suggest emergency dispatch immediately. \
Provide helpful, calm advice.";

const FALLBACK_ADVICE: &str = "I'm having trouble connecting to the medical database. \
Please consult a doctor manually if you feel unwell.";
const FALLBACK_ACTION: &str = "Monitor symptoms";

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("No API key configured for the triage model")]
    MissingApiKey,

    #[error("Cannot reach triage endpoint at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Triage endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse triage response: {0}")]
    ResponseParsing(String),
}

/// A model that classifies free-text symptoms.
pub trait TriageModel: Send + Sync {
    fn classify(&self, symptoms: &str) -> Result<TriageReport, TriageError>;
}

/// The report returned whenever the model cannot be used.
pub fn fallback_report() -> TriageReport {
    TriageReport {
        severity: Severity::Normal,
        advice: FALLBACK_ADVICE.to_string(),
        suggested_action: FALLBACK_ACTION.to_string(),
    }
}

/// The prompt sent for a patient's description.
pub fn build_prompt(symptoms: &str) -> String {
    format!("Patient reports the following symptoms: \"{symptoms}\". Analyze the condition.")
}

/// In-app flow a severity points the patient to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientFlow {
    BookConsultation,
    EmergencyDispatch,
}

impl PatientFlow {
    pub fn for_severity(severity: Severity) -> Option<PatientFlow> {
        match severity {
            Severity::Normal => None,
            Severity::Moderate => Some(PatientFlow::BookConsultation),
            Severity::Severe => Some(PatientFlow::EmergencyDispatch),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatientFlow::BookConsultation => "Book Consultation",
            PatientFlow::EmergencyDispatch => "Request Emergency Dispatch",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, TriageError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TriageError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.trim().to_string(),
            client,
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(symptoms: &str) -> Value {
        json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": build_prompt(symptoms) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "severity": { "type": "STRING", "enum": ["normal", "moderate", "severe"] },
                        "advice": { "type": "STRING" },
                        "suggestedAction": { "type": "STRING" }
                    },
                    "required": ["severity", "advice", "suggestedAction"]
                }
            }
        })
    }

    /// Pulls the report out of the first candidate's text part.
    fn parse_response(response: GenerateContentResponse) -> Result<TriageReport, TriageError> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| TriageError::ResponseParsing("response has no text".to_string()))?;

        serde_json::from_str(&text).map_err(|e| TriageError::ResponseParsing(e.to_string()))
    }
}

impl TriageModel for GeminiClient {
    fn classify(&self, symptoms: &str) -> Result<TriageReport, TriageError> {
        if self.api_key.is_empty() {
            return Err(TriageError::MissingApiKey);
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(symptoms))
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    TriageError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    TriageError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    TriageError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TriageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| TriageError::ResponseParsing(e.to_string()))?;

        Self::parse_response(parsed)
    }
}

/// Turns model failures into the fallback report.
pub struct TriageAdvisor {
    model: Box<dyn TriageModel>,
}

impl TriageAdvisor {
    pub fn new(model: Box<dyn TriageModel>) -> Self {
        Self { model }
    }

    /// Classifies `symptoms`. Never fails.
    pub fn analyze(&self, symptoms: &str) -> TriageReport {
        let symptoms = symptoms.trim();
        if symptoms.is_empty() {
            warn!("empty symptom text, returning fallback report");
            return fallback_report();
        }

        match self.model.classify(symptoms) {
            Ok(report) => {
                info!(severity = %report.severity, "triage completed");
                report
            }
            Err(e) => {
                error!(error = %e, "triage failed, returning fallback report");
                fallback_report()
            }
        }
    }
}

/// Model with a fixed answer, for tests.
#[cfg(test)]
pub(crate) struct CannedModel {
    pub response: Result<TriageReport, String>,
}

#[cfg(test)]
impl CannedModel {
    pub fn answering(severity: Severity) -> Self {
        Self {
            response: Ok(TriageReport {
                severity,
                advice: format!("{severity} advice"),
                suggested_action: format!("{severity} action"),
            }),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err("connection refused".to_string()),
        }
    }
}

#[cfg(test)]
impl TriageModel for CannedModel {
    fn classify(&self, _symptoms: &str) -> Result<TriageReport, TriageError> {
        self.response
            .clone()
            .map_err(TriageError::Connection)
    }
}
