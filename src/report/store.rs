use chrono::{DateTime, Utc};

use crate::report::error::ReportError;
use crate::report::QuizReport;

/// Writes results into the `results` table of a Supabase project through its REST API.
#[derive(Debug, Clone)]
pub struct ResultStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, serde::Serialize)]
struct ResultRow<'a> {
    email: &'a str,
    game: &'a str,
    score: f64,
    completed_at: DateTime<Utc>,
}

impl<'a> From<&'a QuizReport> for ResultRow<'a> {
    fn from(report: &'a QuizReport) -> Self {
        Self {
            email: &report.email,
            game: &report.game,
            score: report.score,
            completed_at: report.completed_at,
        }
    }
}

impl ResultStore {
    pub fn new(client: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/results", self.base_url)
    }

    pub async fn save(&self, report: &QuizReport) -> Result<(), ReportError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=minimal")
            .json(&[ResultRow::from(report)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Rejected {
                sink: "result store",
                status,
                body,
            });
        }
        Ok(())
    }
}
