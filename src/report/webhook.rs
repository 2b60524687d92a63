use crate::report::error::ReportError;
use crate::report::QuizReport;

/// Posts finished quizzes to an HTTP endpoint as JSON.
#[derive(Debug, Clone)]
pub struct Webhook {
    client: reqwest::Client,
    url: String,
    element_id: String,
    game_name: String,
    location: String,
}

#[derive(Debug, serde::Serialize)]
struct WebhookPayload<'a> {
    email: &'a str,
    element_id: &'a str,
    game_name: &'a str,
    location: &'a str,
    score: f64,
    correct_answers: i64,
    time_used: i64,
}

impl Webhook {
    pub fn new(client: reqwest::Client, url: &str, element_id: &str, game_name: &str, location: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            element_id: element_id.to_string(),
            game_name: game_name.to_string(),
            location: location.to_string(),
        }
    }

    fn payload<'a>(&'a self, report: &'a QuizReport) -> WebhookPayload<'a> {
        WebhookPayload {
            email: &report.email,
            element_id: &self.element_id,
            game_name: &self.game_name,
            location: &self.location,
            score: report.score,
            correct_answers: report.correct_answers,
            time_used: report.time_used,
        }
    }

    pub async fn send(&self, report: &QuizReport) -> Result<(), ReportError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(report))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Rejected {
                sink: "webhook",
                status,
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report() -> QuizReport {
        QuizReport {
            email: "a@b.co".to_string(),
            game: "General Knowledge Quiz".to_string(),
            score: 4.4,
            correct_answers: 8,
            time_used: 110,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn payload_carries_score_fields() {
        let webhook = Webhook::new(reqwest::Client::new(), "https://hook.example/quiz", "04", "MCQ", "surat");
        let report = report();
        let payload = serde_json::to_value(webhook.payload(&report)).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "email": "a@b.co",
                "element_id": "04",
                "game_name": "MCQ",
                "location": "surat",
                "score": 4.4,
                "correct_answers": 8,
                "time_used": 110
            })
        );
    }

    #[tokio::test]
    async fn unreachable_webhook_is_an_error() {
        let webhook = Webhook::new(reqwest::Client::new(), "http://127.0.0.1:9/hook", "04", "MCQ", "surat");
        assert!(webhook.send(&report()).await.is_err());
    }
}
