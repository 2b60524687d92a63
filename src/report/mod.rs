pub mod error;
pub mod store;
pub mod webhook;

use chrono::{DateTime, Utc};

use crate::quiz::scoring::ScoreBreakdown;
use store::ResultStore;
use webhook::Webhook;

/// What a finished quiz sends to the outside world.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizReport {
    pub email: String,
    pub game: String,
    pub score: f64,
    pub correct_answers: i64,
    pub time_used: i64,
    pub completed_at: DateTime<Utc>,
}

impl QuizReport {
    pub fn new(email: &str, game: &str, breakdown: &ScoreBreakdown, completed_at: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            game: game.to_string(),
            score: breakdown.final_score,
            correct_answers: breakdown.correct_answers,
            time_used: breakdown.time_used,
            completed_at,
        }
    }
}

/// Fans a report out to every configured sink.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    pub store: Option<ResultStore>,
    pub webhook: Option<Webhook>,
}

impl Reporter {
    pub fn new(store: Option<ResultStore>, webhook: Option<Webhook>) -> Self {
        Self { store, webhook }
    }

    pub fn sink_count(&self) -> usize {
        self.store.is_some() as usize + self.webhook.is_some() as usize
    }

    /// Sends the report in the background. Failures are logged, never returned:
    /// a broken sink must not hold up the participant's results.
    pub fn dispatch(&self, report: QuizReport) {
        if let Some(store) = self.store.clone() {
            let report = report.clone();
            tokio::spawn(async move {
                match store.save(&report).await {
                    Ok(()) => log::info!("Saved quiz result for {}", report.email),
                    Err(e) => log::error!("Error saving quiz result for {}: {}", report.email, e),
                }
            });
        }
        if let Some(webhook) = self.webhook.clone() {
            tokio::spawn(async move {
                match webhook.send(&report).await {
                    Ok(()) => log::info!("Sent quiz result for {} to webhook", report.email),
                    Err(e) => log::error!("Error sending results to webhook: {}", e),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::scoring::score;
    use chrono::TimeZone;

    #[test]
    fn report_takes_final_score_and_counters() {
        let completed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 0).unwrap();
        let report = QuizReport::new("a@b.co", "General Knowledge Quiz", &score(7, 10, 60.0, 120), completed_at);

        assert_eq!(report.score, 6.0);
        assert_eq!(report.correct_answers, 7);
        assert_eq!(report.time_used, 60);
        assert_eq!(report.game, "General Knowledge Quiz");
    }

    #[tokio::test]
    async fn dispatch_without_sinks_does_nothing() {
        let reporter = Reporter::default();
        assert_eq!(reporter.sink_count(), 0);
        reporter.dispatch(QuizReport::new("a@b.co", "quiz", &score(1, 1, 1.0, 1), Utc::now()));
    }
}
