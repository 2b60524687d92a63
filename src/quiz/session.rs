use chrono::{DateTime, Utc};

use crate::quiz::scoring::{self, ScoreBreakdown};
use crate::quiz::Question;

/// One participant's run through a sampled quiz.
///
/// Kept in the dialogue storage between messages, so it only holds plain data
/// and every time-dependent method takes `now` explicitly.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    pub email: String,
    pub questions: Vec<Question>,
    pub current: usize,
    pub correct: usize,
    pub started_at: DateTime<Utc>,
    pub time_limit_secs: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    Correct,
    Wrong { correct_option: Option<String> },
    /// The clock ran out before the answer arrived; it is not counted.
    Expired,
}

impl QuizSession {
    pub fn new(
        email: String,
        questions: Vec<Question>,
        time_limit_secs: i64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            email,
            questions,
            current: 0,
            correct: 0,
            started_at,
            time_limit_secs,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// 1-based number of the question being asked.
    pub fn question_number(&self) -> usize {
        self.current + 1
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.questions.len()
    }

    /// Seconds left on the clock, fractional, never negative.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = (now - self.started_at).num_milliseconds() as f64 / 1000.0;
        (self.time_limit_secs as f64 - elapsed).max(0.0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.time_remaining(now) <= 0.0
    }

    /// Records an answer to the current question and moves on to the next one.
    pub fn answer(&mut self, option: usize, now: DateTime<Utc>) -> AnswerOutcome {
        if self.is_expired(now) {
            return AnswerOutcome::Expired;
        }
        let Some(question) = self.questions.get(self.current) else {
            return AnswerOutcome::Expired;
        };

        let outcome = if question.is_correct(option) {
            self.correct += 1;
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Wrong {
                correct_option: question.correct_option().map(str::to_string),
            }
        };
        self.current += 1;
        outcome
    }

    pub fn breakdown(&self, now: DateTime<Utc>) -> ScoreBreakdown {
        scoring::score(
            self.correct as i64,
            self.questions.len() as i64,
            self.time_remaining(now),
            self.time_limit_secs,
        )
    }

    /// Breakdown for a quiz ended by the clock: nothing left to score for speed.
    pub fn timed_out_breakdown(&self) -> ScoreBreakdown {
        scoring::score(
            self.correct as i64,
            self.questions.len() as i64,
            0.0,
            self.time_limit_secs,
        )
    }
}
