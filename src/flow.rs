//! Dialogue transitions of a quiz.
//!
//! Every transition takes the chat's lock, reads the stored state, writes the
//! next one and only then hands back what should be sent, so a late answer and
//! the countdown can never both finish the same quiz.

use chrono::{DateTime, Utc};
use teloxide::dispatching::dialogue::{Dialogue, Storage};
use teloxide::types::ChatId;

use crate::quiz::chat_lock::ChatLocks;
use crate::quiz::scoring::ScoreBreakdown;
use crate::quiz::session::{AnswerOutcome, QuizSession};
use crate::quiz::Question;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveEmail,
    Quiz {
        session: QuizSession,
    },
    Results {
        email: String,
    },
}

enum QuizEnd {
    Completed(DateTime<Utc>),
    TimedOut,
}

/// A quiz that has just moved to `Results`.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedQuiz {
    pub email: String,
    pub breakdown: ScoreBreakdown,
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerStep {
    /// The chat is not in a running quiz any more, the countdown got there first.
    Ignored,
    /// The reply matched none of the options of this question.
    Unrecognized(Question),
    Next {
        outcome: AnswerOutcome,
        session: QuizSession,
    },
    Finished {
        outcome: Option<AnswerOutcome>,
        finished: FinishedQuiz,
    },
}

/// Stores a freshly sampled session. A session without questions finishes on the spot.
pub async fn begin<S>(
    dialogue: &Dialogue<State, S>,
    locks: &ChatLocks<ChatId>,
    session: QuizSession,
    now: DateTime<Utc>,
) -> Result<Option<FinishedQuiz>, S::Error>
where
    S: Storage<State> + Send + Sync + ?Sized,
{
    let _guard = locks.lock(dialogue.chat_id()).await;
    if session.is_finished() {
        return finish(dialogue, session, QuizEnd::Completed(now)).await.map(Some);
    }
    dialogue.update(State::Quiz { session }).await?;
    Ok(None)
}

pub async fn answer<S>(
    dialogue: &Dialogue<State, S>,
    locks: &ChatLocks<ChatId>,
    reply: Option<&str>,
    now: DateTime<Utc>,
) -> Result<AnswerStep, S::Error>
where
    S: Storage<State> + Send + Sync + ?Sized,
{
    let _guard = locks.lock(dialogue.chat_id()).await;
    let Some(State::Quiz { mut session }) = dialogue.get().await? else {
        return Ok(AnswerStep::Ignored);
    };

    if session.is_expired(now) {
        let finished = finish(dialogue, session, QuizEnd::TimedOut).await?;
        return Ok(AnswerStep::Finished {
            outcome: Some(AnswerOutcome::Expired),
            finished,
        });
    }
    let Some(question) = session.current_question() else {
        let finished = finish(dialogue, session, QuizEnd::Completed(now)).await?;
        return Ok(AnswerStep::Finished {
            outcome: None,
            finished,
        });
    };
    let Some(option) = reply.and_then(|text| question.parse_reply(text)) else {
        return Ok(AnswerStep::Unrecognized(question.clone()));
    };

    let outcome = session.answer(option, now);
    let end = match outcome {
        AnswerOutcome::Expired => Some(QuizEnd::TimedOut),
        _ if session.is_finished() => Some(QuizEnd::Completed(now)),
        _ => None,
    };
    if let Some(end) = end {
        let finished = finish(dialogue, session, end).await?;
        return Ok(AnswerStep::Finished {
            outcome: Some(outcome),
            finished,
        });
    }

    dialogue
        .update(State::Quiz {
            session: session.clone(),
        })
        .await?;
    Ok(AnswerStep::Next { outcome, session })
}

/// Ends the quiz started at `started_at` if it is still the one running.
pub async fn expire<S>(
    dialogue: &Dialogue<State, S>,
    locks: &ChatLocks<ChatId>,
    started_at: DateTime<Utc>,
) -> Result<Option<FinishedQuiz>, S::Error>
where
    S: Storage<State> + Send + Sync + ?Sized,
{
    let _guard = locks.lock(dialogue.chat_id()).await;
    match dialogue.get().await? {
        Some(State::Quiz { session }) if session.started_at == started_at => {
            finish(dialogue, session, QuizEnd::TimedOut).await.map(Some)
        }
        _ => Ok(None),
    }
}

// Caller holds the chat lock.
async fn finish<S>(
    dialogue: &Dialogue<State, S>,
    session: QuizSession,
    end: QuizEnd,
) -> Result<FinishedQuiz, S::Error>
where
    S: Storage<State> + Send + Sync + ?Sized,
{
    let (breakdown, timed_out) = match end {
        QuizEnd::Completed(now) => (session.breakdown(now), false),
        QuizEnd::TimedOut => (session.timed_out_breakdown(), true),
    };
    dialogue
        .update(State::Results {
            email: session.email.clone(),
        })
        .await?;
    Ok(FinishedQuiz {
        email: session.email,
        breakdown,
        timed_out,
    })
}
