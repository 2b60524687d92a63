/// Maximum of each half of the score; the final score tops out at twice this.
const HALF_WEIGHT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreBreakdown {
    /// Accuracy half, 0 to 5.
    pub points_score: f64,
    /// Speed half, 0 to 5.
    pub time_score: f64,
    /// 0 to 10.
    pub final_score: f64,
    pub correct_answers: i64,
    pub total_questions: i64,
    /// Whole seconds.
    pub time_used: i64,
    pub total_time: i64,
}

/// Weighted quiz score: half accuracy, half time left on the clock.
///
/// Never fails. Out-of-range input is clamped first: at least one question and
/// one second of budget, correct answers within `0..=total`, remaining time
/// within `0..=total_time`.
pub fn score(
    correct_answers: i64,
    total_questions: i64,
    time_remaining: f64,
    total_time: i64,
) -> ScoreBreakdown {
    let valid_total = total_questions.max(1);
    let valid_correct = correct_answers.clamp(0, valid_total);
    let valid_total_time = total_time.max(1);
    let valid_time_remaining = if time_remaining.is_nan() {
        0.0
    } else {
        time_remaining.clamp(0.0, valid_total_time as f64)
    };
    let time_used = valid_total_time as f64 - valid_time_remaining;

    let points_score = valid_correct as f64 / valid_total as f64 * HALF_WEIGHT;
    let time_score = valid_time_remaining / valid_total_time as f64 * HALF_WEIGHT;
    let final_score = points_score + time_score;

    ScoreBreakdown {
        points_score: round_to_tenth(points_score),
        time_score: round_to_tenth(time_score),
        final_score: round_to_tenth(final_score),
        correct_answers: valid_correct,
        total_questions: valid_total,
        time_used: time_used.round() as i64,
        total_time: valid_total_time,
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
