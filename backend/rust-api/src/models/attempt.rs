use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::{bson_datetime_as_chrono, bson_datetime_as_chrono_option, Difficulty};

/// One recorded answer, keyed by question index. At most one entry per index
/// exists in an attempt; a resubmission replaces the previous entry wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    #[serde(rename = "questionIndex")]
    pub question_index: u32,
    #[serde(rename = "selectedOption")]
    pub selected_option: u32,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    pub points: u32,
}

/// Quiz attempt stored in the MongoDB "quiz_attempts" collection.
///
/// At most one incomplete attempt exists per (user, quiz) pair; once
/// `completed` flips to true the document is immutable. `score` and
/// `percentage` are recomputed from `answers` at completion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub quiz: ObjectId,
    pub user: ObjectId,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub percentage: u32,
    /// Seconds, as reported by the client at completion
    #[serde(rename = "timeSpent", default)]
    pub time_spent: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        rename = "completedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

/// Attempt as returned to clients
#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub id: String,
    pub quiz: String,
    pub user: String,
    pub answers: Vec<Answer>,
    pub score: u32,
    pub percentage: u32,
    #[serde(rename = "timeSpent")]
    pub time_spent: u64,
    pub completed: bool,
    #[serde(rename = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<QuizAttempt> for AttemptView {
    fn from(attempt: QuizAttempt) -> Self {
        AttemptView {
            id: attempt.id.map(|id| id.to_hex()).unwrap_or_default(),
            quiz: attempt.quiz.to_hex(),
            user: attempt.user.to_hex(),
            answers: attempt.answers,
            score: attempt.score,
            percentage: attempt.percentage,
            time_spent: attempt.time_spent,
            completed: attempt.completed,
            completed_at: attempt.completed_at,
            created_at: attempt.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    #[serde(rename = "questionIndex")]
    pub question_index: u32,
    #[serde(rename = "selectedOption")]
    pub selected_option: u32,
}

/// Per-question feedback returned after a submission. The running total is
/// deliberately absent: the overall score is only authoritative once the
/// attempt is completed.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerData {
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteAttemptRequest {
    #[serde(rename = "timeSpent")]
    pub time_spent: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CompletionData {
    pub score: u32,
    #[serde(rename = "totalPoints")]
    pub total_points: u32,
    pub percentage: u32,
    #[serde(rename = "timeSpent")]
    pub time_spent: u64,
    pub answers: Vec<Answer>,
}

/// Quiz fields attached to entries of GET /api/quiz/my/attempts
#[derive(Debug, Serialize)]
pub struct AttemptQuizSummary {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(rename = "totalPoints")]
    pub total_points: u32,
}

#[derive(Debug, Serialize)]
pub struct MyAttemptView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<AttemptQuizSummary>,
    pub score: u32,
    pub percentage: u32,
    #[serde(rename = "timeSpent")]
    pub time_spent: u64,
    pub completed: bool,
    #[serde(rename = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Fixed five-bucket grade distribution over attempt percentages.
/// Bounds are half-open except A, which includes 100.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ScoreDistribution {
    #[serde(rename = "A (90-100%)")]
    pub a: u64,
    #[serde(rename = "B (80-89%)")]
    pub b: u64,
    #[serde(rename = "C (70-79%)")]
    pub c: u64,
    #[serde(rename = "D (60-69%)")]
    pub d: u64,
    #[serde(rename = "F (Below 60%)")]
    pub f: u64,
}

#[derive(Debug, Serialize)]
pub struct QuizStatistics {
    #[serde(rename = "totalAttempts")]
    pub total_attempts: u64,
    #[serde(rename = "averageScore")]
    pub average_score: u32,
    #[serde(rename = "scoreDistribution")]
    pub score_distribution: ScoreDistribution,
    #[serde(rename = "recentAttempts")]
    pub recent_attempts: Vec<AttemptView>,
}
