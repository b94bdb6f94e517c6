use std::collections::HashMap;

use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::error::ApiError;
use crate::models::attempt::{
    Answer, AttemptQuizSummary, AttemptView, CompletionData, MyAttemptView, QuizAttempt,
    QuizStatistics, ScoreDistribution, SubmitAnswerData, SubmitAnswerRequest,
};
use crate::models::quiz::{total_points, Quiz};
use crate::utils::time::chrono_to_bson;

/// Number of completed attempts echoed back in quiz statistics
const RECENT_ATTEMPTS_LIMIT: usize = 10;

/// Completion rescoring passes before giving up on a churning attempt
const COMPLETE_RETRIES: usize = 3;

/// Outcome of starting an attempt: either a fresh document was inserted or an
/// existing incomplete attempt for the same (user, quiz) pair was picked up.
pub struct StartOutcome {
    pub attempt: AttemptView,
    pub resumed: bool,
}

pub struct AttemptService {
    mongo: Database,
}

impl AttemptService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> mongodb::Collection<QuizAttempt> {
        self.mongo.collection("quiz_attempts")
    }

    fn quizzes(&self) -> mongodb::Collection<Quiz> {
        self.mongo.collection("quizzes")
    }

    async fn load_quiz(&self, id: &ObjectId) -> Result<Quiz, ApiError> {
        self.quizzes()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
    }

    async fn load_attempt(&self, id: &ObjectId) -> Result<QuizAttempt, ApiError> {
        self.collection()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Quiz attempt not found".to_string()))
    }

    /// Start a new attempt, or resume the caller's incomplete attempt on the
    /// same quiz if one exists.
    ///
    /// A single upserting `update_one` keyed on (quiz, user, completed:false)
    /// makes this race-free: concurrent starts land on the same document, and
    /// `upserted_id` tells inserts apart from matches.
    pub async fn start(
        &self,
        quiz_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<StartOutcome, ApiError> {
        self.load_quiz(quiz_id).await?;

        let now = chrono_to_bson(chrono::Utc::now());
        let filter = doc! { "quiz": quiz_id, "user": user_id, "completed": false };
        // quiz/user/completed are copied from the equality filter on insert,
        // so they must not reappear under $setOnInsert.
        let update = doc! {
            "$setOnInsert": {
                "answers": [],
                "score": 0,
                "percentage": 0,
                "timeSpent": 0_i64,
                "createdAt": now,
                "updatedAt": now,
            }
        };

        let result = self
            .collection()
            .update_one(filter.clone(), update)
            .upsert(true)
            .await?;
        let resumed = result.upserted_id.is_none();

        let attempt = self
            .collection()
            .find_one(filter)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Upserted attempt not found")))?;

        if resumed {
            crate::metrics::record_attempt("resumed");
            tracing::debug!(attempt_id = %attempt.id.map(|id| id.to_hex()).unwrap_or_default(),
                "Resuming incomplete quiz attempt");
        } else {
            crate::metrics::record_attempt("started");
        }

        Ok(StartOutcome {
            attempt: AttemptView::from(attempt),
            resumed,
        })
    }

    /// Record an answer on an open attempt. Answering the same question again
    /// replaces the earlier answer (last write wins).
    pub async fn submit_answer(
        &self,
        attempt_id: &ObjectId,
        user_id: &ObjectId,
        req: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerData, ApiError> {
        let attempt = self.load_attempt(attempt_id).await?;

        if attempt.user != *user_id {
            return Err(ApiError::Forbidden(
                "Not authorized to update this attempt".to_string(),
            ));
        }
        if attempt.completed {
            return Err(ApiError::BadRequest(
                "Quiz attempt already completed".to_string(),
            ));
        }

        let quiz = self.load_quiz(&attempt.quiz).await?;
        let question = quiz
            .questions
            .get(req.question_index as usize)
            .ok_or_else(|| ApiError::BadRequest("Invalid question index".to_string()))?;
        let option = question
            .options
            .get(req.selected_option as usize)
            .ok_or_else(|| ApiError::BadRequest("Invalid option selected".to_string()))?;

        let is_correct = option.is_correct;
        let points = if is_correct { question.points } else { 0 };

        self.upsert_answer(attempt_id, req, is_correct, points)
            .await?;

        crate::metrics::record_answer(is_correct);

        Ok(SubmitAnswerData {
            is_correct,
            points,
            explanation: question.explanation.clone(),
        })
    }

    /// Two-step answer upsert. The positional update replaces an existing
    /// entry for the question index; the guarded $push appends a new entry
    /// only if no entry with that index exists. Every filter also requires
    /// completed:false, so a concurrent completion makes both steps no-ops.
    async fn upsert_answer(
        &self,
        attempt_id: &ObjectId,
        req: &SubmitAnswerRequest,
        is_correct: bool,
        points: u32,
    ) -> Result<(), ApiError> {
        let now = chrono_to_bson(chrono::Utc::now());
        let replace_filter = doc! {
            "_id": attempt_id,
            "completed": false,
            "answers.questionIndex": req.question_index,
        };
        let replace_update = doc! {
            "$set": {
                "answers.$.selectedOption": req.selected_option,
                "answers.$.isCorrect": is_correct,
                "answers.$.points": points,
                "updatedAt": now.clone(),
            }
        };

        let replaced = self
            .collection()
            .update_one(replace_filter.clone(), replace_update.clone())
            .await?;
        if replaced.matched_count > 0 {
            return Ok(());
        }

        let push_filter = doc! {
            "_id": attempt_id,
            "completed": false,
            "answers.questionIndex": { "$ne": req.question_index },
        };
        let push_update = doc! {
            "$push": {
                "answers": {
                    "questionIndex": req.question_index,
                    "selectedOption": req.selected_option,
                    "isCorrect": is_correct,
                    "points": points,
                }
            },
            "$set": { "updatedAt": now },
        };

        let pushed = self.collection().update_one(push_filter, push_update).await?;
        if pushed.matched_count > 0 {
            return Ok(());
        }

        // A concurrent submission for the same index slipped in between the
        // two updates; retry the in-place replacement once.
        let retried = self
            .collection()
            .update_one(replace_filter, replace_update)
            .await?;
        if retried.matched_count > 0 {
            return Ok(());
        }

        Err(ApiError::BadRequest(
            "Quiz attempt already completed".to_string(),
        ))
    }

    /// Finalize an attempt: recompute the score from the stored answers and
    /// the quiz's current questions, then flip `completed` exactly once.
    pub async fn complete(
        &self,
        attempt_id: &ObjectId,
        user_id: &ObjectId,
        time_spent: Option<u64>,
    ) -> Result<CompletionData, ApiError> {
        // The CAS filter pins both the completed flag and the answer count,
        // so a submission that lands between the snapshot read and the
        // update invalidates the write and we rescore from a fresh read.
        for _ in 0..COMPLETE_RETRIES {
            let attempt = self.load_attempt(attempt_id).await?;

            if attempt.user != *user_id {
                return Err(ApiError::Forbidden(
                    "Not authorized to update this attempt".to_string(),
                ));
            }
            if attempt.completed {
                return Err(ApiError::BadRequest(
                    "Quiz attempt already completed".to_string(),
                ));
            }

            let quiz = self.load_quiz(&attempt.quiz).await?;
            let score = earned_score(&attempt.answers);
            let total = total_points(&quiz.questions);
            let percentage = score_percentage(score, total);
            let time_spent = time_spent.unwrap_or(attempt.time_spent);
            let now = chrono::Utc::now();

            let result = self
                .collection()
                .update_one(
                    doc! {
                        "_id": attempt_id,
                        "completed": false,
                        "answers": { "$size": attempt.answers.len() as i64 },
                    },
                    doc! {
                        "$set": {
                            "completed": true,
                            "score": score,
                            "percentage": percentage,
                            "timeSpent": time_spent as i64,
                            "completedAt": chrono_to_bson(now),
                            "updatedAt": chrono_to_bson(now),
                        }
                    },
                )
                .await?;
            if result.matched_count == 0 {
                // Either a concurrent completion (caught by the completed
                // check on the next pass) or a concurrent answer; rescore.
                continue;
            }

            crate::metrics::record_attempt("completed");
            tracing::info!(
                attempt_id = %attempt_id.to_hex(),
                score,
                percentage,
                "Quiz attempt completed"
            );

            return Ok(CompletionData {
                score,
                total_points: total,
                percentage,
                time_spent,
                answers: attempt.answers,
            });
        }

        Err(ApiError::Internal(anyhow::anyhow!(
            "Attempt {} kept changing during completion",
            attempt_id.to_hex()
        )))
    }

    /// The caller's attempt history, newest first, with a quiz summary joined
    /// onto each entry. Attempts whose quiz was deleted keep a null quiz.
    pub async fn my_attempts(&self, user_id: &ObjectId) -> Result<Vec<MyAttemptView>, ApiError> {
        let attempts: Vec<QuizAttempt> = self
            .collection()
            .find(doc! { "user": user_id })
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;

        let quiz_ids: Vec<ObjectId> = attempts.iter().map(|a| a.quiz).collect();
        let quizzes: Vec<Quiz> = self
            .quizzes()
            .find(doc! { "_id": { "$in": quiz_ids } })
            .await?
            .try_collect()
            .await?;
        let by_id: HashMap<ObjectId, Quiz> = quizzes
            .into_iter()
            .filter_map(|q| q.id.map(|id| (id, q)))
            .collect();

        Ok(attempts
            .into_iter()
            .map(|attempt| {
                let quiz = by_id.get(&attempt.quiz).map(|q| AttemptQuizSummary {
                    id: attempt.quiz.to_hex(),
                    title: q.title.clone(),
                    difficulty: q.difficulty,
                    category: q.category.clone(),
                    total_points: q.total_points,
                });
                MyAttemptView {
                    id: attempt.id.map(|id| id.to_hex()).unwrap_or_default(),
                    quiz,
                    score: attempt.score,
                    percentage: attempt.percentage,
                    time_spent: attempt.time_spent,
                    completed: attempt.completed,
                    completed_at: attempt.completed_at,
                    created_at: attempt.created_at,
                }
            })
            .collect())
    }

    /// Aggregate statistics over completed attempts; restricted to the quiz
    /// owner.
    pub async fn quiz_statistics(
        &self,
        quiz_id: &ObjectId,
        user_id: &ObjectId,
    ) -> Result<QuizStatistics, ApiError> {
        let quiz = self.load_quiz(quiz_id).await?;
        if quiz.created_by != *user_id {
            return Err(ApiError::Forbidden(
                "Not authorized to view quiz statistics".to_string(),
            ));
        }

        let attempts: Vec<QuizAttempt> = self
            .collection()
            .find(doc! { "quiz": quiz_id, "completed": true })
            .sort(doc! { "completedAt": -1 })
            .await?
            .try_collect()
            .await?;

        let total_attempts = attempts.len() as u64;
        let average_score = average_percentage(attempts.iter().map(|a| a.percentage));
        let score_distribution = score_distribution(attempts.iter().map(|a| a.percentage));
        let recent_attempts = attempts
            .into_iter()
            .take(RECENT_ATTEMPTS_LIMIT)
            .map(AttemptView::from)
            .collect();

        Ok(QuizStatistics {
            total_attempts,
            average_score,
            score_distribution,
            recent_attempts,
        })
    }
}

/// Points earned across recorded answers
pub fn earned_score(answers: &[Answer]) -> u32 {
    answers.iter().map(|a| a.points).sum()
}

/// Score as a rounded percentage of the available points. A quiz worth zero
/// points scores 0%, never a division error.
pub fn score_percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((f64::from(score) / f64::from(total)) * 100.0).round() as u32
}

/// Bucket completed-attempt percentages into letter grades
pub fn score_distribution(percentages: impl Iterator<Item = u32>) -> ScoreDistribution {
    let mut distribution = ScoreDistribution::default();
    for percentage in percentages {
        match percentage {
            90.. => distribution.a += 1,
            80..=89 => distribution.b += 1,
            70..=79 => distribution.c += 1,
            60..=69 => distribution.d += 1,
            _ => distribution.f += 1,
        }
    }
    distribution
}

/// Mean of the given percentages, rounded to the nearest whole number.
/// No attempts yields 0.
pub fn average_percentage(percentages: impl Iterator<Item = u32>) -> u32 {
    let (sum, count) = percentages.fold((0u64, 0u64), |(s, c), p| (s + u64::from(p), c + 1));
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_index: u32, points: u32) -> Answer {
        Answer {
            question_index,
            selected_option: 0,
            is_correct: points > 0,
            points,
        }
    }

    #[test]
    fn earned_score_sums_answer_points() {
        let answers = vec![answer(0, 2), answer(1, 0), answer(2, 3)];
        assert_eq!(earned_score(&answers), 5);
    }

    #[test]
    fn three_of_five_equal_questions_is_sixty_percent() {
        assert_eq!(score_percentage(3, 5), 60);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(score_percentage(1, 3), 33);
        assert_eq!(score_percentage(2, 3), 67);
    }

    #[test]
    fn zero_total_points_is_zero_percent() {
        assert_eq!(score_percentage(0, 0), 0);
        assert_eq!(score_percentage(5, 0), 0);
    }

    #[test]
    fn full_score_is_one_hundred_percent() {
        assert_eq!(score_percentage(7, 7), 100);
    }

    #[test]
    fn distribution_places_one_attempt_in_each_bucket() {
        let distribution = score_distribution([95, 82, 71, 65, 40].into_iter());
        assert_eq!(
            distribution,
            ScoreDistribution {
                a: 1,
                b: 1,
                c: 1,
                d: 1,
                f: 1,
            }
        );
    }

    #[test]
    fn distribution_boundaries() {
        let distribution = score_distribution([100, 90, 89, 80, 79, 70, 69, 60, 59, 0].into_iter());
        assert_eq!(
            distribution,
            ScoreDistribution {
                a: 2,
                b: 2,
                c: 2,
                d: 2,
                f: 2,
            }
        );
    }

    #[test]
    fn average_of_sample_scores_is_seventy_one() {
        assert_eq!(average_percentage([95, 82, 71, 65, 40].into_iter()), 71);
    }

    #[test]
    fn average_of_no_attempts_is_zero() {
        assert_eq!(average_percentage(std::iter::empty()), 0);
    }
}
