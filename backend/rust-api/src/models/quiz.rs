use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{bson_datetime_as_chrono, flashcard::default_true, Difficulty};

/// Quiz model stored in the MongoDB "quizzes" collection.
///
/// `total_points` is denormalized output: it is recomputed from the question
/// list on every save and never read as an input to scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Time limit in minutes
    #[serde(rename = "timeLimit", default = "default_time_limit")]
    pub time_limit: u32,
    #[serde(rename = "totalPoints", default)]
    pub total_points: u32,
    #[serde(rename = "createdBy")]
    pub created_by: ObjectId,
    #[serde(rename = "isPublic", default = "default_true")]
    pub is_public: bool,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "vocabulary".to_string()
}

fn default_time_limit() -> u32 {
    30
}

/// One question embedded in a quiz, addressed by its index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<AnswerOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

/// Sum of question points. The `totalPoints` invariant is re-derived through
/// this on every quiz save.
pub fn total_points(questions: &[Question]) -> u32 {
    questions.iter().map(|q| q.points).sum()
}

/// Full quiz view, only shown to the quiz owner.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub questions: Vec<Question>,
    #[serde(rename = "timeLimit")]
    pub time_limit: u32,
    #[serde(rename = "totalPoints")]
    pub total_points: u32,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Quiz> for QuizView {
    fn from(quiz: Quiz) -> Self {
        QuizView {
            id: quiz.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: quiz.title,
            description: quiz.description,
            difficulty: quiz.difficulty,
            category: quiz.category,
            questions: quiz.questions,
            time_limit: quiz.time_limit,
            total_points: quiz.total_points,
            created_by: quiz.created_by.to_hex(),
            is_public: quiz.is_public,
            created_at: quiz.created_at,
            updated_at: quiz.updated_at,
        }
    }
}

/// Quiz view for quiz takers: the `isCorrect` flags are stripped so an
/// in-progress quiz never leaks its answer key.
#[derive(Debug, Serialize)]
pub struct PublicQuizView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub questions: Vec<PublicQuestion>,
    #[serde(rename = "timeLimit")]
    pub time_limit: u32,
    #[serde(rename = "totalPoints")]
    pub total_points: u32,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub text: String,
    pub options: Vec<PublicOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub points: u32,
}

#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub text: String,
}

impl From<Quiz> for PublicQuizView {
    fn from(quiz: Quiz) -> Self {
        PublicQuizView {
            id: quiz.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: quiz.title,
            description: quiz.description,
            difficulty: quiz.difficulty,
            category: quiz.category,
            questions: quiz
                .questions
                .into_iter()
                .map(|q| PublicQuestion {
                    text: q.text,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| PublicOption { text: o.text })
                        .collect(),
                    explanation: q.explanation,
                    points: q.points,
                })
                .collect(),
            time_limit: quiz.time_limit,
            total_points: quiz.total_points,
            created_by: quiz.created_by.to_hex(),
            created_at: quiz.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Quiz title is required"))]
    pub title: String,

    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub category: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
    #[serde(rename = "timeLimit")]
    pub time_limit: Option<u32>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Quiz title must not be empty"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub questions: Option<Vec<QuestionInput>>,
    #[serde(rename = "timeLimit")]
    pub time_limit: Option<u32>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionInput {
    pub text: String,
    pub options: Vec<OptionInput>,
    pub explanation: Option<String>,
    #[serde(default = "default_points")]
    pub points: u32,
}

#[derive(Debug, Deserialize)]
pub struct OptionInput {
    pub text: String,
    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

impl QuestionInput {
    pub fn into_question(self) -> Question {
        Question {
            text: self.text,
            options: self
                .options
                .into_iter()
                .map(|o| AnswerOption {
                    text: o.text,
                    is_correct: o.is_correct,
                })
                .collect(),
            explanation: self.explanation,
            points: self.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(points: u32) -> Question {
        Question {
            text: "What is 'water' in Thai?".to_string(),
            options: vec![
                AnswerOption {
                    text: "น้ำ".to_string(),
                    is_correct: true,
                },
                AnswerOption {
                    text: "ไฟ".to_string(),
                    is_correct: false,
                },
            ],
            explanation: None,
            points,
        }
    }

    #[test]
    fn total_points_sums_question_points() {
        let questions = vec![question(1), question(3), question(2)];
        assert_eq!(total_points(&questions), 6);
    }

    #[test]
    fn total_points_of_empty_quiz_is_zero() {
        assert_eq!(total_points(&[]), 0);
    }

    #[test]
    fn public_view_strips_correct_flags() {
        let quiz = Quiz {
            id: None,
            title: "Basics".to_string(),
            description: String::new(),
            difficulty: Difficulty::Beginner,
            category: "vocabulary".to_string(),
            questions: vec![question(1)],
            time_limit: 30,
            total_points: 1,
            created_by: mongodb::bson::oid::ObjectId::new(),
            is_public: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let view = PublicQuizView::from(quiz);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["questions"][0]["options"][0].get("isCorrect").is_none());
        assert_eq!(json["questions"][0]["options"][0]["text"], "น้ำ");
    }
}
