use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Database;

use crate::error::ApiError;
use crate::models::quiz::{
    total_points, CreateQuizRequest, PublicQuizView, Quiz, QuizView, UpdateQuizRequest,
};
use crate::models::{ListQuery, ListResponse};
use crate::utils::time::chrono_to_bson;

pub struct QuizService {
    mongo: Database,
}

impl QuizService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> mongodb::Collection<Quiz> {
        self.mongo.collection("quizzes")
    }

    /// Public catalog listing; correct answers are stripped from every entry.
    pub async fn list(&self, query: &ListQuery) -> Result<ListResponse<PublicQuizView>, ApiError> {
        let filter = catalog_filter(query);
        let (page, limit) = query.page_window();

        let collection = self.collection();
        let total = collection.count_documents(filter.clone()).await?;

        let quizzes: Vec<Quiz> = collection
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(query.skip())
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        let data = quizzes.into_iter().map(PublicQuizView::from).collect();
        Ok(ListResponse::new(total, page, limit, data))
    }

    /// Single quiz for takers, with the answer key redacted
    pub async fn get_public(&self, id: &ObjectId) -> Result<PublicQuizView, ApiError> {
        let quiz = self.load(id).await?;
        Ok(PublicQuizView::from(quiz))
    }

    /// Full quiz document, including correct-answer flags. Internal use and
    /// owner views only.
    pub async fn load(&self, id: &ObjectId) -> Result<Quiz, ApiError> {
        self.collection()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
    }

    pub async fn create(
        &self,
        user_id: &ObjectId,
        req: CreateQuizRequest,
    ) -> Result<QuizView, ApiError> {
        let questions: Vec<_> = req
            .questions
            .into_iter()
            .map(|q| q.into_question())
            .collect();
        validate_questions(&questions)?;

        let now = chrono::Utc::now();
        let quiz = Quiz {
            id: None,
            title: req.title,
            description: req.description.unwrap_or_default(),
            difficulty: req.difficulty,
            category: req.category.unwrap_or_else(|| "vocabulary".to_string()),
            total_points: total_points(&questions),
            questions,
            time_limit: req.time_limit.unwrap_or(30),
            created_by: *user_id,
            is_public: req.is_public.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let insert_result = self.collection().insert_one(&quiz).await?;
        let id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Failed to get inserted quiz ID")))?;

        crate::metrics::record_content_created("quiz");
        tracing::info!(quiz_id = %id.to_hex(), "Quiz created");

        let mut quiz_with_id = quiz;
        quiz_with_id.id = Some(id);
        Ok(QuizView::from(quiz_with_id))
    }

    pub async fn update(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
        req: UpdateQuizRequest,
    ) -> Result<QuizView, ApiError> {
        let collection = self.collection();
        let quiz = self.load(id).await?;

        if quiz.created_by != *user_id {
            return Err(ApiError::Forbidden(
                "Not authorized to update this quiz".to_string(),
            ));
        }

        let mut set = Document::new();
        if let Some(title) = req.title {
            set.insert("title", title);
        }
        if let Some(description) = req.description {
            set.insert("description", description);
        }
        if let Some(difficulty) = req.difficulty {
            set.insert("difficulty", difficulty.as_str());
        }
        if let Some(category) = req.category {
            set.insert("category", category);
        }
        if let Some(inputs) = req.questions {
            let questions: Vec<_> = inputs.into_iter().map(|q| q.into_question()).collect();
            validate_questions(&questions)?;
            // Re-derive the totalPoints invariant whenever questions change
            set.insert("totalPoints", total_points(&questions));
            let questions_bson =
                mongodb::bson::to_bson(&questions).map_err(anyhow::Error::new)?;
            set.insert("questions", questions_bson);
        }
        if let Some(time_limit) = req.time_limit {
            set.insert("timeLimit", time_limit);
        }
        if let Some(is_public) = req.is_public {
            set.insert("isPublic", is_public);
        }
        set.insert("updatedAt", chrono_to_bson(chrono::Utc::now()));

        collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;

        let updated = self.load(id).await?;
        Ok(QuizView::from(updated))
    }

    /// Delete a quiz and cascade to all of its attempts
    pub async fn delete(&self, id: &ObjectId, user_id: &ObjectId) -> Result<(), ApiError> {
        let quiz = self.load(id).await?;

        if quiz.created_by != *user_id {
            return Err(ApiError::Forbidden(
                "Not authorized to delete this quiz".to_string(),
            ));
        }

        self.mongo
            .collection::<Document>("quiz_attempts")
            .delete_many(doc! { "quiz": id })
            .await?;
        self.collection().delete_one(doc! { "_id": id }).await?;

        tracing::info!(quiz_id = %id.to_hex(), "Quiz deleted with its attempts");
        Ok(())
    }

    pub async fn my_quizzes(&self, user_id: &ObjectId) -> Result<Vec<QuizView>, ApiError> {
        let quizzes: Vec<Quiz> = self
            .collection()
            .find(doc! { "createdBy": user_id })
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes.into_iter().map(QuizView::from).collect())
    }
}

/// Required-field checks on embedded questions, reported all at once
fn validate_questions(questions: &[crate::models::quiz::Question]) -> Result<(), ApiError> {
    let mut problems = Vec::new();

    for (index, question) in questions.iter().enumerate() {
        if question.text.trim().is_empty() {
            problems.push(format!("questions[{}]: text is required", index));
        }
        if question.points == 0 {
            problems.push(format!("questions[{}]: points must be positive", index));
        }
        if question.options.is_empty() {
            problems.push(format!("questions[{}]: at least one option is required", index));
        }
        for (opt_index, option) in question.options.iter().enumerate() {
            if option.text.trim().is_empty() {
                problems.push(format!(
                    "questions[{}].options[{}]: text is required",
                    index, opt_index
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ApiError::BadRequest(problems.join("; ")))
    }
}

/// Catalog filter: public quizzes, optional difficulty/category narrowing,
/// case-insensitive search over title/description/category.
fn catalog_filter(query: &ListQuery) -> Document {
    let mut filter = doc! { "isPublic": true };

    if let Some(difficulty) = query.difficulty.as_deref().filter(|d| *d != "all") {
        filter.insert("difficulty", difficulty);
    }
    if let Some(category) = query.category.as_deref().filter(|c| *c != "all") {
        filter.insert("category", category);
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": search, "$options": "i" } },
                doc! { "description": { "$regex": search, "$options": "i" } },
                doc! { "category": { "$regex": search, "$options": "i" } },
            ],
        );
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{AnswerOption, Question};

    fn question(text: &str, points: u32, options: usize) -> Question {
        Question {
            text: text.to_string(),
            options: (0..options)
                .map(|i| AnswerOption {
                    text: format!("option {}", i),
                    is_correct: i == 0,
                })
                .collect(),
            explanation: None,
            points,
        }
    }

    #[test]
    fn valid_questions_pass() {
        let questions = vec![question("q1", 1, 4), question("q2", 3, 2)];
        assert!(validate_questions(&questions).is_ok());
    }

    #[test]
    fn validation_collects_every_problem() {
        let questions = vec![question("", 0, 0), question("ok", 1, 2)];
        let err = validate_questions(&questions).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("questions[0]: text is required"));
        assert!(message.contains("questions[0]: points must be positive"));
        assert!(message.contains("questions[0]: at least one option is required"));
        assert!(!message.contains("questions[1]"));
    }

    #[test]
    fn catalog_filter_searches_title_and_description() {
        let query = ListQuery {
            search: Some("greetings".to_string()),
            ..Default::default()
        };
        let filter = catalog_filter(&query);
        assert!(filter.contains_key("$or"));
        assert!(filter.get_bool("isPublic").unwrap());
    }
}
