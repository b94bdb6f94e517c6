use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Database;

use crate::error::ApiError;
use crate::models::flashcard::{
    CreateFlashcardRequest, Flashcard, FlashcardView, StudyQuery, UpdateFlashcardRequest,
};
use crate::models::{Difficulty, ListQuery, ListResponse};
use crate::utils::time::chrono_to_bson;

pub struct FlashcardService {
    mongo: Database,
}

impl FlashcardService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> mongodb::Collection<Flashcard> {
        self.mongo.collection("flashcards")
    }

    /// Public listing with difficulty/category/search filters and pagination
    pub async fn list(&self, query: &ListQuery) -> Result<ListResponse<FlashcardView>, ApiError> {
        let filter = public_filter(query);
        let (page, limit) = query.page_window();

        let collection = self.collection();
        let total = collection.count_documents(filter.clone()).await?;

        let cards: Vec<Flashcard> = collection
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(query.skip())
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        let data = cards.into_iter().map(FlashcardView::from).collect();
        Ok(ListResponse::new(total, page, limit, data))
    }

    pub async fn get(&self, id: &ObjectId) -> Result<FlashcardView, ApiError> {
        let card = self
            .collection()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Flashcard not found".to_string()))?;
        Ok(FlashcardView::from(card))
    }

    pub async fn create(
        &self,
        user_id: &ObjectId,
        req: CreateFlashcardRequest,
    ) -> Result<FlashcardView, ApiError> {
        let now = chrono::Utc::now();
        let card = Flashcard {
            id: None,
            english_word: req.english_word,
            thai_meaning: req.thai_meaning,
            pronunciation: req.pronunciation,
            part_of_speech: req.part_of_speech,
            difficulty: req.difficulty,
            category: req.category.unwrap_or_else(|| "general".to_string()),
            example_sentence: req.example_sentence,
            tags: req.tags,
            created_by: *user_id,
            is_public: req.is_public.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let insert_result = self.collection().insert_one(&card).await?;
        let id = insert_result.inserted_id.as_object_id().ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("Failed to get inserted flashcard ID"))
        })?;

        crate::metrics::record_content_created("flashcard");
        tracing::info!(flashcard_id = %id.to_hex(), "Flashcard created");

        let mut card_with_id = card;
        card_with_id.id = Some(id);
        Ok(FlashcardView::from(card_with_id))
    }

    pub async fn update(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
        req: UpdateFlashcardRequest,
    ) -> Result<FlashcardView, ApiError> {
        let collection = self.collection();
        let card = collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Flashcard not found".to_string()))?;

        if card.created_by != *user_id {
            return Err(ApiError::Forbidden(
                "Not authorized to update this flashcard".to_string(),
            ));
        }

        let mut set = Document::new();
        if let Some(word) = req.english_word {
            set.insert("englishWord", word);
        }
        if let Some(meaning) = req.thai_meaning {
            set.insert("thaiMeaning", meaning);
        }
        if let Some(pronunciation) = req.pronunciation {
            set.insert("pronunciation", pronunciation);
        }
        if let Some(pos) = req.part_of_speech {
            let pos_bson = mongodb::bson::to_bson(&pos).map_err(anyhow::Error::new)?;
            set.insert("partOfSpeech", pos_bson);
        }
        if let Some(difficulty) = req.difficulty {
            set.insert("difficulty", difficulty.as_str());
        }
        if let Some(category) = req.category {
            set.insert("category", category);
        }
        if let Some(sentence) = req.example_sentence {
            set.insert("exampleSentence", sentence);
        }
        if let Some(tags) = req.tags {
            set.insert("tags", tags);
        }
        if let Some(is_public) = req.is_public {
            set.insert("isPublic", is_public);
        }
        set.insert("updatedAt", chrono_to_bson(chrono::Utc::now()));

        collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;

        let updated = collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Flashcard not found".to_string()))?;
        Ok(FlashcardView::from(updated))
    }

    pub async fn delete(&self, id: &ObjectId, user_id: &ObjectId) -> Result<(), ApiError> {
        let collection = self.collection();
        let card = collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Flashcard not found".to_string()))?;

        if card.created_by != *user_id {
            return Err(ApiError::Forbidden(
                "Not authorized to delete this flashcard".to_string(),
            ));
        }

        collection.delete_one(doc! { "_id": id }).await?;
        tracing::info!(flashcard_id = %id.to_hex(), "Flashcard deleted");
        Ok(())
    }

    pub async fn by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> Result<Vec<FlashcardView>, ApiError> {
        let cards: Vec<Flashcard> = self
            .collection()
            .find(doc! { "difficulty": difficulty.as_str(), "isPublic": true })
            .await?
            .try_collect()
            .await?;
        Ok(cards.into_iter().map(FlashcardView::from).collect())
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<FlashcardView>, ApiError> {
        let cards: Vec<Flashcard> = self
            .collection()
            .find(doc! { "category": category, "isPublic": true })
            .await?
            .try_collect()
            .await?;
        Ok(cards.into_iter().map(FlashcardView::from).collect())
    }

    pub async fn my_cards(&self, user_id: &ObjectId) -> Result<Vec<FlashcardView>, ApiError> {
        let cards: Vec<Flashcard> = self
            .collection()
            .find(doc! { "createdBy": user_id })
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(cards.into_iter().map(FlashcardView::from).collect())
    }

    /// Random study set, sampled server-side
    pub async fn random_study_set(
        &self,
        query: &StudyQuery,
    ) -> Result<Vec<FlashcardView>, ApiError> {
        let mut match_stage = doc! { "isPublic": true };
        if let Some(difficulty) = query.difficulty.as_deref().filter(|d| *d != "all") {
            match_stage.insert("difficulty", difficulty);
        }
        if let Some(category) = query.category.as_deref().filter(|c| *c != "all") {
            match_stage.insert("category", category);
        }

        let limit = query.limit.unwrap_or(10).clamp(1, 100);
        let pipeline = vec![
            doc! { "$match": match_stage },
            doc! { "$sample": { "size": limit as i32 } },
        ];

        let docs: Vec<Document> = self
            .mongo
            .collection::<Document>("flashcards")
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        let mut cards = Vec::with_capacity(docs.len());
        for document in docs {
            let card: Flashcard = mongodb::bson::from_document(document).map_err(|e| {
                ApiError::Internal(anyhow::anyhow!("Malformed flashcard document: {}", e))
            })?;
            cards.push(FlashcardView::from(card));
        }
        Ok(cards)
    }
}

/// Public listing filter: only public cards, optional difficulty/category
/// narrowing, case-insensitive search over word, meaning and category.
fn public_filter(query: &ListQuery) -> Document {
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
                doc! { "englishWord": { "$regex": search, "$options": "i" } },
                doc! { "thaiMeaning": { "$regex": search, "$options": "i" } },
                doc! { "category": { "$regex": search, "$options": "i" } },
            ],
        );
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_public_only() {
        let filter = public_filter(&ListQuery::default());
        assert_eq!(filter, doc! { "isPublic": true });
    }

    #[test]
    fn filter_ignores_all_sentinel() {
        let query = ListQuery {
            difficulty: Some("all".to_string()),
            category: Some("travel".to_string()),
            ..Default::default()
        };
        let filter = public_filter(&query);
        assert!(!filter.contains_key("difficulty"));
        assert_eq!(filter.get_str("category").unwrap(), "travel");
    }

    #[test]
    fn filter_search_covers_both_languages() {
        let query = ListQuery {
            search: Some("water".to_string()),
            ..Default::default()
        };
        let filter = public_filter(&query);
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 3);
    }
}
