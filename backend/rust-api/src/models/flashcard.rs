use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{bson_datetime_as_chrono, Difficulty};

/// Flashcard model stored in the MongoDB "flashcards" collection.
/// Field names match the collection schema (camelCase) on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "englishWord")]
    pub english_word: String,
    #[serde(rename = "thaiMeaning")]
    pub thai_meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(rename = "partOfSpeech", default)]
    pub part_of_speech: PartOfSpeech,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(rename = "exampleSentence", default, skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
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
    "general".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    #[default]
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Interjection,
    Pronoun,
}

/// Flashcard as returned to clients (ObjectIds rendered as hex strings)
#[derive(Debug, Serialize)]
pub struct FlashcardView {
    pub id: String,
    #[serde(rename = "englishWord")]
    pub english_word: String,
    #[serde(rename = "thaiMeaning")]
    pub thai_meaning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: PartOfSpeech,
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(rename = "exampleSentence", skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
    pub tags: Vec<String>,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Flashcard> for FlashcardView {
    fn from(card: Flashcard) -> Self {
        FlashcardView {
            id: card.id.map(|id| id.to_hex()).unwrap_or_default(),
            english_word: card.english_word,
            thai_meaning: card.thai_meaning,
            pronunciation: card.pronunciation,
            part_of_speech: card.part_of_speech,
            difficulty: card.difficulty,
            category: card.category,
            example_sentence: card.example_sentence,
            tags: card.tags,
            created_by: card.created_by.to_hex(),
            is_public: card.is_public,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFlashcardRequest {
    #[validate(length(min = 1, max = 200, message = "English word is required"))]
    #[serde(rename = "englishWord")]
    pub english_word: String,

    #[validate(length(min = 1, max = 200, message = "Thai meaning is required"))]
    #[serde(rename = "thaiMeaning")]
    pub thai_meaning: String,

    pub pronunciation: Option<String>,
    #[serde(rename = "partOfSpeech", default)]
    pub part_of_speech: PartOfSpeech,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub category: Option<String>,
    #[serde(rename = "exampleSentence")]
    pub example_sentence: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFlashcardRequest {
    #[validate(length(min = 1, max = 200, message = "English word must not be empty"))]
    #[serde(rename = "englishWord")]
    pub english_word: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Thai meaning must not be empty"))]
    #[serde(rename = "thaiMeaning")]
    pub thai_meaning: Option<String>,

    pub pronunciation: Option<String>,
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: Option<PartOfSpeech>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    #[serde(rename = "exampleSentence")]
    pub example_sentence: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}

/// Query params for the random study set endpoint
#[derive(Debug, Default, Deserialize)]
pub struct StudyQuery {
    pub limit: Option<u32>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
}
