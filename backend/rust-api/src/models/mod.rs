use serde::{Deserialize, Serialize};

pub mod attempt;
pub mod flashcard;
pub mod quiz;
pub mod user;

/// Difficulty scale shared by flashcards and quizzes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

/// Standard success envelope: { success, message?, data }
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

/// Envelope for paginated listings: { success, count, total, pagination, data }
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(total: u64, page: u32, limit: u32, data: Vec<T>) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64)
        };
        Self {
            success: true,
            count: data.len(),
            total,
            pagination: Pagination { page, limit, pages },
            data,
        }
    }
}

/// Query params shared by the public flashcard and quiz listings
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl ListQuery {
    /// Clamped page size (default 20, max 100) and 1-based page number.
    pub fn page_window(&self) -> (u32, u32) {
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (page, limit)
    }

    /// Documents to skip for the current page. Widened to u64 before the
    /// multiply so an extreme `page` value cannot overflow.
    pub fn skip(&self) -> u64 {
        let (page, limit) = self.page_window();
        (u64::from(page) - 1) * u64::from(limit)
    }
}

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
pub(crate) mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bson_dt = bson::DateTime::from_millis(date.timestamp_millis());
        bson_dt.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

pub(crate) mod bson_datetime_as_chrono_option {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let bson_dt = bson::DateTime::from_millis(d.timestamp_millis());
                serializer.serialize_some(&bson_dt)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_bson_dt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt_bson_dt
            .and_then(|bson_dt| DateTime::from_timestamp_millis(bson_dt.timestamp_millis())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults_and_clamps() {
        let query = ListQuery::default();
        assert_eq!(query.page_window(), (1, 20));

        let query = ListQuery {
            limit: Some(500),
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(query.page_window(), (1, 100));
    }

    #[test]
    fn skip_survives_extreme_page_numbers() {
        let query = ListQuery {
            page: Some(u32::MAX),
            limit: Some(100),
            ..Default::default()
        };
        assert_eq!(query.skip(), (u64::from(u32::MAX) - 1) * 100);

        let query = ListQuery::default();
        assert_eq!(query.skip(), 0);
    }

    #[test]
    fn list_response_counts_pages() {
        let resp = ListResponse::new(41, 2, 20, vec![1, 2, 3]);
        assert_eq!(resp.count, 3);
        assert_eq!(resp.pagination.pages, 3);
    }
}
