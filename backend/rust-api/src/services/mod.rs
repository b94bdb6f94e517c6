use crate::config::Config;
use mongodb::{Client as MongoClient, Database};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
}

impl AppState {
    pub fn new(config: Config, mongo_client: MongoClient) -> Self {
        let mongo = mongo_client.database(&config.mongo_database);
        Self { config, mongo }
    }
}

pub mod attempt_service;
pub mod auth_service;
pub mod flashcard_service;
pub mod quiz_service;
