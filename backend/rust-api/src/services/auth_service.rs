use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::error::ApiError;
use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile};

pub struct AuthService {
    mongo: Database,
    jwt_service: JwtService,
    token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(mongo: Database, jwt_service: JwtService) -> Self {
        // Read TTL from env or use the 30-day default
        let token_ttl_seconds = std::env::var("JWT_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(2_592_000);

        Self {
            mongo,
            jwt_service,
            token_ttl_seconds,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, hashed: &str) -> Result<bool, ApiError> {
        verify(password, hashed)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to verify password: {}", e)))
    }

    /// Register a new user and issue a token
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
        let users = self.mongo.collection::<User>("users");

        let existing = users.find_one(doc! { "email": &req.email }).await?;
        if existing.is_some() {
            return Err(ApiError::BadRequest(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = self.hash_password(&req.password)?;

        let now = Utc::now();
        let user = User {
            id: None, // MongoDB will generate
            name: req.name,
            email: req.email,
            password_hash,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let insert_result = users.insert_one(&user).await?;
        let user_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Failed to get inserted user ID")))?;

        let token = self.generate_token(&user_id)?;

        let mut user_with_id = user;
        user_with_id.id = Some(user_id);

        tracing::info!(user_id = %user_id.to_hex(), "User registered");

        Ok(AuthResponse {
            success: true,
            token,
            user: UserProfile::from(user_with_id),
        })
    }

    /// Login with email and password
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ApiError> {
        let users = self.mongo.collection::<User>("users");

        let user = users
            .find_one(doc! { "email": &req.email })
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

        if !self.verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(email = %req.email, "Failed login attempt: invalid password");
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let user_id = user
            .id
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("User document missing _id")))?;

        // Update last login timestamp
        users
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "lastLoginAt": mongodb::bson::DateTime::now() } },
            )
            .await?;

        let token = self.generate_token(&user_id)?;

        tracing::info!(user_id = %user_id.to_hex(), "Successful login");

        Ok(AuthResponse {
            success: true,
            token,
            user: UserProfile::from(user),
        })
    }

    pub async fn get_user_by_id(&self, user_id: &ObjectId) -> Result<User, ApiError> {
        let users = self.mongo.collection::<User>("users");
        users
            .find_one(doc! { "_id": user_id })
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    fn generate_token(&self, user_id: &ObjectId) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_ttl_seconds);

        let claims = JwtClaims {
            sub: user_id.to_hex(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to generate token: {}", e)))
    }
}
