use crate::{db::DatabaseAccess, entities::user, errors::ServiceError, services::format_day};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Months, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Public view of an account. There is deliberately no password field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    /// Day of the last login, `YYYY-MM-DD`
    pub ultima_sesion: Option<String>,
    pub estado: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            ultima_sesion: model.last_login_at.as_ref().map(format_day),
            estado: model.status,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub role: String,
    pub estado: String,
    /// Replaces the stored password when present and non-empty
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewUsersCount {
    pub total_users: u64,
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct UserService {
    db: DatabaseAccess,
}

impl UserService {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self
            .db
            .execute("list_users", |db| {
                user::Entity::find().order_by_asc(user::Column::Id).all(db)
            })
            .await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<UserResponse, ServiceError> {
        self.db
            .execute("get_user", |db| user::Entity::find_by_id(id).one(db))
            .await?
            .map(UserResponse::from)
            .ok_or_else(ServiceError::user_not_found)
    }

    /// Updates profile fields, and the password only when one is supplied.
    /// Returns the stored row after the update.
    #[instrument(skip(self, request), fields(password_changed = tracing::field::Empty))]
    pub async fn update_user(&self, id: i32, request: UserUpdate) -> Result<UserResponse, ServiceError> {
        let mut changes = user::ActiveModel {
            name: Set(request.name),
            email: Set(request.email),
            role: Set(request.role),
            status: Set(Some(request.estado)),
            ..Default::default()
        };

        let new_password = request.password.as_deref().filter(|p| !p.is_empty());
        if let Some(password) = new_password {
            changes.password_hash = Set(hash_password(password)?);
        }
        tracing::Span::current().record("password_changed", new_password.is_some());

        let result = self
            .db
            .execute("update_user", |db| {
                user::Entity::update_many()
                    .set(changes)
                    .filter(user::Column::Id.eq(id))
                    .exec(db)
            })
            .await?;
        info!(user_id = id, rows_affected = result.rows_affected, "User updated");

        self.get_user(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i32) -> Result<(), ServiceError> {
        let result = self
            .db
            .execute("delete_user", |db| user::Entity::delete_by_id(id).exec(db))
            .await?;

        info!(user_id = id, rows_affected = result.rows_affected, "User deleted");
        Ok(())
    }

    pub async fn users_last_month(&self) -> Result<NewUsersCount, ServiceError> {
        self.users_last_month_at(Utc::now()).await
    }

    /// Accounts created within the rolling month ending at `now`
    #[instrument(skip(self))]
    pub async fn users_last_month_at(&self, now: DateTime<Utc>) -> Result<NewUsersCount, ServiceError> {
        let since = now
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| ServiceError::InternalError("date out of range".to_string()))?;

        let total_users = self
            .db
            .execute("users_last_month", |db| {
                user::Entity::find()
                    .filter(user::Column::CreatedAt.gte(since))
                    .filter(user::Column::CreatedAt.lt(now))
                    .count(db)
            })
            .await?;

        Ok(NewUsersCount { total_users })
    }
}
