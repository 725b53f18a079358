//! Member management service

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{CreateUser, UpdateUser, UserQuery},
        ResourceRef, Upserted, User,
    },
    repository::Repository,
};

use super::result_limit;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    default_limit: i64,
}

fn duplicate_email(existing: &User) -> AppError {
    let url = ResourceRef::user(existing.id).url;
    AppError::conflict(format!("User with this email already exists at {}", url), url)
}

impl UsersService {
    pub fn new(repository: Repository, default_limit: i64) -> Self {
        Self {
            repository,
            default_limit,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users_list().await
    }

    /// Members ordered by total rent paid
    pub async fn highest_paying(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let limit = result_limit(query.limit, self.default_limit)?;
        self.repository.users_highest_paying(limit).await
    }

    pub async fn get(&self, id: i32) -> AppResult<User> {
        self.repository
            .users_get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Create a new member; the email, when given, must not be taken
    pub async fn create(&self, user: CreateUser) -> AppResult<User> {
        if let Some(ref email) = user.email {
            if let Some(existing) = self.repository.users_get_by_email(email).await? {
                return Err(duplicate_email(&existing));
            }
        }

        let created = self.repository.users_create(&user).await?;
        tracing::info!("Created user {}", created.id);
        Ok(created)
    }

    /// Update the given fields of a member, or create it when the id is unknown
    pub async fn upsert(&self, id: i32, changes: UpdateUser) -> AppResult<Upserted<User>> {
        if let Some(email) = changes.new_email() {
            if let Some(existing) = self.repository.users_get_by_email(email).await? {
                if existing.id != id {
                    return Err(duplicate_email(&existing));
                }
            }
        }

        if let Some(updated) = self.repository.users_update(id, &changes).await? {
            return Ok(Upserted::Updated(updated));
        }

        let created = self.repository.users_create(&changes.into_create()?).await?;
        tracing::info!("User {} not found, created user {} instead", id, created.id);
        Ok(Upserted::Created(created))
    }

    /// Delete a member and return its id
    pub async fn delete(&self, id: i32) -> AppResult<i32> {
        if !self.repository.users_delete(id).await? {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        tracing::info!("Deleted user {}", id);
        Ok(id)
    }
}
