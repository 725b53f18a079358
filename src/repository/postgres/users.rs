//! Member queries

use super::{unique_violation, PgRepository};
use crate::{
    error::AppResult,
    models::{
        user::{CreateUser, UpdateUser},
        User,
    },
};

const DUPLICATE_EMAIL: &str = "A user with this email already exists";

impl PgRepository {
    pub(super) async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub(super) async fn highest_paying_users(&self, limit: i64) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.*
            FROM users u
            LEFT JOIN transactions t ON t.member = u.id
            GROUP BY u.id
            ORDER BY COALESCE(SUM(t.rent), 0) DESC, u.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub(super) async fn get_user(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub(super) async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub(super) async fn create_user(&self, user: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, first_name, last_name, contact)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.contact)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))
    }

    pub(super) async fn update_user(&self, id: i32, data: &UpdateUser) -> AppResult<Option<User>> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.email, "email");
        add_field!(data.first_name, "first_name");
        add_field!(data.last_name, "last_name");
        add_field!(data.contact, "contact");

        if sets.is_empty() {
            return self.get_user(id).await;
        }

        let query = format!("UPDATE users SET {} WHERE id = ${} RETURNING *", sets.join(", "), idx);
        let mut builder = sqlx::query_as::<_, User>(&query);

        // email and last_name are Option<Option<_>>: the inner None binds NULL
        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.email);
        bind_field!(data.first_name);
        bind_field!(data.last_name);
        bind_field!(data.contact);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))
    }

    pub(super) async fn delete_user(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
