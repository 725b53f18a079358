//! Library member model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Member of the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    /// Unique when set
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Phone number
    pub contact: String,
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUser {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 30, message = "Email must be at most 30 characters")
    )]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 255, message = "First name must be 1-255 characters"))]
    pub first_name: String,
    #[validate(length(max = 255, message = "Last name must be at most 255 characters"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 10, message = "Contact must be 1-10 characters"))]
    pub contact: String,
}

/// Partial update request.
///
/// `email` and `last_name` distinguish an absent key (leave unchanged) from an
/// explicit `null` (clear the value).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUser {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 30, message = "Email must be at most 30 characters")
    )]
    pub email: Option<Option<String>>,
    #[validate(length(min = 1, max = 255, message = "First name must be 1-255 characters"))]
    pub first_name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 255, message = "Last name must be at most 255 characters"))]
    pub last_name: Option<Option<String>>,
    #[validate(length(min = 1, max = 10, message = "Contact must be 1-10 characters"))]
    pub contact: Option<String>,
}

impl UpdateUser {
    /// Merge the provided fields into an existing user
    pub fn apply_to(&self, user: &mut User) {
        if let Some(ref email) = self.email {
            user.email = email.clone();
        }
        if let Some(ref first_name) = self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(ref last_name) = self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(ref contact) = self.contact {
            user.contact = contact.clone();
        }
    }

    /// The email this update would set, if it sets one
    pub fn new_email(&self) -> Option<&str> {
        self.email.as_ref().and_then(|email| email.as_deref())
    }

    /// Promote the update to a full create request (upsert on a missing id)
    pub fn into_create(self) -> AppResult<CreateUser> {
        let mut missing = Vec::new();
        if self.first_name.is_none() {
            missing.push("first_name");
        }
        if self.contact.is_none() {
            missing.push("contact");
        }

        match (self.first_name, self.contact) {
            (Some(first_name), Some(contact)) => Ok(CreateUser {
                email: self.email.flatten(),
                first_name,
                last_name: self.last_name.flatten(),
                contact,
            }),
            _ => Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Query parameters for the highest paying listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> User {
        User {
            id: 1,
            email: Some("abc@example.com".to_string()),
            first_name: "First".to_string(),
            last_name: Some("Last".to_string()),
            contact: "1234567890".to_string(),
        }
    }

    #[test]
    fn test_wire_round_trip() {
        let user = member();
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(user, back);
    }

    #[test]
    fn test_create_validation() {
        let create = CreateUser {
            email: Some("not-an-email".to_string()),
            first_name: "First".to_string(),
            last_name: None,
            contact: "12345678901".to_string(),
        };
        let errors = create.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("contact"));
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let clear: UpdateUser = serde_json::from_str(r#"{"email": null}"#).unwrap();
        let untouched: UpdateUser = serde_json::from_str(r#"{"contact": "555"}"#).unwrap();

        let mut user = member();
        untouched.apply_to(&mut user);
        assert_eq!(user.email.as_deref(), Some("abc@example.com"));
        assert_eq!(user.contact, "555");

        clear.apply_to(&mut user);
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_update_into_create_requires_schema() {
        let update: UpdateUser = serde_json::from_str(r#"{"first_name": "Ada"}"#).unwrap();
        match update.into_create() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("contact")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
