//! Input schemas for the HTML-form style endpoints.
//!
//! Each form deserializes from `application/x-www-form-urlencoded` bodies and
//! validates with [`validator`]. [`validated`] turns a form into either the
//! checked form or a per-field error map.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

/// Form for adding/editing messages.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MessageForm {
    #[serde(default)]
    #[validate(
        custom(function = "data_required"),
        length(max = 140, message = "Messages are limited to 140 characters.")
    )]
    pub text: String,
}

/// Form for adding users.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserAddForm {
    #[serde(default)]
    #[validate(custom(function = "data_required"))]
    pub username: String,

    #[serde(default)]
    #[validate(
        custom(function = "data_required"),
        email(message = "Invalid email address.")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Field must be at least 6 characters long."))]
    pub password: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub image_url: Option<String>,
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "data_required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Field must be at least 6 characters long."))]
    pub password: String,
}

/// Form for editing the current user's profile. `password` is the current
/// password, re-checked before anything is saved.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EditUserForm {
    #[serde(default)]
    #[validate(custom(function = "data_required"))]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub header_image_url: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub bio: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<String>,

    #[serde(default)]
    #[validate(length(min = 6, message = "Field must be at least 6 characters long."))]
    pub password: String,
}

/// Form for liking a message. An unchecked box is simply absent from the body.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct LikeMessageForm {
    #[serde(default, deserialize_with = "checkbox")]
    pub like_unlike: bool,
}

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(pub BTreeMap<String, Vec<String>>);

impl FormErrors {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let map = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or_else(|| e.code.to_string(), ToString::to_string)
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self(map)
    }
}

/// Validate a submitted form, returning it unchanged on success.
pub fn validated<F: Validate>(form: F) -> Result<F, FormErrors> {
    form.validate().map_err(FormErrors::from)?;
    Ok(form)
}

fn data_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(matches!(value.trim(), "y" | "on" | "true" | "1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;
    use serde_json::json;

    fn parse<T: DeserializeOwned>(body: serde_json::Value) -> T {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn message_form_requires_text() {
        let errors = validated(MessageForm {
            text: "   ".to_string(),
        })
        .unwrap_err();
        assert_eq!(errors.field("text"), Some(&["This field is required.".to_string()][..]));

        assert!(validated(MessageForm {
            text: "Hello".to_string()
        })
        .is_ok());
    }

    #[test]
    fn message_form_bounds_length() {
        let form = MessageForm {
            text: "x".repeat(141),
        };
        assert!(validated(form).is_err());

        let form = MessageForm {
            text: "x".repeat(140),
        };
        assert!(validated(form).is_ok());
    }

    #[test]
    fn signup_form_checks_every_field() {
        let form: UserAddForm = parse(json!({"username": "", "email": "not-an-email", "password": "abc", "image_url": ""}));
        let errors = validated(form).unwrap_err();

        assert!(errors.field("username").is_some());
        assert!(errors.field("email").is_some());
        assert!(errors.field("password").is_some());
        assert!(errors.field("image_url").is_none());
    }

    #[test]
    fn signup_form_treats_blank_image_as_absent() {
        let form: UserAddForm = parse(json!({
            "username": "testuser",
            "email": "test@test.com",
            "password": "pass123",
            "image_url": " "
        }));
        let form = validated(form).unwrap();
        assert_eq!(form.image_url, None);
    }

    #[test]
    fn login_form_requires_six_character_password() {
        let form: LoginForm = parse(json!({"username": "testuser", "password": "pass1"}));
        assert!(validated(form).is_err());

        let form: LoginForm = parse(json!({"username": "testuser", "password": "pass123"}));
        assert!(validated(form).is_ok());
    }

    #[test]
    fn edit_form_validates_email_and_password() {
        let form: EditUserForm = parse(json!({"username": "testuser", "email": "bad", "password": "short"}));
        let errors = validated(form).unwrap_err();
        assert!(errors.field("email").is_some());
        assert!(errors.field("password").is_some());
        assert!(errors.field("username").is_none());

        let form: EditUserForm = parse(json!({
            "username": "testuser",
            "email": "t@t.com",
            "bio": "hi",
            "location": "",
            "password": "pass123"
        }));
        let form = validated(form).unwrap();
        assert_eq!(form.bio.as_deref(), Some("hi"));
        assert_eq!(form.location, None);
    }

    #[test]
    fn like_checkbox_values() {
        let form: LikeMessageForm = parse(json!({"like_unlike": "y"}));
        assert!(form.like_unlike);

        let form: LikeMessageForm = parse(json!({"like_unlike": "on"}));
        assert!(form.like_unlike);

        let form: LikeMessageForm = parse(json!({"like_unlike": "false"}));
        assert!(!form.like_unlike);

        let form: LikeMessageForm = parse(json!({"like_unlike": "yes"}));
        assert!(!form.like_unlike);

        let form: LikeMessageForm = parse(json!({}));
        assert!(!form.like_unlike);
    }

    #[test]
    fn errors_render_in_field_order() {
        let form: UserAddForm = parse(json!({"username": "", "email": "a@b.com", "password": "abc"}));
        let errors = validated(form).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "password: Field must be at least 6 characters long.; username: This field is required."
        );
    }
}
