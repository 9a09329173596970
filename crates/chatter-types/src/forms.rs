//! Client-side input validation, enforced before any request is built.
//!
//! Each form mirrors what the UI collects; `into_request()` strips
//! anything that must never reach the wire (`confirm_password`).

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;
use validator::Validate;

use crate::api::{
    CreateCommentRequest, CreateGroupConversationRequest, CreatePostRequest, LoginRequest,
    RegisterRequest, SendMessageRequest, UpdateCommentRequest, UpdatePostRequest,
};
use crate::models::MessageType;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("static regex"));

#[derive(Debug, Clone, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, max = 100, message = "Username or email is required"))]
    pub identity: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginForm {
    pub fn into_request(self) -> LoginRequest {
        LoginRequest {
            identity: self.identity,
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct RegisterForm {
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3-50 characters"),
        regex(
            path = *USERNAME_RE,
            message = "Username can only contain letters, numbers, and underscores"
        )
    )]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 100, message = "Password must be 6-100 characters"))]
    pub password: String,
    /// Collected and cross-checked locally; never serialized.
    #[validate(
        length(min = 1, message = "Please confirm your password"),
        must_match(other = password, message = "Passwords do not match")
    )]
    pub confirm_password: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

impl RegisterForm {
    /// Drops `confirm_password`: it exists only for the local
    /// cross-field check and must not be transmitted.
    pub fn into_request(self) -> RegisterRequest {
        RegisterRequest {
            username: self.username,
            email: self.email,
            password: self.password,
            name: self.name,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, max = 5000, message = "Post content must be 1-5000 characters"))]
    pub content: String,
}

impl PostForm {
    pub fn into_create_request(self) -> CreatePostRequest {
        CreatePostRequest {
            content: self.content,
        }
    }

    pub fn into_update_request(self) -> UpdatePostRequest {
        UpdatePostRequest {
            content: self.content,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub content: String,
}

impl CommentForm {
    pub fn into_create_request(self, post_id: Uuid) -> CreateCommentRequest {
        CreateCommentRequest {
            post_id,
            content: self.content,
        }
    }

    pub fn into_update_request(self) -> UpdateCommentRequest {
        UpdateCommentRequest {
            content: self.content,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct MessageForm {
    #[validate(length(min = 1, max = 5000, message = "Message is too long"))]
    pub content: String,
    pub message_type: MessageType,
    pub media_url: Option<String>,
}

impl MessageForm {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: MessageType::Text,
            media_url: None,
        }
    }

    pub fn into_request(self) -> SendMessageRequest {
        SendMessageRequest {
            content: self.content,
            message_type: self.message_type,
            media_url: self.media_url,
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct GroupForm {
    #[validate(length(min = 1, max = 100, message = "Group name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "At least one participant is required"))]
    pub participant_ids: Vec<Uuid>,
}

impl GroupForm {
    pub fn into_request(self) -> CreateGroupConversationRequest {
        CreateGroupConversationRequest {
            name: self.name,
            participant_ids: self.participant_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_messages(form: &impl Validate, field: &'static str) -> Vec<String> {
        let errs = form.validate().unwrap_err();
        errs.field_errors()
            .get(field)
            .map(|v| {
                v.iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn login_rejects_empty_identity() {
        let form = LoginForm {
            identity: "".into(),
            password: "hunter2".into(),
        };
        let msgs = field_messages(&form, "identity");
        assert!(msgs.contains(&"Username or email is required".to_string()));
    }

    #[test]
    fn login_rejects_empty_password() {
        let form = LoginForm {
            identity: "alice".into(),
            password: "".into(),
        };
        let msgs = field_messages(&form, "password");
        assert!(msgs.contains(&"Password is required".to_string()));
    }

    #[test]
    fn login_accepts_valid_input() {
        let form = LoginForm {
            identity: "alice@example.com".into(),
            password: "hunter2".into(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn register_rejects_password_mismatch() {
        let form = RegisterForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret123".into(),
            confirm_password: "secret124".into(),
            name: "Alice".into(),
        };
        let msgs = field_messages(&form, "confirm_password");
        assert!(msgs.contains(&"Passwords do not match".to_string()));
    }

    #[test]
    fn register_rejects_bad_username_chars() {
        let form = RegisterForm {
            username: "al ice!".into(),
            email: "alice@example.com".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            name: "Alice".into(),
        };
        assert!(!field_messages(&form, "username").is_empty());
    }

    #[test]
    fn register_request_never_carries_confirm_password() {
        let form = RegisterForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            name: "Alice".into(),
        };
        assert!(form.validate().is_ok());

        let json = serde_json::to_value(form.into_request()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("confirmPassword"));
        assert!(!obj.contains_key("confirm_password"));
        assert_eq!(obj.get("username").unwrap(), "alice");
    }

    #[test]
    fn message_form_defaults_to_text() {
        let form = MessageForm::text("hi");
        assert!(form.validate().is_ok());
        let json = serde_json::to_value(form.into_request()).unwrap();
        assert_eq!(json.get("messageType").unwrap(), "text");
    }

    #[test]
    fn group_form_requires_participants() {
        let form = GroupForm {
            name: "lunch".into(),
            participant_ids: vec![],
        };
        let msgs = field_messages(&form, "participant_ids");
        assert!(msgs.contains(&"At least one participant is required".to_string()));
    }
}
