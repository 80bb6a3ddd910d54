use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub role: String,
    pub content: String,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn display_time(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub message_id: i64,
    pub is_positive: bool,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn display_time_uses_second_precision() {
        let msg = ChatMessage {
            id: 1,
            role: Role::User.as_str().to_string(),
            content: "hello".to_string(),
            model: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 5).unwrap(),
        };
        assert_eq!(msg.display_time(), "2024-05-17 09:30:05");
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::System.as_str(), "system");
    }
}
