use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A send request's current lifecycle state. Created as `Queued`, then
/// transitions exactly once to `Sent` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Queued,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Queued => "queued",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(MessageStatus::Queued),
            "sent" => Some(MessageStatus::Sent),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traffic lane. Distinct pricing, retry budget, topic and consumer group
/// per lane (see GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsType {
    Normal,
    Express,
}

impl SmsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmsType::Normal => "normal",
            SmsType::Express => "express",
        }
    }

    /// Empty/blank input normalizes to `Normal`; anything else must match
    /// exactly (case-insensitive) or parsing fails (§8 boundary case:
    /// unknown type -> 400).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "normal" => Some(SmsType::Normal),
            "express" => Some(SmsType::Express),
            _ => None,
        }
    }

    pub fn topic(&self) -> &'static str {
        match self {
            SmsType::Normal => "sms.normal",
            SmsType::Express => "sms.express",
        }
    }
}

impl fmt::Display for SmsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One send request, persisted in `messages`.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: String,
    pub customer_id: i64,
    pub phone: String,
    pub text: String,
    #[sqlx(rename = "type")]
    pub sms_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_type_empty_defaults_to_normal() {
        assert_eq!(SmsType::parse(""), Some(SmsType::Normal));
        assert_eq!(SmsType::parse("  "), Some(SmsType::Normal));
    }

    #[test]
    fn sms_type_unknown_is_rejected() {
        assert_eq!(SmsType::parse("urgent"), None);
    }

    #[test]
    fn sms_type_is_case_insensitive() {
        assert_eq!(SmsType::parse("EXPRESS"), Some(SmsType::Express));
    }
}
