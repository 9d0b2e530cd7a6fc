use serde::{Deserialize, Serialize};

/// The JSON payload serialized into the outbox row / bus message (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub user_id: i64,
    pub sms: Sms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sms {
    pub phone: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub r#type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let env = Envelope {
            id: "01HZZZ".into(),
            user_id: 7,
            sms: Sms {
                phone: "+989123456789".into(),
                text: "hi".into(),
                r#type: Some("express".into()),
            },
        };
        let raw = serde_json::to_vec(&env).unwrap();
        let back: Envelope = serde_json::from_slice(&raw).unwrap();
        assert_eq!(back.id, "01HZZZ");
        assert_eq!(back.sms.phone, "+989123456789");
    }
}
