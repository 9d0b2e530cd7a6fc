//! Queue service — Enqueue (C9): the single-transaction reserve -> ledger
//! -> message -> outbox write described in §4.4. No repository in this
//! crate opens its own transaction; this service owns the one transaction
//! boundary and passes it down to every repo call.

use sqlx::PgPool;

use crate::errors::ServiceError;
use crate::ids::IdGenerator;
use crate::models::{Envelope, Message, MessageStatus, Sms, SmsType};
use crate::repos::{ledger_repo, messages_repo, outbox_repo, wallet_repo};

#[derive(Debug, Clone, Copy)]
pub struct Pricing {
    pub normal: i64,
    pub express: i64,
}

impl Pricing {
    pub fn price_of(&self, lane: SmsType) -> i64 {
        match lane {
            SmsType::Normal => self.normal,
            SmsType::Express => self.express,
        }
    }
}

pub struct QueueService {
    pool: PgPool,
    ids: IdGenerator,
    pricing: Pricing,
}

impl QueueService {
    pub fn new(pool: PgPool, ids: IdGenerator, pricing: Pricing) -> Self {
        Self { pool, ids, pricing }
    }

    /// Reserve wallet funds, persist the message and publish the outbox
    /// event, all in one transaction. Returns the generated message id.
    pub async fn enqueue(
        &self,
        customer_id: i64,
        sms: Sms,
        lane: SmsType,
    ) -> Result<String, ServiceError> {
        let msg_id = self.ids.next();
        let price = self.pricing.price_of(lane);

        let envelope = Envelope {
            id: msg_id.clone(),
            user_id: customer_id,
            sms: Sms {
                phone: sms.phone.clone(),
                text: sms.text.clone(),
                r#type: Some(lane.as_str().to_string()),
            },
        };
        let payload = serde_json::to_vec(&envelope)
            .map_err(|e| ServiceError::InvalidInput(format!("envelope serialization: {e}")))?;

        let message = Message {
            id: msg_id.clone(),
            customer_id,
            phone: sms.phone,
            text: sms.text,
            sms_type: lane.as_str().to_string(),
            status: MessageStatus::Queued.as_str().to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        wallet_repo::upsert_account(&mut tx, customer_id).await?;
        let (balance, _reserved) = wallet_repo::get_for_update(&mut tx, customer_id).await?;

        if balance < price {
            return Err(ServiceError::InsufficientFunds { customer_id });
        }

        wallet_repo::adjust(&mut tx, customer_id, -price, price).await?;
        ledger_repo::insert_reserve(&mut tx, customer_id, price, &msg_id, &format!("reserve-{msg_id}"))
            .await?;
        messages_repo::insert_queued(&mut tx, &message).await?;
        outbox_repo::insert(&mut tx, "message", &msg_id, lane.topic(), &payload).await?;

        tx.commit().await?;

        Ok(msg_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_selects_by_lane() {
        let pricing = Pricing { normal: 10, express: 25 };
        assert_eq!(pricing.price_of(SmsType::Normal), 10);
        assert_eq!(pricing.price_of(SmsType::Express), 25);
    }
}
