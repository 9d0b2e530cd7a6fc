//! Integration coverage for the Enqueue transaction (C9) against a real
//! Postgres database: §8 scenarios S1 and S3, plus invariant 5
//! (all-or-nothing atomicity when funds are insufficient).

mod common;

use serial_test::serial;
use sms_gateway::ids::IdGenerator;
use sms_gateway::models::{Sms, SmsType};
use sms_gateway::services::{Pricing, QueueService};

const PRICING: Pricing = Pricing { normal: 10, express: 25 };

fn sms(text: &str) -> Sms {
    Sms {
        phone: "+989123456789".into(),
        text: text.into(),
        r#type: None,
    }
}

#[tokio::test]
#[serial]
async fn s1_enqueue_reserves_funds_and_publishes_outbox() {
    let pool = common::setup_pool().await;
    let customer_id = common::seed_customer_with_balance(&pool, 100).await;

    let service = QueueService::new(pool.clone(), IdGenerator::new(), PRICING);
    let msg_id = service
        .enqueue(customer_id, sms("hello"), SmsType::Normal)
        .await
        .expect("enqueue should succeed with sufficient funds");

    let (balance, reserved) = common::wallet_row(&pool, customer_id).await;
    assert_eq!(balance, 90);
    assert_eq!(reserved, 10);

    assert_eq!(common::ledger_count(&pool, &msg_id, "reserve").await, 1);
    assert_eq!(
        common::message_status(&pool, &msg_id).await.as_deref(),
        Some("queued")
    );

    let (topic, payload) = common::outbox_row(&pool, &msg_id)
        .await
        .expect("outbox row should exist");
    assert_eq!(topic, "sms.normal");
    let envelope: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(envelope["id"], msg_id);
    assert_eq!(envelope["user_id"], customer_id);
}

#[tokio::test]
#[serial]
async fn s3_insufficient_funds_leaves_no_trace() {
    let pool = common::setup_pool().await;
    let customer_id = common::seed_customer_with_balance(&pool, 10).await;

    let service = QueueService::new(pool.clone(), IdGenerator::new(), PRICING);
    let err = service
        .enqueue(customer_id, sms("hello"), SmsType::Express)
        .await
        .expect_err("402 expected: balance 10 < express price 25");

    assert!(matches!(
        err,
        sms_gateway::errors::ServiceError::InsufficientFunds { .. }
    ));

    let (balance, reserved) = common::wallet_row(&pool, customer_id).await;
    assert_eq!(balance, 10, "balance must be untouched by a rolled-back enqueue");
    assert_eq!(reserved, 0);

    let messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(messages, 0, "no message row for a rejected enqueue");

    let ledger: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wallet_ledger WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(ledger, 0, "no ledger row for a rejected enqueue");

    let outbox: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM outbox_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(outbox, 0, "no outbox row for a rejected enqueue (this customer had none pending)");
}

#[tokio::test]
#[serial]
async fn reserved_equals_sum_of_queued_messages() {
    let pool = common::setup_pool().await;
    let customer_id = common::seed_customer_with_balance(&pool, 1000).await;
    let service = QueueService::new(pool.clone(), IdGenerator::new(), PRICING);

    for _ in 0..3 {
        service
            .enqueue(customer_id, sms("hi"), SmsType::Normal)
            .await
            .unwrap();
    }
    service
        .enqueue(customer_id, sms("hi"), SmsType::Express)
        .await
        .unwrap();

    let (_, reserved) = common::wallet_row(&pool, customer_id).await;
    assert_eq!(reserved, 3 * 10 + 25);
}
