pub mod reports;
pub mod send_sms;
pub mod wallet_topup;
