use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build alert email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("alert delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Db(#[from] leadgen_db::DbError),
}
