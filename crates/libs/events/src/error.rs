use thiserror::Error;

/// Errors raised while building or delivering a lifecycle event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to build CloudEvents envelope: {0}")]
    Envelope(#[from] cloudevents::event::EventBuilderError),

    #[error("failed to serialize event payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),

    #[error("failed to encode CloudEvents HTTP request: {0}")]
    Encode(#[from] cloudevents::message::Error),
}
