//! The agent capabilities a [`super::GovernanceWrapper`] can instrument.
//!
//! The wrapper treats the agent as fully opaque: it only needs to serialize
//! inputs and outputs for previews and render errors as text.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

/// An agent exposing a single-result call.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    type Input: Serialize + Send + Sync;
    type Output: Serialize + Send;
    type Error: std::fmt::Display + Send;

    async fn invoke(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}

/// An agent that can also produce its result incrementally.
pub trait StreamingCapability: AgentCapability {
    type Chunk: AsRef<str> + Send;

    fn stream(&self, input: Self::Input) -> BoxStream<'_, Result<Self::Chunk, Self::Error>>;
}
