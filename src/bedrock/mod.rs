pub mod client;
pub mod error;
pub mod types;

pub use client::{BedrockClient, ModelInvoker};
pub use error::{InvocationError, InvocationKind};
pub use types::{ModelRequest, RawResponse};
