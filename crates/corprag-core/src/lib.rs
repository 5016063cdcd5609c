pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod session;
pub mod state;
pub mod upload;
pub mod view;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use client::{RagBackend, RagClient, DEFAULT_SERVER_URL};
pub use config::Config;
pub use error::{Ignored, ServiceError};
pub use request::{PendingQuestion, RequestCoordinator, Resolution};
pub use session::Session;
pub use state::{ChatMessage, ChatRole, ConversationState, MessageLog, UploadState, UploadStatus};
pub use upload::{is_supported_document, PendingUpload, UploadCoordinator, UploadFile};
pub use view::{View, ViewEntry};
