pub mod auth;
pub mod bulk_message_response;
pub mod channel;
pub mod enums;
pub mod error_types;
pub mod file;
pub mod message;
pub mod node;
pub mod server;
pub mod user;
pub mod websocket;

// Re-export the main types commonly used
pub use auth::{DataEditSession, DataLogin, ResponseLogin, SessionInfo};
pub use bulk_message_response::BulkMessageResponse;
pub use channel::{Channel, DataEditChannel, FieldsChannel};
pub use enums::{ChannelType, FileTag, SocketErrorId};
pub use error_types::Error as ApiError;
pub use file::{File, Metadata};
pub use message::{DataMessageSend, Message};
pub use node::NodeInfo;
pub use server::{Category, Server};
pub use user::{Member, User};
pub use websocket::*;
