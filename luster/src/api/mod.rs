//! Low-level endpoint access.
//!
//! One trait per route group, all implemented on
//! [`HttpHandler`](crate::http::HttpHandler). Methods map one-to-one to REST
//! routes and return wire types from [`crate::types`].

pub mod auth;
pub mod channels;
pub mod files;
pub mod messages;
pub mod node;
pub mod servers;
pub mod session;
pub mod users;

pub use auth::AuthApi;
pub use channels::ChannelsApi;
pub use files::FilesApi;
pub use messages::{FetchMessagesOptions, MessagesApi};
pub use node::NodeApi;
pub use servers::ServersApi;
pub use session::SessionApi;
pub use users::UsersApi;
