use serde::{Deserialize, Serialize};

/// Error body returned by the REST API on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    /// Source location on the server side, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "PascalCase")]
pub enum ErrorKind {
    LabelMe,
    AlreadyOnboarded,
    UsernameTaken,
    InvalidUsername,
    UnknownUser,
    AlreadyFriends,
    AlreadySentRequest,
    Blocked,
    BlockedByOther,
    NotFriends,
    UnknownChannel,
    UnknownAttachment,
    UnknownMessage,
    CannotEditMessage,
    CannotJoinCall,
    TooManyAttachments { max: u32 },
    TooManyReplies { max: u32 },
    TooManyChannels { max: u32 },
    EmptyMessage,
    PayloadTooLarge,
    CannotRemoveYourself,
    GroupTooLarge { max: u32 },
    AlreadyInGroup,
    NotInGroup,
    UnknownServer,
    InvalidRole,
    Banned,
    TooManyServers { max: u32 },
    AlreadyInServer,
    IsBot,
    BotIsPrivate,
    MissingPermission { permission: String },
    MissingUserPermission { permission: String },
    NotElevated,
    NotPrivileged,
    CannotGiveMissingPermissions,
    NotOwner,
    DatabaseError { operation: String, collection: String },
    InternalError,
    InvalidOperation,
    InvalidCredentials,
    InvalidProperty,
    InvalidSession,
    DuplicateNonce,
    NotFound,
    NoEffect,
    FailedValidation { error: String },
    /// Any error type this crate does not know about yet.
    #[serde(other)]
    Unknown,
}
