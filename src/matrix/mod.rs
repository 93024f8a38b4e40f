//! Matrix transport.
//!
//! The rest of the crate never touches the SDK directly:
//!
//! - [`MatrixClient`] implements [`MessageSink`](crate::sink::MessageSink)
//!   for everything a bot sends
//! - the sync loop translates room events into
//!   [`InboundEvent`](crate::events::InboundEvent)s pushed on a channel
//!
//! Logging in, restoring the persisted session and unlocking the encryption
//! secrets happen once in [`MatrixClient::connect`].

mod client;
mod login;
mod session;
mod sync;

pub use crate::matrix::client::MatrixClient;

/// Credentials of the bot account.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: String,
    pub password: String,
    /// Recovery passphrase, encrypted rooms are unreadable on a new device
    /// without it
    pub passphrase: Option<String>,
}

impl From<&crate::config::Matrix> for UserCredentials {
    fn from(matrix: &crate::config::Matrix) -> Self {
        UserCredentials {
            user_id: matrix.user_id.clone(),
            password: matrix.password.clone(),
            passphrase: matrix.passphrase.clone(),
        }
    }
}
