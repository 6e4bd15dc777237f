//! Client side of the system control console: token storage, the role
//! reader, the control service client and the start/stop toggle.

pub mod auth;
pub mod system_control;
pub mod toggle;
pub mod token_store;

pub use auth::{decode_token_claims, AuthError, AuthService, TokenClaims, TokenDecodeError};
pub use system_control::{ControlError, HttpSystemControl, SystemControlService};
pub use toggle::{ControlToggle, ToggleEvent, ToggleOutcome, ToggleSnapshot, ToggleState};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
