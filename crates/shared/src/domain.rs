use serde::{Deserialize, Serialize};

/// Role claim value that unlocks start/stop.
pub const ADMIN_ROLE: &str = "admin";

/// Local storage key holding the credential token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);

pub fn is_admin_role(role: &str) -> bool {
    role == ADMIN_ROLE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: String,
    pub role: String,
}
