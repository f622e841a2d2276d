//! Storage key constants.

/// Keys under which the session is persisted.
pub struct StorageKeys;

impl StorageKeys {
    /// Access token sent as the bearer credential
    pub const AUTH_TOKEN: &'static str = "auth_token";

    /// Refresh token exchanged for a new access token
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Serialized user profile (JSON)
    pub const AUTH_USER: &'static str = "auth_user";

    /// Every key the session owns, in the order they are cleared.
    pub const ALL: [&'static str; 3] = [Self::AUTH_TOKEN, Self::REFRESH_TOKEN, Self::AUTH_USER];
}
