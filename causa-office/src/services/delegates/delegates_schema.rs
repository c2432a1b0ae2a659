use causa_auth::DelegateRole;
use serde::Deserialize;
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Delegates schema validation failed";

/// Create payload as the service sees it: the password has already been
/// replaced by its hash.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDelegate {
    #[validate(length(min = 2, max = 150))]
    pub username: String,

    pub password_hash: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone: String,

    pub role: DelegateRole,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDelegate {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone: String,

    pub role: DelegateRole,

    #[serde(default = "active_by_default")]
    pub active: bool,

    #[serde(default)]
    pub password_hash: Option<String>,
}

fn active_by_default() -> bool {
    true
}
