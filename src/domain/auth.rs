//! Identity of the signed-in user as carried by the session token.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject identifier issued by the auth service.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

/// Returns `true` when `role` is among `roles`.
pub fn check_role(role: &str, roles: &[String]) -> bool {
    roles.iter().any(|r| r == role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_role_matches_exact_names() {
        let roles = vec!["helix".to_string(), "helix_editor".to_string()];

        assert!(check_role("helix", &roles));
        assert!(check_role("helix_editor", &roles));
        assert!(!check_role("helix_admin", &roles));
        assert!(!check_role("help", &roles));
    }
}
