//! Session token handling for [`AuthenticatedUser`].
//!
//! The auth service stores a signed JWT as the identity of the session. Every
//! request carrying one is decoded with the shared secret; anything else is
//! answered with `401 Unauthorized`, which [`crate::middleware::RedirectUnauthorized`]
//! turns into a redirect to the sign-in page.

use std::future::{Ready, ready};

use actix_identity::IdentityExt;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::domain::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;

/// Decodes and validates a session token.
pub fn decode_token(token: &str, secret: &str) -> Result<AuthenticatedUser, jsonwebtoken::errors::Error> {
    let data = decode::<AuthenticatedUser>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Signs `user` into a session token.
pub fn encode_token(user: &AuthenticatedUser, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        user,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = match req.get_identity().and_then(|identity| identity.id()) {
            Ok(token) => token,
            Err(_) => return ready(Err(ErrorUnauthorized("Not signed in"))),
        };
        let Some(config) = req.app_data::<web::Data<ServerConfig>>() else {
            log::error!("Server configuration is missing from the application data");
            return ready(Err(ErrorUnauthorized("Not signed in")));
        };
        ready(decode_token(&token, &config.secret).map_err(|e| {
            log::warn!("Rejected session token: {e}");
            ErrorUnauthorized("Invalid session")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(exp: usize) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "42".to_string(),
            email: "analyst@example.org".to_string(),
            name: "Analyst".to_string(),
            roles: vec!["helix".to_string()],
            exp,
        }
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn token_round_trips_with_the_same_secret() {
        let token = encode_token(&user(far_future()), "secret").expect("encodes");

        let decoded = decode_token(&token, "secret").expect("decodes");

        assert_eq!(decoded.email, "analyst@example.org");
        assert_eq!(decoded.roles, vec!["helix".to_string()]);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = encode_token(&user(far_future()), "secret").expect("encodes");

        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = encode_token(&user(1), "secret").expect("encodes");

        assert!(decode_token(&token, "secret").is_err());
    }
}
