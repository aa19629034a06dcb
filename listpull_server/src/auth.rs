//! Staff authentication for the `/api` routes.
//!
//! Staff requests carry the shared API token as `Authorization: Bearer <token>`. Handlers opt in by taking a
//! [`StaffAuth`] argument; the request is rejected before the handler runs if the token is missing or wrong.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use listpull_common::Secret;
use log::*;

use crate::errors::ServerError;

/// The configured staff token, registered as app data.
#[derive(Clone, Debug, Default)]
pub struct StaffApiToken(pub Secret<String>);

impl StaffApiToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(Secret::new(token.into()))
    }

    /// Checks a presented token. An empty configured token matches nothing.
    pub fn accepts(&self, presented: &str) -> bool {
        let expected = self.0.reveal().as_bytes();
        let presented = presented.as_bytes();
        if expected.is_empty() || expected.len() != presented.len() {
            return false;
        }
        expected.iter().zip(presented).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

/// Proof that the request presented a valid staff token.
#[derive(Debug, Clone, Copy)]
pub struct StaffAuth;

impl FromRequest for StaffAuth {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(check_staff_token(req))
    }
}

fn check_staff_token(req: &HttpRequest) -> Result<StaffAuth, ServerError> {
    let token = match req.app_data::<web::Data<StaffApiToken>>() {
        Some(t) if !t.0.is_empty() => t,
        _ => {
            debug!("💻️ Staff request to {} refused. No staff API token is configured", req.path());
            return Err(ServerError::StaffApiDisabled);
        },
    };
    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(ServerError::MissingStaffToken)?;
    if token.accepts(presented) {
        trace!("💻️ Staff token accepted for {}", req.path());
        Ok(StaffAuth)
    } else {
        warn!("💻️ Invalid staff token presented for {}", req.path());
        Err(ServerError::MissingStaffToken)
    }
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn empty_token_accepts_nothing() {
        let token = StaffApiToken::default();
        assert!(!token.accepts(""));
        assert!(!token.accepts("anything"));
    }

    #[test]
    fn token_must_match_exactly() {
        let token = StaffApiToken::new("s3cret");
        assert!(token.accepts("s3cret"));
        assert!(!token.accepts("s3cre"));
        assert!(!token.accepts("S3CRET"));
    }

    #[test]
    fn bearer_header_is_required() {
        let req = TestRequest::default()
            .app_data(web::Data::new(StaffApiToken::new("s3cret")))
            .insert_header((AUTHORIZATION, "Bearer s3cret"))
            .to_http_request();
        assert!(check_staff_token(&req).is_ok());

        let req = TestRequest::default()
            .app_data(web::Data::new(StaffApiToken::new("s3cret")))
            .insert_header((AUTHORIZATION, "s3cret"))
            .to_http_request();
        assert!(matches!(check_staff_token(&req), Err(ServerError::MissingStaffToken)));

        let req = TestRequest::default().insert_header((AUTHORIZATION, "Bearer s3cret")).to_http_request();
        assert!(matches!(check_staff_token(&req), Err(ServerError::StaffApiDisabled)));
    }
}
