//! Staff detection for privileged endpoints
//!
//! A request is from staff when its `X-Staff-Token` header equals the
//! configured staff token. Without a configured token nobody is staff.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use subtle::ConstantTimeEq;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const STAFF_TOKEN_HEADER: &str = "x-staff-token";

/// Who is making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub is_staff: bool,
}

impl Caller {
    pub fn require_staff(&self) -> ApiResult<()> {
        if self.is_staff {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Staff permission required".to_string(),
            ))
        }
    }
}

fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(STAFF_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        let is_staff = match (state.staff_token.as_deref(), presented) {
            (Some(expected), Some(presented)) => tokens_match(expected, presented),
            _ => false,
        };

        Ok(Caller { is_staff })
    }
}
