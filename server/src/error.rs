//! Mapping from domain errors to [`AppError`].
//!
//! | Error | Status |
//! |---|---|
//! | `AuthError::MissingCredentials`, `InvalidToken` | 401 |
//! | `AuthError::InsufficientPermissions` | 403 |
//! | `AuthError::TooManyAttempts` | 429 + `Retry-After` |
//! | `AuthError::ProviderUnavailable` | 502 |
//! | `CommerceError::Validation` | 422 with `details.fields` |
//! | `CommerceError::Unavailable`, `OutOfStock`, `SoldOutWhileReserving` | 409 |
//! | `MediaError::Validation` / `Forbidden` / `TooLarge` / `Platform` | 422 / 403 / 413 / 502 |
//!
//! Everything else is a 500 with the domain error kept as the log source.

use campus_auth::AuthError;
use campus_commerce::CommerceError;
use campus_media::MediaError;
use campus_web::AppError;
use serde_json::json;

/// Map an auth failure.
#[must_use]
pub fn auth_error(err: AuthError) -> AppError {
    match err {
        AuthError::MissingCredentials | AuthError::InvalidToken => {
            AppError::unauthorized(err.to_string())
        }
        AuthError::InsufficientPermissions { .. } => AppError::forbidden(err.to_string()),
        AuthError::TooManyAttempts { retry_after } => {
            AppError::too_many_requests("Too many requests, please try again later", retry_after)
        }
        AuthError::ProviderUnavailable(_) => {
            AppError::bad_gateway("Identity provider unavailable").with_source(err.into())
        }
        AuthError::DatabaseError(_) | AuthError::InternalError(_) => {
            AppError::internal("An internal error occurred").with_source(err.into())
        }
    }
}

/// Map an order placement failure.
#[must_use]
pub fn commerce_error(err: CommerceError) -> AppError {
    match err {
        CommerceError::Validation(fields) => AppError::validation("Order request is invalid")
            .with_details(json!({ "fields": fields })),
        CommerceError::Unavailable { .. }
        | CommerceError::OutOfStock { .. }
        | CommerceError::SoldOutWhileReserving { .. } => AppError::conflict(err.to_string()),
        CommerceError::Catalog(_)
        | CommerceError::Membership(_)
        | CommerceError::Persistence(_) => {
            AppError::internal("Order could not be placed").with_source(err.into())
        }
    }
}

/// Map an upload failure.
#[must_use]
pub fn media_error(err: MediaError) -> AppError {
    match err {
        MediaError::Validation(_) => AppError::validation(err.to_string()),
        MediaError::Forbidden(_) => AppError::forbidden(err.to_string()),
        MediaError::TooLarge { .. } => AppError::payload_too_large(err.to_string()),
        MediaError::Platform { .. } => {
            AppError::bad_gateway("Video platform request failed").with_source(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use campus_commerce::FieldError;
    use std::time::Duration;

    #[test]
    fn test_auth_statuses() {
        assert_eq!(auth_error(AuthError::InvalidToken).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            auth_error(AuthError::InsufficientPermissions {
                required: "admin".into()
            })
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            auth_error(AuthError::TooManyAttempts {
                retry_after: Duration::from_secs(30)
            })
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            auth_error(AuthError::ProviderUnavailable("timeout".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            auth_error(AuthError::DatabaseError("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_commerce_statuses() {
        let invalid = CommerceError::Validation(vec![FieldError::new("items", "required")]);
        assert_eq!(commerce_error(invalid).status(), StatusCode::UNPROCESSABLE_ENTITY);

        let sold_out = CommerceError::OutOfStock {
            item: "ticket type x".into(),
            requested: 2,
            available: 1,
        };
        assert_eq!(commerce_error(sold_out).status(), StatusCode::CONFLICT);

        let raced = CommerceError::SoldOutWhileReserving {
            item: "product p".into(),
            requested: 1,
        };
        assert_eq!(commerce_error(raced).status(), StatusCode::CONFLICT);
        assert_eq!(
            commerce_error(CommerceError::Persistence("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_media_statuses() {
        assert_eq!(
            media_error(MediaError::TooLarge { size: 10, max: 5 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            media_error(MediaError::transport("reset")).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
