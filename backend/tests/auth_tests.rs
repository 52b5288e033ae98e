//! Authentication and authorization tests
//!
//! - token verification (signature, expiry, claims)
//! - group to permission mapping

use cafe_backend::error::AppError;
use cafe_backend::middleware::auth::{decode_token, Claims, MANAGER_GROUP, STAFF_GROUP};
use cafe_backend::middleware::{AuthUser, Permission};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use proptest::prelude::*;

const SECRET: &str = "test-secret";

fn token(groups: &[&str], secret: &str, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "user-1".to_string(),
        name: Some("Ana".to_string()),
        groups: groups.iter().map(|g| g.to_string()).collect(),
        exp: now + exp_offset_secs,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

fn user(groups: &[&str]) -> AuthUser {
    AuthUser {
        subject: "user-1".to_string(),
        name: None,
        groups: groups.iter().map(|g| g.to_string()).collect(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_valid_token_decodes() {
        let claims = decode_token(&token(&[STAFF_GROUP], SECRET, 3600), SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.groups, vec!["staff".to_string()]);

        let user = AuthUser::from(claims);
        assert!(user.in_group("STAFF"));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let err = decode_token(&token(&[MANAGER_GROUP], "other-secret", 3600), SECRET).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let err = decode_token(&token(&[MANAGER_GROUP], SECRET, -3600), SECRET).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        assert!(decode_token("not.a.token", SECRET).is_err());
    }

    #[test]
    fn test_manager_can_do_everything() {
        let manager = user(&[MANAGER_GROUP]);
        assert!(manager.require(Permission::View).is_ok());
        assert!(manager.require(Permission::RecordSale).is_ok());
        assert!(manager.require(Permission::Manage).is_ok());
    }

    #[test]
    fn test_staff_can_view_and_sell() {
        let staff = user(&[STAFF_GROUP]);
        assert!(staff.require(Permission::View).is_ok());
        assert!(staff.require(Permission::RecordSale).is_ok());

        let err = staff.require(Permission::Manage).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_no_groups_means_no_access() {
        let nobody = user(&[]);
        assert!(nobody.require(Permission::View).is_err());
        assert!(nobody.require(Permission::RecordSale).is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Group names that grant nothing
    fn unknown_group_strategy() -> impl Strategy<Value = String> {
        "[a-z]{3,12}".prop_filter("known group", |g| g != MANAGER_GROUP && g != STAFF_GROUP)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Only the manager group grants Manage
        #[test]
        fn prop_manage_requires_manager_group(
            groups in prop::collection::vec(unknown_group_strategy(), 0..4),
            with_staff in any::<bool>()
        ) {
            let mut groups = groups;
            if with_staff {
                groups.push(STAFF_GROUP.to_string());
            }
            let user = AuthUser { subject: "u".to_string(), name: None, groups: groups.clone() };
            prop_assert!(!user.has_permission(Permission::Manage));
            prop_assert_eq!(user.has_permission(Permission::View), with_staff);

            groups.push(MANAGER_GROUP.to_string());
            let manager = AuthUser { subject: "u".to_string(), name: None, groups };
            prop_assert!(manager.has_permission(Permission::Manage));
        }
    }
}
