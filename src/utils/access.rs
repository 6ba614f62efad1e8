// src/utils/access.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::assignment::Assignment, utils::jwt::Claims};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "instructor" => Some(Role::Instructor),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

/// Who is calling, resolved once from the verified claims and handed to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
        let role = Role::parse(&claims.role)
            .ok_or_else(|| AppError::AuthError("Unknown role".to_string()))?;
        Ok(Self { user_id, role })
    }

    /// Instructors may only manage what they created.
    pub fn ensure_owns(&self, assignment: &Assignment) -> Result<(), AppError> {
        if self.role == Role::Instructor && assignment.instructor_id == self.user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not own this assignment".to_string(),
            ))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| AppError::AuthError("Missing credentials".to_string()))?;
        Identity::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: 0,
        }
    }

    #[test]
    fn identity_from_valid_claims() {
        let id = Identity::from_claims(&claims("7", "instructor")).unwrap();
        assert_eq!(id, Identity { user_id: 7, role: Role::Instructor });
    }

    #[test]
    fn malformed_subject_or_role_is_rejected() {
        assert!(Identity::from_claims(&claims("x", "student")).is_err());
        assert!(Identity::from_claims(&claims("7", "admin")).is_err());
    }
}
