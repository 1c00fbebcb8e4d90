//! Center-scoped access control.
//!
//! Every protected handler receives a [`CallerContext`] and asks it two
//! questions: which center filter applies to a read, and whether a mutation
//! on a given center is allowed. Admins are unrestricted; tutors see and touch
//! only their own center.

use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Attendance, Family, Role, Student, TestScore, User, Woman};
use crate::types::{Action, Resource};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{resource} center must match family center")]
    CenterMismatch { resource: &'static str },

    #[error("Access denied. Unsupported role '{0}'")]
    UnknownRole(String),

    #[error("Tutor account has no assigned center")]
    MissingCenter,
}

/// The authenticated caller, passed explicitly into every policy decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub id: Uuid,
    pub role: Role,
    center: Option<String>,
}

impl CallerContext {
    pub fn new(id: Uuid, role: Role, center: Option<String>) -> Result<Self, AccessError> {
        match role {
            Role::Admin => Ok(Self { id, role, center: None }),
            Role::Tutor => match center {
                Some(c) if !c.trim().is_empty() => Ok(Self { id, role, center: Some(c) }),
                _ => Err(AccessError::MissingCenter),
            },
        }
    }

    /// Build from a raw role label, rejecting anything but admin and tutor
    pub fn from_parts(id: Uuid, role: &str, center: Option<String>) -> Result<Self, AccessError> {
        let role = role
            .parse::<Role>()
            .map_err(|_| AccessError::UnknownRole(role.to_string()))?;
        Self::new(id, role, center)
    }

    pub fn from_user(user: &User) -> Result<Self, AccessError> {
        Self::new(user.id, user.role, user.center.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Assigned center, `None` for admins
    pub fn center(&self) -> Option<&str> {
        self.center.as_deref()
    }

    /// Center filter for list and report queries.
    ///
    /// Tutors always get their own center; whatever they request is ignored.
    /// Admins get the requested center, or no filter at all.
    pub fn scope(&self, requested: Option<&str>) -> Option<String> {
        match self.role {
            Role::Tutor => self.center.clone(),
            Role::Admin => requested
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        }
    }

    /// Decide whether `action` on a record in `center` is allowed
    pub fn authorize(&self, action: Action, resource: Resource, center: &str) -> Result<(), AccessError> {
        if self.is_admin() || self.center() == Some(center) {
            return Ok(());
        }
        tracing::debug!(
            caller = %self.id,
            ?action,
            ?resource,
            center,
            "center policy denied request"
        );
        let message = match action {
            Action::Create => format!(
                "Access denied. You can only create {} for your center.",
                resource.plural()
            ),
            _ => format!(
                "Access denied. You can only {} {} from your center.",
                action.verb(),
                resource.plural()
            ),
        };
        Err(AccessError::Forbidden(message))
    }

    pub fn require_admin(&self) -> Result<(), AccessError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AccessError::Forbidden("Access denied. Admin privileges required.".to_string()))
        }
    }
}

/// Records that carry a denormalized center
pub trait Scoped {
    fn center(&self) -> &str;
}

macro_rules! scoped {
    ($($ty:ty),+) => {
        $(impl Scoped for $ty {
            fn center(&self) -> &str {
                &self.center
            }
        })+
    };
}

scoped!(Family, Student, Woman, Attendance, TestScore);

/// A beneficiary's center must equal its family's center, whatever the caller's role
pub fn ensure_family_center(resource: Resource, payload_center: &str, family_center: &str) -> Result<(), AccessError> {
    if payload_center == family_center {
        Ok(())
    } else {
        Err(AccessError::CenterMismatch {
            resource: resource.singular(),
        })
    }
}
