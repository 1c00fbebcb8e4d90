/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Operations a caller can request against a center-scoped resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    ReadOne,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn verb(&self) -> &'static str {
        match self {
            Action::ReadOne => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Center-scoped collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    Family,
    Student,
    Woman,
    Attendance,
    TestScore,
}

impl Resource {
    pub fn singular(&self) -> &'static str {
        match self {
            Resource::Family => "Family",
            Resource::Student => "Student",
            Resource::Woman => "Woman",
            Resource::Attendance => "Attendance record",
            Resource::TestScore => "Test score",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Resource::Family => "families",
            Resource::Student => "students",
            Resource::Woman => "women",
            Resource::Attendance => "attendance records",
            Resource::TestScore => "test scores",
        }
    }

    pub fn not_found(&self) -> String {
        format!("{} not found", self.singular())
    }
}
