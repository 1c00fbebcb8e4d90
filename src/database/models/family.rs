use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::user::UserRef;
use crate::database::record::Record;
use crate::filter::FieldValue;

/// Household unit owning students and women beneficiaries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub center: String,
    pub address: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Family {
    pub fn new(name: String, contact: String, center: String, address: String, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            contact,
            center,
            address,
            is_active: true,
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Family as returned by the API, with its derived member count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyView {
    #[serde(flatten)]
    pub family: Family,
    pub total_members: i64,
    pub creator: Option<UserRef>,
}

/// Embedded reference used by member records
#[derive(Debug, Clone, Serialize)]
pub struct FamilyRef {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
}

impl From<&Family> for FamilyRef {
    fn from(family: &Family) -> Self {
        Self {
            id: family.id,
            name: family.name.clone(),
            contact: family.contact.clone(),
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Family {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            contact: row.try_get("contact")?,
            center: row.try_get("center")?,
            address: row.try_get("address")?,
            is_active: row.try_get("is_active")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Record for Family {
    const TABLE: &'static str = "families";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "contact",
        "center",
        "address",
        "is_active",
        "created_by",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.contact.clone().into(),
            self.center.clone().into(),
            self.address.clone().into(),
            self.is_active.into(),
            self.created_by.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}
