use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use common_macros::hash_map;
use serde::{Deserialize, Serialize};
use aws_sdk_dynamodb::model::AttributeValue;
use service_core::ddb::Item;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::InvalidTransition;

/// Access-granting record for a (user, course) pair.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[builder(default = Uuid::new_v4())]
    pub enrollment_id: Uuid,

    #[builder(setter(into))]
    pub user_id: String,

    pub course_id: Uuid,

    #[serde(default)]
    #[builder(default)]
    pub amount: f64,

    #[builder(default)]
    pub status: EnrollmentStatus,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Success,
    Failed,
}

impl Default for EnrollmentStatus {
    fn default() -> Self {
        EnrollmentStatus::Pending
    }
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 3] = [EnrollmentStatus::Pending, EnrollmentStatus::Success, EnrollmentStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Success => "success",
            EnrollmentStatus::Failed => "failed",
        }
    }

    /// Access, once granted, is never revoked by a payment event.
    pub fn transition(self, to: EnrollmentStatus) -> Result<EnrollmentStatus, InvalidTransition> {
        use EnrollmentStatus::*;

        match (self, to) {
            (from, to) if from == to => Ok(to),
            (Pending, Success) | (Pending, Failed) | (Failed, Success) => Ok(to),
            (from, to) => Err(InvalidTransition {
                from: from.as_str(),
                to: to.as_str(),
            }),
        }
    }
}

impl Display for EnrollmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Enrollment {
    /// Enrollments created for a purchase get an id derived from it, so that concurrent
    /// creators (checkout, webhook recovery, manual completion) all land on the same row.
    pub fn id_for_purchase(purchase_id: &Uuid) -> Uuid {
        Uuid::new_v5(purchase_id, b"enrollment")
    }

    pub fn key(enrollment_id: &Uuid) -> Item {
        hash_map! {
            "enrollmentId".to_string() => AttributeValue::S(enrollment_id.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Success
    }
}
