use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use common_macros::hash_map;
use serde::{Deserialize, Serialize};
use aws_sdk_dynamodb::model::AttributeValue;
use service_core::ddb::Item;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::InvalidTransition;

/// Financial record of one checkout attempt.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    #[builder(default = Uuid::new_v4())]
    pub purchase_id: Uuid,

    pub course_id: Uuid,

    #[builder(setter(into))]
    pub user_id: String,

    pub amount: f64,

    #[builder(default)]
    pub status: PurchaseStatus,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
}

impl Default for PurchaseStatus {
    fn default() -> Self {
        PurchaseStatus::Pending
    }
}

impl PurchaseStatus {
    pub const ALL: [PurchaseStatus; 3] = [PurchaseStatus::Pending, PurchaseStatus::Completed, PurchaseStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }

    /// Moves to `to`, refusing to reopen or flip a settled purchase. Self-transitions are allowed
    /// so redelivered gateway events are harmless.
    pub fn transition(self, to: PurchaseStatus) -> Result<PurchaseStatus, InvalidTransition> {
        use PurchaseStatus::*;

        match (self, to) {
            (from, to) if from == to => Ok(to),
            (Pending, Completed) | (Pending, Failed) => Ok(to),
            // A late success confirmation wins over an expired session.
            (Failed, Completed) => Ok(to),
            (from, to) => Err(InvalidTransition {
                from: from.as_str(),
                to: to.as_str(),
            }),
        }
    }
}

impl Display for PurchaseStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Purchase {
    pub fn key(purchase_id: &Uuid) -> Item {
        hash_map! {
            "purchaseId".to_string() => AttributeValue::S(purchase_id.to_string()),
        }
    }
}
