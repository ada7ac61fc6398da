use async_trait::async_trait;
use aws_sdk_dynamodb::model::AttributeValue;
use common_macros::hash_map;
use serde_dynamo::aws_sdk_dynamodb_0_9::{from_item, from_items, to_item};
use service_core::ddb::delete_item::DeleteItemInput;
use service_core::ddb::get_item::GetItemInput;
use service_core::ddb::put_item::PutItemInput;
use service_core::ddb::query::QueryInput;
use service_core::ddb::update_item::UpdateItemInput;
use service_core::ddb::{DdbError, Item, ThreadSafeDdbClient};
use uuid::Uuid;

use super::DdbStore;
use crate::model::{Purchase, PurchaseStatus};
use crate::store::{PurchaseRepository, StoreError};

#[async_trait]
impl<T: ThreadSafeDdbClient> PurchaseRepository for DdbStore<T> {
    async fn create_purchase(&self, purchase: &Purchase) -> Result<(), StoreError> {
        let item: Item = to_item(purchase)?;
        let input = PutItemInput::builder()
            .table_name(self.tables.purchases.as_str())
            .item(item)
            .condition_expression("attribute_not_exists(purchaseId)")
            .build();

        Ok(self.ddb.put_item(input).await?)
    }

    async fn get_purchase(&self, purchase_id: &Uuid) -> Result<Option<Purchase>, StoreError> {
        let input = GetItemInput::builder()
            .table_name(self.tables.purchases.as_str())
            .key(Purchase::key(purchase_id))
            .consistent_read(true)
            .build();

        match self.ddb.get_item(input).await? {
            Some(item) => Ok(Some(from_item(item)?)),
            None => Ok(None),
        }
    }

    async fn set_purchase_status(&self, purchase_id: &Uuid, from: PurchaseStatus, to: PurchaseStatus) -> Result<bool, StoreError> {
        let input = UpdateItemInput::builder()
            .table_name(self.tables.purchases.as_str())
            .key(Purchase::key(purchase_id))
            .update_expression("SET #status = :to")
            .condition_expression("#status = :from")
            .expression_attribute_names(hash_map! {
                "#status".to_string() => "status".to_string(),
            })
            .expression_attribute_values(hash_map! {
                ":from".to_string() => AttributeValue::S(from.as_str().to_string()),
                ":to".to_string() => AttributeValue::S(to.as_str().to_string()),
            })
            .build();

        match self.ddb.update_item(input).await {
            Ok(_) => Ok(true),
            Err(DdbError::ConditionalCheckFailed) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_course_purchases(&self, course_id: &Uuid) -> Result<Vec<Purchase>, StoreError> {
        let input = QueryInput::builder()
            .table_name(self.tables.purchases.as_str())
            .index_name("CourseIdIndex")
            .key_condition_expression("courseId = :course_id")
            .expression_attribute_values(Some(hash_map! {
                ":course_id".to_string() => AttributeValue::S(course_id.to_string()),
            }))
            .build();

        let mut purchases: Vec<Purchase> = from_items(self.ddb.query_all(input).await?)?;
        purchases.sort_by_key(|p| p.created_at);
        Ok(purchases)
    }

    async fn delete_course_purchases(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        let purchases = self.list_course_purchases(course_id).await?;

        for purchase in &purchases {
            let input = DeleteItemInput::builder()
                .table_name(self.tables.purchases.as_str())
                .key(Purchase::key(&purchase.purchase_id))
                .build();
            self.ddb.delete_item(input).await?;
        }

        Ok(purchases.len())
    }
}
