use async_trait::async_trait;
use serde_dynamo::aws_sdk_dynamodb_0_9::{from_item, to_item};
use service_core::ddb::get_item::GetItemInput;
use service_core::ddb::put_item::PutItemInput;
use service_core::ddb::{Item, ThreadSafeDdbClient};
use uuid::Uuid;

use super::DdbStore;
use crate::model::Progress;
use crate::store::{ProgressRepository, StoreError};

#[async_trait]
impl<T: ThreadSafeDdbClient> ProgressRepository for DdbStore<T> {
    async fn get_progress(&self, user_id: &str, course_id: &Uuid) -> Result<Option<Progress>, StoreError> {
        let input = GetItemInput::builder()
            .table_name(self.tables.progress.as_str())
            .key(Progress::key(user_id, course_id))
            .build();

        match self.ddb.get_item(input).await? {
            Some(item) => Ok(Some(from_item(item)?)),
            None => Ok(None),
        }
    }

    async fn put_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        let item: Item = to_item(progress)?;
        let input = PutItemInput::builder()
            .table_name(self.tables.progress.as_str())
            .item(item)
            .build();

        Ok(self.ddb.put_item(input).await?)
    }
}
