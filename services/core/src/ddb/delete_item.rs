use async_trait::async_trait;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::{DdbError, Item};

#[derive(Debug, Clone, TypedBuilder)]
pub struct DeleteItemInput {
    #[builder(setter(into))]
    pub table_name: String,

    #[builder(setter(into))]
    pub key: Item,
}

#[async_trait]
pub trait DeleteItem {
    /// Deletes the item under the given key. Deleting a missing item is not an error.
    async fn delete_item(&self, input: DeleteItemInput) -> Result<(), DdbError>;
}

#[async_trait]
impl DeleteItem for Adapter {
    async fn delete_item(&self, input: DeleteItemInput) -> Result<(), DdbError> {
        self.raw
            .delete_item()
            .table_name(input.table_name)
            .set_key(Some(input.key))
            .send()
            .await
            .map_err(|e| DdbError::Sdk(e.into()))?;

        Ok(())
    }
}
