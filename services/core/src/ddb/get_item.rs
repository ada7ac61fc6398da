use async_trait::async_trait;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::{DdbError, Item};

#[derive(Debug, Clone, TypedBuilder)]
pub struct GetItemInput {
    #[builder(setter(into))]
    pub table_name: String,

    pub key: Item,

    #[builder(default = false)]
    pub consistent_read: bool,

    #[builder(default, setter(strip_option, into))]
    pub projection_expression: Option<String>,
}

#[async_trait]
pub trait GetItem {
    /// Returns the item stored under the given key, if any.
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>, DdbError>;
}

#[async_trait]
impl GetItem for Adapter {
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>, DdbError> {
        let output = self
            .raw
            .get_item()
            .table_name(input.table_name)
            .set_key(Some(input.key))
            .consistent_read(input.consistent_read)
            .set_projection_expression(input.projection_expression)
            .send()
            .await
            .map_err(|e| DdbError::Sdk(e.into()))?;

        Ok(output.item)
    }
}
