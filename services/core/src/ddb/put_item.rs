use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{PutItemError, PutItemErrorKind};
use aws_sdk_dynamodb::model::AttributeValue;
use aws_sdk_dynamodb::types::SdkError;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::{DdbError, Item};

#[derive(Debug, Clone, TypedBuilder)]
pub struct PutItemInput {
    #[builder(setter(into))]
    pub table_name: String,

    #[builder(setter(into))]
    pub item: Item,

    #[builder(default, setter(strip_option, into))]
    pub condition_expression: Option<String>,

    #[builder(default, setter(strip_option))]
    pub expression_attribute_values: Option<HashMap<String, AttributeValue>>,
}

#[async_trait]
pub trait PutItem {
    /// Writes the whole item. A failing condition is reported as `DdbError::ConditionalCheckFailed`.
    async fn put_item(&self, input: PutItemInput) -> Result<(), DdbError>;
}

#[async_trait]
impl PutItem for Adapter {
    async fn put_item(&self, input: PutItemInput) -> Result<(), DdbError> {
        self.raw
            .put_item()
            .table_name(input.table_name)
            .set_item(Some(input.item))
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError {
                    err:
                        PutItemError {
                            kind: PutItemErrorKind::ConditionalCheckFailedException(_),
                            ..
                        },
                    ..
                } => DdbError::ConditionalCheckFailed,
                e => DdbError::Sdk(e.into()),
            })?;

        Ok(())
    }
}
