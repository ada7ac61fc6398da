use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::model::AttributeValue;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::{DdbError, Item, Page};

#[derive(Debug, Clone, TypedBuilder)]
pub struct QueryInput {
    #[builder(setter(into))]
    pub table_name: String,

    #[builder(default, setter(strip_option, into))]
    pub index_name: Option<String>,

    #[builder(default, setter(strip_option))]
    pub limit: Option<i32>,

    #[builder(default)]
    pub exclusive_start_key: Option<Item>,

    #[builder(setter(into))]
    pub key_condition_expression: String,

    #[builder(default, setter(strip_option, into))]
    pub filter_expression: Option<String>,

    #[builder(default)]
    pub expression_attribute_names: Option<HashMap<String, String>>,

    #[builder(default)]
    pub expression_attribute_values: Option<HashMap<String, AttributeValue>>,
}

#[async_trait]
pub trait Query {
    async fn query(&self, input: QueryInput) -> Result<Page, DdbError>;

    /// Follows `LastEvaluatedKey` until the query is exhausted.
    async fn query_all(&self, mut input: QueryInput) -> Result<Vec<Item>, DdbError>
    where
        Self: Sync,
    {
        let mut items = Vec::new();
        loop {
            let page = self.query(input.clone()).await?;
            items.extend(page.items);
            match page.last_evaluated_key {
                Some(key) => input.exclusive_start_key = Some(key),
                None => return Ok(items),
            }
        }
    }
}

#[async_trait]
impl Query for Adapter {
    async fn query(&self, input: QueryInput) -> Result<Page, DdbError> {
        let output = self
            .raw
            .query()
            .table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_limit(input.limit)
            .set_exclusive_start_key(input.exclusive_start_key)
            .key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await
            .map_err(|e| DdbError::Sdk(e.into()))?;

        Ok(Page {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key,
        })
    }
}
