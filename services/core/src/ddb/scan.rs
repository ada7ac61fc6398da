use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::model::AttributeValue;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;
use super::{DdbError, Item, Page};

#[derive(Debug, Clone, TypedBuilder)]
pub struct ScanInput {
    #[builder(setter(into))]
    pub table_name: String,

    #[builder(default, setter(strip_option))]
    pub limit: Option<i32>,

    #[builder(default)]
    pub exclusive_start_key: Option<Item>,

    #[builder(default, setter(strip_option, into))]
    pub filter_expression: Option<String>,

    #[builder(default)]
    pub expression_attribute_names: Option<HashMap<String, String>>,

    #[builder(default)]
    pub expression_attribute_values: Option<HashMap<String, AttributeValue>>,
}

#[async_trait]
pub trait Scan {
    async fn scan(&self, input: ScanInput) -> Result<Page, DdbError>;

    /// Follows `LastEvaluatedKey` until the whole table has been read.
    async fn scan_all(&self, mut input: ScanInput) -> Result<Vec<Item>, DdbError>
    where
        Self: Sync,
    {
        let mut items = Vec::new();
        loop {
            let page = self.scan(input.clone()).await?;
            items.extend(page.items);
            match page.last_evaluated_key {
                Some(key) => input.exclusive_start_key = Some(key),
                None => return Ok(items),
            }
        }
    }
}

#[async_trait]
impl Scan for Adapter {
    async fn scan(&self, input: ScanInput) -> Result<Page, DdbError> {
        let output = self
            .raw
            .scan()
            .table_name(input.table_name)
            .set_limit(input.limit)
            .set_exclusive_start_key(input.exclusive_start_key)
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
