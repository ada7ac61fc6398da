pub mod adapter;
pub mod delete_item;
pub mod get_item;
pub mod put_item;
pub mod query;
pub mod scan;
pub mod update_item;

use std::collections::HashMap;

pub use adapter::Adapter;
use aws_sdk_dynamodb::model::AttributeValue;

/// A DynamoDB item, or a key of one.
pub type Item = HashMap<String, AttributeValue>;

/// Every call a repository may issue against DynamoDB.
pub trait ThreadSafeDdbClient:
    get_item::GetItem + put_item::PutItem + update_item::UpdateItem + delete_item::DeleteItem + query::Query + scan::Scan + Send + Sync
{
}

impl<T> ThreadSafeDdbClient for T where
    T: get_item::GetItem
        + put_item::PutItem
        + update_item::UpdateItem
        + delete_item::DeleteItem
        + query::Query
        + scan::Scan
        + Send
        + Sync
{
}

/// Failure of a single DynamoDB call.
#[derive(Debug, thiserror::Error)]
pub enum DdbError {
    /// The condition expression attached to a write evaluated to false.
    #[error("Conditional check failed.")]
    ConditionalCheckFailed,

    #[error(transparent)]
    Sdk(Box<dyn std::error::Error + Send + Sync>),
}

/// One page of a `Query` or `Scan`.
#[derive(Debug, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}
