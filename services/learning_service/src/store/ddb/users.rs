use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::model::AttributeValue;
use common_macros::hash_map;
use serde_dynamo::aws_sdk_dynamodb_0_9::{from_item, from_items, to_item};
use service_core::ddb::delete_item::DeleteItemInput;
use service_core::ddb::get_item::GetItemInput;
use service_core::ddb::put_item::PutItemInput;
use service_core::ddb::scan::ScanInput;
use service_core::ddb::update_item::UpdateItemInput;
use service_core::ddb::{DdbError, Item, ThreadSafeDdbClient};
use uuid::Uuid;

use super::DdbStore;
use crate::model::User;
use crate::store::{StoreError, UserRepository};

/// `REMOVE` expression for the list positions holding `stale`, each guarded by a condition that
/// the position still holds the value read.
fn removal_expression(snapshot: &[Uuid], stale: &[Uuid]) -> Option<(String, String, Item)> {
    let positions: Vec<usize> = snapshot
        .iter()
        .enumerate()
        .filter(|(_, id)| stale.contains(id))
        .map(|(i, _)| i)
        .collect();
    if positions.is_empty() {
        return None;
    }

    let mut values = HashMap::with_capacity(positions.len());
    let mut removals = Vec::with_capacity(positions.len());
    let mut conditions = Vec::with_capacity(positions.len());
    for i in positions {
        removals.push(format!("enrolledCourses[{}]", i));
        conditions.push(format!("enrolledCourses[{}] = :c{}", i, i));
        values.insert(format!(":c{}", i), AttributeValue::S(snapshot[i].to_string()));
    }

    Some((
        format!("REMOVE {}", removals.join(", ")),
        conditions.join(" AND "),
        values,
    ))
}

#[async_trait]
impl<T: ThreadSafeDdbClient> UserRepository for DdbStore<T> {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let input = GetItemInput::builder()
            .table_name(self.tables.users.as_str())
            .key(User::key(user_id))
            .build();

        match self.ddb.get_item(input).await? {
            Some(item) => Ok(Some(from_item(item)?)),
            None => Ok(None),
        }
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        let item: Item = to_item(user)?;
        let input = PutItemInput::builder()
            .table_name(self.tables.users.as_str())
            .item(item)
            .build();

        Ok(self.ddb.put_item(input).await?)
    }

    async fn upsert_profile(&self, user: &User) -> Result<(), StoreError> {
        let input = UpdateItemInput::builder()
            .table_name(self.tables.users.as_str())
            .key(User::key(&user.user_id))
            .update_expression(
                "SET #name = :name, email = :email, imageUrl = :image_url, \
                 enrolledCourses = if_not_exists(enrolledCourses, :empty)",
            )
            .expression_attribute_names(hash_map! {
                "#name".to_string() => "name".to_string(),
            })
            .expression_attribute_values(hash_map! {
                ":name".to_string() => AttributeValue::S(user.name.clone()),
                ":email".to_string() => AttributeValue::S(user.email.clone()),
                ":image_url".to_string() => AttributeValue::S(user.image_url.clone()),
                ":empty".to_string() => AttributeValue::L(Vec::new()),
            })
            .build();

        self.ddb.update_item(input).await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        let input = DeleteItemInput::builder()
            .table_name(self.tables.users.as_str())
            .key(User::key(user_id))
            .build();

        Ok(self.ddb.delete_item(input).await?)
    }

    async fn add_enrolled_course(&self, user_id: &str, course_id: &Uuid) -> Result<bool, StoreError> {
        let course_id = course_id.to_string();
        let input = UpdateItemInput::builder()
            .table_name(self.tables.users.as_str())
            .key(User::key(user_id))
            .update_expression("SET enrolledCourses = list_append(if_not_exists(enrolledCourses, :empty), :course)")
            .condition_expression("attribute_exists(userId) AND NOT contains(enrolledCourses, :course_id)")
            .expression_attribute_values(hash_map! {
                ":empty".to_string() => AttributeValue::L(Vec::new()),
                ":course".to_string() => AttributeValue::L(vec![AttributeValue::S(course_id.clone())]),
                ":course_id".to_string() => AttributeValue::S(course_id),
            })
            .build();

        match self.ddb.update_item(input).await {
            Ok(_) => Ok(true),
            Err(DdbError::ConditionalCheckFailed) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_enrolled_courses(&self, user_id: &str, snapshot: &[Uuid], stale: &[Uuid]) -> Result<bool, StoreError> {
        let (update, condition, values) = match removal_expression(snapshot, stale) {
            Some(expression) => expression,
            None => return Ok(false),
        };
        let input = UpdateItemInput::builder()
            .table_name(self.tables.users.as_str())
            .key(User::key(user_id))
            .update_expression(update)
            .condition_expression(condition)
            .expression_attribute_values(values)
            .build();

        match self.ddb.update_item(input).await {
            Ok(_) => Ok(true),
            Err(DdbError::ConditionalCheckFailed) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_course_from_users(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        let input = ScanInput::builder()
            .table_name(self.tables.users.as_str())
            .filter_expression("contains(enrolledCourses, :course_id)")
            .expression_attribute_values(Some(hash_map! {
                ":course_id".to_string() => AttributeValue::S(course_id.to_string()),
            }))
            .build();
        let users: Vec<User> = from_items(self.ddb.scan_all(input).await?)?;

        let mut changed = 0;
        for user in &users {
            let mut snapshot = user.enrolled_courses.clone();
            // A concurrent cache write moved the positions; re-read and try again.
            for _ in 0..3 {
                if self
                    .remove_enrolled_courses(&user.user_id, &snapshot, &[*course_id])
                    .await?
                {
                    changed += 1;
                    break;
                }
                match self.get_user(&user.user_id).await? {
                    Some(fresh) if fresh.has_course(course_id) => snapshot = fresh.enrolled_courses,
                    _ => break,
                }
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_targets_positions_of_stale_entries() {
        let (keep, gone) = (Uuid::new_v4(), Uuid::new_v4());

        let (update, condition, values) = removal_expression(&[keep, gone, keep], &[gone]).unwrap();

        assert_eq!("REMOVE enrolledCourses[1]", update);
        assert_eq!("enrolledCourses[1] = :c1", condition);
        assert_eq!(Some(&AttributeValue::S(gone.to_string())), values.get(":c1"));
    }

    #[test]
    fn nothing_stale_means_no_write() {
        let id = Uuid::new_v4();

        assert!(removal_expression(&[id], &[Uuid::new_v4()]).is_none());
    }
}
