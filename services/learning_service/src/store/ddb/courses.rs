use async_trait::async_trait;
use aws_sdk_dynamodb::model::AttributeValue;
use common_macros::hash_map;
use serde_dynamo::aws_sdk_dynamodb_0_9::{from_item, from_items, to_attribute_value, to_item};
use service_core::ddb::delete_item::DeleteItemInput;
use service_core::ddb::get_item::GetItemInput;
use service_core::ddb::put_item::PutItemInput;
use service_core::ddb::query::QueryInput;
use service_core::ddb::scan::ScanInput;
use service_core::ddb::update_item::UpdateItemInput;
use service_core::ddb::{DdbError, Item, ThreadSafeDdbClient};
use uuid::Uuid;

use super::DdbStore;
use crate::model::{Course, Rating};
use crate::store::{CourseRepository, StoreError};

#[async_trait]
impl<T: ThreadSafeDdbClient> CourseRepository for DdbStore<T> {
    async fn get_course(&self, course_id: &Uuid) -> Result<Option<Course>, StoreError> {
        let input = GetItemInput::builder()
            .table_name(self.tables.courses.as_str())
            .key(Course::key(course_id))
            .build();

        match self.ddb.get_item(input).await? {
            Some(item) => Ok(Some(from_item(item)?)),
            None => Ok(None),
        }
    }

    async fn list_published_courses(&self) -> Result<Vec<Course>, StoreError> {
        let input = ScanInput::builder()
            .table_name(self.tables.courses.as_str())
            .filter_expression("isPublished = :published")
            .expression_attribute_values(Some(hash_map! {
                ":published".to_string() => AttributeValue::Bool(true),
            }))
            .build();

        Ok(from_items(self.ddb.scan_all(input).await?)?)
    }

    async fn list_educator_courses(&self, educator_id: &str) -> Result<Vec<Course>, StoreError> {
        let input = QueryInput::builder()
            .table_name(self.tables.courses.as_str())
            .index_name("EducatorIdIndex")
            .key_condition_expression("educatorId = :educator")
            .expression_attribute_values(Some(hash_map! {
                ":educator".to_string() => AttributeValue::S(educator_id.to_owned()),
            }))
            .build();

        Ok(from_items(self.ddb.query_all(input).await?)?)
    }

    async fn put_course(&self, course: &Course) -> Result<(), StoreError> {
        let item: Item = to_item(course)?;
        let input = PutItemInput::builder()
            .table_name(self.tables.courses.as_str())
            .item(item)
            .build();

        Ok(self.ddb.put_item(input).await?)
    }

    async fn replace_ratings(&self, course_id: &Uuid, expected: &[Rating], ratings: &[Rating]) -> Result<bool, StoreError> {
        let condition = if expected.is_empty() {
            "attribute_exists(courseId) AND (attribute_not_exists(ratings) OR ratings = :expected)"
        } else {
            "attribute_exists(courseId) AND ratings = :expected"
        };
        let expected: AttributeValue = to_attribute_value(expected)?;
        let ratings: AttributeValue = to_attribute_value(ratings)?;
        let input = UpdateItemInput::builder()
            .table_name(self.tables.courses.as_str())
            .key(Course::key(course_id))
            .update_expression("SET ratings = :ratings")
            .condition_expression(condition)
            .expression_attribute_values(hash_map! {
                ":expected".to_string() => expected,
                ":ratings".to_string() => ratings,
            })
            .build();

        match self.ddb.update_item(input).await {
            Ok(_) => Ok(true),
            Err(DdbError::ConditionalCheckFailed) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_course(&self, course_id: &Uuid) -> Result<(), StoreError> {
        let input = DeleteItemInput::builder()
            .table_name(self.tables.courses.as_str())
            .key(Course::key(course_id))
            .build();

        Ok(self.ddb.delete_item(input).await?)
    }

    async fn add_enrolled_student(&self, course_id: &Uuid, user_id: &str) -> Result<bool, StoreError> {
        let input = UpdateItemInput::builder()
            .table_name(self.tables.courses.as_str())
            .key(Course::key(course_id))
            .update_expression("SET enrolledStudents = list_append(if_not_exists(enrolledStudents, :empty), :student)")
            .condition_expression("attribute_exists(courseId) AND NOT contains(enrolledStudents, :student_id)")
            .expression_attribute_values(hash_map! {
                ":empty".to_string() => AttributeValue::L(Vec::new()),
                ":student".to_string() => AttributeValue::L(vec![AttributeValue::S(user_id.to_owned())]),
                ":student_id".to_string() => AttributeValue::S(user_id.to_owned()),
            })
            .build();

        match self.ddb.update_item(input).await {
            Ok(_) => Ok(true),
            Err(DdbError::ConditionalCheckFailed) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
