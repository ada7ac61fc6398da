use async_trait::async_trait;
use aws_sdk_dynamodb::model::AttributeValue;
use common_macros::hash_map;
use serde_dynamo::aws_sdk_dynamodb_0_9::{from_items, to_item};
use service_core::ddb::delete_item::DeleteItemInput;
use service_core::ddb::put_item::PutItemInput;
use service_core::ddb::query::QueryInput;
use service_core::ddb::update_item::UpdateItemInput;
use service_core::ddb::{DdbError, Item, ThreadSafeDdbClient};
use uuid::Uuid;

use super::DdbStore;
use crate::model::{Enrollment, EnrollmentStatus};
use crate::store::{EnrollmentRepository, StoreError};

impl<T: ThreadSafeDdbClient> DdbStore<T> {
    async fn query_enrollments(&self, index: &str, condition: &str, value: String) -> Result<Vec<Enrollment>, StoreError> {
        let input = QueryInput::builder()
            .table_name(self.tables.enrollments.as_str())
            .index_name(index)
            .key_condition_expression(condition)
            .expression_attribute_values(Some(hash_map! {
                ":value".to_string() => AttributeValue::S(value),
            }))
            .build();

        let mut enrollments: Vec<Enrollment> = from_items(self.ddb.query_all(input).await?)?;
        enrollments.sort_by_key(|e| e.created_at);
        Ok(enrollments)
    }
}

#[async_trait]
impl<T: ThreadSafeDdbClient> EnrollmentRepository for DdbStore<T> {
    async fn put_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        let item: Item = to_item(enrollment)?;
        let input = PutItemInput::builder()
            .table_name(self.tables.enrollments.as_str())
            .item(item)
            .build();

        Ok(self.ddb.put_item(input).await?)
    }

    async fn list_user_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, StoreError> {
        self.query_enrollments("UserIdIndex", "userId = :value", user_id.to_string())
            .await
    }

    async fn list_course_enrollments(&self, course_id: &Uuid) -> Result<Vec<Enrollment>, StoreError> {
        self.query_enrollments("CourseIdIndex", "courseId = :value", course_id.to_string())
            .await
    }

    async fn set_enrollment_status(
        &self,
        enrollment_id: &Uuid,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> Result<bool, StoreError> {
        let input = UpdateItemInput::builder()
            .table_name(self.tables.enrollments.as_str())
            .key(Enrollment::key(enrollment_id))
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

    async fn delete_enrollment(&self, enrollment_id: &Uuid) -> Result<(), StoreError> {
        let input = DeleteItemInput::builder()
            .table_name(self.tables.enrollments.as_str())
            .key(Enrollment::key(enrollment_id))
            .build();

        Ok(self.ddb.delete_item(input).await?)
    }

    async fn delete_course_enrollments(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        let enrollments = self.list_course_enrollments(course_id).await?;

        for enrollment in &enrollments {
            self.delete_enrollment(&enrollment.enrollment_id).await?;
        }

        Ok(enrollments.len())
    }
}
