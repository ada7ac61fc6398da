use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::simple_err_map;
use tracing::instrument;
use uuid::Uuid;

use super::{StudentDirectory, StudentView};
use crate::model::{Course, PurchaseStatus};
use crate::store::{Store, StoreError};

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEnrollment {
    pub student: StudentView,
    pub course_title: String,
    pub purchase_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudentsOutput {
    pub enrolled_students: Vec<StudentEnrollment>,
}

/// One row per (student, course) pair with a settled payment or an active enrollment, dated by
/// the purchase when there is one.
#[instrument(skip(store))]
pub async fn enrolled_students(
    store: &(impl Store + ?Sized),
    educator_id: &str,
) -> Result<EnrolledStudentsOutput, EndpointError<Infallible>> {
    let courses = store
        .list_educator_courses(educator_id)
        .await
        .map_err(simple_err_map!("Listing educator courses failed.", EndpointError::internal()))?;

    let enrolled_students = collect(store, &courses)
        .await
        .map_err(simple_err_map!("Listing enrolled students failed.", EndpointError::internal()))?;

    Ok(EnrolledStudentsOutput { enrolled_students })
}

async fn collect(store: &(impl Store + ?Sized), courses: &[Course]) -> Result<Vec<StudentEnrollment>, StoreError> {
    let titles: HashMap<Uuid, &str> = courses.iter().map(|c| (c.course_id, c.title.as_str())).collect();
    let mut rows: Vec<(String, Uuid, DateTime<Utc>)> = Vec::new();

    for course in courses {
        let mut purchases = store.list_course_purchases(&course.course_id).await?;
        purchases.retain(|p| p.status == PurchaseStatus::Completed);
        rows.extend(purchases.into_iter().map(|p| (p.user_id, p.course_id, p.created_at)));

        let mut enrollments = store.list_course_enrollments(&course.course_id).await?;
        enrollments.retain(|e| e.is_active());
        enrollments.sort_by_key(|e| e.created_at);
        rows.extend(enrollments.into_iter().map(|e| (e.user_id, e.course_id, e.created_at)));
    }

    let mut seen = HashSet::new();
    let mut students = StudentDirectory::default();
    let mut result = Vec::new();
    for (user_id, course_id, purchase_date) in rows {
        if !seen.insert((user_id.clone(), course_id)) {
            continue;
        }
        let student = match students.get(store, &user_id).await? {
            Some(student) => student,
            None => continue,
        };
        result.push(StudentEnrollment {
            student,
            course_title: titles.get(&course_id).map(|t| t.to_string()).unwrap_or_default(),
            purchase_date,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::{Enrollment, EnrollmentStatus, Purchase};
    use crate::operations::testing::{seeded, user};
    use crate::store::{EnrollmentRepository, PurchaseRepository, UserRepository};

    #[tokio::test]
    async fn prefers_purchase_date_and_skips_duplicates() {
        let (store, course, _) = seeded(20.0, 0).await;
        store.put_user(&user("user_2")).await.unwrap();
        let paid_at = Utc::now() - Duration::days(3);

        let purchase = Purchase::builder()
            .course_id(course.course_id)
            .user_id("user_1")
            .amount(20.0)
            .status(PurchaseStatus::Completed)
            .created_at(paid_at)
            .build();
        store.create_purchase(&purchase).await.unwrap();
        for user_id in ["user_1", "user_2", "ghost"] {
            store
                .put_enrollment(
                    &Enrollment::builder()
                        .user_id(user_id)
                        .course_id(course.course_id)
                        .status(EnrollmentStatus::Success)
                        .build(),
                )
                .await
                .unwrap();
        }
        store
            .put_enrollment(
                &Enrollment::builder()
                    .user_id("user_2")
                    .course_id(course.course_id)
                    .status(EnrollmentStatus::Pending)
                    .build(),
            )
            .await
            .unwrap();

        let output = enrolled_students(&store, "educator_1").await.unwrap();

        let rows = output.enrolled_students;
        assert_eq!(2, rows.len());
        assert_eq!("user_1", rows[0].student.user_id);
        assert_eq!(paid_at, rows[0].purchase_date);
        assert_eq!("user_2", rows[1].student.user_id);
        assert_eq!("Ownership in practice", rows[1].course_title);
    }

    #[tokio::test]
    async fn pending_purchases_are_not_students() {
        let (store, course, _) = seeded(20.0, 0).await;
        let purchase = Purchase::builder()
            .course_id(course.course_id)
            .user_id("user_1")
            .amount(20.0)
            .build();
        store.create_purchase(&purchase).await.unwrap();

        let output = enrolled_students(&store, "educator_1").await.unwrap();

        assert!(output.enrolled_students.is_empty());
    }
}
