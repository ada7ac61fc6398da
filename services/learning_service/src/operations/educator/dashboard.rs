use std::collections::HashSet;
use std::convert::Infallible;

use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::simple_err_map;
use tracing::instrument;

use super::{StudentDirectory, StudentView};
use crate::model::{Course, EnrollmentStatus, PurchaseStatus};
use crate::store::{Store, StoreError};

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudent {
    pub course_title: String,
    pub student: StudentView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_earnings: f64,
    pub enrolled_students_data: Vec<EnrolledStudent>,
    pub total_courses: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOutput {
    pub dashboard_data: DashboardData,
}

/// Earnings and enrolled students across every course of the educator.
///
/// Completed purchases are counted first. Paid enrollments whose (course, student) pair has no
/// completed purchase are added on top, which covers rows recorded without a purchase.
#[instrument(skip(store))]
pub async fn educator_dashboard(
    store: &(impl Store + ?Sized),
    educator_id: &str,
) -> Result<DashboardOutput, EndpointError<Infallible>> {
    let courses = store
        .list_educator_courses(educator_id)
        .await
        .map_err(simple_err_map!("Listing educator courses failed.", EndpointError::internal()))?;

    let dashboard_data = collect(store, &courses)
        .await
        .map_err(simple_err_map!("Building dashboard failed.", EndpointError::internal()))?;

    Ok(DashboardOutput { dashboard_data })
}

async fn collect(store: &(impl Store + ?Sized), courses: &[Course]) -> Result<DashboardData, StoreError> {
    let mut earnings = 0.0;
    let mut students = StudentDirectory::default();
    let mut enrolled_students_data = Vec::new();

    for course in courses {
        let purchases = store.list_course_purchases(&course.course_id).await?;
        let enrollments = store.list_course_enrollments(&course.course_id).await?;

        let mut paid = HashSet::new();
        for purchase in purchases.iter().filter(|p| p.status == PurchaseStatus::Completed) {
            earnings += purchase.amount;
            paid.insert(purchase.user_id.as_str());
        }
        earnings += enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Success && e.amount > 0.0 && !paid.contains(e.user_id.as_str()))
            .map(|e| e.amount)
            .sum::<f64>();

        let ledger = enrollments
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.user_id.as_str());
        let mut seen = HashSet::new();
        for user_id in course.enrolled_students.iter().map(String::as_str).chain(ledger) {
            if !seen.insert(user_id) {
                continue;
            }
            match students.get(store, user_id).await? {
                Some(student) => enrolled_students_data.push(EnrolledStudent {
                    course_title: course.title.clone(),
                    student,
                }),
                None => tracing::debug!(user_id, course_id = %course.course_id, "Skipping unknown student."),
            }
        }
    }

    Ok(DashboardData {
        total_earnings: (earnings * 100.0).round() / 100.0,
        enrolled_students_data,
        total_courses: courses.len(),
    })
}
