//! Repository traits over the five collections, with a DynamoDB and an in-memory backend.

pub mod ddb;
pub mod memory;

use async_trait::async_trait;
use service_core::ddb::DdbError;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Course, Enrollment, EnrollmentStatus, Progress, Purchase, PurchaseStatus, Rating, User};

pub use ddb::{DdbStore, TableNames};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Datastore call failed: {0}")]
    Datastore(#[from] DdbError),

    #[error("Invalid record in datastore: {0}")]
    Serde(#[from] serde_dynamo::Error),
}

#[async_trait]
pub trait CourseRepository {
    async fn get_course(&self, course_id: &Uuid) -> Result<Option<Course>, StoreError>;

    async fn list_published_courses(&self) -> Result<Vec<Course>, StoreError>;

    async fn list_educator_courses(&self, educator_id: &str) -> Result<Vec<Course>, StoreError>;

    async fn put_course(&self, course: &Course) -> Result<(), StoreError>;

    /// Swaps the course's ratings for `ratings` if they still equal `expected`. Returns `false`
    /// when another writer changed them first.
    async fn replace_ratings(&self, course_id: &Uuid, expected: &[Rating], ratings: &[Rating]) -> Result<bool, StoreError>;

    async fn delete_course(&self, course_id: &Uuid) -> Result<(), StoreError>;

    /// Appends the student to the course's enrolled cache unless already present. Returns
    /// `true` when the list changed.
    async fn add_enrolled_student(&self, course_id: &Uuid, user_id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserRepository {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    async fn put_user(&self, user: &User) -> Result<(), StoreError>;

    /// Writes name, email and image of `user`, creating the record when missing. The enrolled
    /// cache of an existing record is left untouched.
    async fn upsert_profile(&self, user: &User) -> Result<(), StoreError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError>;

    /// Appends the course to the user's enrolled cache unless already present. Returns `true`
    /// when the list changed.
    async fn add_enrolled_course(&self, user_id: &str, course_id: &Uuid) -> Result<bool, StoreError>;

    /// Drops `stale` from the user's enrolled cache as it was read in `snapshot`. Entries added
    /// since are kept. Returns `false` when nothing was removed because the cache moved.
    async fn remove_enrolled_courses(&self, user_id: &str, snapshot: &[Uuid], stale: &[Uuid]) -> Result<bool, StoreError>;

    /// Removes the course from every user cache. Returns the number of users changed.
    async fn remove_course_from_users(&self, course_id: &Uuid) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait PurchaseRepository {
    async fn create_purchase(&self, purchase: &Purchase) -> Result<(), StoreError>;

    async fn get_purchase(&self, purchase_id: &Uuid) -> Result<Option<Purchase>, StoreError>;

    /// Moves the purchase from `from` to `to`. Returns `false`, writing nothing, when the purchase
    /// is missing or no longer in `from`.
    async fn set_purchase_status(&self, purchase_id: &Uuid, from: PurchaseStatus, to: PurchaseStatus) -> Result<bool, StoreError>;

    async fn list_course_purchases(&self, course_id: &Uuid) -> Result<Vec<Purchase>, StoreError>;

    /// Returns the number of rows deleted.
    async fn delete_course_purchases(&self, course_id: &Uuid) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait EnrollmentRepository {
    /// Creates or overwrites the enrollment with the same id.
    async fn put_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError>;

    async fn list_user_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, StoreError>;

    async fn list_course_enrollments(&self, course_id: &Uuid) -> Result<Vec<Enrollment>, StoreError>;

    /// Moves the enrollment from `from` to `to`. Returns `false`, writing nothing, when the
    /// enrollment is missing or no longer in `from`.
    async fn set_enrollment_status(
        &self,
        enrollment_id: &Uuid,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> Result<bool, StoreError>;

    async fn delete_enrollment(&self, enrollment_id: &Uuid) -> Result<(), StoreError>;

    /// Returns the number of rows deleted.
    async fn delete_course_enrollments(&self, course_id: &Uuid) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait ProgressRepository {
    async fn get_progress(&self, user_id: &str, course_id: &Uuid) -> Result<Option<Progress>, StoreError>;

    async fn put_progress(&self, progress: &Progress) -> Result<(), StoreError>;
}

/// Everything the operations need from persistence.
pub trait Store:
    CourseRepository + UserRepository + PurchaseRepository + EnrollmentRepository + ProgressRepository + Send + Sync
{
}

impl<T> Store for T where
    T: CourseRepository + UserRepository + PurchaseRepository + EnrollmentRepository + ProgressRepository + Send + Sync
{
}

/// Enrollments of `user_id` in `course_id`, in creation order.
pub async fn pair_enrollments(
    store: &(impl EnrollmentRepository + ?Sized + Sync),
    user_id: &str,
    course_id: &Uuid,
) -> Result<Vec<Enrollment>, StoreError> {
    let mut enrollments: Vec<_> = store
        .list_user_enrollments(user_id)
        .await?
        .into_iter()
        .filter(|e| &e.course_id == course_id)
        .collect();
    enrollments.sort_by_key(|e| e.created_at);
    Ok(enrollments)
}

/// Moves the purchase to `to` from any status allowed to reach it. Returns `false` when no such
/// status matched, which leaves the purchase as another writer settled it.
pub async fn settle_purchase(
    store: &(impl PurchaseRepository + ?Sized + Sync),
    purchase_id: &Uuid,
    to: PurchaseStatus,
) -> Result<bool, StoreError> {
    for from in PurchaseStatus::ALL {
        if from != to && from.transition(to).is_ok() && store.set_purchase_status(purchase_id, from, to).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Same as [`settle_purchase`] for enrollments.
pub async fn settle_enrollment(
    store: &(impl EnrollmentRepository + ?Sized + Sync),
    enrollment_id: &Uuid,
    to: EnrollmentStatus,
) -> Result<bool, StoreError> {
    for from in EnrollmentStatus::ALL {
        if from != to && from.transition(to).is_ok() && store.set_enrollment_status(enrollment_id, from, to).await? {
            return Ok(true);
        }
    }
    Ok(false)
}
