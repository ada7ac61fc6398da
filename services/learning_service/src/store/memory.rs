use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CourseRepository, EnrollmentRepository, ProgressRepository, PurchaseRepository, StoreError, UserRepository,
};
use crate::model::{Course, Enrollment, EnrollmentStatus, Progress, Purchase, PurchaseStatus, Rating, User};

/// Process-local store. Used for local runs (`STORE_BACKEND=memory`) and in tests; every
/// mutation happens under the collection's write lock, so membership checks and the writes
/// they guard are atomic.
#[derive(Default)]
pub struct MemoryStore {
    courses: RwLock<HashMap<Uuid, Course>>,
    users: RwLock<HashMap<String, User>>,
    purchases: RwLock<HashMap<Uuid, Purchase>>,
    enrollments: RwLock<HashMap<Uuid, Enrollment>>,
    progress: RwLock<HashMap<(String, Uuid), Progress>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn get_course(&self, course_id: &Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.courses.read().await.get(course_id).cloned())
    }

    async fn list_published_courses(&self) -> Result<Vec<Course>, StoreError> {
        let mut courses: Vec<_> = self
            .courses
            .read()
            .await
            .values()
            .filter(|c| c.is_published)
            .cloned()
            .collect();
        courses.sort_by_key(|c| c.created_at);
        Ok(courses)
    }

    async fn list_educator_courses(&self, educator_id: &str) -> Result<Vec<Course>, StoreError> {
        let mut courses: Vec<_> = self
            .courses
            .read()
            .await
            .values()
            .filter(|c| c.educator_id == educator_id)
            .cloned()
            .collect();
        courses.sort_by_key(|c| c.created_at);
        Ok(courses)
    }

    async fn put_course(&self, course: &Course) -> Result<(), StoreError> {
        self.courses.write().await.insert(course.course_id, course.clone());
        Ok(())
    }

    async fn replace_ratings(&self, course_id: &Uuid, expected: &[Rating], ratings: &[Rating]) -> Result<bool, StoreError> {
        match self.courses.write().await.get_mut(course_id) {
            Some(course) if course.ratings == expected => {
                course.ratings = ratings.to_vec();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_course(&self, course_id: &Uuid) -> Result<(), StoreError> {
        self.courses.write().await.remove(course_id);
        Ok(())
    }

    async fn add_enrolled_student(&self, course_id: &Uuid, user_id: &str) -> Result<bool, StoreError> {
        let mut courses = self.courses.write().await;
        match courses.get_mut(course_id) {
            Some(course) if !course.has_student(user_id) => {
                course.enrolled_students.push(user_id.to_owned());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.write().await.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn upsert_profile(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .entry(user.user_id.clone())
            .and_modify(|existing| {
                existing.name = user.name.clone();
                existing.email = user.email.clone();
                existing.image_url = user.image_url.clone();
            })
            .or_insert_with(|| user.clone());
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.users.write().await.remove(user_id);
        Ok(())
    }

    async fn add_enrolled_course(&self, user_id: &str, course_id: &Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) if !user.has_course(course_id) => {
                user.enrolled_courses.push(*course_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_enrolled_courses(&self, user_id: &str, _snapshot: &[Uuid], stale: &[Uuid]) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let user = match users.get_mut(user_id) {
            Some(user) => user,
            None => return Ok(false),
        };
        let before = user.enrolled_courses.len();
        user.enrolled_courses.retain(|id| !stale.contains(id));
        Ok(user.enrolled_courses.len() != before)
    }

    async fn remove_course_from_users(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        let mut changed = 0;
        for user in self.users.write().await.values_mut() {
            let before = user.enrolled_courses.len();
            user.enrolled_courses.retain(|id| id != course_id);
            if user.enrolled_courses.len() != before {
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl PurchaseRepository for MemoryStore {
    async fn create_purchase(&self, purchase: &Purchase) -> Result<(), StoreError> {
        self.purchases.write().await.insert(purchase.purchase_id, purchase.clone());
        Ok(())
    }

    async fn get_purchase(&self, purchase_id: &Uuid) -> Result<Option<Purchase>, StoreError> {
        Ok(self.purchases.read().await.get(purchase_id).cloned())
    }

    async fn set_purchase_status(&self, purchase_id: &Uuid, from: PurchaseStatus, to: PurchaseStatus) -> Result<bool, StoreError> {
        match self.purchases.write().await.get_mut(purchase_id) {
            Some(purchase) if purchase.status == from => {
                purchase.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_course_purchases(&self, course_id: &Uuid) -> Result<Vec<Purchase>, StoreError> {
        let mut purchases: Vec<_> = self
            .purchases
            .read()
            .await
            .values()
            .filter(|p| &p.course_id == course_id)
            .cloned()
            .collect();
        purchases.sort_by_key(|p| p.created_at);
        Ok(purchases)
    }

    async fn delete_course_purchases(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        let mut purchases = self.purchases.write().await;
        let before = purchases.len();
        purchases.retain(|_, p| &p.course_id != course_id);
        Ok(before - purchases.len())
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn put_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        self.enrollments
            .write()
            .await
            .insert(enrollment.enrollment_id, enrollment.clone());
        Ok(())
    }

    async fn list_user_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, StoreError> {
        let mut enrollments: Vec<_> = self
            .enrollments
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| e.created_at);
        Ok(enrollments)
    }

    async fn list_course_enrollments(&self, course_id: &Uuid) -> Result<Vec<Enrollment>, StoreError> {
        let mut enrollments: Vec<_> = self
            .enrollments
            .read()
            .await
            .values()
            .filter(|e| &e.course_id == course_id)
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| e.created_at);
        Ok(enrollments)
    }

    async fn set_enrollment_status(
        &self,
        enrollment_id: &Uuid,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> Result<bool, StoreError> {
        match self.enrollments.write().await.get_mut(enrollment_id) {
            Some(enrollment) if enrollment.status == from => {
                enrollment.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_enrollment(&self, enrollment_id: &Uuid) -> Result<(), StoreError> {
        self.enrollments.write().await.remove(enrollment_id);
        Ok(())
    }

    async fn delete_course_enrollments(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        let mut enrollments = self.enrollments.write().await;
        let before = enrollments.len();
        enrollments.retain(|_, e| &e.course_id != course_id);
        Ok(before - enrollments.len())
    }
}

#[async_trait]
impl ProgressRepository for MemoryStore {
    async fn get_progress(&self, user_id: &str, course_id: &Uuid) -> Result<Option<Progress>, StoreError> {
        Ok(self
            .progress
            .read()
            .await
            .get(&(user_id.to_owned(), *course_id))
            .cloned())
    }

    async fn put_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        self.progress
            .write()
            .await
            .insert((progress.user_id.clone(), progress.course_id), progress.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::course::fixtures::course;

    #[tokio::test]
    async fn cache_additions_are_idempotent() {
        let store = MemoryStore::new();
        let course = course(10.0, 0);
        let user = User::builder().user_id("user_a").name("A").email("a@example.com").build();
        store.put_course(&course).await.unwrap();
        store.put_user(&user).await.unwrap();

        assert!(store.add_enrolled_student(&course.course_id, "user_a").await.unwrap());
        assert!(!store.add_enrolled_student(&course.course_id, "user_a").await.unwrap());
        assert!(store.add_enrolled_course("user_a", &course.course_id).await.unwrap());
        assert!(!store.add_enrolled_course("user_a", &course.course_id).await.unwrap());

        let course = store.get_course(&course.course_id).await.unwrap().unwrap();
        let user = store.get_user("user_a").await.unwrap().unwrap();
        assert_eq!(1, course.enrolled_students.len());
        assert_eq!(1, user.enrolled_courses.len());
    }

    #[tokio::test]
    async fn cache_additions_skip_missing_records() {
        let store = MemoryStore::new();

        assert!(!store.add_enrolled_student(&Uuid::new_v4(), "user_a").await.unwrap());
        assert!(!store.add_enrolled_course("ghost", &Uuid::new_v4()).await.unwrap());
        assert!(store.get_user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_writes_compare_the_stored_status() {
        let store = MemoryStore::new();
        let purchase = Purchase::builder().course_id(Uuid::new_v4()).user_id("user_a").amount(5.0).build();
        store.create_purchase(&purchase).await.unwrap();

        assert!(!store
            .set_purchase_status(&purchase.purchase_id, PurchaseStatus::Failed, PurchaseStatus::Completed)
            .await
            .unwrap());
        assert!(store
            .set_purchase_status(&purchase.purchase_id, PurchaseStatus::Pending, PurchaseStatus::Completed)
            .await
            .unwrap());
        assert!(!store
            .set_purchase_status(&purchase.purchase_id, PurchaseStatus::Pending, PurchaseStatus::Failed)
            .await
            .unwrap());
        assert!(!store
            .set_enrollment_status(&Uuid::new_v4(), EnrollmentStatus::Pending, EnrollmentStatus::Success)
            .await
            .unwrap());

        let stored = store.get_purchase(&purchase.purchase_id).await.unwrap().unwrap();
        assert_eq!(PurchaseStatus::Completed, stored.status);
    }

    #[tokio::test]
    async fn profile_upsert_keeps_cache() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let user = User::builder()
            .user_id("user_a")
            .name("A")
            .email("a@example.com")
            .enrolled_courses(vec![course_id])
            .build();
        store.put_user(&user).await.unwrap();

        let renamed = User::builder().user_id("user_a").name("B").email("b@example.com").build();
        store.upsert_profile(&renamed).await.unwrap();

        let stored = store.get_user("user_a").await.unwrap().unwrap();
        assert_eq!("B", stored.name);
        assert_eq!(vec![course_id], stored.enrolled_courses);
    }

    #[tokio::test]
    async fn rating_swap_requires_unchanged_ratings() {
        let store = MemoryStore::new();
        let course = course(10.0, 0);
        store.put_course(&course).await.unwrap();
        let first = vec![Rating {
            user_id: "user_a".to_string(),
            rating: 4,
        }];

        assert!(store.replace_ratings(&course.course_id, &[], &first).await.unwrap());
        assert!(!store.replace_ratings(&course.course_id, &[], &[]).await.unwrap());

        let stored = store.get_course(&course.course_id).await.unwrap().unwrap();
        assert_eq!(first, stored.ratings);
    }
}
