//! Fakes and fixtures shared by the operation tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use uuid::Uuid;

use crate::context::Settings;
use crate::integration::identity::{IdentityAdmin, IdentityAdminError};
use crate::integration::media::{MediaError, MediaHost};
use crate::integration::payment::{CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway};
use crate::model::course::fixtures;
use crate::model::{Course, Enrollment, EnrollmentStatus, Progress, Purchase, PurchaseStatus, Rating, User};
use crate::store::{
    CourseRepository, EnrollmentRepository, MemoryStore, ProgressRepository, PurchaseRepository, StoreError,
    UserRepository,
};

pub const PAYMENT_SECRET: &str = "whsec_payment";
// whsec_ + base64 of "identity-secret"
pub const IDENTITY_SECRET: &str = "whsec_aWRlbnRpdHktc2VjcmV0";

/// Gateway answering every request with a fake session, optionally rejecting it.
#[derive(Default)]
pub struct RecordingGateway {
    pub requests: Mutex<Vec<CheckoutRequest>>,
    pub reject: bool,
}

impl RecordingGateway {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.reject {
            return Err(GatewayError::Rejected {
                status: 402,
                body: "card_declined".to_string(),
            });
        }
        Ok(CheckoutSession {
            id: format!("cs_test_{}", request.purchase_id.simple()),
            url: format!("https://checkout.test/pay/{}", request.purchase_id),
        })
    }
}

pub struct FakeMedia;

#[async_trait]
impl MediaHost for FakeMedia {
    async fn upload_image(&self, file: &str) -> Result<String, MediaError> {
        if file.starts_with("data:image/") {
            Ok("https://media.test/thumbnail.png".to_string())
        } else {
            Err(MediaError::Rejected {
                status: 400,
                body: "Invalid image file".to_string(),
            })
        }
    }
}

/// Identity admin recording every role change, optionally rejecting them.
#[derive(Default)]
pub struct FakeIdentity {
    pub roles: Mutex<Vec<(String, String)>>,
    pub reject: bool,
}

impl FakeIdentity {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<(String, String)> {
        self.roles.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityAdmin for FakeIdentity {
    async fn set_role(&self, user_id: &str, role: &str) -> Result<(), IdentityAdminError> {
        if self.reject {
            return Err(IdentityAdminError::Rejected {
                status: 404,
                body: "resource_not_found".to_string(),
            });
        }
        self.roles.lock().unwrap().push((user_id.to_string(), role.to_string()));
        Ok(())
    }
}

pub fn settings() -> Settings {
    Settings::builder()
        .payment_webhook_secret(PAYMENT_SECRET)
        .identity_webhook_secret(IDENTITY_SECRET)
        .build()
}

pub fn user(user_id: &str) -> User {
    User::builder()
        .user_id(user_id)
        .name("Ada Lovelace")
        .email(format!("{}@example.com", user_id))
        .build()
}

/// A store holding `user_1` and one published course of `educator_1`.
pub async fn seeded(price: f64, discount: u8) -> (MemoryStore, Course, User) {
    let store = MemoryStore::new();
    let course = fixtures::course(price, discount);
    let user = user("user_1");
    store.put_course(&course).await.unwrap();
    store.put_user(&user).await.unwrap();
    (store, course, user)
}

type Hook = Box<dyn FnOnce(Arc<MemoryStore>) -> BoxFuture<'static, ()> + Send>;

/// Store running a competing writer once, right after the first read of a course, user or
/// purchase. Places a concurrent update between an operation's read and its write.
pub struct Interleaved {
    pub inner: Arc<MemoryStore>,
    hook: Mutex<Option<Hook>>,
}

impl Interleaved {
    pub fn new<F, Fut>(inner: Arc<MemoryStore>, hook: F) -> Self
    where
        F: FnOnce(Arc<MemoryStore>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let hook: Hook = Box::new(move |store| hook(store).boxed());
        Self {
            inner,
            hook: Mutex::new(Some(hook)),
        }
    }

    async fn interleave(&self) {
        let hook = self.hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(self.inner.clone()).await;
        }
    }
}

#[async_trait]
impl CourseRepository for Interleaved {
    async fn get_course(&self, course_id: &Uuid) -> Result<Option<Course>, StoreError> {
        let course = self.inner.get_course(course_id).await;
        self.interleave().await;
        course
    }

    async fn list_published_courses(&self) -> Result<Vec<Course>, StoreError> {
        self.inner.list_published_courses().await
    }

    async fn list_educator_courses(&self, educator_id: &str) -> Result<Vec<Course>, StoreError> {
        self.inner.list_educator_courses(educator_id).await
    }

    async fn put_course(&self, course: &Course) -> Result<(), StoreError> {
        self.inner.put_course(course).await
    }

    async fn replace_ratings(&self, course_id: &Uuid, expected: &[Rating], ratings: &[Rating]) -> Result<bool, StoreError> {
        self.inner.replace_ratings(course_id, expected, ratings).await
    }

    async fn delete_course(&self, course_id: &Uuid) -> Result<(), StoreError> {
        self.inner.delete_course(course_id).await
    }

    async fn add_enrolled_student(&self, course_id: &Uuid, user_id: &str) -> Result<bool, StoreError> {
        self.inner.add_enrolled_student(course_id, user_id).await
    }
}

#[async_trait]
impl UserRepository for Interleaved {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let user = self.inner.get_user(user_id).await;
        self.interleave().await;
        user
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.put_user(user).await
    }

    async fn upsert_profile(&self, user: &User) -> Result<(), StoreError> {
        self.inner.upsert_profile(user).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.inner.delete_user(user_id).await
    }

    async fn add_enrolled_course(&self, user_id: &str, course_id: &Uuid) -> Result<bool, StoreError> {
        self.inner.add_enrolled_course(user_id, course_id).await
    }

    async fn remove_enrolled_courses(&self, user_id: &str, snapshot: &[Uuid], stale: &[Uuid]) -> Result<bool, StoreError> {
        self.inner.remove_enrolled_courses(user_id, snapshot, stale).await
    }

    async fn remove_course_from_users(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        self.inner.remove_course_from_users(course_id).await
    }
}

#[async_trait]
impl PurchaseRepository for Interleaved {
    async fn create_purchase(&self, purchase: &Purchase) -> Result<(), StoreError> {
        self.inner.create_purchase(purchase).await
    }

    async fn get_purchase(&self, purchase_id: &Uuid) -> Result<Option<Purchase>, StoreError> {
        let purchase = self.inner.get_purchase(purchase_id).await;
        self.interleave().await;
        purchase
    }

    async fn set_purchase_status(&self, purchase_id: &Uuid, from: PurchaseStatus, to: PurchaseStatus) -> Result<bool, StoreError> {
        self.inner.set_purchase_status(purchase_id, from, to).await
    }

    async fn list_course_purchases(&self, course_id: &Uuid) -> Result<Vec<Purchase>, StoreError> {
        self.inner.list_course_purchases(course_id).await
    }

    async fn delete_course_purchases(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        self.inner.delete_course_purchases(course_id).await
    }
}

#[async_trait]
impl EnrollmentRepository for Interleaved {
    async fn put_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        self.inner.put_enrollment(enrollment).await
    }

    async fn list_user_enrollments(&self, user_id: &str) -> Result<Vec<Enrollment>, StoreError> {
        self.inner.list_user_enrollments(user_id).await
    }

    async fn list_course_enrollments(&self, course_id: &Uuid) -> Result<Vec<Enrollment>, StoreError> {
        self.inner.list_course_enrollments(course_id).await
    }

    async fn set_enrollment_status(
        &self,
        enrollment_id: &Uuid,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> Result<bool, StoreError> {
        self.inner.set_enrollment_status(enrollment_id, from, to).await
    }

    async fn delete_enrollment(&self, enrollment_id: &Uuid) -> Result<(), StoreError> {
        self.inner.delete_enrollment(enrollment_id).await
    }

    async fn delete_course_enrollments(&self, course_id: &Uuid) -> Result<usize, StoreError> {
        self.inner.delete_course_enrollments(course_id).await
    }
}

#[async_trait]
impl ProgressRepository for Interleaved {
    async fn get_progress(&self, user_id: &str, course_id: &Uuid) -> Result<Option<Progress>, StoreError> {
        self.inner.get_progress(user_id, course_id).await
    }

    async fn put_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        self.inner.put_progress(progress).await
    }
}
