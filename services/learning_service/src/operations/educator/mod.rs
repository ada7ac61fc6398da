//! Operations reserved to callers holding the educator role.

pub mod add_course;
pub mod courses;
pub mod dashboard;
pub mod enrolled_students;
pub mod update_role;

use std::collections::HashMap;

use serde::Serialize;

use crate::model::User;
use crate::store::{Store, StoreError};

/// Public profile of a student, as shown to educators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    pub user_id: String,
    pub name: String,
    pub image_url: String,
}

impl From<&User> for StudentView {
    fn from(user: &User) -> Self {
        StudentView {
            user_id: user.user_id.clone(),
            name: if user.name.is_empty() {
                String::from("Student")
            } else {
                user.name.clone()
            },
            image_url: user.image_url.clone(),
        }
    }
}

/// Memoized user lookups; students reached through several courses are loaded once.
#[derive(Default)]
pub(crate) struct StudentDirectory {
    known: HashMap<String, Option<StudentView>>,
}

impl StudentDirectory {
    pub(crate) async fn get(
        &mut self,
        store: &(impl Store + ?Sized),
        user_id: &str,
    ) -> Result<Option<StudentView>, StoreError> {
        if let Some(known) = self.known.get(user_id) {
            return Ok(known.clone());
        }
        let view = store.get_user(user_id).await?.as_ref().map(StudentView::from);
        self.known.insert(user_id.to_owned(), view.clone());
        Ok(view)
    }
}
