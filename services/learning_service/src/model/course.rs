use chrono::{DateTime, Utc};
use common_macros::hash_map;
use serde::{Deserialize, Serialize};
use aws_sdk_dynamodb::model::AttributeValue;
use service_core::ddb::Item;
use thiserror::Error;
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default = "Uuid::nil")]
    #[builder(default = Uuid::new_v4())]
    pub course_id: Uuid,

    #[builder(setter(into))]
    pub title: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub description: String,

    pub price: f64,

    /// Percent taken off `price` at checkout.
    #[serde(default)]
    #[builder(default)]
    pub discount: u8,

    #[serde(default = "published_by_default")]
    #[builder(default = true)]
    pub is_published: bool,

    #[serde(default)]
    #[builder(default)]
    pub content: Vec<Chapter>,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub thumbnail: String,

    #[serde(default)]
    #[builder(setter(into))]
    pub educator_id: String,

    #[serde(default)]
    #[builder(default)]
    pub ratings: Vec<Rating>,

    /// Denormalized cache of the students holding a successful enrollment.
    #[serde(default)]
    #[builder(default)]
    pub enrolled_students: Vec<String>,

    #[serde(default = "Utc::now")]
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_id: String,
    pub title: String,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub lecture_id: String,
    pub title: String,
    pub duration_minutes: f64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_preview_free: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: String,
    pub rating: u8,
}

#[derive(Debug, Error, PartialEq)]
pub enum CourseValidationError {
    #[error("Course title is required.")]
    MissingTitle,

    #[error("Course price must be a non-negative number.")]
    InvalidPrice,

    #[error("Discount must be between 0 and 100.")]
    InvalidDiscount,

    #[error("Lecture {0} has a negative duration.")]
    NegativeDuration(String),

    #[error("Lecture id {0} is used more than once.")]
    DuplicateLecture(String),
}

fn published_by_default() -> bool {
    true
}

impl Course {
    pub fn key(course_id: &Uuid) -> Item {
        hash_map! {
            "courseId".to_string() => AttributeValue::S(course_id.to_string()),
        }
    }

    pub fn lectures(&self) -> impl Iterator<Item = &Lecture> {
        self.content.iter().flat_map(|chapter| chapter.lectures.iter())
    }

    pub fn total_lectures(&self) -> usize {
        self.content.iter().map(|chapter| chapter.lectures.len()).sum()
    }

    pub fn has_lecture(&self, lecture_id: &str) -> bool {
        self.lectures().any(|lecture| lecture.lecture_id == lecture_id)
    }

    pub fn has_student(&self, user_id: &str) -> bool {
        self.enrolled_students.iter().any(|s| s == user_id)
    }

    /// Price after discount, rounded to cents.
    pub fn checkout_amount(&self) -> f64 {
        let amount = self.price - self.price * f64::from(self.discount) / 100.0;
        (amount * 100.0).round() / 100.0
    }

    /// Replaces the rating left by `user_id`, or appends one. Returns `true` when a previous
    /// rating was replaced.
    pub fn upsert_rating(&mut self, user_id: &str, rating: u8) -> bool {
        match self.ratings.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => {
                existing.rating = rating;
                true
            }
            None => {
                self.ratings.push(Rating {
                    user_id: user_id.to_owned(),
                    rating,
                });
                false
            }
        }
    }

    /// Blanks the video URL of every lecture that is not a free preview.
    pub fn redact_locked_lectures(&mut self) {
        self.content
            .iter_mut()
            .flat_map(|chapter| chapter.lectures.iter_mut())
            .filter(|lecture| !lecture.is_preview_free)
            .for_each(|lecture| lecture.url.clear());
    }

    pub fn validate(&self) -> Result<(), CourseValidationError> {
        if self.title.trim().is_empty() {
            return Err(CourseValidationError::MissingTitle);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CourseValidationError::InvalidPrice);
        }
        if self.discount > 100 {
            return Err(CourseValidationError::InvalidDiscount);
        }

        let mut seen = std::collections::HashSet::new();
        for lecture in self.lectures() {
            if !(lecture.duration_minutes >= 0.0) {
                return Err(CourseValidationError::NegativeDuration(lecture.lecture_id.clone()));
            }
            if !seen.insert(lecture.lecture_id.as_str()) {
                return Err(CourseValidationError::DuplicateLecture(lecture.lecture_id.clone()));
            }
        }

        Ok(())
    }
}
