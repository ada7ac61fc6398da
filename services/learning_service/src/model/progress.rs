use common_macros::hash_map;
use serde::{Deserialize, Serialize};
use aws_sdk_dynamodb::model::AttributeValue;
use service_core::ddb::Item;
use uuid::Uuid;

use super::course::Course;

/// Completed lectures of one user in one course. Keyed by the (user, course) pair, so there is
/// at most one record per pair.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    pub course_id: Uuid,
    /// Treated as a set; kept in completion order.
    #[serde(default)]
    pub lecture_completed: Vec<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Completion figures derived from a progress record and the current course content.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_lectures: usize,
    pub completed_lectures: usize,
    pub percentage: u32,
    pub is_completed: bool,
    pub lecture_ids: Vec<String>,
}

impl Progress {
    pub fn empty(user_id: impl Into<String>, course_id: Uuid) -> Self {
        Progress {
            user_id: user_id.into(),
            course_id,
            lecture_completed: Vec::new(),
            completed: false,
        }
    }

    pub fn key(user_id: &str, course_id: &Uuid) -> Item {
        hash_map! {
            "userId".to_string() => AttributeValue::S(user_id.to_owned()),
            "courseId".to_string() => AttributeValue::S(course_id.to_string()),
        }
    }

    /// Adds the lecture to the completed set. Returns `false` when it was already there.
    pub fn mark(&mut self, lecture_id: &str) -> bool {
        if self.lecture_completed.iter().any(|id| id == lecture_id) {
            return false;
        }
        self.lecture_completed.push(lecture_id.to_owned());
        true
    }

    /// Recomputes `completed` against the course content and returns the figures.
    pub fn refresh(&mut self, course: &Course) -> ProgressSummary {
        let summary = Self::summarize(Some(&*self), course);
        self.completed = summary.is_completed;
        summary
    }

    /// Only lectures that still exist in the course are counted, so the completed count never
    /// exceeds the total even after lectures were removed from the course.
    pub fn summarize(progress: Option<&Progress>, course: &Course) -> ProgressSummary {
        let total_lectures = course.total_lectures();
        let lecture_ids: Vec<String> = progress
            .map(|p| p.lecture_completed.clone())
            .unwrap_or_default();
        let completed_lectures = lecture_ids.iter().filter(|id| course.has_lecture(id)).count();
        let percentage = if total_lectures > 0 {
            ((completed_lectures as f64 / total_lectures as f64) * 100.0).round() as u32
        } else {
            0
        };

        ProgressSummary {
            total_lectures,
            completed_lectures,
            percentage,
            is_completed: total_lectures > 0 && completed_lectures == total_lectures,
            lecture_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::course::fixtures::course;

    #[test]
    fn marking_twice_is_a_noop() {
        let mut progress = Progress::empty("user_a", Uuid::new_v4());

        assert!(progress.mark("l1"));
        assert!(!progress.mark("l1"));
        assert_eq!(1, progress.lecture_completed.len());
    }

    #[test]
    fn completes_when_every_lecture_is_marked() {
        let course = course(10.0, 0);
        let mut progress = Progress::empty("user_a", course.course_id);

        for id in ["l1", "l2"] {
            progress.mark(id);
        }
        let partial = progress.refresh(&course);
        assert_eq!(67, partial.percentage);
        assert!(!partial.is_completed);
        assert!(!progress.completed);

        progress.mark("l3");
        let done = progress.refresh(&course);
        assert_eq!(100, done.percentage);
        assert!(done.is_completed);
        assert!(progress.completed);
    }

    #[test]
    fn empty_course_is_never_completed() {
        let mut course = course(10.0, 0);
        course.content.clear();

        let summary = Progress::summarize(None, &course);

        assert_eq!(0, summary.total_lectures);
        assert_eq!(0, summary.percentage);
        assert!(!summary.is_completed);
    }

    #[test]
    fn stale_lectures_are_not_counted() {
        let course = course(10.0, 0);
        let mut progress = Progress::empty("user_a", course.course_id);
        for id in ["l1", "l2", "l3", "removed"] {
            progress.mark(id);
        }

        let summary = Progress::summarize(Some(&progress), &course);

        assert_eq!(3, summary.completed_lectures);
        assert!(summary.completed_lectures <= summary.total_lectures);
        assert!(summary.is_completed);
        assert_eq!(4, summary.lecture_ids.len());
    }
}
