mod courses;
mod enrollments;
mod progress;
mod purchases;
mod users;

use service_core::ddb::ThreadSafeDdbClient;
use typed_builder::TypedBuilder;

/// Names of the tables backing each collection.
///
/// Attribute names are the records' serde names. Expected secondary indexes: `EducatorIdIndex`
/// (`educatorId`) on courses, `CourseIdIndex` (`courseId`) on purchases, `UserIdIndex` (`userId`)
/// and `CourseIdIndex` on enrollments. The progress table is keyed by `userId` (hash) and
/// `courseId` (range).
#[derive(Debug, Clone, TypedBuilder)]
pub struct TableNames {
    #[builder(setter(into))]
    pub courses: String,

    #[builder(setter(into))]
    pub users: String,

    #[builder(setter(into))]
    pub purchases: String,

    #[builder(setter(into))]
    pub enrollments: String,

    #[builder(setter(into))]
    pub progress: String,
}

pub struct DdbStore<T: ThreadSafeDdbClient> {
    ddb: T,
    tables: TableNames,
}

impl<T: ThreadSafeDdbClient> DdbStore<T> {
    pub fn new(ddb: T, tables: TableNames) -> Self {
        Self { ddb, tables }
    }
}
