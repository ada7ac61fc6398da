use common_macros::hash_map;
use serde::{Deserialize, Serialize};
use aws_sdk_dynamodb::model::AttributeValue;
use service_core::ddb::Item;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Local projection of an identity-provider account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[builder(setter(into))]
    pub user_id: String,

    #[builder(setter(into))]
    pub name: String,

    #[builder(setter(into))]
    pub email: String,

    #[serde(default)]
    #[builder(default, setter(into))]
    pub image_url: String,

    /// Denormalized cache of the courses this user was enrolled into. Rebuildable from the
    /// enrollment ledger; healed whenever a dangling entry is found.
    #[serde(default)]
    #[builder(default)]
    pub enrolled_courses: Vec<Uuid>,
}

impl User {
    pub fn key(user_id: &str) -> Item {
        hash_map! {
            "userId".to_string() => AttributeValue::S(user_id.to_owned()),
        }
    }

    pub fn has_course(&self, course_id: &Uuid) -> bool {
        self.enrolled_courses.contains(course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_without_cache() {
        let input = serde_json::json!({
            "userId": "user_2Ab",
            "name": "Ada Lovelace",
            "email": "ada@example.com"
        });

        let user: User = serde_json::from_value(input).unwrap();

        assert!(user.enrolled_courses.is_empty());
        assert_eq!("", user.image_url);
    }

    #[test]
    fn rejects_malformed_cache_entries() {
        use serde_dynamo::aws_sdk_dynamodb_0_9::{from_item, to_item};

        let user = User::builder()
            .user_id("user_2Ab")
            .name("Ada Lovelace")
            .email("ada@example.com")
            .build();
        let mut item: Item = to_item(&user).unwrap();
        item.insert(
            "enrolledCourses".to_string(),
            AttributeValue::L(vec![AttributeValue::S("not-a-uuid".to_string())]),
        );

        let restored: Result<User, _> = from_item(item);

        assert!(restored.is_err());
    }
}
