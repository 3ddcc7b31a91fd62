use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entities::{comment, movie};

/// Schema-less movie metadata exactly as the provider returned it.
///
/// Lookups only ever see string values: a key that is missing, or that holds
/// a non-string JSON value, never matches a filter, search or sort.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalData(Map<String, Value>);

impl ExternalData {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Anything other than a JSON object is stored as an empty mapping.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn field_contains(&self, field: &str, needle: &str) -> bool {
        self.get(field)
            .is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
    }

    pub fn field_equals(&self, field: &str, expected: &str) -> bool {
        self.get(field)
            .is_some_and(|value| value.to_lowercase() == expected.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExternalData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), Value::String(v.into()))).collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Movie {
    pub id: i32,
    pub external_data: ExternalData,
}

impl Movie {
    pub fn view(&self) -> MovieView {
        MovieView { external_data: self.external_data.clone(), id: self.id }
    }
}

impl From<movie::Model> for Movie {
    fn from(model: movie::Model) -> Self {
        Self { id: model.id, external_data: ExternalData::from_json(model.external_data) }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: i32,
    pub movie_id: i32,
    pub comment: String,
    pub added_on: Timestamp,
}

impl Comment {
    pub fn view(&self) -> CommentView {
        CommentView {
            movie_id: self.movie_id,
            comment: self.comment.clone(),
            added_on: self.added_on,
            id: self.id,
        }
    }
}

impl TryFrom<comment::Model> for Comment {
    type Error = jiff::Error;

    fn try_from(model: comment::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            movie_id: model.movie_id,
            comment: model.comment,
            added_on: Timestamp::from_microsecond(model.added_on)?,
        })
    }
}

/// `external_data` flattened next to the store id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieView {
    #[serde(flatten)]
    pub external_data: ExternalData,
    pub id: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub movie_id: i32,
    pub comment: String,
    pub added_on: Timestamp,
    pub id: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMovie {
    pub movie_id: i32,
    pub rank: usize,
    pub total_comments: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Results<T> {
    pub results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieQuery {
    pub order: Option<String>,
    pub search: Option<String>,
    pub year: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub movie: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<String>,
}

/// Query-string values are treated as absent when empty.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookups_ignore_missing_and_non_string_values() {
        let data = ExternalData::from_json(json!({
            "Title": "Fight Club",
            "Ratings": [{"Source": "Internet Movie Database", "Value": "8.8/10"}],
        }));

        assert!(data.field_contains("Title", "CLUB"));
        assert!(!data.field_contains("Ratings", "Internet"));
        assert!(!data.field_contains("Director", ""));
        assert!(data.field_equals("Title", "fight club"));
        assert_eq!(data.get("Ratings"), None);
    }

    #[test]
    fn non_object_json_becomes_empty_mapping() {
        assert!(ExternalData::from_json(json!("Fight Club")).is_empty());
    }

    #[test]
    fn movie_view_flattens_external_data() {
        let movie = Movie {
            id: 8,
            external_data: [("Title", "Fight Club"), ("Year", "1999")].into_iter().collect(),
        };

        let value = serde_json::to_value(movie.view()).unwrap();
        assert_eq!(value, json!({"Title": "Fight Club", "Year": "1999", "id": 8}));
    }

    #[test]
    fn comment_view_renders_utc_timestamp() {
        let comment = Comment {
            id: 1,
            movie_id: 1,
            comment: "10/10".to_string(),
            added_on: "2019-10-10T00:00:00Z".parse().unwrap(),
        };

        let value = serde_json::to_value(comment.view()).unwrap();
        assert_eq!(
            value,
            json!({"movie_id": 1, "comment": "10/10", "added_on": "2019-10-10T00:00:00Z", "id": 1})
        );
    }
}
