use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

// --- Entity ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// --- Entity contract ---

/// A uniquely identified record the repositories can store and search.
///
/// The engine only needs the id and a way to read a field by name; everything
/// else about the record is opaque to it.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &EntityId;

    /// Value of the named field, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<Value>;

    /// JSON form of the record: the id merged with its attributes.
    fn to_json(&self) -> Result<Value, serde_json::Error>;
}

// --- Generic record ---

/// Entity made of an id and a serializable attribute set.
///
/// Field names are the serialized property names, so `#[serde(rename_all)]`
/// on `P` decides what callers sort and filter by.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Record<P> {
    id: EntityId,
    #[serde(flatten)]
    pub(crate) props: P,
}

impl<P> Record<P> {
    /// Creates a record with a freshly generated id.
    pub fn new(props: P) -> Self {
        Self::with_id(EntityId::generate(), props)
    }

    pub fn with_id(id: EntityId, props: P) -> Self {
        Self { id, props }
    }

    pub fn props(&self) -> &P {
        &self.props
    }
}

impl<P> Entity for Record<P>
where
    P: Serialize + Clone + Send + Sync + 'static,
{
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(&self.props) {
            Ok(Value::Object(mut map)) => map.remove(name),
            _ => None,
        }
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Debug, Clone, PartialEq)]
    struct StubProps {
        name: String,
        price: u32,
    }

    #[test]
    fn record_keeps_given_id_and_props() {
        let props = StubProps {
            name: "value1".to_string(),
            price: 2,
        };
        let id = EntityId::new("a92288fc-a6e8-465a-8f56-f2f82db8aaee");
        let record = Record::with_id(id.clone(), props.clone());

        assert_eq!(record.id(), &id);
        assert_eq!(record.props(), &props);
    }

    #[test]
    fn new_record_gets_a_uuid() {
        let record = Record::new(StubProps {
            name: "any".to_string(),
            price: 10,
        });
        assert!(Uuid::parse_str(record.id().as_str()).is_ok());
    }

    #[test]
    fn to_json_merges_id_and_props() {
        let record = Record::with_id(
            EntityId::new("id-1"),
            StubProps {
                name: "any_name".to_string(),
                price: 10,
            },
        );
        assert_eq!(
            record.to_json().unwrap(),
            json!({ "id": "id-1", "name": "any_name", "price": 10 })
        );
    }

    #[test]
    fn field_reads_serialized_property() {
        let record = Record::new(StubProps {
            name: "any_name".to_string(),
            price: 10,
        });
        assert_eq!(record.field("name"), Some(json!("any_name")));
        assert_eq!(record.field("price"), Some(json!(10)));
        assert_eq!(record.field("missing"), None);
    }

    #[derive(Debug, Clone)]
    struct BrokenProps;

    impl Serialize for BrokenProps {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("props cannot be serialized"))
        }
    }

    #[test]
    fn to_json_reports_serialization_failure() {
        let record = Record::new(BrokenProps);
        let err = record.to_json().unwrap_err();
        assert!(err.to_string().contains("props cannot be serialized"));
        assert_eq!(record.field("name"), None);
    }
}
