//! The contract every configuration domain implements.
//!
//! A domain is a plain serde struct that knows its own name and schema. The
//! aggregate [`Config`](super::Config) only ever talks to domains through this
//! contract, so adding a domain never touches another domain's code.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::schema::Schema;
use super::violation::Violation;

/// A configuration domain: default construction, schema validation and deep
/// copy.
///
/// `Default::default()` must produce an instance that passes
/// [`validate`](ConfigObject::validate) with no user input, and two calls must
/// share nothing mutable.
pub trait ConfigObject: Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key under which the domain appears in the persisted configuration.
    const NAME: &'static str;

    /// The schema the domain's records are checked against.
    fn schema() -> &'static Schema;

    /// Validates a raw record before it is deserialized into `Self`.
    fn validate_record(record: &Value) -> Vec<Violation> {
        Self::schema().validate(record)
    }

    /// Validates this instance against the domain schema.
    ///
    /// Pure: reads nothing but `self`.
    fn validate(&self) -> Vec<Violation> {
        match serde_json::to_value(self) {
            Ok(record) => Self::validate_record(&record),
            Err(e) => vec![Violation::new("", format!("cannot be represented as a record: {e}"))],
        }
    }

    /// Returns an independently owned copy; mutating either side is never
    /// observable through the other.
    fn copy(&self) -> Self {
        self.clone()
    }
}

/// Object-safe view of a [`ConfigObject`], used to walk the aggregate's
/// members without naming their concrete types.
pub trait ConfigSection {
    fn name(&self) -> &'static str;
    fn violations(&self) -> Vec<Violation>;
}

impl<T: ConfigObject> ConfigSection for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn violations(&self) -> Vec<Violation> {
        self.validate()
    }
}

/// A recognized domain as seen by the loader: its name and raw-record
/// validator.
#[derive(Clone, Copy)]
pub struct Domain {
    pub name: &'static str,
    pub validate_record: fn(&Value) -> Vec<Violation>,
    pub schema: fn() -> &'static Schema,
}

impl Domain {
    pub fn of<T: ConfigObject>() -> Self {
        Self {
            name: T::NAME,
            validate_record: T::validate_record,
            schema: T::schema,
        }
    }
}
