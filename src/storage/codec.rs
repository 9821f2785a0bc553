//! Value codec - freeze/thaw of property values
//!
//! Values are `serde_json::Value` scalars frozen to compact JSON text. The
//! same frozen form is written to properties tables and bound as a query
//! parameter, so equality in SQL matches equality of values.

use serde_json::Value;
use crate::Result;

/// Serialize a value to its stored form.
pub fn freeze(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Deserialize a stored value.
pub fn thaw(frozen: &str) -> Result<Value> {
    Ok(serde_json::from_str(frozen)?)
}
