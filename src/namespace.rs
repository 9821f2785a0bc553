//! Class namespace - class identity to EAV table names
//!
//! Every class gets its own `(records, properties)` table pair inside the one
//! shared store. Names are built from four segments:
//!
//! `<core tag>__<class namespace>__<type name>__<type tag>`
//!
//! e.g. `eavbase__shop__Widget__props`.
//!
//! Each segment is escaped so that the mapping is injective and the result is
//! always a bare SQL identifier: ASCII alphanumerics pass through, every other
//! byte becomes `_` followed by two lowercase hex digits. Escaped segments never
//! contain `__`, so the separator cannot be forged by a segment.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Tag scoping this crate's tables away from anything else in the store
pub const CORE_TAG: &str = "eavbase";

/// Type tag of records tables
pub const RECORDS_TAG: &str = "recs";

/// Type tag of properties tables
pub const PROPERTIES_TAG: &str = "props";

/// Logical class of an entity: namespace segment plus concrete type name.
///
/// Written as `namespace::TypeName`; the last `::` separates the two, so
/// nested namespaces such as `app::shop::Widget` are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassIdentity {
    pub namespace: String,
    pub type_name: String,
}

impl ClassIdentity {
    pub fn new(namespace: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            type_name: type_name.into(),
        }
    }

    /// Parse `namespace::TypeName`
    pub fn parse(s: &str) -> Result<Self> {
        let (namespace, type_name) = s
            .rsplit_once("::")
            .ok_or_else(|| Error::InvalidClass(format!("expected namespace::Type, got {:?}", s)))?;

        if namespace.is_empty() || type_name.is_empty() {
            return Err(Error::InvalidClass(format!("empty segment in {:?}", s)));
        }

        Ok(Self::new(namespace, type_name))
    }
}

impl fmt::Display for ClassIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.type_name)
    }
}

impl FromStr for ClassIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Two-part tag scoping one class's tables: core tag plus concrete class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableBase {
    pub core: &'static str,
    pub class: ClassIdentity,
}

/// Compute the table base for a class
pub fn table_base(class: &ClassIdentity) -> TableBase {
    TableBase {
        core: CORE_TAG,
        class: class.clone(),
    }
}

/// Map a table base and type tag to a table name
pub fn table_name(base: &TableBase, type_tag: &str) -> String {
    [base.core, base.class.namespace.as_str(), base.class.type_name.as_str(), type_tag]
        .iter()
        .map(|segment| escape_segment(segment))
        .collect::<Vec<_>>()
        .join("__")
}

fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

/// The records/properties table pair of one class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableNamespace {
    pub records: String,
    pub properties: String,
}

impl TableNamespace {
    pub fn for_class(class: &ClassIdentity) -> Self {
        let base = table_base(class);
        Self {
            records: table_name(&base, RECORDS_TAG),
            properties: table_name(&base, PROPERTIES_TAG),
        }
    }
}
