//! Query builder - multi-predicate lookup over an EAV table pair
//!
//! A predicate set `{k1 = v1, ..., kN = vN}` compiles to a self-join of the
//! class's properties table, one alias per predicate:
//!
//! ```sql
//! SELECT t1.id FROM "<props>" AS t1
//!   JOIN "<props>" AS t2 ON t1.id = t2.id
//!   ...
//! WHERE t1.key = ?1 AND t1.value = ?2 AND t2.key = ?3 AND t2.value = ?4 ...
//! ```
//!
//! A record matches iff every predicate is satisfied by some property row of
//! that record; unrelated extra properties do not disqualify it. Keys and
//! frozen values are always bound, never spliced into the text.

use serde::Serialize;
use serde_json::Value;
use crate::Result;
use crate::gate::PersistenceGate;
use crate::namespace::{ClassIdentity, TableNamespace};
use crate::storage::{codec, EavStore, RecordId};

/// A single required `key = value` match
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub key: String,
    pub value: Value,
}

impl Predicate {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Conjunction of predicates
///
/// Insertion order only decides alias and placeholder numbering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate whose value is already a JSON value
    pub fn and(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::new(key, value));
        self
    }

    /// Add a predicate from any serializable value
    pub fn and_serialized<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        self.predicates.push(Predicate::new(key, value));
        Ok(self)
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }
}

impl FromIterator<Predicate> for PredicateSet {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PredicateSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| Predicate::new(k, v)).collect()
    }
}

/// Compiled id lookup: SQL text plus its bindings
///
/// Join clauses, filter clauses and bindings are accumulated side by side so
/// placeholder `?n` always refers to `bindings()[n - 1]`.
#[derive(Debug, Clone)]
pub struct SelectIds {
    from: String,
    joins: Vec<String>,
    filters: Vec<String>,
    bindings: Vec<String>,
}

impl SelectIds {
    /// Start a lookup over a properties table
    pub fn over(properties_table: &str) -> Self {
        Self {
            from: format!(r#""{}" AS t1"#, properties_table),
            joins: Vec::new(),
            filters: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Add one predicate as a fresh alias
    pub fn predicate(mut self, properties_table: &str, predicate: &Predicate) -> Result<Self> {
        let alias = format!("t{}", self.filters.len() + 1);
        if alias != "t1" {
            self.joins.push(format!(
                r#"JOIN "{table}" AS {alias} ON t1.id = {alias}.id"#,
                table = properties_table,
                alias = alias
            ));
        }

        let frozen = codec::freeze(&predicate.value)?;
        self.bindings.push(predicate.key.clone());
        let key_slot = self.bindings.len();
        self.bindings.push(frozen);
        let value_slot = self.bindings.len();

        self.filters.push(format!(
            "{alias}.key = ?{key_slot} AND {alias}.value = ?{value_slot}",
        ));
        Ok(self)
    }

    /// Compile a whole predicate set against a properties table
    pub fn compile(properties_table: &str, predicates: &PredicateSet) -> Result<Self> {
        predicates
            .iter()
            .try_fold(Self::over(properties_table), |select, p| select.predicate(properties_table, p))
    }

    pub fn sql(&self) -> String {
        let mut sql = format!("SELECT t1.id FROM {}", self.from);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filters.join(" AND "));
        }
        sql
    }

    pub fn bindings(&self) -> &[String] {
        &self.bindings
    }
}

/// Ids of the class's records matching every predicate
///
/// `Ok(None)` means there is no usable persistence layer (disabled,
/// unreachable or incompatible store), which is distinct from `Ok(Some(vec![]))`,
/// zero matches. Order is unspecified and ids are not deduplicated.
pub fn select_ids(
    gate: &PersistenceGate,
    class: &ClassIdentity,
    predicates: &PredicateSet,
) -> Result<Option<Vec<RecordId>>> {
    let Some(store) = gate.active_store() else {
        tracing::debug!("select_ids({}): persistence inactive", class);
        return Ok(None);
    };
    select_ids_in(&store, class, predicates).map(Some)
}

/// Run a lookup against a store that has already passed the gate
pub(crate) fn select_ids_in(
    store: &EavStore,
    class: &ClassIdentity,
    predicates: &PredicateSet,
) -> Result<Vec<RecordId>> {
    let ns = TableNamespace::for_class(class);

    if predicates.is_empty() {
        if !store.table_exists(&ns.records)? {
            return Ok(Vec::new());
        }
        return store.record_ids(&ns);
    }

    // compile before touching the store so bad values always surface
    let select = SelectIds::compile(&ns.properties, predicates)?;

    if !store.table_exists(&ns.properties)? {
        return Ok(Vec::new());
    }

    let sql = select.sql();
    tracing::debug!("select_ids({}): {} [{} bindings]", class, sql, select.bindings().len());
    store.query_ids(&sql, select.bindings())
}
