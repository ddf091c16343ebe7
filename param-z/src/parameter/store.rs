//! Per-node parameter storage with pending-change batching.
//!
//! The store is deliberately not synchronized; [`super::server::ParameterServer`]
//! owns it behind a `Mutex` because the transport may dispatch request
//! handlers concurrently.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ParamError;

use super::types::{Parameter, ParameterEvent};

/// Changes accumulated since the last flush, transmitted atomically as one
/// [`ParameterEvent`]. A name appears in at most one of the three lists:
/// re-sets update the pending entry in place, and a name created and
/// deleted inside one batch vanishes without a trace (observers never saw
/// it).
#[derive(Debug, Default)]
pub struct PendingChanges {
    pub new: Vec<Parameter>,
    pub changed: Vec<Parameter>,
    pub deleted: Vec<Parameter>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }

    fn record_set(&mut self, param: &Parameter, is_new: bool) {
        if let Some(entry) = self.new.iter_mut().find(|p| p.name == param.name) {
            entry.value = param.value.clone();
            return;
        }
        if let Some(entry) = self.changed.iter_mut().find(|p| p.name == param.name) {
            entry.value = param.value.clone();
            return;
        }
        // Deleted then re-set within one batch: observers last saw it alive.
        if let Some(pos) = self.deleted.iter().position(|p| p.name == param.name) {
            self.deleted.remove(pos);
            self.changed.push(param.clone());
            return;
        }
        if is_new {
            self.new.push(param.clone());
        } else {
            self.changed.push(param.clone());
        }
    }

    fn record_delete(&mut self, param: Parameter) {
        if let Some(pos) = self.new.iter().position(|p| p.name == param.name) {
            self.new.remove(pos);
            return;
        }
        if let Some(pos) = self.changed.iter().position(|p| p.name == param.name) {
            self.changed.remove(pos);
        }
        self.deleted.push(param);
    }
}

/// In-memory map of name → [`Parameter`] for a single node.
#[derive(Debug, Default)]
pub struct ParameterStore {
    parameters: HashMap<String, Parameter>,
    pending: PendingChanges,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one parameter and record it in the pending batch: names not
    /// yet in the store are classified *new*, existing names *changed*.
    pub fn set_parameter(&mut self, param: Parameter) {
        let is_new = !self.parameters.contains_key(&param.name);
        self.pending.record_set(&param, is_new);
        self.parameters.insert(param.name.clone(), param);
    }

    /// Apply each parameter in order. The caller flushes the combined batch
    /// afterwards (the server does so automatically).
    pub fn set_parameters(&mut self, params: impl IntoIterator<Item = Parameter>) {
        for param in params {
            self.set_parameter(param);
        }
    }

    /// Remove a parameter if present, recording it in pending-deleted.
    /// Returns whether anything was removed; absent names are a no-op.
    pub fn delete_parameter(&mut self, name: &str) -> bool {
        match self.parameters.remove(name) {
            Some(param) => {
                self.pending.record_delete(param);
                true
            }
            None => false,
        }
    }

    /// Look up a parameter. Absent names fail; there are no defaults.
    pub fn get_parameter(&self, name: &str) -> Result<&Parameter, ParamError> {
        self.parameters
            .get(name)
            .ok_or_else(|| ParamError::NotFound(name.to_owned()))
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// All stored parameters, sorted by name.
    pub fn get_all_parameters(&self) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = self.parameters.values().cloned().collect();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        params
    }

    /// Names starting with `prefix` (empty prefix matches all), sorted.
    ///
    /// `depth > 0` excludes names whose total dot-count is `>= depth`, so
    /// `depth == 1` keeps only top-level names regardless of prefix.
    pub fn list_parameter_names(&self, prefix: &str, depth: u32) -> Vec<String> {
        let mut names: Vec<String> = self
            .parameters
            .keys()
            .filter(|name| prefix.is_empty() || name.starts_with(prefix))
            .filter(|name| depth == 0 || (name.matches('.').count() as u32) < depth)
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// The un-flushed batch, inspectable between flushes.
    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    /// Drain the pending batch into one event, or `None` when nothing is
    /// pending (an empty batch is never transmitted).
    pub fn take_event(&mut self, node_id: &str) -> Option<ParameterEvent> {
        if self.pending.is_empty() {
            return None;
        }
        let pending = std::mem::take(&mut self.pending);
        Some(ParameterEvent {
            node_id: node_id.to_owned(),
            timestamp_ns: now_timestamp_ns(),
            new: pending.new,
            changed: pending.changed,
            deleted: pending.deleted,
        })
    }
}

fn now_timestamp_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::types::ParameterValue;

    #[test]
    fn test_set_then_get_roundtrip_all_kinds() {
        let values = [
            ParameterValue::Bool(true),
            ParameterValue::Integer(-42),
            ParameterValue::Double(2.0),
            ParameterValue::String("fast".into()),
            ParameterValue::ByteArray(vec![1, 2, 3]),
            ParameterValue::BoolArray(vec![false, true]),
            ParameterValue::IntegerArray(vec![10, 20]),
            ParameterValue::DoubleArray(vec![0.5, 1.5]),
            ParameterValue::StringArray(vec!["x".into()]),
        ];
        let mut store = ParameterStore::new();
        for (i, value) in values.iter().enumerate() {
            let name = format!("p{}", i);
            store.set_parameter(Parameter::new(&name, value.clone()));
            assert_eq!(&store.get_parameter(&name).unwrap().value, value);
        }
    }

    #[test]
    fn test_get_absent_fails() {
        let store = ParameterStore::new();
        assert_eq!(
            store.get_parameter("missing").unwrap_err(),
            ParamError::NotFound("missing".into())
        );
    }

    #[test]
    fn test_event_classification() {
        let mut store = ParameterStore::new();

        store.set_parameter(Parameter::new("speed", 1.0));
        let event = store.take_event("robot1").unwrap();
        assert_eq!(event.node_id, "robot1");
        assert_eq!(event.new.len(), 1);
        assert_eq!(event.new[0].name, "speed");
        assert!(event.changed.is_empty());
        assert!(event.deleted.is_empty());

        store.set_parameter(Parameter::new("speed", 2.0));
        let event = store.take_event("robot1").unwrap();
        assert!(event.new.is_empty());
        assert_eq!(event.changed.len(), 1);
        assert_eq!(event.changed[0].value, ParameterValue::Double(2.0));

        assert!(store.delete_parameter("speed"));
        let event = store.take_event("robot1").unwrap();
        assert_eq!(event.deleted.len(), 1);
        assert!(!store.has_parameter("speed"));
    }

    #[test]
    fn test_empty_batch_yields_no_event() {
        let mut store = ParameterStore::new();
        assert!(store.take_event("n").is_none());

        // Deleting an absent name must not produce an event either.
        assert!(!store.delete_parameter("ghost"));
        assert!(store.take_event("n").is_none());
    }

    #[test]
    fn test_take_event_drains_batch() {
        let mut store = ParameterStore::new();
        store.set_parameter(Parameter::new("a", 1i64));
        assert!(store.take_event("n").is_some());
        assert!(store.take_event("n").is_none());
    }

    #[test]
    fn test_rebatch_same_name_stays_new() {
        let mut store = ParameterStore::new();
        store.set_parameter(Parameter::new("a", 1i64));
        store.set_parameter(Parameter::new("a", 2i64));

        assert_eq!(store.pending().new.len(), 1);
        assert!(store.pending().changed.is_empty());

        let event = store.take_event("n").unwrap();
        assert_eq!(event.new.len(), 1);
        assert_eq!(event.new[0].value, ParameterValue::Integer(2));
        assert!(event.changed.is_empty());
    }

    #[test]
    fn test_set_then_delete_in_one_batch_vanishes() {
        let mut store = ParameterStore::new();
        store.set_parameter(Parameter::new("temp", 1i64));
        store.delete_parameter("temp");
        assert!(store.take_event("n").is_none());
        assert!(!store.has_parameter("temp"));
    }

    #[test]
    fn test_delete_then_set_in_one_batch_is_changed() {
        let mut store = ParameterStore::new();
        store.set_parameter(Parameter::new("a", 1i64));
        store.take_event("n");

        store.delete_parameter("a");
        store.set_parameter(Parameter::new("a", 2i64));
        let event = store.take_event("n").unwrap();
        assert!(event.new.is_empty());
        assert!(event.deleted.is_empty());
        assert_eq!(event.changed.len(), 1);
    }

    #[test]
    fn test_event_lists_are_disjoint() {
        let mut store = ParameterStore::new();
        store.set_parameter(Parameter::new("a", 1i64));
        store.take_event("n");

        store.set_parameter(Parameter::new("a", 2i64));
        store.set_parameter(Parameter::new("b", 3i64));
        store.set_parameter(Parameter::new("b", 4i64));
        let event = store.take_event("n").unwrap();

        let mut seen = Vec::new();
        for p in event.new.iter().chain(&event.changed).chain(&event.deleted) {
            assert!(!seen.contains(&p.name), "name '{}' appears twice", p.name);
            seen.push(p.name.clone());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_list_by_prefix_unlimited_depth() {
        let mut store = ParameterStore::new();
        for name in ["robot.max_velocity", "robot.arm.reach", "sensor.rate"] {
            store.set_parameter(Parameter::new(name, 1i64));
        }
        assert_eq!(
            store.list_parameter_names("robot.", 0),
            vec!["robot.arm.reach", "robot.max_velocity"]
        );
    }

    #[test]
    fn test_list_depth_one_excludes_dotted_names() {
        let mut store = ParameterStore::new();
        for name in ["alpha", "beta", "robot.max_velocity"] {
            store.set_parameter(Parameter::new(name, 1i64));
        }
        assert_eq!(store.list_parameter_names("", 1), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_list_depth_counts_total_dots() {
        // The depth cap counts dots in the whole name, not below the prefix:
        // every "robot."-prefixed name has at least one dot, so depth 1
        // filters them all out.
        let mut store = ParameterStore::new();
        store.set_parameter(Parameter::new("robot.max_velocity", 1i64));
        store.set_parameter(Parameter::new("robot.arm.reach", 1i64));
        assert!(store.list_parameter_names("robot.", 1).is_empty());
        assert_eq!(
            store.list_parameter_names("robot.", 2),
            vec!["robot.max_velocity"]
        );
    }

    #[test]
    fn test_timestamps_do_not_go_backwards() {
        let mut store = ParameterStore::new();
        store.set_parameter(Parameter::new("a", 1i64));
        let first = store.take_event("n").unwrap();
        store.set_parameter(Parameter::new("a", 2i64));
        let second = store.take_event("n").unwrap();
        assert!(first.timestamp_ns > 0);
        assert!(second.timestamp_ns >= first.timestamp_ns);
    }
}
