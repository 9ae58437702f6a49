#![forbid(unsafe_code)]

//! Per-component state container.
//!
//! A component's state is a flat string-keyed map of JSON values. Mutation
//! goes through [`StateContainer::merge`], which applies a shallow merge and
//! hands back owned `(old, new)` snapshots for the state-change hook.
//!
//! # Invariants
//!
//! 1. Keys present in a partial overwrite; absent keys are preserved.
//! 2. Every merge bumps `revision` by exactly one, even when the partial is
//!    empty or repeats the current values. Updates are never coalesced.
//! 3. Snapshots are owned copies. Mutating a snapshot never reaches the
//!    container.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Component state: an ordered map of string keys to arbitrary JSON values.
pub type State = Map<String, Value>;

/// Convert any serializable value into a state value.
///
/// Values that cannot be represented as JSON (maps with non-string keys)
/// become `null` so templates see an absent payload instead of a fault.
#[must_use]
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Build a partial [`State`] from `key => value` pairs.
///
/// ```
/// use aero_core::state;
///
/// let partial = state! { "visible" => true, "message" => "hello" };
/// assert_eq!(partial.len(), 2);
/// ```
#[macro_export]
macro_rules! state {
    () => {
        $crate::state::State::new()
    };
    ($($key:literal => $value:expr),+ $(,)?) => {{
        let mut map = $crate::state::State::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::state::to_value(&$value),
            );
        )+
        map
    }};
}

/// Result of a merge: owned snapshots taken before and after.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// State before the merge.
    pub old: State,
    /// State after the merge.
    pub new: State,
}

/// Owns one component's state.
#[derive(Debug, Clone, Default)]
pub struct StateContainer {
    current: State,
    revision: u64,
}

impl StateContainer {
    /// Create an empty container at revision 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge `partial` into the current state.
    pub fn merge(&mut self, partial: State) -> StateChange {
        let old = self.current.clone();
        for (key, value) in partial {
            self.current.insert(key, value);
        }
        self.revision += 1;
        StateChange {
            old,
            new: self.current.clone(),
        }
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> State {
        self.current.clone()
    }

    /// Borrow the current state (read-only).
    #[must_use]
    pub fn current(&self) -> &State {
        &self.current
    }

    /// Number of merges applied so far.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

/// Typed, total accessors over [`State`].
///
/// Every accessor returns `None` for a missing key or a value of the wrong
/// shape, which lets templates degrade to placeholders instead of failing.
pub trait StateExt {
    /// Read a boolean.
    fn get_bool(&self, key: &str) -> Option<bool>;
    /// Read a string slice.
    fn get_str(&self, key: &str) -> Option<&str>;
    /// Read an integer.
    fn get_i64(&self, key: &str) -> Option<i64>;
    /// Read a float (integers are widened).
    fn get_f64(&self, key: &str) -> Option<f64>;
    /// Deserialize a value into `T`. `null` counts as absent.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T>;
    /// Truthiness in the loose sense templates expect: `false`, `null`,
    /// `""`, `0` and missing keys are all false.
    fn is_truthy(&self, key: &str) -> bool;
}

impl StateExt for State {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => serde_json::from_value(value.clone()).ok(),
        }
    }

    fn is_truthy(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::Array(_) | Value::Object(_)) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_and_preserves() {
        let mut container = StateContainer::new();
        container.merge(state! { "a" => 1, "b" => "x" });
        let change = container.merge(state! { "b" => "y", "c" => true });

        assert_eq!(change.old.get("b"), Some(&json!("x")));
        assert_eq!(change.new.get("a"), Some(&json!(1)));
        assert_eq!(change.new.get("b"), Some(&json!("y")));
        assert_eq!(change.new.get("c"), Some(&json!(true)));
        assert_eq!(container.revision(), 2);
    }

    #[test]
    fn snapshots_are_not_aliased() {
        let mut container = StateContainer::new();
        container.merge(state! { "count" => 1 });

        let mut snap = container.snapshot();
        snap.insert("count".into(), json!(99));
        assert_eq!(container.current().get("count"), Some(&json!(1)));

        let mut change = container.merge(state! { "count" => 2 });
        change.old.insert("count".into(), json!(-1));
        change.new.clear();
        assert_eq!(container.current().get("count"), Some(&json!(2)));
    }

    #[test]
    fn empty_merge_still_counts() {
        let mut container = StateContainer::new();
        let change = container.merge(State::new());
        assert_eq!(change.old, change.new);
        assert_eq!(container.revision(), 1);
    }

    #[test]
    fn typed_accessors_are_total() {
        let s = state! {
            "flag" => true,
            "name" => "Falcon",
            "battery" => 3,
            "score" => 8.5,
            "nothing" => Option::<String>::None,
        };
        assert_eq!(s.get_bool("flag"), Some(true));
        assert_eq!(s.get_bool("name"), None);
        assert_eq!(s.get_str("name"), Some("Falcon"));
        assert_eq!(s.get_i64("battery"), Some(3));
        assert_eq!(s.get_f64("battery"), Some(3.0));
        assert_eq!(s.get_f64("score"), Some(8.5));
        assert_eq!(s.get_as::<String>("nothing"), None);
        assert_eq!(s.get_as::<u32>("missing"), None);
    }

    #[test]
    fn truthiness() {
        let s = state! {
            "t" => true,
            "f" => false,
            "empty" => "",
            "text" => "hi",
            "zero" => 0,
            "list" => Vec::<u8>::new(),
        };
        assert!(s.is_truthy("t"));
        assert!(!s.is_truthy("f"));
        assert!(!s.is_truthy("empty"));
        assert!(s.is_truthy("text"));
        assert!(!s.is_truthy("zero"));
        assert!(s.is_truthy("list"));
        assert!(!s.is_truthy("missing"));
    }
}
