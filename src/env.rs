// src/env.rs

//! Snapshot of the ambient environment.
//!
//! The snapshot is captured once and handed explicitly to the validator and
//! every launch. Nothing in the crate reads or mutates the process
//! environment after that.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Entries whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    /// Names from `required` that are absent from the snapshot.
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.contains(name))
            .map(String::as_str)
            .collect()
    }

    /// Expand `$VAR` / `${VAR}` references against this snapshot.
    ///
    /// Unknown variables are left as written.
    pub fn substitute(&self, input: &str) -> String {
        shellexpand::env_with_context_no_errors(input, |name| self.vars.get(name)).into_owned()
    }
}

impl FromIterator<(String, String)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_expands_known_and_keeps_unknown() {
        let env = EnvSnapshot::empty()
            .with_var("SNAP_LIST", "a,b")
            .with_var("HOME", "/home/ci");

        assert_eq!(env.substitute("--snap-list=$SNAP_LIST"), "--snap-list=a,b");
        assert_eq!(env.substitute("${HOME}/.kube"), "/home/ci/.kube");
        assert_eq!(env.substitute("$NOPE"), "$NOPE");
        assert_eq!(env.substitute("plain"), "plain");
    }

    #[test]
    fn missing_lists_absent_names_in_order() {
        let env = EnvSnapshot::empty().with_var("A", "1");
        let required = vec!["B".to_string(), "A".to_string(), "C".to_string()];
        assert_eq!(env.missing(&required), vec!["B", "C"]);
    }
}
