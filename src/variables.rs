//! Variable Store
//!
//! Name-to-string mapping backing `assign`, argument passing, and the
//! `{name}` substitution pass of the dispatcher. Reserved names use a
//! `%` prefix:
//! - `%N` — count of stored positional arguments
//! - `%0`, `%1`, … — positional arguments (`%0` is the invoked keyword)
//! - `%?` — integer result of the last completed dispatch

use std::collections::HashMap;

use crate::errors::ShellError;

/// Reserved name holding the positional argument count.
pub const ARG_COUNT_NAME: &str = "%N";

/// Reserved name holding the result of the last completed dispatch.
pub const RESULT_NAME: &str = "%?";

const VAR_BEGIN: char = '{';
const VAR_END: char = '}';

/// The shell's variable environment. All values are stored as strings;
/// numeric results are stored in decimal form.
#[derive(Debug, Default)]
pub struct VariableStore {
    vars: HashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a value, replacing any previous one.
    pub fn assign(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.remove(name);
    }

    /// Replace every `{name}` span with the stored value of `name`,
    /// scanning left to right. The replacement is built into a fresh
    /// string, so substituted values are never rescanned and an unknown
    /// variable leaves the caller's line untouched.
    ///
    /// A `{` with no closing `}` ends the scan; the remainder is copied
    /// verbatim.
    pub fn substitute(&self, line: &str) -> Result<String, ShellError> {
        let mut out = String::with_capacity(line.len());
        let mut rest = line;

        loop {
            let Some(begin) = rest.find(VAR_BEGIN) else {
                out.push_str(rest);
                return Ok(out);
            };
            let Some(end) = rest[begin..].find(VAR_END).map(|i| begin + i) else {
                out.push_str(rest);
                return Ok(out);
            };

            let name = &rest[begin + 1..end];
            let value = self
                .get(name)
                .ok_or_else(|| ShellError::UnknownVariable(name.to_string()))?;

            out.push_str(&rest[..begin]);
            out.push_str(value);
            rest = &rest[end + 1..];
        }
    }

    /// Store positional arguments as `%0 … %argc-1` plus `%N`, removing
    /// any stale positionals left over from a longer previous call.
    pub fn store_args(&mut self, args: &[String]) {
        let previous = self
            .get(ARG_COUNT_NAME)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        for stale in args.len()..previous {
            self.vars.remove(&format!("%{stale}"));
        }

        self.assign(ARG_COUNT_NAME, &args.len().to_string());
        for (num, arg) in args.iter().enumerate() {
            self.assign(&format!("%{num}"), arg);
        }
    }

    /// Record the result of the last completed dispatch in `%?`.
    pub fn set_result(&mut self, result: i32) {
        self.assign(RESULT_NAME, &result.to_string());
    }

    pub fn result(&self) -> Option<i32> {
        self.get(RESULT_NAME).and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================
