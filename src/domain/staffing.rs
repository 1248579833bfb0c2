//! Staffing envelopes: per (rotation code, week) min/max headcount.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub min: u32,
    pub max: u32,
}

/// Sourced from a fixed workbook region (`Base Schedule` rows 101–151);
/// treated as external configuration by the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffingEnvelope {
    entries: HashMap<(String, u32), Envelope>,
}

impl StaffingEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, code: impl Into<String>, week: u32, min: u32, max: u32) {
        self.entries.insert((code.into(), week), Envelope { min, max });
    }

    pub fn get(&self, code: &str, week: u32) -> Option<Envelope> {
        self.entries.get(&(code.to_string(), week)).copied()
    }

    /// Whether `count` satisfies the envelope for (code, week). Codes with
    /// no configured envelope are treated as unconstrained.
    pub fn satisfies(&self, code: &str, week: u32, count: u32) -> bool {
        match self.get(code, week) {
            Some(env) => count >= env.min && count <= env.max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_code_week_is_unconstrained() {
        let env = StaffingEnvelope::new();
        assert!(env.satisfies("Mnuc", 3, 0));
        assert!(env.satisfies("Mnuc", 3, 99));
    }

    #[test]
    fn configured_envelope_is_enforced() {
        let mut env = StaffingEnvelope::new();
        env.set("Mnuc", 3, 2, 4);
        assert!(!env.satisfies("Mnuc", 3, 1));
        assert!(env.satisfies("Mnuc", 3, 2));
        assert!(env.satisfies("Mnuc", 3, 4));
        assert!(!env.satisfies("Mnuc", 3, 5));
    }
}
