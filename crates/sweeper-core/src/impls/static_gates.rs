//! StaticFeatureGates - 設定から作る固定値の機能フラグ

use std::collections::HashMap;

use crate::ports::FeatureGates;

#[derive(Debug, Clone, Default)]
pub struct StaticFeatureGates {
    flags: HashMap<String, bool>,
}

impl StaticFeatureGates {
    pub fn new(flags: HashMap<String, bool>) -> Self {
        Self { flags }
    }

    pub fn with(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.flags.insert(name.into(), enabled);
        self
    }
}

impl FeatureGates for StaticFeatureGates {
    fn is_enabled(&self, name: &str) -> bool {
        // 未定義は無効
        self.flags.get(name).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_flags_are_disabled() {
        let gates = StaticFeatureGates::default().with("on", true).with("off", false);
        assert!(gates.is_enabled("on"));
        assert!(!gates.is_enabled("off"));
        assert!(!gates.is_enabled("never-configured"));
    }
}
