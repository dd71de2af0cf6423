// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The risk policy contract: a tier-keyed list of required check names,
//! loadable from the project tree or falling back to a built-in default.

use crate::profile::RiskTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const CANDIDATE_PATHS: &[&str] = &[
    "ops/risk_policy_contract.json",
    ".agents/risk_policy_contract.json",
];

/// A tier-keyed checklist of required check names, plus a version and
/// source tag for traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPolicyContract {
    pub version: String,
    pub source: String,
    pub checks_by_tier: BTreeMap<String, Vec<String>>,
}

impl RiskPolicyContract {
    pub fn required_checks(&self, tier: RiskTier) -> Vec<String> {
        self.checks_by_tier
            .get(&tier.to_string())
            .cloned()
            .unwrap_or_default()
    }
}

/// The built-in contract: `high` requires `risk-policy-gate,
/// harness-smoke, head-sha-gate, evidence-manifest`; `low` requires
/// `risk-policy-gate, head-sha-gate`.
pub fn default_contract() -> RiskPolicyContract {
    let mut checks_by_tier = BTreeMap::new();
    checks_by_tier.insert(
        "high".to_string(),
        vec![
            "risk-policy-gate".to_string(),
            "harness-smoke".to_string(),
            "head-sha-gate".to_string(),
            "evidence-manifest".to_string(),
        ],
    );
    checks_by_tier.insert(
        "low".to_string(),
        vec!["risk-policy-gate".to_string(), "head-sha-gate".to_string()],
    );
    RiskPolicyContract {
        version: "builtin-1".to_string(),
        source: "builtin".to_string(),
        checks_by_tier,
    }
}

/// Load a project-level contract override from the first existing,
/// parseable candidate file; falls back to the built-in default
/// otherwise.
pub fn load_contract(project_root: &Path) -> RiskPolicyContract {
    for candidate in CANDIDATE_PATHS {
        let path = project_root.join(candidate);
        if !path.is_file() {
            continue;
        }
        let Ok(data) = std::fs::read_to_string(&path) else {
            continue;
        };
        if let Ok(mut contract) = serde_json::from_str::<RiskPolicyContract>(&data) {
            contract.source = path.display().to_string();
            return contract;
        }
    }
    default_contract()
}
