// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default provider argv templates and argv-augmentation rules.

use agentcheck_core::Provider;

/// The default command line for a provider, before model/agent-toggle
/// augmentation. Overridable per-process via `AWE_<PROVIDER>_COMMAND`.
pub fn default_argv(provider: Provider) -> Vec<String> {
    match provider {
        Provider::Claude => split(
            "claude -p --dangerously-skip-permissions --effort low",
        ),
        Provider::Codex => split(
            "codex exec --skip-git-repo-check --dangerously-bypass-approvals-and-sandbox -c model_reasoning_effort=low",
        ),
        Provider::Gemini => split("gemini -p --yolo"),
    }
}

/// The flag token used to pass a model name, per provider.
pub fn model_flag(provider: Provider) -> &'static str {
    match provider {
        Provider::Claude => "--model",
        Provider::Codex | Provider::Gemini => "-m",
    }
}

fn split(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

fn has_flag(argv: &[String], flag: &str) -> bool {
    argv.iter()
        .any(|tok| tok == flag || tok.starts_with(&format!("{flag}=")))
}

/// Build the full argv for a participant invocation: base command,
/// model flag (if not already present), free-form model params, and the
/// team/multi-agent toggle flag.
pub struct ArgvBuilder {
    pub provider: Provider,
    pub model: Option<String>,
    pub model_params: Vec<String>,
    pub claude_team_agents: bool,
    pub codex_multi_agents: bool,
}

impl ArgvBuilder {
    pub fn build(&self, base: Vec<String>) -> Vec<String> {
        let mut argv = base;

        if let Some(model) = &self.model {
            let flag = model_flag(self.provider);
            if !has_flag(&argv, flag) {
                argv.push(flag.to_string());
                argv.push(model.clone());
            }
        }

        argv.extend(self.model_params.iter().cloned());

        match self.provider {
            Provider::Claude if self.claude_team_agents && !has_flag(&argv, "--agents") => {
                argv.push("--agents".to_string());
                argv.push("{}".to_string());
            }
            Provider::Codex if self.codex_multi_agents && !has_flag(&argv, "--multi-agent") => {
                argv.push("--multi-agent".to_string());
            }
            _ => {}
        }

        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_argv_matches_provider_table() {
        assert_eq!(default_argv(Provider::Gemini), vec!["gemini", "-p", "--yolo"]);
    }

    #[test]
    fn model_flag_differs_by_provider() {
        assert_eq!(model_flag(Provider::Claude), "--model");
        assert_eq!(model_flag(Provider::Codex), "-m");
    }

    #[test]
    fn model_flag_not_duplicated_when_already_present() {
        let builder = ArgvBuilder {
            provider: Provider::Claude,
            model: Some("opus".to_string()),
            model_params: vec![],
            claude_team_agents: false,
            codex_multi_agents: false,
        };
        let argv = builder.build(vec!["claude".into(), "--model".into(), "sonnet".into()]);
        assert_eq!(argv.iter().filter(|t| *t == "--model").count(), 1);
    }

    #[test]
    fn claude_team_agents_appends_empty_json_flag() {
        let builder = ArgvBuilder {
            provider: Provider::Claude,
            model: None,
            model_params: vec![],
            claude_team_agents: true,
            codex_multi_agents: false,
        };
        let argv = builder.build(vec!["claude".into()]);
        assert_eq!(argv, vec!["claude", "--agents", "{}"]);
    }

    #[test]
    fn codex_multi_agents_appends_flag_once() {
        let builder = ArgvBuilder {
            provider: Provider::Codex,
            model: None,
            model_params: vec![],
            claude_team_agents: false,
            codex_multi_agents: true,
        };
        let argv = builder.build(vec!["codex".into(), "--multi-agent".into()]);
        assert_eq!(argv.iter().filter(|t| *t == "--multi-agent").count(), 1);
    }
}
