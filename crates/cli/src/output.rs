// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting shared by every subcommand: plain text or
//! pretty-printed JSON, chosen by the global `-o/--output` flag.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON, regardless of format — used by
/// subcommands whose only sensible text rendering *is* JSON.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` as JSON when `format` is `Json`; otherwise run `text`
/// to render the human-readable form.
pub fn print(format: OutputFormat, value: &impl Serialize, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Text => {
            text();
            Ok(())
        }
    }
}
