// SPDX-License-Identifier: MIT
//
// Command-line arguments for n-snip.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Replay an edit script against a snippet region tree
#[derive(Parser, Debug)]
#[command(name = "n-snip", version, about = "Replay an edit script against a snippet region tree")]
pub struct CliArgs {
    /// Session file (YAML): document, region tree and edits
    #[arg(value_name = "SESSION")]
    pub session: PathBuf,

    /// What to print once the edits have been replayed
    #[arg(short, long, value_enum, default_value_t = Output::Both)]
    pub output: Output,

    /// Report the tabstop that `<Tab>` from tabstop N would jump to
    #[arg(long, value_name = "N")]
    pub next_tab: Option<usize>,

    /// Report the tabstop that `<S-Tab>` from tabstop N would jump to
    #[arg(long, value_name = "N")]
    pub prev_tab: Option<usize>,

    /// Log edit routing (same as RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// The region hierarchy
    Tree,
    /// The document text
    Document,
    /// Both, tree first
    Both,
}

impl Output {
    pub const fn shows_tree(self) -> bool {
        matches!(self, Self::Tree | Self::Both)
    }

    pub const fn shows_document(self) -> bool {
        matches!(self, Self::Document | Self::Both)
    }
}
