// SPDX-License-Identifier: MIT
//
// n-snip: replay an edit script against a snippet region tree.
//
// A session file describes a document, the regions a snippet expansion left
// on it, and a list of primitive edits. Each edit flows through the same path
// an editor would use:
//
//   edit → buffer.apply → tree.dispatch_edit → (rejected? undo in buffer)
//   end of script → tree.update (mirrors) → print tree / document
//
// Routing decisions are logged at debug level under `n_snippet::dispatch`;
// use --verbose or RUST_LOG to see them.

mod cli;
mod session;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use n_snippet::{ObjectId, TextObjects};

use crate::cli::CliArgs;
use crate::session::{Replay, Session};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// One line describing where a tab jump from `from` lands.
fn describe_jump(
    replay: &Replay,
    label: &str,
    from: usize,
    hit: Option<(usize, ObjectId)>,
) -> String {
    match hit {
        Some((number, id)) => format!(
            "{label} from ${from}: ${number} {}",
            replay.tree.describe(id, &replay.buffer)
        ),
        None => format!("{label} from ${from}: none"),
    }
}

fn report(args: &CliArgs, replay: &Replay) -> Result<String> {
    let tree: &TextObjects = &replay.tree;
    let mut out = String::new();

    if args.output.shows_tree() {
        out.push_str(&tree.hierarchy(&replay.buffer));
    }
    if args.output.shows_document() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&replay.buffer.contents());
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
    if let Some(from) = args.next_tab {
        let hit = tree.next_tab(ObjectId::ROOT, from).context("next tab")?;
        out.push_str(&describe_jump(replay, "next", from, hit));
        out.push('\n');
    }
    if let Some(from) = args.prev_tab {
        let hit = tree.prev_tab(ObjectId::ROOT, from).context("previous tab")?;
        out.push_str(&describe_jump(replay, "prev", from, hit));
        out.push('\n');
    }
    if replay.rejected > 0 {
        out.push_str(&format!("{} edit(s) rejected\n", replay.rejected));
    }
    Ok(out)
}

fn run(args: &CliArgs) -> Result<()> {
    let session = Session::load(&args.session)?;
    let replay = session.replay()?;
    tracing::debug!(
        objects = replay.tree.len(),
        rejected = replay.rejected,
        "replayed {} edit(s)",
        session.edits.len()
    );
    print!("{}", report(args, &replay)?);
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("n-snip: {err:#}");
            ExitCode::FAILURE
        }
    }
}
