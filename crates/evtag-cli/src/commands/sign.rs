use std::fs;
use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use evtag_core::{DigestFormat, DigestResult, Verifier};
use evtag_utils::ToolCommand;
use tracing::info;

use super::{digest, open_store};
use crate::editor::Editor;
use crate::worktree;

/// Comment lines with this prefix survive editing and end up in the tag.
const STATS_COMMENT: &str = "# git-evtag comment:";

#[derive(Args)]
pub struct SignArgs {
    /// Print the digest lines instead of creating a tag
    #[arg(long)]
    print_only: bool,

    /// Sign with this key instead of the default one
    #[arg(short = 'u', long, value_name = "KEYID")]
    local_user: Option<String>,

    /// Also record the SHA-256 checksum of `git archive --format=tar`
    #[arg(long)]
    with_legacy_archive_tag: bool,

    /// Name of the tag to create
    tagname: String,
}

pub fn run(args: &SignArgs) -> Result<i32> {
    let store = open_store()?;
    let work_tree = store
        .work_tree()
        .context("cannot sign from a bare repository")?
        .to_path_buf();
    worktree::ensure_clean(&work_tree)?;

    let head = store.head()?;
    let (v0, stats) = digest(&store, &head, DigestFormat::V0)?;
    let mut expected = vec![v0];
    if args.with_legacy_archive_tag {
        expected.push(digest(&store, &head, DigestFormat::LegacyArchive)?.0);
    }

    let mut lines: Vec<String> = stats.iter().map(|s| s.comment_line()).collect();
    lines.extend(expected.iter().map(DigestResult::line));

    if args.print_only {
        for line in &lines {
            println!("{line}");
        }
        return Ok(0);
    }

    let mut file = tempfile::Builder::new()
        .prefix("EVTAG_TAGMSG")
        .tempfile_in(store.git_dir())
        .context("cannot create the tag message file")?;
    file.write_all(template(&args.tagname, &lines).as_bytes())?;
    file.flush()?;

    Editor::from_git(store.git_dir())?.edit(file.path())?;

    let edited = fs::read_to_string(file.path()).context("cannot read the edited tag message")?;
    let message = strip_comments(&edited);
    let verifier = Verifier::new(&message);
    for result in &expected {
        if verifier.verify(result).is_err() {
            bail!(
                "the '{}' line was removed or changed; not creating tag '{}'",
                result.format.prefix(),
                args.tagname
            );
        }
    }
    fs::write(file.path(), &message)?;

    let mut tag = ToolCommand::git(store.git_dir()).args(["tag", "-a", "-s"]);
    if let Some(key) = &args.local_user {
        tag = tag.arg("-u").arg(key);
    }
    let output = tag
        .args(["--cleanup=verbatim", "-F"])
        .arg(file.path())
        .arg(&args.tagname)
        .interactive()
        .run()?;
    if !output.success() {
        bail!("git tag exited with {}", output.status);
    }

    info!(tag = %args.tagname, digest = %expected[0].hex, "signed tag created");
    Ok(0)
}

/// Editor contents: room for the message, then the lines to keep.
fn template(tagname: &str, lines: &[String]) -> String {
    let mut text = String::from("\n\n");
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("#\n");
    text.push_str(&format!("# Write a message for tag {tagname} above.\n"));
    text.push_str("# Lines starting with '#' are removed, except the git-evtag comment.\n");
    text.push_str("# The digest lines must stay as they are.\n");
    text
}

/// Drop `#` lines other than the stats comment, and blank lines at either end.
fn strip_comments(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| !line.starts_with('#') || line.starts_with(STATS_COMMENT))
        .collect();
    let start = kept.iter().position(|l| !l.trim().is_empty());
    let end = kept.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => {
            let mut message = kept[start..=end].join("\n");
            message.push('\n');
            message
        }
        _ => String::new(),
    }
}
