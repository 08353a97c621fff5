use anyhow::Result;
use clap::Args;
use evtag_core::{DigestFormat, Verifier};

use super::{digest, open_store, verification_exit};

#[derive(Args)]
pub struct ComputeArgs {
    /// Digest rule: v0, contents or legacy-archive
    #[arg(long, default_value = "v0")]
    format: DigestFormat,

    /// Also print the object and byte counts
    #[arg(short, long)]
    verbose: bool,

    /// Check the digest against this text instead of printing it
    #[arg(long, value_name = "LINE")]
    verify_line: Option<String>,

    /// Commit to digest (tags are peeled)
    #[arg(default_value = "HEAD")]
    rev: String,
}

pub fn run(args: &ComputeArgs) -> Result<i32> {
    let store = open_store()?;
    // Peel tags only; a tree or blob is reported as not a commit.
    let commit = store.resolve(&format!("{}^{{}}", args.rev))?;
    let (result, stats) = digest(&store, &commit, args.format)?;

    if let Some(text) = &args.verify_line {
        return match Verifier::new(text).verify(&result) {
            Ok(found) => {
                println!("Successfully verified: {}", found.line);
                Ok(0)
            }
            Err(e) => verification_exit(e),
        };
    }

    if args.verbose {
        if let Some(stats) = &stats {
            println!("{}", stats.comment_line());
        }
    }
    println!("{}", result.line());
    Ok(0)
}
