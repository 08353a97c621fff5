use anyhow::{bail, Context, Result};
use bstr::ByteSlice;
use clap::Args;
use evtag_core::Verifier;
use evtag_object::ObjectKind;
use tracing::info;

use super::{digest, open_store, verification_exit};
use crate::gpg::GpgVerifier;

#[derive(Args)]
pub struct VerifyArgs {
    /// Skip the GPG signature check
    #[arg(short = 'n', long)]
    no_signature: bool,

    /// Print gpg's report even when the signature is good
    #[arg(short, long)]
    verbose: bool,

    /// Tag to verify; it must point at the checked out HEAD
    tagname: String,
}

pub fn run(args: &VerifyArgs) -> Result<i32> {
    let store = open_store()?;
    let tag = store
        .read_tag(&args.tagname)
        .with_context(|| format!("'{}' is not an annotated tag", args.tagname))?;

    if !args.no_signature {
        let Some(signature) = &tag.object.signature else {
            eprintln!("error: no signature found in tag '{}'", args.tagname);
            return Ok(1);
        };
        let payload = tag.object.signed_payload(&tag.raw.data);
        let outcome = GpgVerifier::from_git_config(store.git_dir())?.verify(payload, signature)?;
        if args.verbose || !outcome.valid {
            eprintln!("{}", outcome.summary);
        }
        if !outcome.valid {
            eprintln!("error: tag '{}' has a bad signature", args.tagname);
            return Ok(1);
        }
        info!(tag = %args.tagname, key = ?outcome.key_id, "signature verified");
    }

    if tag.object.target_kind != ObjectKind::Commit {
        bail!(
            "tag '{}' points at a {}, not a commit",
            args.tagname,
            tag.object.target_kind
        );
    }
    let head = store.head()?;
    if tag.object.target != head {
        bail!(
            "tag '{}' targets {} but HEAD is {}; check out the tag first",
            args.tagname,
            tag.object.target,
            head
        );
    }

    let message = tag.object.message.to_str_lossy();
    let verifier = Verifier::new(&message);
    let formats = verifier.detect();
    if formats.is_empty() {
        eprintln!("error: no git-evtag digest in tag '{}'", args.tagname);
        return Ok(1);
    }

    for format in formats {
        let (actual, _) = digest(&store, &head, format)?;
        match verifier.verify(&actual) {
            Ok(found) => println!("Successfully verified: {}", found.line),
            Err(e) => return verification_exit(e),
        }
    }
    Ok(0)
}
