//! Seeds command - write a synthetic seed file

use crate::cli::args::SeedsArgs;
use crate::error::{HitrateError, HitrateResult};
use crate::seeds::{FileSeedSource, SyntheticSeedSource};
use crate::ui::{self, UiContext};

/// Execute the seeds command
pub async fn execute(args: SeedsArgs) -> HitrateResult<()> {
    let ctx = UiContext::detect();

    if args.count == 0 {
        return Err(HitrateError::User(
            "--count must be at least 1".to_string(),
        ));
    }

    let seeds = SyntheticSeedSource::new(args.count, args.rng_seed).generate();
    FileSeedSource::write(&args.out, &seeds).await?;

    ui::step_ok_detail(
        &ctx,
        &format!("Wrote {} seeds", seeds.len()),
        &args.out.display().to_string(),
    );
    Ok(())
}
