//! Silicon revision of the uncore blocks.
//!
//! Pass2 parts implement a larger set of L2C TAD events. The revision is
//! read once during bring-up and fixed for the lifetime of the system.

use conquer_once::spin::OnceCell;

use crate::error::{UncoreError, UncoreResult};

static REVISION: OnceCell<Revision> = OnceCell::uninit();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Revision {
    #[default]
    Pass1,
    Pass2,
}

/// Fix the process-wide revision. Only the first call succeeds.
pub fn init_revision(revision: Revision) -> UncoreResult<()> {
    REVISION
        .try_init_once(|| revision)
        .map_err(|_| UncoreError::AlreadyInitialized)?;
    log::info!("uncore: hardware revision {:?}", revision);
    Ok(())
}

/// The configured revision, or [`Revision::Pass1`] before initialization.
#[must_use]
pub fn current() -> Revision {
    REVISION.get().copied().unwrap_or_default()
}
