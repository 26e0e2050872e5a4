//! Process-wide record of which targets are held, and under which sharing mode.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::config::SharingMode;
use crate::error::DriverError;

#[derive(Debug)]
struct Entry {
    id: u64,
    path: String,
    address: u8,
    mode: SharingMode,
}

static CLAIMS: Mutex<Vec<Entry>> = Mutex::new(Vec::new());
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn claims() -> MutexGuard<'static, Vec<Entry>> {
    // Entries are only pushed or removed whole, so a poisoned list is still valid.
    CLAIMS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A held target, released when dropped.
#[derive(Debug)]
pub(crate) struct Claim {
    id: u64,
}

impl Claim {
    /// Hold `address` on the bridge at `path`.
    ///
    /// An exclusive claim conflicts with any other claim on the same target; a
    /// shared claim conflicts only with an exclusive one.
    pub(crate) fn acquire(path: &str, address: u8, mode: SharingMode) -> Result<Self, DriverError> {
        let mut claims = claims();
        let conflict = claims
            .iter()
            .filter(|c| c.path == path && c.address == address)
            .any(|c| mode == SharingMode::Exclusive || c.mode == SharingMode::Exclusive);
        if conflict {
            return Err(DriverError::BusInUse(address.into()));
        }
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        trace!("claim {id}: {path} address {address:#04X} {mode:?}");
        claims.push(Entry {
            id,
            path: path.to_owned(),
            address,
            mode,
        });
        Ok(Self { id })
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        trace!("claim {} released", self.id);
        claims().retain(|c| c.id != self.id);
    }
}
