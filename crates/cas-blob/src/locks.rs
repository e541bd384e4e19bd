//! Per-address mutual exclusion within one process.

use cas_types::Address;
use tokio::sync::{Mutex, MutexGuard};

const STRIPES: usize = 64;

/// Striped async locks keyed by address.
///
/// Serializes the store/commit path against the count-then-delete path for
/// the same address. Distinct addresses may share a stripe; callers must not
/// hold one address lock while taking another.
#[derive(Debug)]
pub(crate) struct AddressLocks {
    stripes: Vec<Mutex<()>>,
}

impl AddressLocks {
    pub(crate) fn new() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub(crate) async fn lock(&self, address: &Address) -> MutexGuard<'_, ()> {
        self.stripes[stripe_of(address)].lock().await
    }
}

fn stripe_of(address: &Address) -> usize {
    let digest = address.digest();
    let head = &digest[..digest.len().min(8)];
    u64::from_str_radix(head, 16).unwrap_or(0) as usize % STRIPES
}
