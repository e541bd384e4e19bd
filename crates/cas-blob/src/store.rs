use std::sync::Arc;

use bytes::Bytes;
use cas_crypto::ContentAddresser;
use cas_refs::{MetadataStore, ReferenceTracker};
use cas_store::{ObjectStoreClient, StoreError, TimeoutObjectStore};
use cas_types::{Address, RecordId};
use tracing::{debug, error, info, warn};

use crate::config::{BlobStoreConfig, DeletePolicy};
use crate::error::{BlobError, BlobResult};
use crate::locks::AddressLocks;
use crate::queue::{DeleteQueue, PendingDelete};

/// What `release` did with an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Other records still reference the address; nothing was deleted.
    Retained { references: u64 },
    /// No references remained and the object was deleted.
    Deleted,
    /// No references remained; the delete waits for a garbage-collection
    /// sweep.
    Deferred,
    /// The delete failed and was queued for retry by the next sweep.
    Queued,
}

/// Result of one garbage-collection sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Objects physically deleted.
    pub deleted: usize,
    /// Queued addresses found referenced again and dropped from the queue.
    pub retained: usize,
    /// Addresses whose count or delete failed; they stay queued.
    pub failed: usize,
    /// Entries left in the queue after the sweep.
    pub pending: usize,
}

/// Deduplicating blob store over a remote object store.
///
/// Payloads are written once per distinct content, keyed by their address.
/// Records (owned by the metadata store) point at addresses; an object is
/// only deleted once no record points at it.
///
/// # Deletion safety
///
/// The object store cannot count references, so the count comes from the
/// metadata store at the moment of the decision. Within one process, the
/// store-and-commit path ([`attach`](Self::attach)) and the count-then-delete
/// path ([`release`](Self::release), [`gc_sweep`](Self::gc_sweep)) for an
/// address run under the same address lock, so a delete cannot slip between
/// a deduplicated write and the metadata update that references it.
///
/// Writers in other processes are not covered by that lock. Two measures
/// narrow the cross-process window:
/// - `attach` re-checks the object after committing the record and re-uploads
///   it if a concurrent delete removed it;
/// - [`DeletePolicy::Deferred`] delays deletes by a grace period and recounts
///   before deleting.
///
/// A delete issued by another process after its count but landing after our
/// re-check can still remove a just-referenced object. Deployments with
/// several writer processes should use the deferred policy with a grace
/// period longer than their slowest attach.
pub struct BlobStore<C, M> {
    config: BlobStoreConfig,
    addresser: ContentAddresser,
    client: TimeoutObjectStore<Arc<C>>,
    metadata: Arc<M>,
    tracker: ReferenceTracker<M>,
    locks: AddressLocks,
    queue: DeleteQueue,
}

impl<C, M> BlobStore<C, M>
where
    C: ObjectStoreClient,
    M: MetadataStore,
{
    /// Create a blob store over an object store client and a metadata store.
    pub fn new(config: BlobStoreConfig, client: Arc<C>, metadata: Arc<M>) -> BlobResult<Self> {
        config.validate()?;
        let addresser = config.addresser()?;
        info!(
            algorithm = %addresser.algorithm(),
            shard_width = addresser.shard_width(),
            delete_policy = ?config.delete_policy,
            "blob store ready"
        );
        Ok(Self {
            client: TimeoutObjectStore::new(client, config.op_timeout()),
            tracker: ReferenceTracker::new(Arc::clone(&metadata)),
            metadata,
            addresser,
            config,
            locks: AddressLocks::new(),
            queue: DeleteQueue::new(),
        })
    }

    pub fn config(&self) -> &BlobStoreConfig {
        &self.config
    }

    pub fn addresser(&self) -> &ContentAddresser {
        &self.addresser
    }

    /// The reference tracker consulted before deletes.
    pub fn tracker(&self) -> &ReferenceTracker<M> {
        &self.tracker
    }

    /// Address a payload would be stored under. No I/O.
    pub fn address(&self, payload: &[u8]) -> Address {
        self.addresser.address(payload)
    }

    // ---- Object operations ----

    /// Store a payload and return its address.
    ///
    /// Writes only if no object exists at the address yet. Returns only after
    /// the write is confirmed; transport errors and timeouts propagate.
    pub async fn store(&self, payload: Bytes) -> BlobResult<Address> {
        let address = self.address(&payload);
        let _guard = self.locks.lock(&address).await;
        self.store_unlocked(&address, payload).await?;
        Ok(address)
    }

    async fn store_unlocked(&self, address: &Address, payload: Bytes) -> BlobResult<()> {
        if self.client.exists(address).await? {
            debug!(address = %address, "object already present; skipping write");
            return Ok(());
        }
        let len = payload.len();
        self.client.put(address, payload).await?;
        debug!(address = %address, bytes = len, "object stored");
        Ok(())
    }

    /// Fetch the payload stored at `address`.
    ///
    /// A missing object means some record holds a dangling address, which is
    /// reported as an integrity error rather than "not found".
    pub async fn retrieve(&self, address: &Address) -> BlobResult<Bytes> {
        let data = match self.client.get(address).await {
            Ok(data) => data,
            Err(StoreError::NotFound { .. }) => {
                error!(address = %address, "referenced object is missing from the store");
                return Err(BlobError::Integrity {
                    address: address.clone(),
                    reason: "referenced object is missing".into(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        if self.config.verify_reads && !self.addresser.verify(&data, address) {
            error!(address = %address, bytes = data.len(), "stored object does not match its address");
            return Err(BlobError::Integrity {
                address: address.clone(),
                reason: "content hash mismatch".into(),
            });
        }
        Ok(data)
    }

    /// Whether an object exists at `address`.
    pub async fn exists(&self, address: &Address) -> BlobResult<bool> {
        Ok(self.client.exists(address).await?)
    }

    /// Give up `record`'s claim on `address`.
    ///
    /// Call after the record stopped referencing `address` (deleted, or
    /// pointed at new content). The object is deleted only if no record
    /// references it anymore, and only as the delete policy allows. If the
    /// count cannot be obtained nothing is deleted, the address is queued for
    /// the next sweep, and the error is returned.
    pub async fn release(&self, address: &Address, record: &RecordId) -> BlobResult<ReleaseOutcome> {
        let _guard = self.locks.lock(address).await;
        self.release_unlocked(address, record).await
    }

    async fn release_unlocked(
        &self,
        address: &Address,
        record: &RecordId,
    ) -> BlobResult<ReleaseOutcome> {
        let references = match self.tracker.count_references(address).await {
            Ok(n) => n,
            Err(e) => {
                warn!(address = %address, record = %record, error = %e, "reference count failed; queueing delete");
                self.queue.retry(address, e.to_string());
                return Err(e.into());
            }
        };
        if references > 0 {
            debug!(address = %address, record = %record, references, "object still referenced");
            return Ok(ReleaseOutcome::Retained { references });
        }

        match self.config.delete_policy {
            DeletePolicy::Deferred { .. } => {
                self.queue.defer(address);
                debug!(address = %address, record = %record, "delete deferred to sweep");
                Ok(ReleaseOutcome::Deferred)
            }
            DeletePolicy::Immediate => match self.client.delete(address).await {
                Ok(()) => {
                    self.queue.remove(address);
                    debug!(address = %address, record = %record, "object deleted");
                    Ok(ReleaseOutcome::Deleted)
                }
                Err(e) if e.is_retryable() => {
                    warn!(address = %address, error = %e, "delete failed; queued for retry");
                    self.queue.retry(address, e.to_string());
                    Ok(ReleaseOutcome::Queued)
                }
                Err(e) => {
                    self.queue.retry(address, e.to_string());
                    Err(e.into())
                }
            },
        }
    }

    // ---- Record operations ----

    /// Store `payload` and make it `record`'s current content.
    ///
    /// Fails only if the record was not moved to the new address. Once the
    /// record is committed, trouble re-checking the object or releasing the
    /// previous address is logged and the address is returned; a failed
    /// release stays queued for [`gc_sweep`](Self::gc_sweep).
    pub async fn attach(&self, record: &RecordId, payload: Bytes) -> BlobResult<Address> {
        let previous = self.metadata.get_current_address(record).await?;
        let address = self.address(&payload);
        {
            let _guard = self.locks.lock(&address).await;
            self.store_unlocked(&address, payload.clone()).await?;
            self.metadata
                .set_current_address(record, address.clone())
                .await?;
            self.repair_after_commit(&address, record, payload).await;
        }
        debug!(address = %address, record = %record, "record attached");

        if let Some(old) = previous.filter(|old| *old != address) {
            if let Err(e) = self.release(&old, record).await {
                warn!(address = %old, record = %record, error = %e, "release of previous address failed; left queued for sweep");
            }
        }
        Ok(address)
    }

    /// Re-upload `address` if a delete from another process landed between
    /// our existence check and the commit.
    async fn repair_after_commit(&self, address: &Address, record: &RecordId, payload: Bytes) {
        match self.client.exists(address).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(address = %address, record = %record, "object vanished during attach; re-uploading");
                if let Err(e) = self.client.put(address, payload).await {
                    error!(address = %address, record = %record, error = %e, "re-upload failed; record references a missing object");
                }
            }
            Err(e) => {
                warn!(address = %address, record = %record, error = %e, "post-commit existence check failed");
            }
        }
    }

    /// Remove `record`'s content and release its address.
    ///
    /// Returns `None` if the record held no address.
    pub async fn detach(&self, record: &RecordId) -> BlobResult<Option<ReleaseOutcome>> {
        let Some(address) = self.metadata.clear_current_address(record).await? else {
            return Ok(None);
        };
        debug!(address = %address, record = %record, "record detached");
        self.release(&address, record).await.map(Some)
    }

    /// Fetch `record`'s current content.
    pub async fn read(&self, record: &RecordId) -> BlobResult<Bytes> {
        let address = self
            .metadata
            .get_current_address(record)
            .await?
            .ok_or(BlobError::MissingAddress(*record))?;
        self.retrieve(&address).await
    }

    // ---- Garbage collection ----

    /// Process the delete queue.
    ///
    /// Every due entry is recounted under its address lock. Unreferenced
    /// objects are deleted; referenced ones leave the queue; failures stay
    /// queued for the next sweep.
    pub async fn gc_sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        for address in self.queue.due(self.config.delete_policy.grace()) {
            let _guard = self.locks.lock(&address).await;
            match self.tracker.count_references(&address).await {
                Ok(0) => match self.client.delete(&address).await {
                    Ok(()) => {
                        self.queue.remove(&address);
                        report.deleted += 1;
                    }
                    Err(e) => {
                        warn!(address = %address, error = %e, "sweep delete failed");
                        self.queue.retry(&address, e.to_string());
                        report.failed += 1;
                    }
                },
                Ok(references) => {
                    debug!(address = %address, references, "queued object referenced again");
                    self.queue.remove(&address);
                    report.retained += 1;
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "sweep reference count failed");
                    self.queue.retry(&address, e.to_string());
                    report.failed += 1;
                }
            }
        }
        report.pending = self.queue.len();
        if report.deleted + report.retained + report.failed > 0 {
            info!(
                deleted = report.deleted,
                retained = report.retained,
                failed = report.failed,
                pending = report.pending,
                "gc sweep finished"
            );
        }
        report
    }

    /// Number of addresses waiting for deletion.
    pub fn pending_deletes(&self) -> usize {
        self.queue.len()
    }

    /// The queued deletes, sorted by address.
    pub fn pending(&self) -> Vec<PendingDelete> {
        self.queue.snapshot()
    }
}

impl<C, M> std::fmt::Debug for BlobStore<C, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("config", &self.config)
            .field("pending_deletes", &self.queue.len())
            .finish()
    }
}
