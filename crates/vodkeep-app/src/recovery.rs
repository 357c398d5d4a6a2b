//! Startup recovery (spec §4.5): jobs stuck `downloading` when the
//! process last exited are not resumable — there is no live worker, no
//! cancel signal, and no guarantee the extractor process is even still
//! running. Reconcile them to `failed` before the scheduler starts.

use vodkeep_store::JobStore;

/// Run recovery once, logging how many rows were reconciled.
///
/// # Errors
///
/// Returns the store's error if the reconciling update itself fails.
pub(crate) async fn recover_interrupted(store: &JobStore) -> Result<u64, vodkeep_store::StoreError> {
    let count = store.recover_interrupted().await?;
    if count > 0 {
        tracing::warn!(count, "recovered jobs interrupted by restart");
    } else {
        tracing::info!("no interrupted jobs to recover");
    }
    Ok(count)
}
