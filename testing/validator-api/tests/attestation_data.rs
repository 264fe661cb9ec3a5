mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use alloy_primitives::B256;
    use anyhow::bail;
    use async_trait::async_trait;
    use ream_consensus_misc::{attestation_data::AttestationData, checkpoint::Checkpoint};
    use ream_operation_pool::{
        attestation_data_cache::AttestationDataCache, slot_keyed_store::CacheKey,
    };
    use ream_rpc_beacon::{
        attestation_data::{AttestationDataError, AttestationDataProvider, AttestationDataService},
        config::ValidatorApiConfig,
    };

    const CALLERS: usize = 32;

    /// Simulates a slow state transition so that callers pile up behind the first one.
    struct SlowProvider {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl AttestationDataProvider for SlowProvider {
        async fn compute_attestation_data(
            &self,
            slot: u64,
            committee_index: u64,
        ) -> anyhow::Result<AttestationData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                bail!("state transition failed");
            }
            Ok(AttestationData {
                slot,
                index: committee_index,
                beacon_block_root: B256::repeat_byte(slot as u8),
                source: Checkpoint::default(),
                target: Checkpoint {
                    epoch: slot / 32,
                    root: B256::repeat_byte(0x11),
                },
            })
        }
    }

    fn setup(
        fail: bool,
    ) -> (
        Arc<AttestationDataService>,
        Arc<SlowProvider>,
        Arc<AttestationDataCache>,
    ) {
        let provider = Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(200),
            fail,
        });
        let cache = Arc::new(AttestationDataCache::new());
        let service = AttestationDataService::new(
            cache.clone(),
            provider.clone(),
            &ValidatorApiConfig::default(),
        );
        (Arc::new(service), provider, cache)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_computation() -> anyhow::Result<()> {
        let (service, provider, cache) = setup(false);

        let handles = (0..CALLERS)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.get_attestation_data(100, 3).await })
            })
            .collect::<Vec<_>>();

        let mut results = Vec::with_capacity(CALLERS);
        for handle in handles {
            results.push(handle.await??);
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|data| *data == results[0]));
        assert_eq!(results[0].slot, 100);
        assert_eq!(results[0].index, 3);
        assert!(!cache.is_in_progress(CacheKey::new(100, 3)));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distinct_committees_compute_independently() -> anyhow::Result<()> {
        let (service, provider, _) = setup(false);

        let handles = (0..4)
            .map(|committee_index| {
                let service = service.clone();
                tokio::spawn(async move { service.get_attestation_data(7, committee_index).await })
            })
            .collect::<Vec<_>>();
        for (committee_index, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await??.index, committee_index as u64);
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failed_computation_fails_every_caller() -> anyhow::Result<()> {
        let (service, provider, cache) = setup(true);

        let handles = (0..CALLERS)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.get_attestation_data(200, 0).await })
            })
            .collect::<Vec<_>>();

        let mut compute_failures = 0;
        for handle in handles {
            match handle.await? {
                Err(AttestationDataError::Compute(_)) => compute_failures += 1,
                Err(AttestationDataError::ResolvedToNil) => {}
                other => bail!("unexpected result: {other:?}"),
            }
        }

        // Every computation that ran failed and released the key.
        assert!(compute_failures >= 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), compute_failures);
        assert!(!cache.is_in_progress(CacheKey::new(200, 0)));
        assert!(cache.get(CacheKey::new(200, 0)).is_none());
        Ok(())
    }
}
