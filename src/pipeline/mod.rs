//! Dashboard state: owns the published snapshot and the refresh lifecycle.
//!
//! ## Lifecycle
//!
//! `Dashboard::init()` runs the first ingestion and publishes it.
//! `refresh()` runs another cycle on demand. `start_auto_refresh()` spawns the
//! periodic timer, and `teardown()` stops it.
//!
//! Every cycle draws a sequence number when it starts. A result is published
//! only if its sequence is newer than the one currently published, so a slow
//! cycle that started earlier can never overwrite a fresher one.

use crate::ingest::Ingestor;
use crate::models::Snapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct Shared {
    ingestor: Ingestor,
    next_sequence: AtomicU64,
    published: watch::Sender<Arc<Snapshot>>,
}

impl Shared {
    async fn run_cycle(&self) -> Arc<Snapshot> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        debug!("Ingestion cycle {} started", sequence);

        let snapshot = Arc::new(self.ingestor.ingest(sequence).await);

        let published = self.published.send_if_modified(|current| {
            if snapshot.sequence > current.sequence {
                *current = Arc::clone(&snapshot);
                true
            } else {
                false
            }
        });

        if published {
            info!(
                "Published cycle {}: {} rows ({})",
                sequence,
                snapshot.len(),
                if snapshot.source.is_live() { "live" } else { "fallback" }
            );
        } else {
            warn!("Cycle {} finished after a newer one; discarded", sequence);
        }
        snapshot
    }
}

struct AutoRefresh {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct Dashboard {
    shared: Arc<Shared>,
    auto_refresh: Option<AutoRefresh>,
}

impl Dashboard {
    /// Build the state holder and publish the first cycle.
    pub async fn init(ingestor: Ingestor) -> Self {
        let (published, _) = watch::channel(Arc::new(Snapshot::empty()));
        let shared = Arc::new(Shared {
            ingestor,
            next_sequence: AtomicU64::new(1),
            published,
        });

        shared.run_cycle().await;

        Self {
            shared,
            auto_refresh: None,
        }
    }

    /// Run one cycle now. Returns what that cycle produced, published or not.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        self.shared.run_cycle().await
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.shared.published.borrow())
    }

    /// Receiver that wakes whenever a newer snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.published.subscribe()
    }

    /// Refresh every `interval`, first tick one interval from now.
    /// Replaces any timer already running.
    pub fn start_auto_refresh(&mut self, interval: Duration) {
        if let Some(previous) = self.auto_refresh.take() {
            let _ = previous.stop.send(());
            previous.handle.abort();
        }

        let shared = Arc::clone(&self.shared);
        let (stop, mut stopped) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let shared = Arc::clone(&shared);
                        // cycles run independently; the sequence check orders them
                        tokio::spawn(async move { shared.run_cycle().await; });
                    }
                }
            }
            debug!("Auto-refresh stopped");
        });

        info!("Auto-refresh every {:?}", interval);
        self.auto_refresh = Some(AutoRefresh { stop, handle });
    }

    /// Stop the refresh timer and wait for it to exit.
    pub async fn teardown(mut self) {
        if let Some(auto) = self.auto_refresh.take() {
            let _ = auto.stop.send(());
            if let Err(e) = auto.handle.await {
                if !e.is_cancelled() {
                    warn!("Auto-refresh task failed: {}", e);
                }
            }
        }
        info!("Dashboard torn down");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::SheetSource;
    use crate::ingest::http_client::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    const BODY: &str = "Hotel,Concepto,Grupo,Mes,Valor\nNubes,ADR,KPIs,2023-01,120\n";

    /// Serves BODY; the first call can be held open until released.
    struct GatedSource {
        calls: AtomicUsize,
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl GatedSource {
        fn open() -> Self {
            Self { calls: AtomicUsize::new(0), gate: tokio::sync::Mutex::new(None) }
        }
    }

    #[async_trait]
    impl SheetSource for GatedSource {
        async fn fetch_payload(&self) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 1 {
                if let Some(gate) = self.gate.lock().await.take() {
                    let _ = gate.await;
                }
            }
            Ok(format!("{BODY}Amalinas,ADR,KPIs,2023-02,{}\n", call))
        }

        fn describe(&self) -> String {
            "gated".into()
        }
    }

    fn dashboard_source(source: GatedSource) -> Ingestor {
        Ingestor::new(Arc::new(source))
    }

    #[tokio::test]
    async fn init_publishes_first_cycle() {
        let dash = Dashboard::init(dashboard_source(GatedSource::open())).await;
        let snap = dash.current();
        assert_eq!(snap.sequence, 1);
        assert!(snap.source.is_live());
        assert_eq!(snap.len(), 2);
    }

    #[tokio::test]
    async fn refresh_replaces_wholesale() {
        let dash = Dashboard::init(dashboard_source(GatedSource::open())).await;
        let mut rx = dash.subscribe();
        let _ = rx.borrow_and_update();

        let snap = dash.refresh().await;
        assert_eq!(snap.sequence, 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(dash.current().sequence, 2);
        assert_eq!(dash.current().rows[1].value, 1.0);
    }

    #[tokio::test]
    async fn stale_cycle_cannot_clobber_newer_one() {
        let (release, gate) = oneshot::channel();
        let source = Arc::new(GatedSource::open());
        *source.gate.lock().await = Some(gate);
        let dash = Arc::new(Dashboard::init(Ingestor::new(Arc::clone(&source) as Arc<dyn SheetSource>)).await);

        // cycle 2 blocks inside the fetch
        let slow = {
            let dash = Arc::clone(&dash);
            tokio::spawn(async move { dash.refresh().await })
        };
        while source.calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        // cycle 3 completes first
        let fast = dash.refresh().await;
        assert_eq!(fast.sequence, 3);
        assert_eq!(dash.current().sequence, 3);

        release.send(()).unwrap();
        let stale = slow.await.unwrap();
        assert_eq!(stale.sequence, 2);
        assert_eq!(dash.current().sequence, 3);
        assert_eq!(dash.current().rows[1].value, 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_ticks_and_tears_down() {
        let mut dash = Dashboard::init(dashboard_source(GatedSource::open())).await;
        let mut rx = dash.subscribe();
        let _ = rx.borrow_and_update();

        dash.start_auto_refresh(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().sequence >= 2);

        dash.teardown().await;
    }

    #[test]
    fn init_from_sync_context() {
        let dash = tokio_test::block_on(Dashboard::init(dashboard_source(GatedSource::open())));
        assert_eq!(dash.current().sequence, 1);
        assert_eq!(dash.current().rows[0].hotel, "Nubes");
    }
}
