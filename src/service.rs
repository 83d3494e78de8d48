//! Dependency-injected service root: owns the component handles, spawns the
//! three long-running consumers (MD receiver, clearing receiver, snapshot
//! broadcaster) and the two HTTP servers, and tears everything down on a
//! shared shutdown signal.
//!
//! Every task holds its component handles by `Arc` clone rather than through
//! a global; shutdown is a `broadcast` channel subscribed to by every task,
//! so a single signal on the sender stops all five concurrent tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::book::OrderBook;
use crate::clearing::ClearingStore;
use crate::config::Config;
use crate::etf::EtfLedger;
use crate::http::{self, AppState};
use crate::mcast;
use crate::snapshot::{self, SubscriberRegistry};
use crate::wire::{self, SequenceTracker};

/// Receivers block on UDP reads for at most this long so they can observe
/// shutdown between datagrams.
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Broadcaster cadence between dashboard frames.
const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(100);

pub struct Service {
    config: Config,
    book: Arc<OrderBook>,
    clearing: Arc<ClearingStore>,
    etf: Arc<EtfLedger>,
    subscribers: Arc<SubscriberRegistry>,
}

impl Service {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            book: Arc::new(OrderBook::new()),
            clearing: Arc::new(ClearingStore::new()),
            etf: Arc::new(EtfLedger::new()),
            subscribers: Arc::new(SubscriberRegistry::new()),
        }
    }

    fn app_state(&self) -> AppState {
        AppState {
            book: self.book.clone(),
            clearing: self.clearing.clone(),
            etf: self.etf.clone(),
            subscribers: self.subscribers.clone(),
        }
    }

    /// Spawns every long-running task and blocks until all have wound down
    /// in response to `shutdown`.
    pub async fn run(self: Arc<Self>, shutdown: broadcast::Sender<()>) -> crate::error::Result<()> {
        let md_socket = mcast::join_group(self.config.md_addr(), self.config.mcast_bind_ip)?;
        let clearing_socket = mcast::join_group(self.config.clearing_addr(), self.config.mcast_bind_ip)?;

        let mut tasks = Vec::new();

        {
            let service = self.clone();
            let mut rx = shutdown.subscribe();
            tasks.push(tokio::spawn(async move { service.run_md_receiver(md_socket, &mut rx).await }));
        }
        {
            let service = self.clone();
            let mut rx = shutdown.subscribe();
            tasks.push(tokio::spawn(async move { service.run_clearing_receiver(clearing_socket, &mut rx).await }));
        }
        {
            let service = self.clone();
            let mut rx = shutdown.subscribe();
            tasks.push(tokio::spawn(async move { service.run_broadcaster(&mut rx).await }));
        }

        let rest_addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.rest_port));
        let ws_addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.ws_port));
        let rest_state = self.app_state();
        let ws_state = self.app_state();

        let rest_shutdown = shutdown.subscribe();
        let ws_shutdown = shutdown.subscribe();
        let rest_task = tokio::spawn(async move {
            http::serve(rest_addr, http::rest_router(rest_state), wait_for_shutdown(rest_shutdown)).await
        });
        let ws_task = tokio::spawn(async move {
            http::serve(ws_addr, http::ws_router(ws_state), wait_for_shutdown(ws_shutdown)).await
        });

        for task in tasks {
            let _ = task.await;
        }
        if let Err(err) = rest_task.await.unwrap_or(Ok(())) {
            warn!(%err, "REST server exited with an error");
        }
        if let Err(err) = ws_task.await.unwrap_or(Ok(())) {
            warn!(%err, "WebSocket server exited with an error");
        }

        Ok(())
    }

    async fn run_md_receiver(&self, socket: tokio::net::UdpSocket, shutdown: &mut broadcast::Receiver<()>) {
        let mut tracker = SequenceTracker::new();
        let mut buf = [0u8; 4096];
        info!("market data receiver started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                result = tokio::time::timeout(RECV_TIMEOUT, socket.recv(&mut buf)) => {
                    match result {
                        Ok(Ok(len)) => self.handle_md_datagram(&buf[..len], &mut tracker).await,
                        Ok(Err(err)) => warn!(%err, "market data socket read failed"),
                        Err(_) => continue, // recv timeout, loop to re-check shutdown
                    }
                }
            }
        }
        debug!("market data receiver stopped");
    }

    async fn handle_md_datagram(&self, datagram: &[u8], tracker: &mut SequenceTracker) {
        let Some((header, event)) = wire::md::decode(datagram) else { return };
        if let Some(gap) = tracker.observe(header.seq_num) {
            warn!(gap, seq_num = header.seq_num, "market data sequence gap");
        }
        match event {
            wire::md::MdEvent::NewOrder { order_id, symbol, side, quantity, price } => {
                self.book.new_order(order_id, symbol, side, quantity, price).await;
            }
            wire::md::MdEvent::DeleteOrder { order_id } => {
                self.book.delete_order(order_id).await;
            }
            wire::md::MdEvent::ModifyOrder { order_id, side, quantity, price } => {
                self.book.modify_order(order_id, side, quantity, price).await;
            }
            wire::md::MdEvent::Heartbeat | wire::md::MdEvent::Ignored(_) => {}
        }
    }

    async fn run_clearing_receiver(&self, socket: tokio::net::UdpSocket, shutdown: &mut broadcast::Receiver<()>) {
        let mut tracker = SequenceTracker::new();
        let mut buf = [0u8; 4096];
        info!("clearing receiver started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                result = tokio::time::timeout(RECV_TIMEOUT, socket.recv(&mut buf)) => {
                    match result {
                        Ok(Ok(len)) => self.handle_clearing_datagram(&buf[..len], &mut tracker).await,
                        Ok(Err(err)) => warn!(%err, "clearing socket read failed"),
                        Err(_) => continue,
                    }
                }
            }
        }
        debug!("clearing receiver stopped");
    }

    async fn handle_clearing_datagram(&self, datagram: &[u8], tracker: &mut SequenceTracker) {
        let Some((header, event)) = wire::clearing::decode(datagram) else { return };
        if let Some(gap) = tracker.observe(header.seq_num) {
            warn!(gap, seq_num = header.seq_num, "clearing sequence gap");
        }
        match event {
            wire::clearing::ClearingEvent::Fill { client_id, symbol, quantity, price, side } => {
                self.clearing.apply_fill(client_id, symbol, quantity, price, side).await;
            }
            wire::clearing::ClearingEvent::Heartbeat | wire::clearing::ClearingEvent::Ignored(_) => {}
        }
    }

    async fn run_broadcaster(&self, shutdown: &mut broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(SNAPSHOT_INTERVAL);
        info!("snapshot broadcaster started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    let frame = snapshot::compose_frame(&self.book, &self.clearing, &self.etf).await;
                    match serde_json::to_string(&frame) {
                        Ok(payload) => self.subscribers.broadcast(&payload).await,
                        Err(err) => warn!(%err, "failed to serialize snapshot frame"),
                    }
                }
            }
        }
        debug!("snapshot broadcaster stopped");
    }
}

async fn wait_for_shutdown(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
