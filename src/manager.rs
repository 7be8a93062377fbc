//! # Printer Connection Manager
//!
//! Owns the Bluetooth adapter, the single active printer link and the saved
//! printer record, and exposes the print job API on top of them.
//!
//! ## State Machine
//!
//! ```text
//!                 start_scan                  connect
//! ┌──────────────┐ ───────► ┌──────────┐ ───────────────► ┌────────────┐
//! │ Disconnected │          │ Scanning │                  │ Connecting │
//! └──────────────┘ ◄─────── └──────────┘                  └────────────┘
//!    ▲    ▲    ▲  stop_scan / timeout                       │       │
//!    │    │    └──────────── no writable char / link error ─┘       │
//!    │    │                                                         ▼
//!    │    └─────── disconnect() (clears saved record) ─────── ┌───────────┐
//!    └──────────── link lost (saved record kept) ──────────── │ Connected │
//!                                                             └───────────┘
//! ```
//!
//! ## Events
//!
//! Everything asynchronous is published on a broadcast channel as
//! [`PrinterEvent`]: state changes, discovered-device snapshots during a
//! scan, adapter power changes and scan failures. `start_scan` hands out a
//! subscription; any number of subscribers may listen.
//!
//! ## Concurrency
//!
//! Every operation that touches the link takes `&mut self`, so at most one
//! connection attempt and one print job are in flight. A background task
//! pumps adapter events (discoveries, link loss, power) into the shared
//! state, and a scan has a timer task. Both are cancelled by
//! [`shutdown`](PrinterManager::shutdown) or on drop.
//!
//! ## Example
//!
//! ```no_run
//! use sudsy::ble::BtleAdapter;
//! use sudsy::label::OrderLabel;
//! use sudsy::manager::PrinterManager;
//! use sudsy::printer::PrinterSettings;
//! use sudsy::store::FileStore;
//!
//! # async fn demo() -> sudsy::error::Result<()> {
//! let adapter = BtleAdapter::new().await?;
//! let store = FileStore::open_default()?;
//! let mut manager = PrinterManager::new(adapter, store, PrinterSettings::default()).await?;
//!
//! manager.reconnect_saved_printer().await?;
//! manager.print_order_tag(&OrderLabel::new("42", "Jane Doe")).await?;
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use futures::StreamExt;
use indexmap::IndexMap;
use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::ble::{
    AdapterEvent, AdapterState, BleAdapter, DeviceDescriptor, EventStream, GattLink, WriteTarget,
    select_write_target,
};
use crate::error::{ConnectStage, Result, SudsyError};
use crate::label::{self, OrderLabel, PrintJob};
use crate::printer::PrinterSettings;
use crate::store::{PrinterStore, SavedPrinter};
use crate::transport;

/// Capacity of the event channel. Slow subscribers skip old events.
const EVENT_CAPACITY: usize = 64;

// ============================================================================
// PUBLIC TYPES
// ============================================================================

/// The printer currently connected and where its data goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePrinter {
    pub device: DeviceDescriptor,
    pub target: WriteTarget,
}

/// Connection state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Scanning,
    Connecting(DeviceDescriptor),
    Connected(ActivePrinter),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

/// Notification published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterEvent {
    StateChanged(ConnectionState),
    /// Every named device seen in the current scan, in discovery order.
    DevicesUpdated(Vec<DeviceDescriptor>),
    AdapterStateChanged(AdapterState),
    /// The scan could not start (adapter off or refused).
    ScanFailed(String),
}

// ============================================================================
// SHARED STATE
// ============================================================================

struct Shared<L> {
    state: ConnectionState,
    link: Option<Arc<L>>,
    discovered: IndexMap<String, DeviceDescriptor>,
    adapter_state: AdapterState,
    scan: Option<CancellationToken>,
    /// Set when the device being connected drops before the link is installed.
    connect_lost: bool,
}

type SharedState<L> = Arc<Mutex<Shared<L>>>;

fn lock<L>(shared: &Mutex<Shared<L>>) -> MutexGuard<'_, Shared<L>> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// Move to `state` and publish it, unless already there.
fn transition<L>(
    shared: &Mutex<Shared<L>>,
    events: &broadcast::Sender<PrinterEvent>,
    state: ConnectionState,
) {
    {
        let mut guard = lock(shared);
        if guard.state == state {
            return;
        }
        guard.state = state.clone();
    }
    debug!("Printer state: {:?}", state);
    let _ = events.send(PrinterEvent::StateChanged(state));
}

/// Apply one adapter event to the shared state.
fn handle_adapter_event<L>(
    shared: &Mutex<Shared<L>>,
    events: &broadcast::Sender<PrinterEvent>,
    event: AdapterEvent,
) {
    match event {
        AdapterEvent::Discovered(device) => {
            if device.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                return;
            }
            let snapshot = {
                let mut guard = lock(shared);
                if guard.state != ConnectionState::Scanning {
                    return;
                }
                if guard.discovered.get(&device.id) == Some(&device) {
                    return;
                }
                debug!("Discovered {} ({})", device.label(), device.id);
                guard.discovered.insert(device.id.clone(), device);
                guard.discovered.values().cloned().collect()
            };
            let _ = events.send(PrinterEvent::DevicesUpdated(snapshot));
        }
        AdapterEvent::Disconnected(id) => {
            let lost = {
                let mut guard = lock(shared);
                let lost = matches!(
                    &guard.state,
                    ConnectionState::Connected(active) if active.device.id == id
                );
                let interrupted = matches!(
                    &guard.state,
                    ConnectionState::Connecting(device) if device.id == id
                );
                if lost {
                    guard.link = None;
                }
                if interrupted {
                    debug!("Printer {} dropped the link while connecting", id);
                    guard.connect_lost = true;
                }
                lost
            };
            if lost {
                info!("Printer {} dropped the link", id);
                transition(shared, events, ConnectionState::Disconnected);
            }
        }
        AdapterEvent::StateChanged(state) => {
            let (changed, lost_link, stopped_scan) = {
                let mut guard = lock(shared);
                let changed = guard.adapter_state != state;
                guard.adapter_state = state;
                let off = state == AdapterState::PoweredOff;
                let lost_link = off && guard.state.is_connected();
                let stopped_scan = off && guard.state == ConnectionState::Scanning;
                if lost_link {
                    guard.link = None;
                }
                if off && matches!(guard.state, ConnectionState::Connecting(_)) {
                    guard.connect_lost = true;
                }
                if stopped_scan {
                    if let Some(token) = guard.scan.take() {
                        token.cancel();
                    }
                }
                (changed, lost_link, stopped_scan)
            };

            if changed {
                info!("Bluetooth adapter is now {:?}", state);
                let _ = events.send(PrinterEvent::AdapterStateChanged(state));
            }
            if lost_link || stopped_scan {
                warn!("Bluetooth turned off");
                transition(shared, events, ConnectionState::Disconnected);
            }
        }
    }
}

/// Background task: feed adapter events into the shared state until
/// cancelled or the stream ends.
async fn pump_events<L>(
    mut stream: EventStream,
    shared: SharedState<L>,
    events: broadcast::Sender<PrinterEvent>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            event = stream.next() => match event {
                Some(event) => handle_adapter_event(&shared, &events, event),
                None => {
                    warn!("Adapter event stream ended");
                    break;
                }
            }
        }
    }
    debug!("Adapter event pump stopped");
}

// ============================================================================
// MANAGER
// ============================================================================

/// Connection manager and print job API.
pub struct PrinterManager<A: BleAdapter, S: PrinterStore> {
    adapter: Arc<A>,
    store: S,
    settings: PrinterSettings,
    shared: SharedState<A::Link>,
    events: broadcast::Sender<PrinterEvent>,
    root: CancellationToken,
}

impl<A: BleAdapter, S: PrinterStore> PrinterManager<A, S> {
    /// Create a manager and start listening to adapter events.
    pub async fn new(adapter: A, store: S, settings: PrinterSettings) -> Result<Self> {
        let adapter = Arc::new(adapter);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let adapter_state = adapter.state().await;

        let shared = Arc::new(Mutex::new(Shared {
            state: ConnectionState::Disconnected,
            link: None,
            discovered: IndexMap::new(),
            adapter_state,
            scan: None,
            connect_lost: false,
        }));

        let root = CancellationToken::new();
        let stream = adapter.events().await?;
        tokio::spawn(pump_events(
            stream,
            shared.clone(),
            events.clone(),
            root.child_token(),
        ));

        info!("Printer manager ready (Bluetooth {:?})", adapter_state);
        Ok(Self {
            adapter,
            store,
            settings,
            shared,
            events,
            root,
        })
    }

    pub fn settings(&self) -> &PrinterSettings {
        &self.settings
    }

    /// A new subscription to printer events.
    pub fn subscribe(&self) -> broadcast::Receiver<PrinterEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.shared).state.clone()
    }

    /// Last power state reported by the adapter.
    pub fn adapter_state(&self) -> AdapterState {
        lock(&self.shared).adapter_state
    }

    /// Named devices seen in the current or last scan, in discovery order.
    pub fn discovered_devices(&self) -> Vec<DeviceDescriptor> {
        lock(&self.shared).discovered.values().cloned().collect()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.shared).state.is_connected()
    }

    /// Name (or id, if unnamed) of the connected printer.
    pub fn connected_device_name(&self) -> Option<String> {
        match &lock(&self.shared).state {
            ConnectionState::Connected(active) => Some(active.device.label().to_string()),
            _ => None,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        transition(&self.shared, &self.events, state);
    }

    async fn refresh_adapter_state(&self) -> AdapterState {
        let state = self.adapter.state().await;
        lock(&self.shared).adapter_state = state;
        state
    }

    // ========================================================================
    // SCANNING
    // ========================================================================

    /// Start a bounded scan and return a subscription to its progress.
    ///
    /// Never fails: a powered-off adapter or a refused scan is reported as
    /// [`PrinterEvent::ScanFailed`] on the returned subscription. While a
    /// printer is connecting or connected the request is ignored.
    pub async fn start_scan(&mut self) -> broadcast::Receiver<PrinterEvent> {
        let receiver = self.events.subscribe();

        let current = self.state();
        match current {
            ConnectionState::Connecting(_) | ConnectionState::Connected(_) => {
                warn!("Ignoring scan request while {:?}", current);
                return receiver;
            }
            ConnectionState::Scanning => self.cancel_scan_timer(),
            ConnectionState::Disconnected => {}
        }

        if !self.refresh_adapter_state().await.is_usable() {
            warn!("Cannot scan: Bluetooth is off");
            let _ = self
                .events
                .send(PrinterEvent::ScanFailed(SudsyError::AdapterUnavailable.to_string()));
            self.set_state(ConnectionState::Disconnected);
            return receiver;
        }

        let token = self.root.child_token();
        {
            let mut guard = lock(&self.shared);
            guard.discovered.clear();
            guard.scan = Some(token.clone());
        }
        self.set_state(ConnectionState::Scanning);

        if let Err(err) = self.adapter.start_scan().await {
            warn!("Failed to start scan: {}", err);
            self.cancel_scan_timer();
            let _ = self.events.send(PrinterEvent::ScanFailed(err.to_string()));
            self.set_state(ConnectionState::Disconnected);
            return receiver;
        }

        let timeout = self.settings.scan_timeout();
        info!("Scanning for printers ({}s)", timeout.as_secs());

        let adapter = self.adapter.clone();
        let shared = self.shared.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = sleep(timeout) => {
                    let still_scanning = {
                        let mut guard = lock(&shared);
                        guard.scan = None;
                        guard.state == ConnectionState::Scanning
                    };
                    if still_scanning {
                        info!("Scan finished");
                        if let Err(err) = adapter.stop_scan().await {
                            warn!("Failed to stop scan: {}", err);
                        }
                        transition(&shared, &events, ConnectionState::Disconnected);
                    }
                }
            }
        });

        receiver
    }

    /// Stop a running scan. Does nothing when not scanning.
    pub async fn stop_scan(&mut self) {
        if self.state() != ConnectionState::Scanning {
            return;
        }
        self.cancel_scan_timer();
        if let Err(err) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", err);
        }
        info!("Scan stopped");
        self.set_state(ConnectionState::Disconnected);
    }

    fn cancel_scan_timer(&self) {
        if let Some(token) = lock(&self.shared).scan.take() {
            token.cancel();
        }
    }

    // ========================================================================
    // CONNECTION
    // ========================================================================

    /// Connect to `device`, replacing any current connection.
    ///
    /// A device given without a name takes the name seen in the current
    /// scan, the saved record or the peripheral itself, in that order. On
    /// success the device is saved as the printer to reconnect to.
    pub async fn connect(&mut self, device: &DeviceDescriptor) -> Result<ActivePrinter> {
        if !self.refresh_adapter_state().await.is_usable() {
            return Err(SudsyError::AdapterUnavailable);
        }

        let mut device = self.known_name(device).await;

        self.stop_scan().await;
        self.drop_link().await;

        lock(&self.shared).connect_lost = false;
        self.set_state(ConnectionState::Connecting(device.clone()));
        info!("Connecting to {} ({})", device.label(), device.id);

        let link = match self.adapter.connect(&device.id).await {
            Ok(link) => link,
            Err(err) => {
                warn!("Connecting to {} failed: {}", device.id, err);
                self.set_state(ConnectionState::Disconnected);
                return Err(link_error(&device, err));
            }
        };

        let services = match link.discover_services().await {
            Ok(services) => services,
            Err(err) => {
                warn!("Service discovery on {} failed: {}", device.id, err);
                abandon(&link).await;
                self.set_state(ConnectionState::Disconnected);
                return Err(SudsyError::ConnectFailed {
                    device: device.id.clone(),
                    stage: ConnectStage::Discovery,
                    reason: err.to_string(),
                });
            }
        };

        let Some(target) = select_write_target(&services, &self.settings.pinned_characteristics)
        else {
            warn!("{} has no writable characteristic", device.id);
            abandon(&link).await;
            self.set_state(ConnectionState::Disconnected);
            return Err(SudsyError::NoWritableCharacteristic);
        };

        if device.name.is_none() {
            device.name = link.local_name().await.filter(|n| !n.trim().is_empty());
        }

        let active = ActivePrinter {
            device: device.clone(),
            target,
        };
        let link = Arc::new(link);

        // Install the link only if the device is still there.
        let dropped = {
            let mut guard = lock(&self.shared);
            if !guard.connect_lost {
                guard.link = Some(link.clone());
                guard.state = ConnectionState::Connected(active.clone());
            }
            guard.connect_lost
        };
        if dropped {
            warn!("{} dropped the link during setup", device.id);
            abandon(link.as_ref()).await;
            self.set_state(ConnectionState::Disconnected);
            return Err(SudsyError::ConnectFailed {
                device: device.id.clone(),
                stage: ConnectStage::Link,
                reason: "link dropped during service discovery".into(),
            });
        }

        info!(
            "Connected to {}; writing to {} / {} ({:?})",
            device.label(),
            target.service_id,
            target.characteristic_id,
            target.kind
        );
        let connected = ConnectionState::Connected(active.clone());
        debug!("Printer state: {:?}", connected);
        let _ = self.events.send(PrinterEvent::StateChanged(connected));

        if let Err(err) = self.store.save(&SavedPrinter::from(&device)).await {
            warn!("Failed to save printer record: {}", err);
        }

        Ok(active)
    }

    /// `device`, with its name filled in from the current scan or the saved
    /// record when it has none.
    async fn known_name(&self, device: &DeviceDescriptor) -> DeviceDescriptor {
        if device.name.as_deref().is_some_and(|n| !n.trim().is_empty()) {
            return device.clone();
        }

        let seen = lock(&self.shared).discovered.get(&device.id).cloned();
        if let Some(seen) = seen {
            return seen;
        }

        match self.store.load().await {
            Ok(Some(saved)) if saved.id == device.id && !saved.name.is_empty() => {
                DeviceDescriptor::new(saved.id, Some(saved.name))
            }
            Ok(_) => device.clone(),
            Err(err) => {
                warn!("Failed to read saved printer record: {}", err);
                device.clone()
            }
        }
    }

    /// Reconnect to the saved printer.
    ///
    /// Always goes through a real connect; the saved record is never
    /// trusted on its own.
    pub async fn reconnect_saved_printer(&mut self) -> Result<ActivePrinter> {
        let saved = self.store.load().await?.ok_or(SudsyError::NoSavedPrinter)?;

        if let ConnectionState::Connected(active) = self.state() {
            if active.device.id == saved.id {
                debug!("Already connected to saved printer {}", saved.id);
                return Ok(active);
            }
        }

        info!("Reconnecting to saved printer {}", saved.id);
        self.connect(&saved.into()).await
    }

    /// Disconnect and forget the saved printer.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.drop_link().await;
        self.set_state(ConnectionState::Disconnected);
        self.store.clear().await?;
        info!("Printer disconnected and forgotten");
        Ok(())
    }

    /// Close the current link, if any, without touching the saved record.
    async fn drop_link(&mut self) {
        let link = lock(&self.shared).link.take();
        if let Some(link) = link {
            abandon(link.as_ref()).await;
        }
        if self.is_connected() {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Stop background tasks and close the link. The saved printer is kept
    /// for the next run.
    pub async fn shutdown(&mut self) {
        if self.root.is_cancelled() {
            return;
        }
        self.stop_scan().await;
        self.drop_link().await;
        self.root.cancel();
        info!("Printer manager shut down");
    }

    // ========================================================================
    // PRINT JOBS
    // ========================================================================

    fn active_link(&self) -> Result<(Arc<A::Link>, WriteTarget)> {
        let guard = lock(&self.shared);
        match (&guard.state, &guard.link) {
            (ConnectionState::Connected(active), Some(link)) => Ok((link.clone(), active.target)),
            _ => Err(SudsyError::NotConnected),
        }
    }

    /// Encode `job` and send it to the connected printer.
    ///
    /// Returns the number of chunks written.
    pub async fn print(&mut self, job: &PrintJob) -> Result<usize> {
        let (link, target) = self.active_link()?;
        let bytes = job.encode(&self.settings, Local::now().naive_local());
        transport::send(link.as_ref(), &target, &bytes, &self.settings.chunk_config()).await
    }

    pub async fn print_text(&mut self, body: &str) -> Result<()> {
        self.print(&PrintJob::PlainText {
            body: body.to_string(),
        })
        .await?;
        Ok(())
    }

    pub async fn print_order_tag(&mut self, order: &OrderLabel) -> Result<()> {
        self.print(&PrintJob::OrderLabel(order.clone())).await?;
        Ok(())
    }

    /// Print `count` labels for `order`, numbered `BAG i OF count`.
    ///
    /// Each label is fully sent before the next starts, with a settle pause
    /// in between. Stops at the first failure.
    pub async fn print_multiple_bag_labels(&mut self, order: &OrderLabel, count: u32) -> Result<()> {
        let jobs = label::bag_labels(order, count)?;
        self.active_link()?;

        for (i, job) in jobs.iter().enumerate() {
            if i > 0 {
                sleep(self.settings.label_settle()).await;
            }
            debug!("Printing bag label {} of {}", i + 1, count);
            self.print(job).await?;
        }
        Ok(())
    }

    pub async fn print_pickup_sheet(&mut self, orders: &[OrderLabel]) -> Result<()> {
        self.print(&label::pickup_sheet(orders)?).await?;
        Ok(())
    }
}

impl<A: BleAdapter, S: PrinterStore> Drop for PrinterManager<A, S> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Disconnect a link we are giving up on, logging failures.
async fn abandon<L: GattLink + ?Sized>(link: &L) {
    if let Err(err) = link.disconnect().await {
        warn!("Failed to close link: {}", err);
    }
}

/// Errors from opening a link keep their kind when it is already specific.
fn link_error(device: &DeviceDescriptor, err: SudsyError) -> SudsyError {
    match err {
        SudsyError::ConnectFailed { .. }
        | SudsyError::DeviceNotFound(_)
        | SudsyError::AdapterUnavailable => err,
        other => SudsyError::ConnectFailed {
            device: device.id.clone(),
            stage: ConnectStage::Link,
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::{GattCharacteristic, GattService, WriteKind};
    use uuid::Uuid;

    type NoLink = Shared<()>;

    fn shared(state: ConnectionState) -> Mutex<NoLink> {
        Mutex::new(Shared {
            state,
            link: None,
            discovered: IndexMap::new(),
            adapter_state: AdapterState::PoweredOn,
            scan: None,
            connect_lost: false,
        })
    }

    fn active(id: &str) -> ActivePrinter {
        let services = [GattService {
            uuid: Uuid::from_u128(1),
            characteristics: vec![GattCharacteristic {
                uuid: Uuid::from_u128(2),
                write_with_response: false,
                write_without_response: true,
            }],
        }];
        ActivePrinter {
            device: DeviceDescriptor::new(id, Some("P".into())),
            target: select_write_target(&services, &[]).unwrap(),
        }
    }

    #[test]
    fn test_discoveries_ignored_unless_scanning() {
        let (tx, mut rx) = broadcast::channel(8);
        let state = shared(ConnectionState::Disconnected);
        handle_adapter_event(
            &state,
            &tx,
            AdapterEvent::Discovered(DeviceDescriptor::new("A", Some("Printer".into()))),
        );
        assert!(lock(&state).discovered.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unnamed_devices_are_skipped() {
        let (tx, mut rx) = broadcast::channel(8);
        let state = shared(ConnectionState::Scanning);
        handle_adapter_event(&state, &tx, AdapterEvent::Discovered(DeviceDescriptor::new("A", None)));
        handle_adapter_event(
            &state,
            &tx,
            AdapterEvent::Discovered(DeviceDescriptor::new("B", Some("  ".into()))),
        );
        handle_adapter_event(
            &state,
            &tx,
            AdapterEvent::Discovered(DeviceDescriptor::new("C", Some("Printer".into()))),
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            PrinterEvent::DevicesUpdated(vec![DeviceDescriptor::new("C", Some("Printer".into()))])
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_updated_name_replaces_entry_in_place() {
        let (tx, _rx) = broadcast::channel(8);
        let state = shared(ConnectionState::Scanning);
        for (id, name) in [("A", "One"), ("B", "Two"), ("A", "Uno")] {
            handle_adapter_event(
                &state,
                &tx,
                AdapterEvent::Discovered(DeviceDescriptor::new(id, Some(name.into()))),
            );
        }
        let names: Vec<_> = lock(&state)
            .discovered
            .values()
            .map(|d| d.label().to_string())
            .collect();
        assert_eq!(names, vec!["Uno", "Two"]);
    }

    #[test]
    fn test_disconnect_of_other_device_is_ignored() {
        let (tx, _rx) = broadcast::channel(8);
        let state = shared(ConnectionState::Connected(active("AA:BB")));
        handle_adapter_event(&state, &tx, AdapterEvent::Disconnected("CC:DD".into()));
        assert!(lock(&state).state.is_connected());

        handle_adapter_event(&state, &tx, AdapterEvent::Disconnected("AA:BB".into()));
        assert_eq!(lock(&state).state, ConnectionState::Disconnected);
    }

    #[test]
    fn test_drop_while_connecting_is_remembered() {
        let (tx, mut rx) = broadcast::channel(8);
        let device = DeviceDescriptor::new("AA:BB", Some("P".into()));
        let state = shared(ConnectionState::Connecting(device.clone()));

        handle_adapter_event(&state, &tx, AdapterEvent::Disconnected("CC:DD".into()));
        assert!(!lock(&state).connect_lost);

        handle_adapter_event(&state, &tx, AdapterEvent::Disconnected("AA:BB".into()));
        assert!(lock(&state).connect_lost);
        assert_eq!(lock(&state).state, ConnectionState::Connecting(device));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_power_off_while_connecting_is_remembered() {
        let (tx, _rx) = broadcast::channel(8);
        let state = shared(ConnectionState::Connecting(DeviceDescriptor::new("AA:BB", None)));
        handle_adapter_event(&state, &tx, AdapterEvent::StateChanged(AdapterState::PoweredOff));
        assert!(lock(&state).connect_lost);
    }

    #[test]
    fn test_power_off_drops_connection() {
        let (tx, mut rx) = broadcast::channel(8);
        let state = shared(ConnectionState::Connected(active("AA:BB")));
        handle_adapter_event(&state, &tx, AdapterEvent::StateChanged(AdapterState::PoweredOff));

        assert_eq!(
            rx.try_recv().unwrap(),
            PrinterEvent::AdapterStateChanged(AdapterState::PoweredOff)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            PrinterEvent::StateChanged(ConnectionState::Disconnected)
        );
        assert_eq!(lock(&state).adapter_state, AdapterState::PoweredOff);
    }

    #[test]
    fn test_write_kind_in_active_printer() {
        assert_eq!(active("X").target.kind, WriteKind::WithoutResponse);
    }
}
