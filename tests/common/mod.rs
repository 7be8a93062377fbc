//! In-memory Bluetooth adapter for driving the printer manager in tests.
//!
//! Devices are registered with their GATT services; `connect` succeeds only
//! for registered ("reachable") devices. Every chunk write is logged with
//! its start and end instants so tests can check ordering under a paused
//! clock.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use sudsy::SudsyError;
use sudsy::ble::{
    AdapterEvent, AdapterState, BleAdapter, DeviceDescriptor, EventStream, GattCharacteristic,
    GattLink, GattService, WriteTarget,
};
use sudsy::error::Result;
use sudsy::manager::{ConnectionState, PrinterEvent};

pub const PRINTER_SERVICE: Uuid = Uuid::from_u128(0x0000_18f0_0000_1000_8000_0080_5f9b_34fb);
pub const PRINTER_WRITE: Uuid = Uuid::from_u128(0x0000_2af1_0000_1000_8000_0080_5f9b_34fb);

/// How long each mock write takes.
pub const WRITE_LATENCY: Duration = Duration::from_millis(2);

/// One chunk as the printer received it.
#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub device: String,
    pub target: WriteTarget,
    pub bytes: Vec<u8>,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Default)]
struct MockState {
    power: AdapterState,
    devices: HashMap<String, Vec<GattService>>,
    broken_discovery: Vec<String>,
    drop_during_discovery: Vec<String>,
    local_names: HashMap<String, String>,
    scanning: bool,
    scans_started: usize,
    connects: usize,
    disconnects: usize,
    writes: Vec<WriteRecord>,
    fail_write_at: Option<usize>,
}

#[derive(Clone)]
pub struct MockAdapter {
    state: Arc<Mutex<MockState>>,
    events: broadcast::Sender<AdapterEvent>,
}

impl MockAdapter {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(MockState {
                power: AdapterState::PoweredOn,
                ..Default::default()
            })),
            events,
        }
    }

    /// A service exposing one write-without-response characteristic.
    pub fn printer_services() -> Vec<GattService> {
        vec![
            GattService {
                uuid: Uuid::from_u128(0x1800),
                characteristics: vec![GattCharacteristic {
                    uuid: Uuid::from_u128(0x2a00),
                    write_with_response: false,
                    write_without_response: false,
                }],
            },
            GattService {
                uuid: PRINTER_SERVICE,
                characteristics: vec![GattCharacteristic {
                    uuid: PRINTER_WRITE,
                    write_with_response: false,
                    write_without_response: true,
                }],
            },
        ]
    }

    /// Services with nothing writable.
    pub fn read_only_services() -> Vec<GattService> {
        vec![GattService {
            uuid: Uuid::from_u128(0x180a),
            characteristics: vec![GattCharacteristic {
                uuid: Uuid::from_u128(0x2a29),
                write_with_response: false,
                write_without_response: false,
            }],
        }]
    }

    pub fn add_device(&self, id: &str, services: Vec<GattService>) {
        self.state.lock().unwrap().devices.insert(id.to_string(), services);
    }

    pub fn remove_device(&self, id: &str) {
        self.state.lock().unwrap().devices.remove(id);
    }

    pub fn break_discovery(&self, id: &str) {
        self.state.lock().unwrap().broken_discovery.push(id.to_string());
    }

    /// Drop the link to `id` mid-discovery on the next connect only.
    pub fn drop_during_discovery(&self, id: &str) {
        self.state.lock().unwrap().drop_during_discovery.push(id.to_string());
    }

    /// Name the peripheral reports once connected.
    pub fn set_local_name(&self, id: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .local_names
            .insert(id.to_string(), name.to_string());
    }

    /// Fail the `n`th write (1-based) from now on.
    pub fn fail_write_at(&self, n: usize) {
        self.state.lock().unwrap().fail_write_at = Some(n);
    }

    pub fn set_power(&self, power: AdapterState) {
        self.state.lock().unwrap().power = power;
    }

    /// Inject an unsolicited adapter event.
    pub fn emit(&self, event: AdapterEvent) {
        let _ = self.events.send(event);
    }

    pub fn advertise(&self, id: &str, name: Option<&str>) {
        self.emit(AdapterEvent::Discovered(DeviceDescriptor::new(
            id,
            name.map(str::to_string),
        )));
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn written_bytes(&self) -> Vec<u8> {
        self.writes().into_iter().flat_map(|w| w.bytes).collect()
    }

    pub fn is_scanning(&self) -> bool {
        self.state.lock().unwrap().scanning
    }

    pub fn scans_started(&self) -> usize {
        self.state.lock().unwrap().scans_started
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }
}

#[async_trait]
impl BleAdapter for MockAdapter {
    type Link = MockLink;

    async fn state(&self) -> AdapterState {
        self.state.lock().unwrap().power
    }

    async fn start_scan(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.scanning = true;
        state.scans_started += 1;
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        self.state.lock().unwrap().scanning = false;
        Ok(())
    }

    async fn events(&self) -> Result<EventStream> {
        let receiver = self.events.subscribe();
        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn connect(&self, id: &str) -> Result<MockLink> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;
        let services = state
            .devices
            .get(id)
            .cloned()
            .ok_or_else(|| SudsyError::DeviceNotFound(id.to_string()))?;
        let before = state.drop_during_discovery.len();
        state.drop_during_discovery.retain(|d| d != id);
        Ok(MockLink {
            id: id.to_string(),
            services,
            broken_discovery: state.broken_discovery.iter().any(|d| d == id),
            drops_in_discovery: state.drop_during_discovery.len() != before,
            local_name: state.local_names.get(id).cloned(),
            events: self.events.clone(),
            state: self.state.clone(),
        })
    }
}

pub struct MockLink {
    id: String,
    services: Vec<GattService>,
    broken_discovery: bool,
    drops_in_discovery: bool,
    local_name: Option<String>,
    events: broadcast::Sender<AdapterEvent>,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl GattLink for MockLink {
    async fn discover_services(&self) -> Result<Vec<GattService>> {
        if self.broken_discovery {
            return Err(SudsyError::Link("GATT discovery timed out".into()));
        }
        if self.drops_in_discovery {
            // The stack reports the drop while discovery still completes.
            let _ = self.events.send(AdapterEvent::Disconnected(self.id.clone()));
            sleep(Duration::from_millis(1)).await;
        }
        Ok(self.services.clone())
    }

    async fn write(&self, target: &WriteTarget, data: &[u8]) -> Result<()> {
        let started = Instant::now();
        let fail = {
            let state = self.state.lock().unwrap();
            state.fail_write_at == Some(state.writes.len() + 1)
        };
        if fail {
            return Err(SudsyError::Link("GATT write rejected".into()));
        }

        sleep(WRITE_LATENCY).await;

        self.state.lock().unwrap().writes.push(WriteRecord {
            device: self.id.clone(),
            target: *target,
            bytes: data.to_vec(),
            started,
            finished: Instant::now(),
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.lock().unwrap().disconnects += 1;
        Ok(())
    }

    async fn local_name(&self) -> Option<String> {
        self.local_name.clone()
    }
}

/// Wait for the manager to publish `state`.
pub async fn wait_for_state(
    events: &mut broadcast::Receiver<PrinterEvent>,
    state: ConnectionState,
) {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(PrinterEvent::StateChanged(s)) if s == state => return,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(60), wait)
        .await
        .expect("state never reached");
}
