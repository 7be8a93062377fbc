//! # btleplug Backend
//!
//! [`BleAdapter`] and [`GattLink`] on top of the platform Bluetooth stack
//! (BlueZ, CoreBluetooth, WinRT) via `btleplug`.
//!
//! Device ids are the platform peripheral id rendered as a string: the
//! `AA:BB:CC:DD:EE:FF` address on Linux and Windows, a UUID on macOS.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CentralState, CharPropFlags, Manager as _, Peripheral as _, ScanFilter,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::time::{Instant, sleep};

use super::{
    AdapterEvent, AdapterState, BleAdapter, DeviceDescriptor, EventStream, GattCharacteristic,
    GattLink, GattService, WriteKind, WriteTarget,
};
use crate::error::{ConnectStage, Result, SudsyError};

/// How long to look for a peripheral the stack does not know yet.
const DEFAULT_LOOKUP_WINDOW: Duration = Duration::from_secs(5);

/// How often to re-check the peripheral list while looking.
const LOOKUP_POLL: Duration = Duration::from_millis(250);

/// The first Bluetooth adapter on this machine.
#[derive(Debug, Clone)]
pub struct BtleAdapter {
    adapter: Adapter,
    lookup_window: Duration,
}

impl BtleAdapter {
    /// Initialize the platform manager and take its first adapter.
    ///
    /// Fails with `AdapterUnavailable` when the machine has no adapter.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(SudsyError::AdapterUnavailable)?;

        info!(
            "Using adapter {}",
            adapter
                .adapter_info()
                .await
                .unwrap_or_else(|_| "UNKNOWN".to_string())
        );

        Ok(Self {
            adapter,
            lookup_window: DEFAULT_LOOKUP_WINDOW,
        })
    }

    /// Set how long `connect` scans for an id the stack has not seen yet.
    pub fn with_lookup_window(mut self, window: Duration) -> Self {
        self.lookup_window = window;
        self
    }

    async fn find_peripheral(&self, id: &str) -> Result<Option<Peripheral>> {
        let peripherals = self.adapter.peripherals().await?;
        Ok(peripherals.into_iter().find(|p| p.id().to_string() == id))
    }

    /// Scan until `id` shows up or the lookup window closes.
    async fn look_up(&self, id: &str) -> Result<Option<Peripheral>> {
        debug!("Peripheral {} unknown to the stack, scanning for it", id);
        self.adapter.start_scan(ScanFilter::default()).await?;

        let deadline = Instant::now() + self.lookup_window;
        let found = loop {
            match self.find_peripheral(id).await {
                Ok(Some(peripheral)) => break Some(peripheral),
                Ok(None) => {}
                Err(err) => warn!("Failed to query peripherals: {}", err),
            }
            if Instant::now() >= deadline {
                break None;
            }
            sleep(LOOKUP_POLL).await;
        };

        if let Err(err) = self.adapter.stop_scan().await {
            warn!("Failed to stop lookup scan: {}", err);
        }
        Ok(found)
    }
}

async fn map_event(adapter: &Adapter, event: CentralEvent) -> Option<AdapterEvent> {
    match event {
        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
            let peripheral = adapter.peripheral(&id).await.ok()?;
            let name = match peripheral.properties().await {
                Ok(Some(properties)) => properties.local_name,
                Ok(None) => None,
                Err(err) => {
                    debug!("Could not query properties of {}: {:?}", id, err);
                    None
                }
            };
            Some(AdapterEvent::Discovered(DeviceDescriptor::new(id.to_string(), name)))
        }
        CentralEvent::DeviceDisconnected(id) => Some(AdapterEvent::Disconnected(id.to_string())),
        CentralEvent::StateUpdate(state) => Some(AdapterEvent::StateChanged(map_state(state))),
        _ => None,
    }
}

fn map_state(state: CentralState) -> AdapterState {
    match state {
        CentralState::PoweredOn => AdapterState::PoweredOn,
        CentralState::PoweredOff => AdapterState::PoweredOff,
        _ => AdapterState::Unknown,
    }
}

#[async_trait]
impl BleAdapter for BtleAdapter {
    type Link = BtleLink;

    async fn state(&self) -> AdapterState {
        match self.adapter.adapter_state().await {
            Ok(state) => map_state(state),
            Err(err) => {
                warn!("Could not read adapter state: {}", err);
                AdapterState::Unknown
            }
        }
    }

    async fn start_scan(&self) -> Result<()> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        self.adapter.stop_scan().await?;
        Ok(())
    }

    async fn events(&self) -> Result<EventStream> {
        let events = self.adapter.events().await?;
        let adapter = self.adapter.clone();
        let mapped = events.filter_map(move |event| {
            let adapter = adapter.clone();
            async move { map_event(&adapter, event).await }
        });
        Ok(Box::pin(mapped))
    }

    async fn connect(&self, id: &str) -> Result<BtleLink> {
        let peripheral = match self.find_peripheral(id).await? {
            Some(peripheral) => peripheral,
            None => self
                .look_up(id)
                .await?
                .ok_or_else(|| SudsyError::DeviceNotFound(id.to_string()))?,
        };

        info!("Connecting to peripheral {}...", id);
        peripheral
            .connect()
            .await
            .map_err(|err| SudsyError::ConnectFailed {
                device: id.to_string(),
                stage: ConnectStage::Link,
                reason: err.to_string(),
            })?;

        Ok(BtleLink { peripheral })
    }
}

/// A connected btleplug peripheral.
#[derive(Debug, Clone)]
pub struct BtleLink {
    peripheral: Peripheral,
}

#[async_trait]
impl GattLink for BtleLink {
    async fn discover_services(&self) -> Result<Vec<GattService>> {
        self.peripheral.discover_services().await?;

        let services = self
            .peripheral
            .services()
            .into_iter()
            .map(|service| GattService {
                uuid: service.uuid,
                characteristics: service
                    .characteristics
                    .into_iter()
                    .map(|c| GattCharacteristic {
                        uuid: c.uuid,
                        write_with_response: c.properties.contains(CharPropFlags::WRITE),
                        write_without_response: c
                            .properties
                            .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
                    })
                    .collect(),
            })
            .collect();

        Ok(services)
    }

    async fn write(&self, target: &WriteTarget, data: &[u8]) -> Result<()> {
        let characteristic = self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.service_uuid == target.service_id && c.uuid == target.characteristic_id)
            .ok_or(SudsyError::NoWritableCharacteristic)?;

        let write_type = match target.kind {
            WriteKind::WithResponse => WriteType::WithResponse,
            WriteKind::WithoutResponse => WriteType::WithoutResponse,
        };

        self.peripheral.write(&characteristic, data, write_type).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }

    async fn local_name(&self) -> Option<String> {
        match self.peripheral.properties().await {
            Ok(properties) => properties.and_then(|p| p.local_name),
            Err(err) => {
                debug!("Could not query properties of {}: {:?}", self.peripheral.id(), err);
                None
            }
        }
    }
}
