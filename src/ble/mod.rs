//! # Bluetooth Low Energy Seam
//!
//! The connection manager talks to Bluetooth through two traits so the same
//! state machine runs against the platform stack ([`btle`]) or an in-memory
//! double in tests.
//!
//! ```text
//! ┌─────────────────┐  connect(id)  ┌──────────────┐
//! │   BleAdapter    │ ────────────► │   GattLink   │
//! │ scan / events   │               │ services     │
//! │ power state     │               │ write chunk  │
//! └─────────────────┘               └──────────────┘
//! ```
//!
//! ## Writable Characteristic Selection
//!
//! Services are walked in discovery order, then their characteristics; the
//! first one flagged write-with-response or write-without-response wins.
//! Its service id and its own id are kept together as a [`WriteTarget`] and
//! used as a pair for every write. Pinned candidates, when configured, are
//! tried first.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

pub mod btle;

pub use btle::{BtleAdapter, BtleLink};

// ============================================================================
// DEVICES AND EVENTS
// ============================================================================

/// A printer seen during a scan, or the persisted record of one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Stable BLE address or platform identifier.
    pub id: String,
    /// Advertised local name.
    pub name: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// Name for display, falling back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Power state of the local Bluetooth adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdapterState {
    PoweredOn,
    PoweredOff,
    #[default]
    Unknown,
}

impl AdapterState {
    /// Whether an operation may be attempted. `Unknown` is given the benefit
    /// of the doubt since some platforms never report power state.
    pub fn is_usable(self) -> bool {
        self != AdapterState::PoweredOff
    }
}

/// Unsolicited notification from the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// An advertisement was seen (new device or updated properties).
    Discovered(DeviceDescriptor),
    /// The stack dropped the link to this device id.
    Disconnected(String),
    /// Bluetooth was switched on or off.
    StateChanged(AdapterState),
}

/// Stream of adapter events.
pub type EventStream = Pin<Box<dyn Stream<Item = AdapterEvent> + Send>>;

// ============================================================================
// GATT MODEL
// ============================================================================

/// A characteristic as reported by service discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub uuid: Uuid,
    pub write_with_response: bool,
    pub write_without_response: bool,
}

impl GattCharacteristic {
    pub fn is_writable(&self) -> bool {
        self.write_with_response || self.write_without_response
    }
}

/// A primary service and its characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattService {
    pub uuid: Uuid,
    pub characteristics: Vec<GattCharacteristic>,
}

/// How each chunk is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Wait for the peripheral to acknowledge every chunk.
    WithResponse,
    /// Fire and forget; pacing is the only flow control.
    WithoutResponse,
}

/// The (service, characteristic) pair print data is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteTarget {
    pub service_id: Uuid,
    pub characteristic_id: Uuid,
    pub kind: WriteKind,
}

impl WriteTarget {
    fn for_characteristic(service: &GattService, characteristic: &GattCharacteristic) -> Self {
        let kind = if characteristic.write_with_response {
            WriteKind::WithResponse
        } else {
            WriteKind::WithoutResponse
        };
        Self {
            service_id: service.uuid,
            characteristic_id: characteristic.uuid,
            kind,
        }
    }
}

/// A known service/characteristic pair for a specific printer family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicPin {
    pub service: Uuid,
    pub characteristic: Uuid,
}

/// Pick the characteristic print data goes to.
///
/// Pinned candidates are tried in order first; a pin only matches when the
/// characteristic is present under that service and writable. Otherwise the
/// first writable characteristic in discovery order is chosen.
///
/// ## Example
///
/// ```
/// use sudsy::ble::{select_write_target, GattCharacteristic, GattService, WriteKind};
/// use uuid::Uuid;
///
/// let services = vec![GattService {
///     uuid: Uuid::from_u128(0x18F0),
///     characteristics: vec![
///         GattCharacteristic { uuid: Uuid::from_u128(0x2AF0), write_with_response: false, write_without_response: false },
///         GattCharacteristic { uuid: Uuid::from_u128(0x2AF1), write_with_response: false, write_without_response: true },
///     ],
/// }];
///
/// let target = select_write_target(&services, &[]).unwrap();
/// assert_eq!(target.characteristic_id, Uuid::from_u128(0x2AF1));
/// assert_eq!(target.kind, WriteKind::WithoutResponse);
/// ```
pub fn select_write_target(
    services: &[GattService],
    pins: &[CharacteristicPin],
) -> Option<WriteTarget> {
    for pin in pins {
        let pinned = services
            .iter()
            .filter(|s| s.uuid == pin.service)
            .find_map(|s| {
                s.characteristics
                    .iter()
                    .find(|c| c.uuid == pin.characteristic && c.is_writable())
                    .map(|c| WriteTarget::for_characteristic(s, c))
            });
        if pinned.is_some() {
            return pinned;
        }
    }

    services.iter().find_map(|s| {
        s.characteristics
            .iter()
            .find(|c| c.is_writable())
            .map(|c| WriteTarget::for_characteristic(s, c))
    })
}

// ============================================================================
// BACKEND TRAITS
// ============================================================================

/// An open connection to one peripheral.
#[async_trait]
pub trait GattLink: Send + Sync + 'static {
    /// Discover services and report their characteristics.
    async fn discover_services(&self) -> Result<Vec<GattService>>;

    /// Write one chunk and wait for the stack to finish with it.
    async fn write(&self, target: &WriteTarget, data: &[u8]) -> Result<()>;

    /// Close the link.
    async fn disconnect(&self) -> Result<()>;

    /// The name the peripheral advertises, if the stack knows it.
    async fn local_name(&self) -> Option<String> {
        None
    }
}

/// The local Bluetooth adapter.
#[async_trait]
pub trait BleAdapter: Send + Sync + 'static {
    type Link: GattLink;

    /// Current power state.
    async fn state(&self) -> AdapterState;

    async fn start_scan(&self) -> Result<()>;

    async fn stop_scan(&self) -> Result<()>;

    /// A fresh subscription to adapter events.
    async fn events(&self) -> Result<EventStream>;

    /// Open a link to the device with this id.
    ///
    /// Implementations may run a short discovery if the id is not currently
    /// known to the stack, and fail with `DeviceNotFound` if it stays absent.
    async fn connect(&self, id: &str) -> Result<Self::Link>;
}
