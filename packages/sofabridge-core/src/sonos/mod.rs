//! Sonos speaker control and discovery.
//!
//! # Module Structure
//!
//! - `types` - Players, zones, snapshots and commands
//! - `services` - UPnP service definitions (URNs, paths)
//! - `traits` - Collaborator seams and speaker read traits
//! - `client` - `SonosClientImpl`, the SOAP-backed implementation
//! - `directory` - `SonosDirectory`, live topology snapshots and room lookup
//! - `zone_groups` - ZoneGroupState parsing and retrieval
//! - `didl` - DIDL-Lite formatting and browse result parsing
//! - `playback` - AVTransport commands
//! - `volume` - Rendering control (volume, mute, equalizer)
//! - `grouping` - Join/leave
//! - `content` - ContentDirectory browsing and library indexing
//! - `discovery` - SSDP discovery
//! - `soap` - Low-level SOAP protocol implementation
//! - `utils` - Shared utility functions

pub mod client;
pub(crate) mod content;
pub mod didl;
pub mod directory;
pub mod discovery;
pub(crate) mod grouping;
pub(crate) mod playback;
pub mod services;
pub mod soap;
pub mod traits;
pub mod types;
pub mod utils;
pub(crate) mod volume;
pub(crate) mod zone_groups;

pub use services::SonosService;

pub use traits::{
    CommandGateway, MediaLibrary, PlayerDirectory, SonosClient, SonosDirectoryClient,
    SonosDiscovery, SonosStatus, SonosTopology,
};

pub use client::SonosClientImpl;
pub use directory::SonosDirectory;
