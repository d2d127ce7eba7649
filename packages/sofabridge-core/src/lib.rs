//! SofaBridge Core - zone grouping and playback control for Sonos speakers.
//!
//! This crate turns HTTP requests into UPnP/SOAP commands against a Sonos
//! household. The standalone server in `apps/server` wraps it in a binary.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`sonos`]: Speaker discovery, topology snapshots and SOAP commands
//! - [`services`]: Group reconciliation, playback, library and shortcuts
//! - [`media`]: Music-service URI translation
//! - [`remote`]: Universal-remote request validation
//! - [`api`]: HTTP router and server startup
//! - [`bootstrap`]: Composition root
//! - [`error`]: Centralized error types
//!
//! # Collaborator Seams
//!
//! Services only see three traits, so they can be driven by in-memory fakes:
//!
//! - [`PlayerDirectory`](sonos::PlayerDirectory): Household topology and room lookup
//! - [`CommandGateway`](sonos::CommandGateway): Sending one command to one player
//! - [`MediaLibrary`](sonos::MediaLibrary): Browsing favorites, playlists and the queue

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod media;
pub mod protocol_constants;
pub mod remote;
pub mod services;
pub mod sonos;

// Re-export commonly used types at the crate root
pub use config::{Config, SpotifyConfig};
pub use error::{DiscoveryResult, ErrorCode, SoapResult, ZoneError, ZoneResult};

// Re-export Sonos types
pub use sonos::types::{
    Command, DesiredGrouping, PlayerHandle, PlayerId, ZoneSnapshot, ZoneTopologySnapshot,
};
pub use sonos::{CommandGateway, MediaLibrary, PlayerDirectory, SonosClientImpl, SonosDirectory};

// Re-export service types
pub use services::{ReconcileOutcome, ReconcileReport, ZoneReconciler};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_services, BootstrappedServices};

// Re-export API types
pub use api::{start_server, AppState, ServerError};
