//! pip-polyline core
//!
//! Decodes encoded polylines and answers "which places does this path
//! cross?" against a pluggable spatial index.

pub mod config;
pub mod error;
pub mod filter;
pub mod geojson;
pub mod pipeline;
pub mod polyline;
pub mod remote;
pub mod results;
pub mod server;
pub mod spr;
pub mod telemetry;
pub mod traits;
