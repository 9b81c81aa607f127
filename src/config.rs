//! Server configuration

use clap::Parser;
use std::net::SocketAddr;

use crate::pipeline::PolylineOptions;
use crate::remote::RemoteIndexConfig;

/// Polyline point-in-polygon server
#[derive(Debug, Clone, Parser)]
#[command(name = "pip-polyline", version, about)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "PIP_POLYLINE_LISTEN_ADDR", default_value = "0.0.0.0:8181")]
    pub listen_addr: SocketAddr,

    /// Base URL of the upstream point-in-polygon service
    #[arg(long, env = "PIP_POLYLINE_UPSTREAM_URL", default_value = "http://localhost:8080")]
    pub upstream_url: String,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "PIP_POLYLINE_UPSTREAM_TIMEOUT_SECS", default_value = "10")]
    pub upstream_timeout_secs: u64,

    /// Seconds an upstream 503 keeps the service unavailable before the
    /// upstream is checked again
    #[arg(long, env = "PIP_POLYLINE_UPSTREAM_INDEXING_RECHECK_SECS", default_value = "5")]
    pub upstream_indexing_recheck_secs: u64,

    /// Allow `format=geojson` responses
    #[arg(long, env = "PIP_POLYLINE_ALLOW_GEOJSON")]
    pub allow_geojson: bool,

    /// Maximum number of coordinates accepted in a decoded polyline
    #[arg(long, env = "PIP_POLYLINE_MAX_COORDS", default_value = "500")]
    pub max_coords: usize,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "PIP_POLYLINE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8181)),
            upstream_url: RemoteIndexConfig::default().base_url,
            upstream_timeout_secs: RemoteIndexConfig::default().timeout_secs,
            upstream_indexing_recheck_secs: RemoteIndexConfig::default().indexing_recheck_secs,
            allow_geojson: false,
            max_coords: PolylineOptions::default().max_coords,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn polyline_options(&self) -> PolylineOptions {
        PolylineOptions {
            allow_geojson: self.allow_geojson,
            max_coords: self.max_coords,
        }
    }

    pub fn remote_index_config(&self) -> RemoteIndexConfig {
        RemoteIndexConfig {
            base_url: self.upstream_url.clone(),
            timeout_secs: self.upstream_timeout_secs,
            indexing_recheck_secs: self.upstream_indexing_recheck_secs,
        }
    }
}
