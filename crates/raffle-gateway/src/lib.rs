//! Raffle Gateway - HTTP interface for provably-fair raffle draws.
//!
//! Exposes the raffle lifecycle and its audit artefacts over REST.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     RAFFLE GATEWAY                         │
//! ├───────────────────────────────────────────────────────────┤
//! │  axum Router + TraceLayer                                  │
//! │      │                                                     │
//! │      ▼                                                     │
//! │  Arc<dyn RaffleApi>  (raffle-draw RaffleService)           │
//! │      │                 │                    │              │
//! │      ▼                 ▼                    ▼              │
//! │  JSON ledger      In-memory store      HTTP beacon         │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use raffle_gateway::{GatewayConfig, RaffleGatewayService};
//!
//! let service = RaffleGatewayService::new(GatewayConfig::from_env())?;
//! service.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

// Allow missing docs for internal items in development
#![allow(missing_docs)]

pub mod domain;
pub mod service;

pub use domain::{ApiError, ApiResult, ConfigError, GatewayConfig, GatewayError};
pub use service::{build_router, CloseRequest, RaffleGatewayService};
