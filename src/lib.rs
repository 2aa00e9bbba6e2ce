//! # MCP Server for Vectra AI investigations
//!
//! This library provides an MCP (Model Context Protocol) server that lets AI
//! agents and automation scripts work investigation assignments on a Vectra AI
//! platform through a standardized protocol.
//!
//! ## Features
//!
//! - List assignments, optionally by analyst, resolved state or creation time
//! - Look up assignments by ID or by the hosts/accounts they cover
//! - Create and delete assignments
//! - Attach investigation notes to hosts and accounts
//! - Mark detections as fixed or not fixed
//!
//! ## Usage
//!
//! The server is typically run as a standalone binary that communicates
//! over stdio with MCP clients. Connection settings come from `VECTRA_*`
//! environment variables, see [`vectra::config::VectraConfig`]; logging settings
//! are read by [`logging::LoggingConfig`].

pub mod logging;
pub mod server;
pub mod tools;
pub mod vectra;

pub use logging::LoggingConfig;
pub use server::VectraToolsServer;
pub use tools::{InvestigationTools, ToolError};
pub use vectra::{
    client::{InvestigationApi, VectraClient},
    config::VectraConfig,
    error::VectraApiError,
};
