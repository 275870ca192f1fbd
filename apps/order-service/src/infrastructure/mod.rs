//! Infrastructure Layer
//!
//! This module contains the adapters for the ports defined in the domain
//! layer. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**: Implement ports for external systems
//!   - `persistence/`: SQLite and in-memory order repositories, schema repair
//!
//! - **Driver Adapters (Inbound)**: Expose application to external world
//!   - `http/`: REST API controllers

pub mod http;
pub mod persistence;
