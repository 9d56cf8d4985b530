//! Ephemeral record store and supporting pieces for the Beacon relay.
//!
//! Game clients report "found server" events; each one becomes a
//! [`Record`] that lives in the [`RecordStore`] until its time-to-live
//! elapses or it is explicitly removed by job ID.
//!
//! # Modules
//!
//! - [`config`] -- Store configuration ([`StoreConfig`]) and the
//!   environment lookup helpers shared by the other crates.
//! - [`record`] -- [`Candidate`] input, the stored [`Record`], and
//!   [`RecordId`].
//! - [`store`] -- The [`RecordStore`]: insert, query, delete, sweep, and
//!   running [`Stats`].
//! - [`sweeper`] -- The background [`Sweeper`] task that expires records
//!   on a fixed period.
//! - [`uptime`] -- Human-readable uptime rendering.
//! - [`value`] -- Parsing and formatting of rate strings like `$2.2M/s`.
//!
//! [`StoreConfig`]: config::StoreConfig
//! [`Candidate`]: record::Candidate
//! [`Record`]: record::Record
//! [`RecordId`]: record::RecordId
//! [`RecordStore`]: store::RecordStore
//! [`Stats`]: store::Stats
//! [`Sweeper`]: sweeper::Sweeper

pub mod config;
pub mod record;
pub mod store;
pub mod sweeper;
pub mod uptime;
pub mod value;

pub use config::{ConfigError, StoreConfig};
pub use record::{Candidate, Record, RecordId};
pub use store::{RecordStore, Stats};
pub use sweeper::Sweeper;
