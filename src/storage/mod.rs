//! SQLite storage layer for health records.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Change and access logs kept on the device
//! - `user_version` schema tracking with embedded migrations
//!
//! # Submodules
//!
//! - [`records`] - Record types and the paging protocol
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Main SQLite storage implementation

pub mod migrations;
pub mod records;
pub mod schema;
pub mod sqlite;

pub use records::{
    HealthDataCategory, HeartRateSample, InsertMode, PageCursor, PageToken, Record, RecordData,
    RecordPage, RecordType,
};
pub use schema::{read_database_version, DATABASE_VERSION};
pub use sqlite::{
    AppInfo, HealthStorage, MutationContext, OperationType, PackageInventory, SharedStorage,
};
