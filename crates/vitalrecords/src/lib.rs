//! `vitalrecords` - Hospital birth and death registration records
//!
//! This library keeps the birth and death collections in a local key-value
//! store and derives the dashboard, notification and search views from them.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod registry;
pub mod search;
pub mod storage;
pub mod views;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{BirthRecord, DeathRecord, Origin, Profile, ProfileKey, Record, RecordId};
pub use registry::{ChangeEvent, ChangeKind, ChangeScope, Registry, Snapshot, SubscriptionId};
pub use search::search;
pub use storage::{KeyValueStore, MemoryStorage, Storage, StorageStats};
pub use views::{
    all_profiles, count_records, dashboard_stats, format_relative_time, recent_activity,
    recent_notifications, ActivityEntry, DashboardStats, NotificationEntry, TimeStyle,
};
