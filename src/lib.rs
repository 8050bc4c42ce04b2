//! Warden - an encrypted, history-replayed secrets archive engine.
//!
//! # Quick Start
//!
//! ```
//! use warden::archive::Archive;
//! use warden::config::Config;
//!
//! let archive = Archive::new(Config::default());
//! let group = archive.create_group("Banking").unwrap();
//! let entry = group.create_entry().unwrap();
//! entry.set_property("username", "alice").unwrap();
//! assert_eq!(entry.properties().get("username").unwrap(), "alice");
//! ```

pub mod archive;
pub mod command;
pub mod comparator;
pub mod config;
pub mod credentials;
pub mod datasource;
pub mod descriptor;
pub mod entry;
pub mod envelope;
pub mod error;
pub mod flatten;
pub mod group;
pub mod idgen;
pub mod merger;
pub mod westley;
pub mod workspace;
