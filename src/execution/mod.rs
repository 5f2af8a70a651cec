//! Query Execution Module
//!
//! This module runs split queries against a fragments endpoint as a stream of rounds.
//!
//! # Components
//!
//! - **SessionContext** - Per-session state carried between rounds (queries, cache, wake time)
//! - **StaticDataResolver** - Fetches and caches static data per correlation key
//! - **Streamer** - Drives rounds and joins dynamic rows with static data
//!
//! # Architecture
//!
//! A split query has a dynamic half that changes over time and a static half
//! that does not. Every round the dynamic half is re-executed; the static half
//! is materialized per dynamic row, fetched once per distinct binding of the
//! disjoint variables and served from the session cache afterwards.
//!
//! # Example
//!
//! ```ignore
//! use kairos::client::OxigraphClient;
//! use kairos::execution::{SessionDescription, Streamer};
//! use kairos::query::SparqlComposer;
//!
//! let description = SessionDescription::from_json(&json)?;
//! let projection = description.projection();
//! let mut context = description.into_context(&SparqlComposer::new())?;
//!
//! let streamer = Streamer::start(&client, "store", projection, |ms| println!("{} ms", ms))?;
//! let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);
//! streamer.run(&mut context, |row, round| println!("{} {:?}", round, row), stop_rx).await;
//! ```

pub mod resolver;
pub mod session;
pub mod streamer;

pub use resolver::StaticDataResolver;
pub use session::{SessionContext, SessionDescription, StaticQuery};
pub use streamer::{DurationCallback, RoundSummary, Streamer};
