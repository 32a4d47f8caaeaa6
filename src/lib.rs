pub mod buffer;
pub mod config;
pub mod db;
pub mod detect;
pub mod export;
pub mod models;
pub mod service;
pub mod tracker;

pub use config::Config;
pub use db::Database;
pub use detect::{Detector, WindowInfo};
#[cfg(feature = "probes")]
pub use detect::SystemDetector;
pub use models::{DailyTotal, Session, SessionRecord, TotalsQuery};
pub use service::Service;
