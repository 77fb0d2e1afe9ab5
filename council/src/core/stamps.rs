//! Source of timestamps and identifiers for engine transforms.
//!
//! The engine never reads the clock or a random source directly; it asks a
//! [`Stamps`] implementation so transforms stay deterministic under test.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub trait Stamps {
    fn now(&self) -> DateTime<Utc>;
    fn new_id(&self) -> String;
}

/// Wall clock + random v4 uuids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStamps;

impl Stamps for SystemStamps {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
