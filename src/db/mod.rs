pub mod db;
pub mod devicedb;
pub mod jobdb;
pub mod paymentdb;
pub mod pointsdb;
pub mod taskdb;
pub mod userdb;

#[cfg(test)]
pub mod memory;

use pointsdb::PointsExt;
use taskdb::TaskExt;

/// The transactional surface the core services run against.
pub trait MarketStore: TaskExt + PointsExt + Send + Sync {}

impl<T> MarketStore for T where T: TaskExt + PointsExt + Send + Sync {}
