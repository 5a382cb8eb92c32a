pub mod destination;
pub mod itinerary;
pub mod package;
pub mod profile;
pub mod weather;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitCount {
    pub count: i64,
}
