mod config;
mod constants;
mod errors;
mod keys;
mod log;
mod metrics;
mod notifier;
pub mod utils;

pub use config::*;
pub use constants::OFFSET_NEWEST;
pub use constants::OFFSET_OLDEST;
pub use errors::*;
pub use keys::*;
pub use log::*;
pub use metrics::*;
pub use notifier::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
