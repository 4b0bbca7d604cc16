// Core algorithm exports
pub mod distance;
pub mod facilities;
pub mod intake;
pub mod ranker;
pub mod scoring;
pub mod timeline;

pub use distance::{distance_km, eta_minutes, haversine_distance};
pub use facilities::{find_nearest, is_eligible, rank_eligible};
pub use intake::{validate_casualty, validate_facility, RecordError};
pub use ranker::{Ranker, RankingResult};
pub use scoring::{calculate_urgency_score, WeightsError};
pub use timeline::assess;
