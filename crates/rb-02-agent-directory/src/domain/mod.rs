pub mod agent;
pub mod capability;

pub use agent::{Agent, INITIAL_ACCURACY_BPS, MAX_ACCURACY_BPS};
pub use capability::ReputationCapability;
