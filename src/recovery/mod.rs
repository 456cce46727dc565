pub mod change;
pub mod engine;
pub mod state;

pub use change::{Change, Content};
pub use engine::{RecoveryEngine, RecoveryRequest};
pub use state::RecoveryState;
