pub mod block;
pub mod chain;
pub mod state;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use state::*;
pub use validation::*;
