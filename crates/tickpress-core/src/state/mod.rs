// Tickpress State
// In-memory settings used by the sync engine and the owned session object

mod runtime;
mod session;

pub use runtime::RuntimeState;
pub use session::{Applied, Session};
