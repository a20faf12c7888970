pub mod error;
pub mod extract;
pub mod interests;
pub mod middleware;
pub mod notifications;
pub mod router;
pub mod state;

pub use router::router;
pub use state::{AppState, AppStateInner};
