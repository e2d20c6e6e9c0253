pub mod local_sessions;
pub mod session_tracker;

pub use local_sessions::*;
pub use session_tracker::*;
