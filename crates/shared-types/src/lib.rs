pub mod error;
pub mod config;

// Case intake domain
pub mod actor;
pub mod case;
pub mod evidence;
pub mod notification;
pub mod stats;

pub use error::*;
pub use config::*;

pub use actor::*;
pub use case::*;
pub use evidence::*;
pub use notification::*;
pub use stats::*;
