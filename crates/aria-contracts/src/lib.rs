// Public contracts for ARIA
// DB/wire-agnostic DTOs shared by every crate in the workspace.

pub mod agent_config;
pub mod delivery;
pub mod goal;
pub mod insight;
pub mod job;
pub mod usage;
pub mod user;

pub use agent_config::*;
pub use delivery::*;
pub use goal::*;
pub use insight::*;
pub use job::*;
pub use usage::*;
pub use user::*;
