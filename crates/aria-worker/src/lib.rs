// Background Job Runner, Proactive Router, and live-stream hub for ARIA.
//
// Everything here runs as Tokio async tasks inside one process: a
// `Scheduler` ticking one interval per job, a `ProactiveRouter` turning
// job output into deliveries, and a `StreamHub` fanning live-stream
// messages out to connected WebSocket sessions.

pub mod business_hours;
pub mod config;
pub mod jobs;
pub mod router;
pub mod scheduler;
pub mod ws_hub;

pub use business_hours::{is_business_hours, is_weekly_digest_window, resolve_timezone, week_start};
pub use config::JobRunnerConfig;
pub use router::ProactiveRouter;
pub use scheduler::{ScheduledJob, Scheduler};
pub use ws_hub::{StreamHub, StreamMessage, StreamSender};
