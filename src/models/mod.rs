pub mod block;
pub mod git;
pub mod message;
pub mod ratelimit;
pub mod session;

pub use block::{BlockUsage, CcusageBlock, CcusageOutput};
pub use git::GitInfo;
pub use message::{TokenUsage, TranscriptLine};
pub use ratelimit::{RateLimitWindow, RateLimits};
pub use session::{ClaudeSession, ContextWindow, CurrentUsage, SessionCost, SessionModel, SessionWorkspace};
