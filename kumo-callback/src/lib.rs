//! KumoMTA callback - suppress permanently bouncing recipients.
//!
//! KumoMTA posts a feedback record for each delivery failure. Records with
//! an enhanced status class of 5 mark the recipient as Do Not Contact in
//! the host application; everything else is acknowledged and ignored.
//!
//! ## Architecture
//!
//! ```text
//! KumoMTA → Web Server → feedback::classify → SuppressionList → host
//! ```

pub mod config;
pub mod feedback;
pub mod process;
pub mod suppression;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use feedback::{classify, parse, Classification, FeedbackError, FeedbackPayload};
pub use process::{apply, handle_webhook, Outcome};
pub use suppression::{MemorySuppressionList, Publisher, ReasonCode, SuppressionList};
pub use web::AppState;
