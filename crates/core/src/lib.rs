#![warn(
    clippy::checked_conversions,
    clippy::panic,
    clippy::panic_in_result_fn,
    trivial_casts,
    trivial_numeric_casts,
    rust_2018_idioms,
    unused_lifetimes,
    unused_import_braces,
    unused_qualifications
)]

pub use amount::{DonationAmount, BASE_UNITS_PER_DISPLAY_UNIT, DISPLAY_UNIT};
pub use error::{Error, ErrorCategory, Stage};
pub use feedback::{ChannelSink, Feedback, FeedbackSink, TracingSink};
pub use pool::{parse_address, PoolGateway, PoolStatus, PoolStatusService, StatusError};
pub use signing::{Availability, SigningSession, SigningSessionProvider};
pub use workflow::{Action, Confirmed, Refresh, Timeouts, WorkflowEngine, WorkflowState};

pub mod amount;
pub mod error;
pub mod feedback;
pub mod pool;
pub mod signing;
pub mod workflow;
