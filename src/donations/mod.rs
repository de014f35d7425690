//! Donation recording subsystem.

pub mod recorder;
pub mod types;

pub use recorder::DonationRecorder;
pub use types::{Donation, DonationStatus};
