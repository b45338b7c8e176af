//! SAOImage DS9 driver
//!
//! Structure:
//! - `command.rs`: file layout of a composite job and the DS9 argument grammar
//! - `session.rs`: one DS9 child process, its settle wait and termination
//! - `error.rs`: Error types

pub mod command;
pub mod error;
pub mod session;

// Re-exports for convenience
pub use command::{band_fits_path, export_path, CompositeJob};
pub use error::Ds9Error;
pub use session::{Ds9Session, FileStamp, SettleOutcome};
