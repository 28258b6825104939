//! The rate-limited, pausable, cancellable stream transfer engine.
//!
//! [`Transfer`] copies bytes from a source [`streamrelay_io::Stream`] to a
//! sink `Stream`, reporting progress through a user callback and obeying an
//! optional byte-per-second rate limit (see [`governor::RateGovernor`]).
//! Both a blocking ([`Transfer::save_sync`]) and a non-blocking, readiness-
//! driven ([`Transfer::save_async`]) way to drive the copy share the same
//! [`controller::Controller`] state machine.

mod assert;
mod controller;
mod error;
mod flags;
mod governor;
mod reporter;
mod transfer;

pub use error::{CallbackState, TransferError};
pub use flags::TransferHandle;
pub use governor::{BLOCK_MAX, GovernorTick, RateGovernor};
pub use reporter::Report;
pub use transfer::Transfer;
