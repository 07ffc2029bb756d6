//! Shared building blocks: identifiers, the [`Outcome`] result algebra,
//! paging, clocks and the request session.

pub mod clock;
pub mod outcome;
pub mod paging;
pub mod session;
pub mod types;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock, system_clock};
pub use outcome::{Failure, Outcome, combine};
pub use paging::{PageRequest, PagedResult};
pub use session::UserSession;
pub use types::EntityId;
