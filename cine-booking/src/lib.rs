pub mod expiry;
pub mod models;
pub mod orchestrator;
pub mod session;

pub use expiry::SessionRegistry;
pub use models::{Booking, BookingStatus, BookingStore, BookedConcession, PaymentStatus};
pub use orchestrator::{BookingError, BookingOrchestrator};
pub use session::{
    BookingSession, ConcessionUpdate, SessionError, SessionState, SessionView, ShowContext,
};
