//! Application session: pure state machine plus the controller that runs its
//! side effects.
//!
//! # Architecture
//!
//! ```text
//! egui update() ──dispatch(Event)──▶ SessionController
//!                                        │ SessionState::apply (pure)
//!                                        ▼
//!                                   Vec<Effect> ──▶ tokio tasks / Narrator
//!                                        ▲
//! egui update() ──poll()─── mpsc ◀───────┘  (MaterialLoaded, DwellElapsed, ...)
//! ```

pub mod controller;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::SessionController;
pub use state::{Effect, Event, ExerciseSession, Feedback, Material, SessionState, Step};
