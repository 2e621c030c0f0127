//! Session lifecycle state machine using rust-fsm.
//!
//! Tracks the provider-side session lifecycle explicitly instead of
//! deriving it from whatever tokens happen to be on disk.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │    SignedOut    │ (initial)
//! └───┬─────────┬───┘
//!     │         │ RestoreRequested
//!     │         ▼
//!     │  ┌─────────────────┐  RestoredExpired   ┌─────────────────┐
//!     │  │    Restoring    │ ─────────────────► │   Refreshing    │
//!     │  └───┬─────────┬───┘                    └───┬─────────┬───┘
//!     │      │         │ RestoredNone              │         │
//!     │      │         ▼                RefreshFailed        │ RefreshSucceeded
//!     │      │      SignedOut                      ▼         ▼
//!     │      │ RestoredActive               SignedOut     SignedIn
//!     │      ▼
//!     │   SignedIn ◄── SignInSucceeded ─┐
//!     │                                 │
//!     │ SignInRequested        ┌────────┴────────┐
//!     └──────────────────────► │    SigningIn    │ ── SignInFailed ──► SignedOut
//!                              └─────────────────┘
//!
//! SignedIn ── SignOutRequested ──► SigningOut ── SignOutCompleted ──► SignedOut
//! SignedIn ── TokenExpired ──────► Refreshing
//! ```

use rust_fsm::*;

// Defines the FSM with rust-fsm's declarative macro. This generates a
// module `session_machine` with:
// - session_machine::State (enum)
// - session_machine::Input (enum)
// - session_machine::StateMachine (type alias)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(SignedOut)

    SignedOut => {
        RestoreRequested => Restoring,
        SignInRequested => SigningIn
    },
    Restoring => {
        RestoredActive => SignedIn,
        RestoredExpired => Refreshing,
        RestoredNone => SignedOut
    },
    SigningIn => {
        SignInSucceeded => SignedIn,
        SignInFailed => SignedOut
    },
    SignedIn => {
        RestoreRequested => Restoring,
        SignInRequested => SigningIn,
        TokenExpired => Refreshing,
        SignOutRequested => SigningOut
    },
    Refreshing => {
        RefreshSucceeded => SignedIn,
        RefreshFailed => SignedOut
    },
    SigningOut => {
        SignOutCompleted => SignedOut
    }
}

// Re-export the generated types with clearer names
pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session lifecycle state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No active session.
    SignedOut,
    /// Checking for a persisted session on startup.
    Restoring,
    /// Password sign-in in flight.
    SigningIn,
    /// Active session.
    SignedIn,
    /// Refreshing an expired token.
    Refreshing,
    /// Sign-out in flight.
    SigningOut,
}

impl SessionState {
    /// Returns true if there is an active session (SignedIn state only).
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::SignedIn)
    }

    /// Returns true if the state is a transient/in-progress state.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionState::Restoring
                | SessionState::SigningIn
                | SessionState::Refreshing
                | SessionState::SigningOut
        )
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::SignedOut => SessionState::SignedOut,
            SessionMachineState::Restoring => SessionState::Restoring,
            SessionMachineState::SigningIn => SessionState::SigningIn,
            SessionMachineState::SignedIn => SessionState::SignedIn,
            SessionMachineState::Refreshing => SessionState::Refreshing,
            SessionMachineState::SigningOut => SessionState::SigningOut,
        }
    }
}
