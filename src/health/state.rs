//! Readiness state machine.
//!
//! # States
//! - NotReady: initial, listener not yet bound
//! - Ready: listener bound, traffic accepted
//! - Draining: shutdown initiated, terminal
//!
//! # State Transitions
//! ```text
//! NotReady → Ready:    after successful bind
//! Ready    → Draining: on shutdown initiation
//! NotReady → Draining: shutdown before bind
//! ```
//!
//! # Design Decisions
//! - Single writer: only the owner of [`Readiness`] can change state
//! - Readers hold [`ReadinessHandle`] clones and never block
//! - State changes logged for observability

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Current readiness of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadinessState {
    NotReady = 0,
    Ready = 1,
    Draining = 2,
}

impl ReadinessState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ReadinessState::Ready,
            2 => ReadinessState::Draining,
            _ => ReadinessState::NotReady,
        }
    }
}

/// Writer side of the readiness flag. Deliberately not `Clone`.
#[derive(Debug)]
pub struct Readiness {
    state: Arc<AtomicU8>,
}

impl Readiness {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ReadinessState::NotReady as u8)),
        }
    }

    /// A read-only view for handlers.
    pub fn handle(&self) -> ReadinessHandle {
        ReadinessHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// NotReady → Ready. Returns `false` once draining has begun.
    pub fn mark_ready(&self) -> bool {
        let moved = self
            .state
            .compare_exchange(
                ReadinessState::NotReady as u8,
                ReadinessState::Ready as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if moved {
            tracing::debug!("Readiness: ready");
        }
        moved
    }

    /// Enter the terminal Draining state.
    pub fn begin_shutdown(&self) {
        let previous = self
            .state
            .swap(ReadinessState::Draining as u8, Ordering::SeqCst);
        tracing::debug!(previous = ?ReadinessState::from_u8(previous), "Readiness: draining");
    }

    pub fn state(&self) -> ReadinessState {
        ReadinessState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the readiness flag.
#[derive(Debug, Clone)]
pub struct ReadinessHandle {
    state: Arc<AtomicU8>,
}

impl ReadinessHandle {
    pub fn state(&self) -> ReadinessState {
        ReadinessState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ReadinessState::Ready
    }
}
