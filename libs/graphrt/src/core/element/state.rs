use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of an element: INIT → RUN ↔ PAUSE → STOP (terminal).
/// Only the owning [`crate::core::graph::Graph`] transitions an element's
/// state; worker threads only ever read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadStatus {
    Init,
    Run,
    Pause,
    Stop,
}

impl ThreadStatus {
    fn to_u8(self) -> u8 {
        match self {
            ThreadStatus::Init => 0,
            ThreadStatus::Run => 1,
            ThreadStatus::Pause => 2,
            ThreadStatus::Stop => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => ThreadStatus::Init,
            1 => ThreadStatus::Run,
            2 => ThreadStatus::Pause,
            _ => ThreadStatus::Stop,
        }
    }
}

impl std::fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadStatus::Init => write!(f, "INIT"),
            ThreadStatus::Run => write!(f, "RUN"),
            ThreadStatus::Pause => write!(f, "PAUSE"),
            ThreadStatus::Stop => write!(f, "STOP"),
        }
    }
}

/// Atomic holder for [`ThreadStatus`], read on every worker loop iteration.
pub(crate) struct AtomicThreadStatus(AtomicU8);

impl AtomicThreadStatus {
    pub(crate) fn new(initial: ThreadStatus) -> Self {
        Self(AtomicU8::new(initial.to_u8()))
    }

    pub(crate) fn load(&self) -> ThreadStatus {
        ThreadStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, status: ThreadStatus) {
        self.0.store(status.to_u8(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_atomic() {
        let s = AtomicThreadStatus::new(ThreadStatus::Init);
        assert_eq!(s.load(), ThreadStatus::Init);
        s.store(ThreadStatus::Run);
        assert_eq!(s.load(), ThreadStatus::Run);
        s.store(ThreadStatus::Pause);
        assert_eq!(s.load(), ThreadStatus::Pause);
        s.store(ThreadStatus::Stop);
        assert_eq!(s.load(), ThreadStatus::Stop);
    }
}
