//! Bring-up states of a volume session.

use log::debug;
use std::fmt;

use super::fat_type::FATType;

/// The state of a volume session.
///
/// A session moves through `Unloaded → BootLoaded → Classified → FatValidated →
/// FsInfoValidated → Ready`. A failed validation moves it to `Failed`, from which no directory
/// operation is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unloaded,
    BootLoaded,
    Classified(FATType),
    FatValidated,
    FsInfoValidated,
    Ready,
    Failed,
}

impl SessionState {
    /// Moves to `next`.
    pub fn advance(&mut self, next: SessionState) {
        debug!("Session state: {self} -> {next}");
        *self = next;
    }

    /// Checks if directory operations are allowed.
    pub fn is_ready(&self) -> bool {
        *self == SessionState::Ready
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unloaded => write!(f, "unloaded"),
            SessionState::BootLoaded => write!(f, "boot sector loaded"),
            SessionState::Classified(fat_type) => write!(f, "classified as {fat_type}"),
            SessionState::FatValidated => write!(f, "FAT validated"),
            SessionState::FsInfoValidated => write!(f, "FSInfo validated"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}
