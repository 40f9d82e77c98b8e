use serde::{Deserialize, Serialize};

/// Which root a certificate store is opened under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreScope {
    Machine,
    User,
}

impl StoreScope {
    /// Scope selected by the `--machine` switch.
    pub fn from_machine_flag(machine: bool) -> Self {
        if machine { Self::Machine } else { Self::User }
    }
}

impl std::fmt::Display for StoreScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Machine => write!(f, "LocalMachine"),
            Self::User => write!(f, "CurrentUser"),
        }
    }
}
