//! Terminal registry

use playmeter_api::TerminalState;
use playmeter_util::{TerminalId, Timestamp};
use thiserror::Error;
use tracing::warn;

/// Whether a terminal is in use, and since when
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Idle,
    Occupied { started_at: Timestamp },
}

/// A rentable gaming station
#[derive(Debug, Clone)]
pub struct Terminal {
    id: TerminalId,
    name: String,
    occupancy: Occupancy,
}

impl Terminal {
    pub fn new(id: TerminalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            occupancy: Occupancy::Idle,
        }
    }

    pub fn id(&self) -> TerminalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self.occupancy, Occupancy::Occupied { .. })
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        match self.occupancy {
            Occupancy::Idle => None,
            Occupancy::Occupied { started_at } => Some(started_at),
        }
    }

    pub fn state(&self) -> TerminalState {
        match self.occupancy {
            Occupancy::Idle => TerminalState::Idle,
            Occupancy::Occupied { .. } => TerminalState::Occupied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown terminal: {0}")]
    UnknownTerminal(TerminalId),

    #[error("Terminal {0} is already occupied")]
    AlreadyOccupied(TerminalId),

    #[error("Terminal {0} is not occupied")]
    NotOccupied(TerminalId),
}

/// Fixed, ordered set of terminals. Occupancy is mutated only by the engine.
#[derive(Debug, Clone, Default)]
pub struct TerminalRegistry {
    terminals: Vec<Terminal>,
}

impl TerminalRegistry {
    pub fn new(terminals: impl IntoIterator<Item = (TerminalId, String)>) -> Self {
        let mut registry = Self::default();
        for (id, name) in terminals {
            if registry.get(id).is_some() {
                warn!(terminal_id = %id, "Duplicate terminal id ignored");
                continue;
            }
            registry.terminals.push(Terminal::new(id, name));
        }
        registry
    }

    pub fn get(&self, id: TerminalId) -> Option<&Terminal> {
        self.terminals.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TerminalId) -> Result<&mut Terminal, RegistryError> {
        self.terminals
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RegistryError::UnknownTerminal(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Terminal> {
        self.terminals.iter()
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    pub fn occupied_count(&self) -> usize {
        self.terminals.iter().filter(|t| t.is_occupied()).count()
    }

    /// Mark a terminal occupied. An occupied terminal keeps its original start.
    pub(crate) fn set_occupied(
        &mut self,
        id: TerminalId,
        started_at: Timestamp,
    ) -> Result<(), RegistryError> {
        let terminal = self.get_mut(id)?;
        if terminal.is_occupied() {
            return Err(RegistryError::AlreadyOccupied(id));
        }
        terminal.occupancy = Occupancy::Occupied { started_at };
        Ok(())
    }

    /// Mark a terminal idle, returning the start time that was cleared
    pub(crate) fn set_idle(&mut self, id: TerminalId) -> Result<Timestamp, RegistryError> {
        let terminal = self.get_mut(id)?;
        match terminal.occupancy {
            Occupancy::Idle => Err(RegistryError::NotOccupied(id)),
            Occupancy::Occupied { started_at } => {
                terminal.occupancy = Occupancy::Idle;
                Ok(started_at)
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        for terminal in &mut self.terminals {
            terminal.occupancy = Occupancy::Idle;
        }
    }
}
