// Snapshot management for stepping back through a recorded schedule

use crate::command::Command;
use crate::interpreter::engine::RunResult;
use crate::interpreter::errors::EngineError;
use crate::interpreter::step::StepEvent;
use crate::memory::Heap;

/// Snapshot of execution state after one scheduled step
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub command: Command,
    pub heap: Heap,
    /// The step that produced this state; `None` for the initial state
    pub event: Option<StepEvent>,
    /// Number of steps taken to reach this state
    pub step: usize,
    /// Set on the final snapshot once the run has ended
    pub outcome: Option<RunResult>,
}

impl Snapshot {
    pub fn new(command: Command, heap: Heap, event: Option<StepEvent>, step: usize) -> Self {
        Snapshot {
            command,
            heap,
            event,
            step,
            outcome: None,
        }
    }

    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // Rough estimate: a boxed node per constructor, two words per cell
        let command_size = self.command.size() * 48;
        let heap_size = self.heap.len() * 16;
        let event_size = self.event.as_ref().map_or(0, |e| 32 + e.path.len());

        command_size + heap_size + event_size + 64
    }
}

/// Manages execution history for reverse stepping
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), EngineError> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(EngineError::SnapshotLimitExceeded {
                current: self.current_memory,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// The most recent snapshot, for attaching the final outcome
    pub fn last_mut(&mut self) -> Option<&mut Snapshot> {
        self.snapshots.last_mut()
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Step events recorded so far, oldest first
    pub fn events(&self) -> impl Iterator<Item = &StepEvent> {
        self.snapshots.iter().filter_map(|s| s.event.as_ref())
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_respects_memory_limit() {
        let snapshot = Snapshot::new(Command::Pure(0), Heap::new(), None, 0);
        let size = snapshot.estimated_size();
        let mut manager = SnapshotManager::new(size * 2);
        manager.push(snapshot.clone()).unwrap();
        manager.push(snapshot.clone()).unwrap();
        assert_eq!(
            manager.push(snapshot),
            Err(EngineError::SnapshotLimitExceeded {
                current: size * 2,
                limit: size * 2
            })
        );
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.memory_usage(), size * 2);
    }
}
