// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keyboard focus trap.
//!
//! A trap confines Tab navigation to a container: Tab on the last focusable
//! descendant wraps to the first, Shift+Tab on the first wraps to the last.
//! Every other key press is left to the host.
//!
//! The first and last focusable descendants are captured when the trap is
//! installed and are not recomputed if the container changes afterwards.
//! There is no timeout or Escape release: a trap ends only when its
//! [`FocusTrapGuard`] is disposed or dropped.

use crate::error::{AuditError, Result};
use crate::tree::{InterfaceTree, NodeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Key identity as seen by the trap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Tab,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn tab() -> Self {
        Self { key: Key::Tab, shift: false }
    }

    pub fn shift_tab() -> Self {
        Self { key: Key::Tab, shift: true }
    }

    pub fn other(name: &str) -> Self {
        Self {
            key: Key::Other(name.to_string()),
            shift: false,
        }
    }
}

/// What the trap did with a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Focus wrapped to the given node; the host must not move focus again
    Wrapped(NodeId),
    /// Not handled; the host applies its default behaviour
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapState {
    Idle,
    Trapped,
}

#[derive(Debug, Clone, Copy)]
struct TrapEntry {
    generation: u64,
    /// `(first, last)` focusable descendants, `None` when there are none
    bounds: Option<(NodeId, NodeId)>,
}

type TrapTable = HashMap<NodeId, TrapEntry>;

/// Registry of installed focus traps
#[derive(Debug, Clone, Default)]
pub struct FocusTraps {
    active: Arc<Mutex<TrapTable>>,
    generation: Arc<AtomicU64>,
}

fn lock(table: &Mutex<TrapTable>) -> MutexGuard<'_, TrapTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FocusTraps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a trap on `container` (`Idle -> Trapped`)
    pub fn trap_focus(&self, tree: &InterfaceTree, container: NodeId) -> Result<FocusTrapGuard> {
        tree.node(container)?;
        let focusable = tree.focusable_descendants(container);
        let bounds = match (focusable.first(), focusable.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => {
                warn!("Focus trap on {} has no focusable descendants", tree.describe(container));
                None
            }
        };

        let mut active = lock(&self.active);
        if active.contains_key(&container) {
            return Err(AuditError::TrapAlreadyActive(container));
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        active.insert(container, TrapEntry { generation, bounds });
        debug!("Focus trap installed on {}", tree.describe(container));

        Ok(FocusTrapGuard {
            container,
            generation,
            traps: Arc::clone(&self.active),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn state(&self, container: NodeId) -> TrapState {
        if lock(&self.active).contains_key(&container) {
            TrapState::Trapped
        } else {
            TrapState::Idle
        }
    }

    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }

    /// Feed a key press through every installed trap
    pub fn handle_key(&self, tree: &mut InterfaceTree, press: &KeyPress) -> KeyOutcome {
        if press.key != Key::Tab {
            return KeyOutcome::Default;
        }
        let Some(current) = tree.focused() else {
            return KeyOutcome::Default;
        };

        // the most recently installed trap wins when boundaries overlap
        let target = lock(&self.active)
            .values()
            .filter_map(|entry| entry.bounds.map(|bounds| (entry.generation, bounds)))
            .filter_map(|(generation, (first, last))| match press.shift {
                false if current == last => Some((generation, first)),
                true if current == first => Some((generation, last)),
                _ => None,
            })
            .max_by_key(|(generation, _)| *generation)
            .map(|(_, next)| next);

        match target {
            Some(next) => match tree.focus(next) {
                Ok(()) => KeyOutcome::Wrapped(next),
                Err(e) => {
                    debug!("Focus trap could not wrap: {}", e);
                    KeyOutcome::Default
                }
            },
            None => KeyOutcome::Default,
        }
    }
}

/// Disposer for an installed trap. Releasing twice is a no-op; dropping the
/// guard releases the trap.
#[derive(Debug)]
pub struct FocusTrapGuard {
    container: NodeId,
    generation: u64,
    traps: Arc<Mutex<TrapTable>>,
    disposed: AtomicBool,
}

impl FocusTrapGuard {
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Remove the trap (`Trapped -> Idle`)
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut active = lock(&self.traps);
        if active.get(&self.container).map(|e| e.generation) == Some(self.generation) {
            active.remove(&self.container);
            debug!("Focus trap released on {}", self.container);
        }
    }
}

impl Drop for FocusTrapGuard {
    fn drop(&mut self) {
        self.dispose();
    }
}
