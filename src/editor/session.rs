//! The drag session state machine.
//!
//! ```text
//! Idle ──palette drag──▶ DraggingFromPalette ──hover elapsed──▶ HoverArmed
//!   ▲                         ▲         │                          │
//!   │                         └─pointer left / re-enter────────────┘
//!   ├──field drag──▶ DraggingExistingField
//!   └──── drop / cancel / drag ended (from any state) ◀────────────
//! ```
//!
//! The session never touches the committed field sequence. A drop returns a
//! new sequence (or a rejection) and the session is back to idle either way.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{
    domain::{
        CreateChildError, Field, FieldCreated, FieldId, FieldType, MoveError, apply_move,
        create_child, hierarchy, insert_field,
    },
    editor::hover::{HoverTicket, HoverTimer},
};

/// Where a drag session currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    /// Nothing is being dragged.
    #[default]
    Idle,

    /// A new field type is being dragged from the palette.
    DraggingFromPalette {
        /// The type that will be created on drop.
        field_type: FieldType,
    },

    /// An existing field is being dragged to a new position.
    DraggingExistingField {
        /// The field being moved.
        field_id: FieldId,
    },

    /// A palette drag has hovered long enough over a field that dropping
    /// creates a child of it.
    HoverArmed {
        /// The type that will be created on drop.
        field_type: FieldType,
        /// The future parent.
        field_id: FieldId,
    },
}

/// Why a drop did not change the form.
///
/// These are recoverable: the field sequence is unchanged and the caller
/// should surface a warning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropRejection {
    /// The move would break the hierarchy.
    #[error(transparent)]
    Move(#[from] MoveError),

    /// The armed field could not take a child.
    #[error(transparent)]
    CreateChild(#[from] CreateChildError),

    /// An existing field was dropped without a target position.
    #[error("field {0} was dropped outside the form")]
    MissingTarget(FieldId),
}

/// The result of a drop that changed the form.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Nothing was being dragged.
    NotDragging,

    /// A child was created under the armed field.
    ChildCreated(FieldCreated),

    /// A new root field was inserted.
    FieldInserted(FieldCreated),

    /// An existing field (and its subtree) moved.
    FieldMoved {
        /// The moved field.
        field_id: FieldId,
        /// The reordered sequence.
        fields: Vec<Field>,
    },
}

impl DropOutcome {
    /// The new field sequence, if the drop changed anything.
    #[must_use]
    pub fn fields(&self) -> Option<&[Field]> {
        match self {
            Self::NotDragging => None,
            Self::ChildCreated(created) | Self::FieldInserted(created) => {
                Some(created.fields.as_slice())
            }
            Self::FieldMoved { fields, .. } => Some(fields.as_slice()),
        }
    }
}

/// One editor's drag-and-drop session.
#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    timer: HoverTimer,
}

impl DragSession {
    /// Creates an idle session with the given hover-to-arm delay.
    #[must_use]
    pub const fn new(hover_delay: Duration) -> Self {
        Self {
            state: DragState::Idle,
            timer: HoverTimer::new(hover_delay),
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether nothing is being dragged.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// The hover currently being timed, if any.
    #[must_use]
    pub const fn pending_hover(&self) -> Option<&HoverTicket> {
        self.timer.pending()
    }

    /// Starts dragging a new field type from the palette.
    ///
    /// Any gesture already in progress is abandoned.
    pub fn begin_palette_drag(&mut self, field_type: FieldType) {
        self.reset();
        debug!(%field_type, "palette drag started");
        self.state = DragState::DraggingFromPalette { field_type };
    }

    /// Starts dragging an existing field.
    ///
    /// Any gesture already in progress is abandoned.
    pub fn begin_field_drag(&mut self, field_id: FieldId) {
        self.reset();
        debug!(field = %field_id, "field drag started");
        self.state = DragState::DraggingExistingField { field_id };
    }

    /// The pointer entered a field while dragging.
    ///
    /// During a palette drag over a field that can take another child, this
    /// starts the hover timer and returns its ticket. The caller schedules a
    /// callback for the ticket's `fires_at` and passes the ticket to
    /// [`Self::hover_elapsed`]. Entering a different field disarms the
    /// previous one.
    pub fn pointer_entered(
        &mut self,
        fields: &[Field],
        field_id: &FieldId,
        now: Instant,
    ) -> Option<HoverTicket> {
        let field_type = match &self.state {
            DragState::DraggingFromPalette { field_type } => *field_type,
            DragState::HoverArmed {
                field_type,
                field_id: armed,
            } => {
                if armed == field_id {
                    return None;
                }
                *field_type
            }
            DragState::Idle | DragState::DraggingExistingField { .. } => return None,
        };

        self.timer.cancel();
        self.state = DragState::DraggingFromPalette { field_type };

        let eligible = hierarchy::find(fields, field_id).is_some_and(Field::accepts_children);
        if !eligible {
            return None;
        }
        Some(self.timer.schedule(field_id.clone(), now))
    }

    /// The pointer left a field while dragging.
    ///
    /// Leaving the armed or pending field disarms it.
    pub fn pointer_left(&mut self, field_id: &FieldId) {
        let pending_here = self
            .timer
            .pending()
            .is_some_and(|ticket| ticket.field_id() == field_id);
        if pending_here {
            self.timer.cancel();
        }
        let disarmed = match &self.state {
            DragState::HoverArmed {
                field_type,
                field_id: armed,
            } if armed == field_id => Some(*field_type),
            _ => None,
        };
        if let Some(field_type) = disarmed {
            debug!(field = %field_id, "hover disarmed");
            self.state = DragState::DraggingFromPalette { field_type };
        }
    }

    /// Delivers a hover ticket whose delay has elapsed.
    ///
    /// Returns `true` if the session is now armed. Stale tickets, from hovers
    /// that were left or from sessions that already ended, do nothing.
    pub fn hover_elapsed(&mut self, ticket: &HoverTicket, now: Instant) -> bool {
        self.arm_with(|timer| timer.fire(ticket, now))
    }

    /// Arms the session if the pending hover is due.
    ///
    /// For callers that drive the timer from a frame tick instead of a
    /// scheduled callback.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.arm_with(|timer| timer.poll(now))
    }

    fn arm_with(&mut self, fire: impl FnOnce(&mut HoverTimer) -> Option<FieldId>) -> bool {
        let DragState::DraggingFromPalette { field_type } = self.state else {
            return false;
        };
        let Some(field_id) = fire(&mut self.timer) else {
            return false;
        };
        debug!(field = %field_id, "hover armed");
        self.state = DragState::HoverArmed {
            field_type,
            field_id,
        };
        true
    }

    /// Completes the gesture.
    ///
    /// - armed: a child of the armed field is created.
    /// - palette drag: a root field is inserted at `target_index` (or
    ///   appended).
    /// - field drag: the field moves to `target_index`.
    ///
    /// The session returns to idle whatever the result.
    ///
    /// # Errors
    ///
    /// Returns a [`DropRejection`] if the hierarchy rules forbid the drop.
    /// The field sequence is then unchanged.
    pub fn drop_at(
        &mut self,
        fields: &[Field],
        target_index: Option<usize>,
    ) -> Result<DropOutcome, DropRejection> {
        let state = std::mem::take(&mut self.state);
        self.timer.cancel();

        let outcome = match state {
            DragState::Idle => Ok(DropOutcome::NotDragging),
            DragState::HoverArmed {
                field_type,
                field_id,
            } => create_child(fields, &field_id, field_type)
                .map(DropOutcome::ChildCreated)
                .map_err(DropRejection::from),
            DragState::DraggingFromPalette { field_type } => Ok(DropOutcome::FieldInserted(
                insert_field(fields, field_type, target_index),
            )),
            DragState::DraggingExistingField { field_id } => match target_index {
                None => Err(DropRejection::MissingTarget(field_id)),
                Some(target) => apply_move(fields, &field_id, target)
                    .map(|fields| DropOutcome::FieldMoved { field_id, fields })
                    .map_err(DropRejection::from),
            },
        };

        if let Err(rejection) = &outcome {
            warn!(%rejection, "drop rejected");
        }
        outcome
    }

    /// Abandons the gesture without changing anything.
    pub fn cancel(&mut self) {
        debug!("drag cancelled");
        self.reset();
    }

    /// The global "drag ended" signal, fired wherever the pointer was
    /// released. Always returns the session to idle, even if a drop target
    /// swallowed the drop.
    pub fn drag_ended(&mut self) {
        if !self.is_idle() {
            debug!("drag ended without a drop");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.timer.cancel();
        self.state = DragState::Idle;
    }
}
