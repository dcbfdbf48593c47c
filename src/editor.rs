//! Editing sessions for a form's field hierarchy.
//!
//! [`FormEditor`] owns the single mutable copy of the field sequence for one
//! editor and is what the UI callbacks are wired into. Every edit goes
//! through the pure domain functions and replaces the sequence only when they
//! succeed.

use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::domain::{
    AnswerSet, Condition, Config, CreateChildError, Field, FieldCreated, FieldId, FieldNotFound,
    FieldType, MoveError, apply_move, create_child, evaluate, hierarchy, insert_field,
    remove_field,
};

mod hover;
pub use hover::{HoverTicket, HoverTimer};

mod session;
pub use session::{DragSession, DragState, DropOutcome, DropRejection};

/// The editing state of one form.
#[derive(Debug, Clone)]
pub struct FormEditor {
    fields: Vec<Field>,
    selected: Option<FieldId>,
    settings_open: Option<FieldId>,
    session: DragSession,
    config: Config,
}

impl FormEditor {
    /// Starts editing a field sequence.
    #[must_use]
    pub fn new(fields: Vec<Field>, config: Config) -> Self {
        let session = DragSession::new(config.hover_arm_delay());
        let mut editor = Self {
            fields: Vec::new(),
            selected: None,
            settings_open: None,
            session,
            config,
        };
        editor.fields_changed(fields);
        editor
    }

    /// The current field sequence.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Ends the session, handing the fields back for persistence.
    #[must_use]
    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// The selected field.
    #[must_use]
    pub const fn selected(&self) -> Option<&FieldId> {
        self.selected.as_ref()
    }

    /// The field whose settings panel is open.
    #[must_use]
    pub const fn settings_open(&self) -> Option<&FieldId> {
        self.settings_open.as_ref()
    }

    /// The drag session.
    #[must_use]
    pub const fn session(&self) -> &DragSession {
        &self.session
    }

    /// The visible fields for a preview with the given answers.
    #[must_use]
    pub fn preview<'a>(&'a self, answers: &AnswerSet) -> Vec<&'a Field> {
        evaluate(&self.fields, answers)
    }

    /// `onFieldsChange`: replaces the whole sequence.
    ///
    /// Integrity problems are logged, not rejected: the sequence came from
    /// storage or another editor surface and is taken as the new truth.
    /// Selection and the settings panel are dropped if their field is gone.
    pub fn fields_changed(&mut self, fields: Vec<Field>) {
        if self.config.check_integrity_on_load {
            for issue in hierarchy::check_integrity(&fields) {
                warn!(%issue, "form integrity problem");
            }
        }
        self.commit(fields);
    }

    /// `onAddField`: inserts a new root field, returning its id.
    ///
    /// The new field is selected.
    pub fn add_field(&mut self, field_type: FieldType, insert_index: Option<usize>) -> FieldId {
        let created = insert_field(&self.fields, field_type, insert_index);
        self.commit_created(created)
    }

    /// Creates a child under `parent_id`, returning its id.
    ///
    /// The new field is selected.
    ///
    /// # Errors
    ///
    /// Returns a [`CreateChildError`] if the parent cannot take a child. The
    /// fields are unchanged.
    pub fn add_child(
        &mut self,
        parent_id: &FieldId,
        field_type: FieldType,
    ) -> Result<FieldId, CreateChildError> {
        let created = create_child(&self.fields, parent_id, field_type)?;
        Ok(self.commit_created(created))
    }

    /// Moves a field from the keyboard or sortable list.
    ///
    /// # Errors
    ///
    /// Returns a [`MoveError`] if the move would break the hierarchy. The
    /// fields are unchanged.
    pub fn move_field(&mut self, field_id: &FieldId, target_index: usize) -> Result<(), MoveError> {
        let fields = apply_move(&self.fields, field_id, target_index)?;
        self.commit(fields);
        Ok(())
    }

    /// `onFieldSelect`: selects a field, or clears the selection.
    ///
    /// Selecting an unknown field clears the selection.
    pub fn select_field(&mut self, field_id: Option<FieldId>) {
        self.selected = field_id.filter(|id| {
            let known = hierarchy::find(&self.fields, id).is_some();
            if !known {
                warn!(field = %id, "cannot select unknown field");
            }
            known
        });
    }

    /// `onFieldDelete`: deletes a field and its descendants.
    ///
    /// Returns the ids of every deleted field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldNotFound`] if the field does not exist.
    #[instrument(skip(self), fields(field = %field_id))]
    pub fn delete_field(&mut self, field_id: &FieldId) -> Result<Vec<FieldId>, FieldNotFound> {
        let removed = remove_field(&self.fields, field_id)?;
        self.commit(removed.fields);
        Ok(removed.removed)
    }

    /// `onFieldSettingsOpen`: opens the settings panel for a field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldNotFound`] if the field does not exist.
    pub fn open_field_settings(&mut self, field_id: &FieldId) -> Result<&Field, FieldNotFound> {
        let index = hierarchy::position_of(&self.fields, field_id)
            .ok_or_else(|| FieldNotFound(field_id.clone()))?;
        self.settings_open = Some(field_id.clone());
        Ok(&self.fields[index])
    }

    /// Closes the settings panel.
    pub fn close_field_settings(&mut self) {
        self.settings_open = None;
    }

    /// Replaces the visibility conditions of a field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldNotFound`] if the field does not exist.
    pub fn set_conditions(
        &mut self,
        field_id: &FieldId,
        conditions: Vec<Condition>,
    ) -> Result<(), FieldNotFound> {
        let field = self.field_mut(field_id)?;
        field.logic_mut().conditions = conditions;
        Ok(())
    }

    /// Switches conditional display of a field's children on or off.
    ///
    /// # Errors
    ///
    /// Returns [`FieldNotFound`] if the field does not exist.
    pub fn set_conditional_logic_enabled(
        &mut self,
        field_id: &FieldId,
        enabled: bool,
    ) -> Result<(), FieldNotFound> {
        let field = self.field_mut(field_id)?;
        field.logic_mut().enabled = enabled;
        Ok(())
    }

    /// Starts dragging a field type from the palette.
    pub fn begin_palette_drag(&mut self, field_type: FieldType) {
        self.session.begin_palette_drag(field_type);
    }

    /// Starts dragging an existing field.
    pub fn begin_field_drag(&mut self, field_id: FieldId) {
        self.session.begin_field_drag(field_id);
    }

    /// The pointer entered a field during a drag. See
    /// [`DragSession::pointer_entered`].
    pub fn pointer_entered(&mut self, field_id: &FieldId, now: Instant) -> Option<HoverTicket> {
        self.session.pointer_entered(&self.fields, field_id, now)
    }

    /// The pointer left a field during a drag.
    pub fn pointer_left(&mut self, field_id: &FieldId) {
        self.session.pointer_left(field_id);
    }

    /// A scheduled hover callback fired.
    pub fn hover_elapsed(&mut self, ticket: &HoverTicket, now: Instant) -> bool {
        self.session.hover_elapsed(ticket, now)
    }

    /// Completes the current drag, committing its result.
    ///
    /// Returns the id of the created or moved field, or `None` if nothing was
    /// being dragged.
    ///
    /// # Errors
    ///
    /// Returns a [`DropRejection`] if the hierarchy rules forbid the drop.
    /// The fields are unchanged and the session is idle.
    pub fn drop_at(&mut self, target_index: Option<usize>) -> Result<Option<FieldId>, DropRejection> {
        match self.session.drop_at(&self.fields, target_index)? {
            DropOutcome::NotDragging => Ok(None),
            DropOutcome::ChildCreated(created) | DropOutcome::FieldInserted(created) => {
                Ok(Some(self.commit_created(created)))
            }
            DropOutcome::FieldMoved { field_id, fields } => {
                self.commit(fields);
                Ok(Some(field_id))
            }
        }
    }

    /// Abandons the current drag.
    pub fn cancel_drag(&mut self) {
        self.session.cancel();
    }

    /// The global drag-ended signal.
    pub fn drag_ended(&mut self) {
        self.session.drag_ended();
    }

    fn field_mut(&mut self, field_id: &FieldId) -> Result<&mut Field, FieldNotFound> {
        self.fields
            .iter_mut()
            .find(|field| &field.id == field_id)
            .ok_or_else(|| FieldNotFound(field_id.clone()))
    }

    fn commit_created(&mut self, mut created: FieldCreated) -> FieldId {
        if self.config.seed_new_fields {
            if let Some(field) = created
                .fields
                .iter_mut()
                .find(|field| field.id == created.new_field_id)
            {
                field.seed_defaults();
            }
        }
        let id = created.new_field_id;
        self.commit(created.fields);
        self.selected = Some(id.clone());
        id
    }

    fn commit(&mut self, fields: Vec<Field>) {
        self.fields = fields;
        let exists = |id: &FieldId| self.fields.iter().any(|field| &field.id == id);
        if self.selected.as_ref().is_some_and(|id| !exists(id)) {
            debug!("selected field no longer exists");
            self.selected = None;
        }
        if self.settings_open.as_ref().is_some_and(|id| !exists(id)) {
            self.settings_open = None;
        }
    }
}
