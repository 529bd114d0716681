//! Create/edit dialog state shared by every entity screen.

use db::models::record::{EntityRecord, RecordId};
use tracing::debug;

use super::{
    notification::Notification,
    resource::ResourceListController,
    validator::{FormValues, ValidationErrors},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was sent; errors are keyed by field
    Invalid(ValidationErrors),
    Saved(EntityRecord),
    /// The gateway refused the change; the dialog stays open with the input intact
    Failed(String),
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogController {
    open: bool,
    mode: DialogMode,
    form: FormValues,
    errors: ValidationErrors,
}

impl Default for DialogController {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogController {
    pub fn new() -> Self {
        Self {
            open: false,
            mode: DialogMode::Create,
            form: FormValues::new(),
            errors: ValidationErrors::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Open empty (with schema defaults) for a new record, or seeded from `editing`
    pub fn open(&mut self, list: &ResourceListController, editing: Option<&EntityRecord>) {
        let schema = &list.config().schema;
        match editing {
            Some(record) => {
                self.mode = DialogMode::Edit(record.id);
                self.form = schema.seed_from(record);
            }
            None => {
                self.mode = DialogMode::Create;
                self.form = schema.defaults();
            }
        }
        self.errors = ValidationErrors::default();
        self.open = true;
        debug!(table = %list.table(), mode = ?self.mode, "Dialog opened");
    }

    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.form.insert(field.into(), value.into());
    }

    /// Close without saving; nothing is sent
    pub fn cancel(&mut self) {
        self.open = false;
        self.form.clear();
        self.errors = ValidationErrors::default();
    }

    /// Validate the current form, then create or update through `list`
    pub async fn submit(&mut self, list: &mut ResourceListController) -> SubmitOutcome {
        let config = list.config().clone();
        let validated = match config.schema.validate(&self.form) {
            Ok(validated) => validated,
            Err(errors) => {
                self.errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
        };

        let (result, success_title) = match self.mode {
            DialogMode::Create => (list.create(validated).await, config.messages.created),
            DialogMode::Edit(id) => (list.update(id, validated).await, config.messages.updated),
        };

        match result {
            Ok(record) => {
                list.notify(Notification::success(success_title, config.title_of(&record)));
                self.open = false;
                self.form.clear();
                self.errors = ValidationErrors::default();
                SubmitOutcome::Saved(record)
            }
            // the list has already told the user; keep the input for another try
            Err(e) => SubmitOutcome::Failed(e.to_string()),
        }
    }
}
