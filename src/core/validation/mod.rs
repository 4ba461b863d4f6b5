//! Form validation for create and edit modals
//!
//! Every write goes through a typed form (see [`forms`]) that trims, coerces
//! and checks the submitted fields before the record store is touched.
//! Filters normalize values, validators reject them.

pub mod filters;
pub mod forms;
pub mod validators;

pub use forms::{
    BannerForm, ExamForm, Form, ImportantDateForm, LoginForm, NoteEditForm, NoteFileForm,
    NoteLinkForm, OldPaperForm, PaperForm, QuestionForm, SamplePaperForm, SignUpForm, parse_form,
};

use crate::config::collections;
use crate::core::error::{PortalError, PortalResult};
use crate::core::record::Fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which modal a submission comes from
///
/// Decides the validator that runs and whether the mutation is a create or
/// an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModalMode {
    Create,
    Edit,
    /// Read-only view of a record
    Preview,
    /// New file note
    File,
    /// New link note
    Link,
    FileEdit,
    LinkEdit,
    /// New question paper
    Paper,
    PaperEdit,
}

impl ModalMode {
    /// Whether submitting updates an existing record
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            ModalMode::Edit | ModalMode::FileEdit | ModalMode::LinkEdit | ModalMode::PaperEdit
        )
    }

    /// Whether the modal has a submit action at all
    pub fn accepts_submit(&self) -> bool {
        !matches!(self, ModalMode::Preview)
    }
}

/// Validate a create or edit payload for a collection
///
/// Notes are dispatched by mode: `File` uploads go through
/// [`NoteFileForm`] instead, so only link notes are accepted here.
pub fn validate_payload(collection: &str, mode: ModalMode, body: Value) -> PortalResult<Fields> {
    if !mode.accepts_submit() {
        return Err(PortalError::invalid("mode", "Preview is read-only."));
    }

    match collection {
        collections::EXAMS => parse_form::<ExamForm>(body, mode),
        collections::IMPORTANT_DATES => parse_form::<ImportantDateForm>(body, mode),
        collections::NOTES => parse_form::<NoteLinkForm>(body, mode),
        collections::PAPERS => parse_form::<PaperForm>(body, mode),
        collections::OLD_PAPERS => parse_form::<OldPaperForm>(body, mode),
        collections::QUESTIONS => parse_form::<QuestionForm>(body, mode),
        collections::BANNERS => parse_form::<BannerForm>(body, mode),
        collections::SAMPLE_PAPERS => parse_form::<SamplePaperForm>(body, mode),
        other => Err(PortalError::UnknownCollection(other.to_string())),
    }
}
