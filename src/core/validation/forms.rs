//! Typed create/edit forms for every collection
//!
//! A form is deserialized from the request body, normalized with the field
//! filters, checked with the field validators and finally turned into the
//! [`Fields`] written to the record store. Nothing is written when a form is
//! rejected.

use super::ModalMode;
use super::filters;
use super::validators;
use crate::core::error::{PortalError, PortalResult};
use crate::core::field::FieldFormat;
use crate::core::record::{Fields, Record};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Paper difficulty levels
pub const PAPER_LEVELS: &[&str] = &["hard", "normal", "medium"];

/// Sample paper publication states
pub const SAMPLE_PAPER_STATUSES: &[&str] = &["draft", "published"];

/// A form accepted by a create or edit modal
pub trait Form: DeserializeOwned {
    /// Validate the form and produce the fields to store
    fn into_fields(self, mode: ModalMode) -> PortalResult<Fields>;
}

/// Deserialize and validate a request body as form `F`
pub fn parse_form<F: Form>(body: Value, mode: ModalMode) -> PortalResult<Fields> {
    let form: F = serde_json::from_value(body)
        .map_err(|e| PortalError::invalid("body", format!("Invalid form data: {}", e)))?;
    form.into_fields(mode)
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

/// Names of the fields failing the `required` validator
fn missing<'a>(checks: &[(&'a str, &str)]) -> Vec<&'a str> {
    let required = validators::required();
    checks
        .iter()
        .filter(|(name, value)| required(*name, &json!(value)).is_err())
        .map(|(name, _)| *name)
        .collect()
}

fn require_all(checks: &[(&str, &str)], message: &str) -> PortalResult<()> {
    let missing = missing(checks);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PortalError::invalid_fields(&missing, message))
    }
}

fn check(
    validator: impl Fn(&str, &Value) -> Result<(), String>,
    field: &str,
    value: &Value,
) -> PortalResult<()> {
    validator(field, value).map_err(|message| PortalError::invalid(field, message))
}

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Exam metadata (`exams`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExamForm {
    pub title: String,
    pub description: String,
    pub exam_date: String,
}

impl Form for ExamForm {
    fn into_fields(self, _mode: ModalMode) -> PortalResult<Fields> {
        let title = trimmed(self.title);
        let description = trimmed(self.description);
        let exam_date = trimmed(self.exam_date);
        require_all(
            &[
                ("title", title.as_str()),
                ("description", description.as_str()),
                ("examDate", exam_date.as_str()),
            ],
            "All fields are required.",
        )?;

        Ok(fields(json!({
            "title": title,
            "description": description,
            "examDate": exam_date,
        })))
    }
}

/// Important date window (`importantDates`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportantDateForm {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub total_questions: Value,
    pub total_marks: Value,
    pub passing_marks: Value,
    pub passing_percent: Value,
    pub total_rounds: Value,
    pub eligibility: String,
}

impl Form for ImportantDateForm {
    fn into_fields(self, _mode: ModalMode) -> PortalResult<Fields> {
        let title = trimmed(self.title);
        let start_date = trimmed(self.start_date);
        let end_date = trimmed(self.end_date);
        require_all(
            &[
                ("title", title.as_str()),
                ("startDate", start_date.as_str()),
                ("endDate", end_date.as_str()),
            ],
            "Title, Start Date and End Date are required.",
        )?;

        let number = filters::number();
        Ok(fields(json!({
            "title": title,
            "startDate": start_date,
            "endDate": end_date,
            "totalQuestions": number("totalQuestions", self.total_questions),
            "totalMarks": number("totalMarks", self.total_marks),
            "passingMarks": number("passingMarks", self.passing_marks),
            "passingPercent": number("passingPercent", self.passing_percent),
            "totalRounds": number("totalRounds", self.total_rounds),
            "eligibility": trimmed(self.eligibility),
        })))
    }
}

/// Link note (`notes` with `type = "link"`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteLinkForm {
    pub title: String,
    pub url: String,
}

impl Form for NoteLinkForm {
    fn into_fields(self, _mode: ModalMode) -> PortalResult<Fields> {
        let title = trimmed(self.title);
        let url = trimmed(self.url);
        require_all(
            &[("title", title.as_str()), ("url", url.as_str())],
            "Title and URL are required.",
        )?;

        Ok(fields(json!({
            "title": title,
            "type": "link",
            "url": url,
        })))
    }
}

/// File note upload parameters (`notes` with `type = "file"`)
///
/// The file content itself travels as the raw request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteFileForm {
    pub title: Option<String>,
    pub file_name: Option<String>,
}

impl NoteFileForm {
    /// File name usable as the last segment of a storage path
    pub fn file_name(&self) -> PortalResult<String> {
        let name = self
            .file_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .replace(['/', '\\'], "_");
        if name.is_empty() {
            return Err(PortalError::invalid("file", "Please select a file."));
        }
        Ok(name)
    }

    /// Reject uploads without a named, non-empty file
    pub fn validate(&self, size: usize) -> PortalResult<String> {
        let name = self.file_name()?;
        if size == 0 {
            return Err(PortalError::invalid("file", "Please select a file."));
        }
        Ok(name)
    }

    /// Storage path for a file uploaded at `millis`
    pub fn storage_path(file_name: &str, millis: i64) -> String {
        format!("notes/{}_{}", millis, file_name)
    }

    /// Fields of the stored note, the title defaulting to the file name
    pub fn into_fields(self, file_name: &str, url: &str, storage_path: &str, size: usize) -> Fields {
        let title = self
            .title
            .map(trimmed)
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| file_name.to_string());

        fields(json!({
            "title": title,
            "type": "file",
            "url": url,
            "fileName": file_name,
            "size": size,
            "storagePath": storage_path,
        }))
    }
}

/// Edit of an existing note
///
/// File notes only accept a new title (an empty title keeps the old one);
/// link notes require both title and URL again.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteEditForm {
    pub title: String,
    pub url: String,
}

impl NoteEditForm {
    /// Edit mode matching the stored note's type
    pub fn mode_for(existing: &Record) -> ModalMode {
        if existing.text("type") == "file" {
            ModalMode::FileEdit
        } else {
            ModalMode::LinkEdit
        }
    }

    pub fn into_fields(self, existing: &Record) -> PortalResult<Fields> {
        match Self::mode_for(existing) {
            ModalMode::FileEdit => {
                let title = trimmed(self.title);
                let title = if title.is_empty() {
                    existing.text("title").into_owned()
                } else {
                    title
                };
                Ok(fields(json!({ "title": title })))
            }
            mode => NoteLinkForm {
                title: self.title,
                url: self.url,
            }
            .into_fields(mode),
        }
    }
}

/// Question paper (`papers`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaperForm {
    pub title: String,
    pub description: String,
    pub total_marks: Value,
    pub duration: Value,
    pub level: Value,
}

impl Form for PaperForm {
    fn into_fields(self, _mode: ModalMode) -> PortalResult<Fields> {
        let title = trimmed(self.title);
        require_all(&[("title", title.as_str())], "Title is required.")?;

        let level = filters::default_to(json!("normal"))("level", filters::trim()("level", self.level));
        check(validators::in_list(PAPER_LEVELS), "level", &level)?;

        let number = filters::number();
        Ok(fields(json!({
            "title": title,
            "description": trimmed(self.description),
            "totalMarks": number("totalMarks", self.total_marks),
            "duration": number("duration", self.duration),
            "level": level,
        })))
    }
}

fn default_correct_index() -> Value {
    json!(-1)
}

/// Multiple-choice question of a paper (`papers/{id}/questions`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestionForm {
    pub question: String,
    pub options: Vec<Value>,
    pub explanation: String,
    #[serde(default = "default_correct_index")]
    pub correct_index: Value,
}

impl Default for QuestionForm {
    fn default() -> Self {
        Self {
            question: String::new(),
            options: vec![json!(""), json!("")],
            explanation: String::new(),
            correct_index: default_correct_index(),
        }
    }
}

impl QuestionForm {
    /// Validate and produce the stored fields
    ///
    /// With `options_first` blank options are reported before a missing
    /// question, the order used by the old papers modal.
    fn checked(self, options_first: bool) -> PortalResult<Fields> {
        let question = trimmed(self.question);
        let options: Vec<String> = self
            .options
            .iter()
            .map(|option| crate::core::field::text(Some(option)).trim().to_string())
            .collect();

        let blank_option = || {
            if options.iter().any(String::is_empty) {
                Err(PortalError::invalid("options", "Please fill all options."))
            } else {
                Ok(())
            }
        };

        if options_first {
            blank_option()?;
        }
        if question.is_empty() {
            return Err(PortalError::invalid("question", "Question is required."));
        }
        if options.len() < 2 {
            return Err(PortalError::invalid(
                "options",
                "At least two options are required.",
            ));
        }
        blank_option()?;
        let correct_index = self.correct_index.as_i64().unwrap_or(-1);
        if correct_index < 0 || correct_index >= options.len() as i64 {
            return Err(PortalError::invalid(
                "correctIndex",
                "Please select the correct answer.",
            ));
        }

        Ok(fields(json!({
            "question": question,
            "options": options,
            "explanation": trimmed(self.explanation),
            "correctIndex": correct_index,
        })))
    }
}

impl Form for QuestionForm {
    fn into_fields(self, _mode: ModalMode) -> PortalResult<Fields> {
        self.checked(false)
    }
}

/// Old paper question (`oldPapers`)
///
/// Same fields as [`QuestionForm`]; blank options are reported first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct OldPaperForm(pub QuestionForm);

impl Form for OldPaperForm {
    fn into_fields(self, _mode: ModalMode) -> PortalResult<Fields> {
        self.0.checked(true)
    }
}

/// Home page banner (`banners`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BannerForm {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub link_url: String,
    pub is_active: Option<bool>,
}

impl Form for BannerForm {
    fn into_fields(self, mode: ModalMode) -> PortalResult<Fields> {
        let title = trimmed(self.title);
        require_all(&[("title", title.as_str())], "Title is required.")?;

        let image_url = json!(trimmed(self.image_url));
        check(validators::format(FieldFormat::Url), "imageUrl", &image_url)?;
        let link_url = json!(trimmed(self.link_url));
        check(validators::format(FieldFormat::Url), "linkUrl", &link_url)?;

        let mut stored = fields(json!({
            "title": title,
            "description": trimmed(self.description),
            "imageUrl": image_url,
            "linkUrl": link_url,
        }));
        // Edits that omit the flag leave it untouched
        match (self.is_active, mode.is_edit()) {
            (Some(active), _) => {
                stored.insert("isActive".to_string(), json!(active));
            }
            (None, false) => {
                stored.insert("isActive".to_string(), json!(true));
            }
            (None, true) => {}
        }
        Ok(stored)
    }
}

/// Sample paper (`samplePapers`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplePaperForm {
    pub title: String,
    pub subject: String,
    pub year: Value,
    pub questions: Value,
    pub status: Value,
}

impl Form for SamplePaperForm {
    fn into_fields(self, mode: ModalMode) -> PortalResult<Fields> {
        let title = trimmed(self.title);
        let subject = trimmed(self.subject);
        require_all(
            &[("title", title.as_str()), ("subject", subject.as_str())],
            "Title and subject are required.",
        )?;

        let number = filters::number();
        let mut stored = fields(json!({
            "title": title,
            "subject": subject,
            "year": number("year", self.year),
            "questions": number("questions", self.questions),
        }));

        let status = filters::lowercase()("status", filters::trim()("status", self.status));
        let status = if mode.is_edit() {
            status
        } else {
            filters::default_to(json!("draft"))("status", status)
        };
        if !status.is_null() {
            check(validators::in_list(SAMPLE_PAPER_STATUSES), "status", &status)?;
            stored.insert("status".to_string(), status);
        }
        Ok(stored)
    }
}

/// Account creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
    pub display_name: Option<String>,
}

impl SignUpForm {
    /// Check the form before contacting the identity provider
    pub fn validate(&self) -> PortalResult<()> {
        let email = json!(self.email.trim());
        check(validators::required(), "email", &email)?;
        check(validators::format(FieldFormat::Email), "email", &email)?;
        if let Some(confirm) = &self.confirm_password
            && confirm != &self.password
        {
            return Err(PortalError::invalid("confirmPassword", "Passwords do not match"));
        }
        check(
            validators::min_length(crate::core::auth::MIN_PASSWORD_LEN),
            "password",
            &json!(self.password),
        )
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Sign-in credentials
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}
