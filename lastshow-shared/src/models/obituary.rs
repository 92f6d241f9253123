use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use utoipa::ToSchema;

/// Field name to validation messages, in field order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const ISO_DATE: &str = "%Y-%m-%d";

/// An obituary as stored by the remote API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Obituary {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub birth_date: String,
    pub death_date: String,
    pub obituary_text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    pub is_public: bool,
    pub created_at: String,
}

/// Listing returned by `/obituaries/my-obituaries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ObituaryList {
    pub obituaries: Vec<Obituary>,
    pub total: usize,
}

/// A file selected in the create form.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Raw create-form submission, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObituaryForm {
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub is_public: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Validated creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObituaryDraft {
    pub name: String,
    pub birth_date: NaiveDate,
    pub death_date: NaiveDate,
    pub is_public: bool,
    /// Present only when a non-empty file was selected.
    pub image: Option<ImageUpload>,
}

impl ObituaryForm {
    /// Check every field, returning the draft or the messages for each failing field.
    ///
    /// `is_public` is true only for the literal string `"true"`; the ordering of
    /// the two dates is left to the remote API.
    ///
    /// # Errors
    /// Returns a [`FieldErrors`] map keyed by field name when any field is invalid.
    pub fn validate(self) -> Result<ObituaryDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        if name.is_none() {
            errors
                .entry("name".to_string())
                .or_default()
                .push("Name is required".to_string());
        }

        let birth_date = parse_date(&mut errors, "birth_date", "Birth date", self.birth_date);
        let death_date = parse_date(&mut errors, "death_date", "Death date", self.death_date);

        let is_public = self.is_public.as_deref() == Some("true");
        let image = self.image.filter(|image| !image.bytes.is_empty());

        match (name, birth_date, death_date) {
            (Some(name), Some(birth_date), Some(death_date)) if errors.is_empty() => {
                Ok(ObituaryDraft {
                    name,
                    birth_date,
                    death_date,
                    is_public,
                    image,
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_date(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: Option<String>,
) -> Option<NaiveDate> {
    let raw = raw.map(|value| value.trim().to_string()).unwrap_or_default();
    if raw.is_empty() {
        errors
            .entry(field.to_string())
            .or_default()
            .push(format!("{label} is required"));
        return None;
    }

    match NaiveDate::parse_from_str(&raw, ISO_DATE) {
        Ok(date) => Some(date),
        Err(_) => {
            errors
                .entry(field.to_string())
                .or_default()
                .push(format!("{label} must be a valid date (YYYY-MM-DD)"));
            None
        }
    }
}

impl ObituaryDraft {
    #[must_use]
    pub fn birth_date_iso(&self) -> String {
        self.birth_date.format(ISO_DATE).to_string()
    }

    #[must_use]
    pub fn death_date_iso(&self) -> String {
        self.death_date.format(ISO_DATE).to_string()
    }

    /// Wire form of the visibility flag.
    #[must_use]
    pub fn is_public_value(&self) -> &'static str {
        if self.is_public { "true" } else { "false" }
    }
}
