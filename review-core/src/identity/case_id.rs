//! Case identity and intake types

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{IdentityError, IdentityResult};

static CANONICAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]+/\d{4}/WK\d{2}$").expect("CANONICAL_PATTERN regex should compile")
});

/// The single human-readable identifier of the active unit of work.
///
/// Canonical shape is `LASTNAME/YEAR/WKnn`, but identifiers issued by the
/// remote generator are accepted as-is provided they are non-empty and
/// contain no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaseIdentity(String);

impl CaseIdentity {
    pub fn parse(value: &str) -> IdentityResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::invalid(value, "empty identifier"));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdentityError::invalid(value, "contains whitespace"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build the canonical identifier locally, for manual entry when the
    /// remote generator is unavailable.
    pub fn compose(last_name: &str, date: NaiveDate) -> IdentityResult<Self> {
        let surname = normalize_surname(last_name)?;
        let week = date.iso_week();
        Ok(Self(format!("{}/{}/WK{:02}", surname, week.year(), week.week())))
    }

    pub fn is_canonical(&self) -> bool {
        CANONICAL_PATTERN.is_match(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CaseIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CaseIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CaseIdentity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CaseIdentity> for String {
    fn from(id: CaseIdentity) -> Self {
        id.0
    }
}

/// Uppercase and strip everything but ASCII letters and digits.
pub fn normalize_surname(last_name: &str) -> IdentityResult<String> {
    let normalized: String = last_name
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if normalized.is_empty() {
        return Err(IdentityError::invalid(
            last_name,
            "last name must contain at least one alphanumeric character",
        ));
    }
    Ok(normalized)
}

/// Intake fields sent to the id generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeForm {
    pub last_name: String,
    pub first_name: Option<String>,
    pub poi_id: Option<String>,
    pub bsb: Option<String>,
    pub account: Option<String>,
}

impl IntakeForm {
    pub fn new(last_name: impl Into<String>) -> Self {
        Self {
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_poi_id(mut self, poi_id: impl Into<String>) -> Self {
        self.poi_id = Some(poi_id.into());
        self
    }

    pub fn with_bank_account(mut self, bsb: impl Into<String>, account: impl Into<String>) -> Self {
        self.bsb = Some(bsb.into());
        self.account = Some(account.into());
        self
    }
}

/// Identity fields read off an uploaded document, used to pre-fill intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIdentity {
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
}

impl ExtractedIdentity {
    /// Intake form seeded from the extracted names.
    pub fn to_intake_form(&self) -> IntakeForm {
        IntakeForm::new(self.last_name.clone()).with_first_name(self.first_name.clone())
    }
}
