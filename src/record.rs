//! Subject records and the closed sets of selectors used to slice them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ReportError;

/// A single subject row as delivered by a [`RecordSource`](crate::services::RecordSource).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub workplace: String,
    pub industry: String,
    pub location: String,
    #[serde(deserialize_with = "deserialize_birth_date")]
    pub birth_date: NaiveDate,
}

/// Borrowed view of one record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(i64),
    Date(NaiveDate),
}

impl FieldValue<'_> {
    /// Grouping key used by the aggregator: dates collapse to their calendar year.
    pub fn grouping_key(&self) -> String {
        match self {
            FieldValue::Text(text) => (*text).to_owned(),
            FieldValue::Number(number) => number.to_string(),
            FieldValue::Date(date) => date.year().to_string(),
        }
    }
}

impl SubjectRecord {
    /// Returns the field picked by `selector`.
    pub fn field(&self, selector: CategorySelector) -> FieldValue<'_> {
        match selector {
            CategorySelector::Age => FieldValue::Number(i64::from(self.age)),
            CategorySelector::Gender => FieldValue::Text(&self.gender),
            CategorySelector::Workplace => FieldValue::Text(&self.workplace),
            CategorySelector::Industry => FieldValue::Text(&self.industry),
            CategorySelector::Location => FieldValue::Text(&self.location),
            CategorySelector::BirthDate => FieldValue::Date(self.birth_date),
        }
    }
}

fn deserialize_birth_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_birth_date(&raw).map_err(serde::de::Error::custom)
}

/// Accepts plain `YYYY-MM-DD` dates as well as RFC 3339 timestamps.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|err| format!("invalid birth date '{raw}': {err}"))
}

/// The record field a distribution is computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelector {
    Age,
    Gender,
    Workplace,
    Industry,
    Location,
    BirthDate,
}

impl CategorySelector {
    /// Every selector, in enumeration order.
    pub const ALL: [CategorySelector; 6] = [
        CategorySelector::Age,
        CategorySelector::Gender,
        CategorySelector::Workplace,
        CategorySelector::Industry,
        CategorySelector::Location,
        CategorySelector::BirthDate,
    ];

    /// Wire name, also used for archive entries and batch keys.
    pub fn as_str(self) -> &'static str {
        match self {
            CategorySelector::Age => "age",
            CategorySelector::Gender => "gender",
            CategorySelector::Workplace => "workplace",
            CategorySelector::Industry => "industry",
            CategorySelector::Location => "location",
            CategorySelector::BirthDate => "birth_date",
        }
    }

    /// Human readable name used in document headers.
    pub fn display_name(self) -> &'static str {
        match self {
            CategorySelector::Age => "Age",
            CategorySelector::Gender => "Gender",
            CategorySelector::Workplace => "Workplace",
            CategorySelector::Industry => "Industry",
            CategorySelector::Location => "Location",
            CategorySelector::BirthDate => "Birth year",
        }
    }
}

impl fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategorySelector {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CategorySelector::ALL
            .into_iter()
            .find(|selector| selector.as_str() == value)
            .ok_or_else(|| ReportError::InvalidArgument(format!("unknown category '{value}'")))
    }
}

/// Which chart blocks an archive document carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Pie,
    Bar,
    Both,
}

impl ChartType {
    pub fn includes_pie(self) -> bool {
        matches!(self, ChartType::Pie | ChartType::Both)
    }

    pub fn includes_bar(self) -> bool {
        matches!(self, ChartType::Bar | ChartType::Both)
    }
}

impl FromStr for ChartType {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pie" => Ok(ChartType::Pie),
            "bar" => Ok(ChartType::Bar),
            "both" => Ok(ChartType::Both),
            other => Err(ReportError::InvalidArgument(format!(
                "unknown chart type '{other}'"
            ))),
        }
    }
}
