//! Translation between the spellings used by the web forms (hyphenated,
//! e.g. `full-time`) and the spellings persisted in the database
//! (underscored, e.g. `full_time`).
//!
//! Parsing is lenient: an unrecognized value resolves to the field's
//! default instead of failing the request. Every such fallback is logged.

use serde::Serialize;

use crate::models::enums::{ApplicationStatus, EmploymentType, InterviewType, Priority, WorkType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MappedField {
    EmploymentType,
    WorkType,
    Priority,
    Status,
    InterviewType,
}

impl MappedField {
    pub const ALL: [MappedField; 5] = [
        MappedField::EmploymentType,
        MappedField::WorkType,
        MappedField::Priority,
        MappedField::Status,
        MappedField::InterviewType,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MappedField::EmploymentType => "employmentType",
            MappedField::WorkType => "workType",
            MappedField::Priority => "priority",
            MappedField::Status => "status",
            MappedField::InterviewType => "interviewType",
        }
    }
}

/// A closed set of values with a storage and a presentation spelling.
pub trait Vocabulary: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    const FIELD: MappedField;
    const ALL: &'static [Self];

    fn storage(self) -> &'static str;
    fn presentation(self) -> &'static str;
    /// Matches a lowercase, trimmed spelling from either vocabulary.
    fn from_spelling(value: &str) -> Option<Self>;
}

impl Vocabulary for EmploymentType {
    const FIELD: MappedField = MappedField::EmploymentType;
    const ALL: &'static [Self] = &[
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contract,
        EmploymentType::Internship,
    ];

    fn storage(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
        }
    }

    fn presentation(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full-time",
            EmploymentType::PartTime => "part-time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
        }
    }

    fn from_spelling(value: &str) -> Option<Self> {
        match value {
            "full-time" | "full_time" => Some(EmploymentType::FullTime),
            "part-time" | "part_time" => Some(EmploymentType::PartTime),
            "contract" => Some(EmploymentType::Contract),
            "internship" => Some(EmploymentType::Internship),
            _ => None,
        }
    }
}

impl Vocabulary for WorkType {
    const FIELD: MappedField = MappedField::WorkType;
    const ALL: &'static [Self] = &[WorkType::Remote, WorkType::Hybrid, WorkType::OnSite];

    fn storage(self) -> &'static str {
        match self {
            WorkType::Remote => "remote",
            WorkType::Hybrid => "hybrid",
            WorkType::OnSite => "on_site",
        }
    }

    fn presentation(self) -> &'static str {
        match self {
            WorkType::Remote => "remote",
            WorkType::Hybrid => "hybrid",
            WorkType::OnSite => "on-site",
        }
    }

    fn from_spelling(value: &str) -> Option<Self> {
        match value {
            "remote" => Some(WorkType::Remote),
            "hybrid" => Some(WorkType::Hybrid),
            "on-site" | "on_site" => Some(WorkType::OnSite),
            _ => None,
        }
    }
}

impl Vocabulary for Priority {
    const FIELD: MappedField = MappedField::Priority;
    const ALL: &'static [Self] = &[Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    fn storage(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    fn presentation(self) -> &'static str {
        self.storage()
    }

    fn from_spelling(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

impl Vocabulary for ApplicationStatus {
    const FIELD: MappedField = MappedField::Status;
    const ALL: &'static [Self] = &[
        ApplicationStatus::Applied,
        ApplicationStatus::Reviewing,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    fn storage(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    fn presentation(self) -> &'static str {
        match self {
            ApplicationStatus::InterviewScheduled => "interview-scheduled",
            other => other.storage(),
        }
    }

    fn from_spelling(value: &str) -> Option<Self> {
        match value {
            "applied" => Some(ApplicationStatus::Applied),
            "reviewing" => Some(ApplicationStatus::Reviewing),
            "interview-scheduled" | "interview_scheduled" => {
                Some(ApplicationStatus::InterviewScheduled)
            }
            "interviewed" => Some(ApplicationStatus::Interviewed),
            "offer" => Some(ApplicationStatus::Offer),
            "rejected" => Some(ApplicationStatus::Rejected),
            "withdrawn" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }
}

impl Vocabulary for InterviewType {
    const FIELD: MappedField = MappedField::InterviewType;
    const ALL: &'static [Self] = &[
        InterviewType::PhoneScreen,
        InterviewType::Video,
        InterviewType::Technical,
        InterviewType::Behavioral,
        InterviewType::Onsite,
        InterviewType::Panel,
        InterviewType::Final,
    ];

    fn storage(self) -> &'static str {
        match self {
            InterviewType::PhoneScreen => "phone_screen",
            InterviewType::Video => "video",
            InterviewType::Technical => "technical",
            InterviewType::Behavioral => "behavioral",
            InterviewType::Onsite => "onsite",
            InterviewType::Panel => "panel",
            InterviewType::Final => "final",
        }
    }

    fn presentation(self) -> &'static str {
        match self {
            InterviewType::PhoneScreen => "phone-screen",
            InterviewType::Onsite => "on-site",
            other => other.storage(),
        }
    }

    fn from_spelling(value: &str) -> Option<Self> {
        match value {
            "phone-screen" | "phone_screen" | "phone" => Some(InterviewType::PhoneScreen),
            "video" => Some(InterviewType::Video),
            "technical" => Some(InterviewType::Technical),
            "behavioral" => Some(InterviewType::Behavioral),
            "on-site" | "onsite" | "on_site" => Some(InterviewType::Onsite),
            "panel" => Some(InterviewType::Panel),
            "final" => Some(InterviewType::Final),
            _ => None,
        }
    }
}

/// Strict parse: `None` when the value belongs to neither vocabulary.
pub fn parse<T: Vocabulary>(raw: &str) -> Option<T> {
    T::from_spelling(raw.trim().to_ascii_lowercase().as_str())
}

/// Lenient parse used on every write path. Unknown spellings become the
/// field default and a warning is logged.
pub fn parse_or_default<T: Vocabulary>(raw: &str) -> T {
    match parse::<T>(raw) {
        Some(value) => value,
        None => {
            let fallback = T::default();
            tracing::warn!(
                field = T::FIELD.as_str(),
                value = raw,
                fallback = fallback.storage(),
                "unrecognized enum value, falling back to default"
            );
            fallback
        }
    }
}

/// Resolves an optional payload value; an absent value is the default.
pub fn resolve<T: Vocabulary>(raw: Option<&str>) -> T {
    raw.map(parse_or_default::<T>).unwrap_or_default()
}

/// Resolves an optional payload value for a partial update; absent stays
/// absent so the stored value is left untouched.
pub fn resolve_change<T: Vocabulary>(raw: Option<&str>) -> Option<T> {
    raw.map(parse_or_default::<T>)
}

pub fn to_storage(field: MappedField, value: &str) -> &'static str {
    match field {
        MappedField::EmploymentType => parse_or_default::<EmploymentType>(value).storage(),
        MappedField::WorkType => parse_or_default::<WorkType>(value).storage(),
        MappedField::Priority => parse_or_default::<Priority>(value).storage(),
        MappedField::Status => parse_or_default::<ApplicationStatus>(value).storage(),
        MappedField::InterviewType => parse_or_default::<InterviewType>(value).storage(),
    }
}

pub fn to_presentation(field: MappedField, value: &str) -> &'static str {
    match field {
        MappedField::EmploymentType => parse_or_default::<EmploymentType>(value).presentation(),
        MappedField::WorkType => parse_or_default::<WorkType>(value).presentation(),
        MappedField::Priority => parse_or_default::<Priority>(value).presentation(),
        MappedField::Status => parse_or_default::<ApplicationStatus>(value).presentation(),
        MappedField::InterviewType => parse_or_default::<InterviewType>(value).presentation(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub storage: &'static str,
    pub presentation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldVocabulary {
    pub field: MappedField,
    pub default: &'static str,
    pub values: Vec<VocabularyEntry>,
}

fn field_vocabulary<T: Vocabulary>() -> FieldVocabulary {
    FieldVocabulary {
        field: T::FIELD,
        default: T::default().storage(),
        values: T::ALL
            .iter()
            .map(|value| VocabularyEntry {
                storage: value.storage(),
                presentation: value.presentation(),
            })
            .collect(),
    }
}

/// The full mapping table, published so clients translate at their own
/// presentation boundary.
pub fn vocabulary_table() -> Vec<FieldVocabulary> {
    MappedField::ALL
        .iter()
        .map(|field| match field {
            MappedField::EmploymentType => field_vocabulary::<EmploymentType>(),
            MappedField::WorkType => field_vocabulary::<WorkType>(),
            MappedField::Priority => field_vocabulary::<Priority>(),
            MappedField::Status => field_vocabulary::<ApplicationStatus>(),
            MappedField::InterviewType => field_vocabulary::<InterviewType>(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_values(field: MappedField) -> Vec<&'static str> {
        vocabulary_table()
            .into_iter()
            .find(|v| v.field == field)
            .map(|v| v.values.iter().map(|e| e.storage).collect())
            .unwrap_or_default()
    }

    #[test]
    fn storage_values_survive_presentation_round_trip() {
        for field in MappedField::ALL {
            let values = storage_values(field);
            assert!(!values.is_empty(), "{} has no values", field.as_str());
            for value in values {
                assert_eq!(
                    to_storage(field, to_presentation(field, value)),
                    value,
                    "round trip broke for {}={}",
                    field.as_str(),
                    value
                );
            }
        }
    }

    #[test]
    fn hyphenated_form_values_translate_to_storage() {
        assert_eq!(to_storage(MappedField::EmploymentType, "full-time"), "full_time");
        assert_eq!(to_storage(MappedField::EmploymentType, "part-time"), "part_time");
        assert_eq!(to_storage(MappedField::WorkType, "on-site"), "on_site");
        assert_eq!(
            to_storage(MappedField::Status, "interview-scheduled"),
            "interview_scheduled"
        );
        assert_eq!(to_storage(MappedField::InterviewType, "phone-screen"), "phone_screen");
    }

    #[test]
    fn storage_values_translate_to_hyphenated_form() {
        assert_eq!(to_presentation(MappedField::EmploymentType, "full_time"), "full-time");
        assert_eq!(to_presentation(MappedField::WorkType, "on_site"), "on-site");
        assert_eq!(to_presentation(MappedField::Priority, "urgent"), "urgent");
    }

    #[test]
    fn unknown_values_fall_back_to_field_defaults() {
        assert_eq!(to_storage(MappedField::EmploymentType, "freelance"), "full_time");
        assert_eq!(to_storage(MappedField::WorkType, "moon"), "remote");
        assert_eq!(to_storage(MappedField::Priority, ""), "medium");
        assert_eq!(to_storage(MappedField::Status, "ghosted"), "applied");
        assert_eq!(to_presentation(MappedField::EmploymentType, "???"), "full-time");
    }

    #[test]
    fn parsing_ignores_case_and_padding() {
        assert_eq!(parse::<WorkType>("  On-Site "), Some(WorkType::OnSite));
        assert_eq!(parse::<Priority>("HIGH"), Some(Priority::High));
        assert_eq!(parse::<Priority>("highest"), None);
    }

    #[test]
    fn absent_values_resolve_to_defaults_and_changes_stay_absent() {
        assert_eq!(resolve::<ApplicationStatus>(None), ApplicationStatus::Applied);
        assert_eq!(resolve::<EmploymentType>(None), EmploymentType::FullTime);
        assert_eq!(resolve_change::<ApplicationStatus>(None), None);
        assert_eq!(
            resolve_change::<ApplicationStatus>(Some("offer")),
            Some(ApplicationStatus::Offer)
        );
    }

    #[test]
    fn serde_spelling_matches_storage_vocabulary() {
        for status in ApplicationStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.storage());
        }
        assert_eq!(serde_json::to_value(WorkType::OnSite).unwrap(), "on_site");
    }
}
