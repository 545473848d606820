//! Answer set and file reference models.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WizardError;

/// Default primary brand colour.
pub const DEFAULT_PRIMARY_COLOR: &str = "#1E40AF";
/// Default secondary brand colour.
pub const DEFAULT_SECONDARY_COLOR: &str = "#3B82F6";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{0,6}$").expect("valid hex colour regex"));

/// A stored file, produced by the upload gateway.
///
/// `url` is either a durable storage link or a `data:` URL carrying the same
/// bytes. Consumers treat both the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub filename: String,
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

impl FileReference {
    /// Whether the bytes are carried inline rather than in durable storage.
    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }
}

/// The shape of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Flag,
    File,
    Files,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Flag => "a boolean",
            Self::File => "a file reference or null",
            Self::Files => "a list of file references",
        }
    }
}

/// Every field of the answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    CompanyName,
    ContactPerson,
    Email,
    Phone,
    TitleCaptureAccess,
    GhlAccess,
    WordpressAccess,
    OpenaiApiKey,
    NeedsOpenaiHelp,
    WordpressUrl,
    PrimaryColor,
    SecondaryColor,
    Logo,
    SamplePdf,
    AdditionalDocs,
    CalendlyLink,
    Notes,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::CompanyName,
        Field::ContactPerson,
        Field::Email,
        Field::Phone,
        Field::TitleCaptureAccess,
        Field::GhlAccess,
        Field::WordpressAccess,
        Field::OpenaiApiKey,
        Field::NeedsOpenaiHelp,
        Field::WordpressUrl,
        Field::PrimaryColor,
        Field::SecondaryColor,
        Field::Logo,
        Field::SamplePdf,
        Field::AdditionalDocs,
        Field::CalendlyLink,
        Field::Notes,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompanyName => "companyName",
            Self::ContactPerson => "contactPerson",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::TitleCaptureAccess => "titleCaptureAccess",
            Self::GhlAccess => "ghlAccess",
            Self::WordpressAccess => "wordpressAccess",
            Self::OpenaiApiKey => "openaiApiKey",
            Self::NeedsOpenaiHelp => "needsOpenaiHelp",
            Self::WordpressUrl => "wordpressUrl",
            Self::PrimaryColor => "primaryColor",
            Self::SecondaryColor => "secondaryColor",
            Self::Logo => "logo",
            Self::SamplePdf => "samplePdf",
            Self::AdditionalDocs => "additionalDocs",
            Self::CalendlyLink => "calendlyLink",
            Self::Notes => "notes",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::TitleCaptureAccess
            | Self::GhlAccess
            | Self::WordpressAccess
            | Self::NeedsOpenaiHelp => FieldKind::Flag,
            Self::Logo | Self::SamplePdf => FieldKind::File,
            Self::AdditionalDocs => FieldKind::Files,
            _ => FieldKind::Text,
        }
    }

    /// Colour fields go through [`normalize_hex_color`] before being stored.
    pub fn is_color(self) -> bool {
        matches!(self, Self::PrimaryColor | Self::SecondaryColor)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| WizardError::UnknownField(s.to_string()))
    }
}

/// A value for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    File(Option<FileReference>),
    Files(Vec<FileReference>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Flag(_) => FieldKind::Flag,
            Self::File(_) => FieldKind::File,
            Self::Files(_) => FieldKind::Files,
        }
    }

    /// Decode a JSON value according to the shape `field` expects.
    pub fn from_json(field: Field, value: serde_json::Value) -> Result<Self, WizardError> {
        let mismatch = || WizardError::FieldTypeMismatch {
            field: field.to_string(),
            expected: field.kind().describe(),
        };
        match field.kind() {
            FieldKind::Text => match value {
                serde_json::Value::String(s) => Ok(Self::Text(s)),
                _ => Err(mismatch()),
            },
            FieldKind::Flag => value.as_bool().map(Self::Flag).ok_or_else(mismatch),
            FieldKind::File => serde_json::from_value::<Option<FileReference>>(value)
                .map(Self::File)
                .map_err(|_| mismatch()),
            FieldKind::Files => serde_json::from_value::<Vec<FileReference>>(value)
                .map(Self::Files)
                .map_err(|_| mismatch()),
        }
    }

    /// Emptiness as used by the completion gate and the "Skip" label.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Flag(b) => !b,
            Self::File(f) => f.is_none(),
            Self::Files(files) => files.is_empty(),
        }
    }
}

/// Every answer collected during one session.
///
/// Always fully populated; the engine replaces the whole record on each
/// write rather than mutating it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSet {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,

    pub title_capture_access: bool,
    pub ghl_access: bool,
    pub wordpress_access: bool,

    pub openai_api_key: String,
    pub needs_openai_help: bool,

    pub wordpress_url: String,

    pub primary_color: String,
    pub secondary_color: String,
    pub logo: Option<FileReference>,

    pub sample_pdf: Option<FileReference>,
    pub additional_docs: Vec<FileReference>,

    pub calendly_link: String,
    pub notes: String,
}

impl Default for AnswerSet {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            contact_person: String::new(),
            email: String::new(),
            phone: String::new(),
            title_capture_access: false,
            ghl_access: false,
            wordpress_access: false,
            openai_api_key: String::new(),
            needs_openai_help: false,
            wordpress_url: String::new(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
            logo: None,
            sample_pdf: None,
            additional_docs: Vec::new(),
            calendly_link: String::new(),
            notes: String::new(),
        }
    }
}

impl AnswerSet {
    /// Read one field.
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::CompanyName => FieldValue::Text(self.company_name.clone()),
            Field::ContactPerson => FieldValue::Text(self.contact_person.clone()),
            Field::Email => FieldValue::Text(self.email.clone()),
            Field::Phone => FieldValue::Text(self.phone.clone()),
            Field::TitleCaptureAccess => FieldValue::Flag(self.title_capture_access),
            Field::GhlAccess => FieldValue::Flag(self.ghl_access),
            Field::WordpressAccess => FieldValue::Flag(self.wordpress_access),
            Field::OpenaiApiKey => FieldValue::Text(self.openai_api_key.clone()),
            Field::NeedsOpenaiHelp => FieldValue::Flag(self.needs_openai_help),
            Field::WordpressUrl => FieldValue::Text(self.wordpress_url.clone()),
            Field::PrimaryColor => FieldValue::Text(self.primary_color.clone()),
            Field::SecondaryColor => FieldValue::Text(self.secondary_color.clone()),
            Field::Logo => FieldValue::File(self.logo.clone()),
            Field::SamplePdf => FieldValue::File(self.sample_pdf.clone()),
            Field::AdditionalDocs => FieldValue::Files(self.additional_docs.clone()),
            Field::CalendlyLink => FieldValue::Text(self.calendly_link.clone()),
            Field::Notes => FieldValue::Text(self.notes.clone()),
        }
    }

    /// Return a copy of this record with `field` replaced by `value`.
    pub fn with(&self, field: Field, value: FieldValue) -> Result<Self, WizardError> {
        let mut next = self.clone();
        match (field, value) {
            (Field::CompanyName, FieldValue::Text(v)) => next.company_name = v,
            (Field::ContactPerson, FieldValue::Text(v)) => next.contact_person = v,
            (Field::Email, FieldValue::Text(v)) => next.email = v,
            (Field::Phone, FieldValue::Text(v)) => next.phone = v,
            (Field::TitleCaptureAccess, FieldValue::Flag(v)) => next.title_capture_access = v,
            (Field::GhlAccess, FieldValue::Flag(v)) => next.ghl_access = v,
            (Field::WordpressAccess, FieldValue::Flag(v)) => next.wordpress_access = v,
            (Field::OpenaiApiKey, FieldValue::Text(v)) => next.openai_api_key = v,
            (Field::NeedsOpenaiHelp, FieldValue::Flag(v)) => next.needs_openai_help = v,
            (Field::WordpressUrl, FieldValue::Text(v)) => next.wordpress_url = v,
            (Field::PrimaryColor, FieldValue::Text(v)) => next.primary_color = v,
            (Field::SecondaryColor, FieldValue::Text(v)) => next.secondary_color = v,
            (Field::Logo, FieldValue::File(v)) => next.logo = v,
            (Field::SamplePdf, FieldValue::File(v)) => next.sample_pdf = v,
            (Field::AdditionalDocs, FieldValue::Files(v)) => next.additional_docs = v,
            (Field::CalendlyLink, FieldValue::Text(v)) => next.calendly_link = v,
            (Field::Notes, FieldValue::Text(v)) => next.notes = v,
            (field, _) => {
                return Err(WizardError::FieldTypeMismatch {
                    field: field.to_string(),
                    expected: field.kind().describe(),
                });
            }
        }
        Ok(next)
    }
}

/// Normalise a hex colour the way the colour picker does: prepend `#` when
/// missing and accept `#` followed by up to six hex digits.
pub fn normalize_hex_color(input: &str) -> Result<String, WizardError> {
    let trimmed = input.trim();
    let hex = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    };
    if HEX_COLOR.is_match(&hex) {
        Ok(hex)
    } else {
        Err(WizardError::InvalidValue {
            field: "color".to_string(),
            reason: format!("{input:?} is not a hex colour"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> FileReference {
        FileReference {
            filename: name.to_string(),
            url: format!("https://blob.example.com/{name}"),
            mime_type: "application/pdf".to_string(),
            size: 42,
        }
    }

    #[test]
    fn default_answers_are_fully_populated() {
        let a = AnswerSet::default();
        assert!(a.company_name.is_empty());
        assert!(!a.needs_openai_help);
        assert_eq!(a.primary_color, DEFAULT_PRIMARY_COLOR);
        assert_eq!(a.secondary_color, DEFAULT_SECONDARY_COLOR);
        assert!(a.logo.is_none());
        assert!(a.additional_docs.is_empty());
        for field in Field::ALL {
            assert_eq!(a.get(field).kind(), field.kind(), "{field}");
        }
    }

    #[test]
    fn field_names_match_serde() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
        assert!(matches!(
            "favouriteColour".parse::<Field>(),
            Err(WizardError::UnknownField(_))
        ));
    }

    #[test]
    fn with_returns_new_record_and_leaves_original() {
        let before = AnswerSet::default();
        let after = before
            .with(Field::CompanyName, FieldValue::Text("Cloud Title".into()))
            .unwrap();
        assert_eq!(after.company_name, "Cloud Title");
        assert!(before.company_name.is_empty());
    }

    #[test]
    fn with_rejects_wrong_shape() {
        let err = AnswerSet::default()
            .with(Field::NeedsOpenaiHelp, FieldValue::Text("yes".into()))
            .unwrap_err();
        assert!(matches!(err, WizardError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn from_json_follows_field_kind() {
        assert_eq!(
            FieldValue::from_json(Field::Email, serde_json::json!("a@b.co")).unwrap(),
            FieldValue::Text("a@b.co".into())
        );
        assert_eq!(
            FieldValue::from_json(Field::GhlAccess, serde_json::json!(true)).unwrap(),
            FieldValue::Flag(true)
        );
        assert_eq!(
            FieldValue::from_json(Field::Logo, serde_json::Value::Null).unwrap(),
            FieldValue::File(None)
        );
        let docs = serde_json::json!([
            {"filename": "faq.pdf", "url": "https://x/faq.pdf", "type": "application/pdf", "size": 3}
        ]);
        match FieldValue::from_json(Field::AdditionalDocs, docs).unwrap() {
            FieldValue::Files(files) => assert_eq!(files[0].filename, "faq.pdf"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(FieldValue::from_json(Field::Phone, serde_json::json!(5551234)).is_err());
        assert!(FieldValue::from_json(Field::WordpressAccess, serde_json::json!("true")).is_err());
    }

    #[test]
    fn emptiness_rules() {
        assert!(FieldValue::Text("   ".into()).is_empty());
        assert!(!FieldValue::Text(" x ".into()).is_empty());
        assert!(FieldValue::File(None).is_empty());
        assert!(!FieldValue::File(Some(pdf("a.pdf"))).is_empty());
        assert!(FieldValue::Files(vec![]).is_empty());
    }

    #[test]
    fn file_reference_wire_shape() {
        let json = serde_json::to_value(pdf("quote.pdf")).unwrap();
        assert_eq!(json["type"], "application/pdf");
        assert_eq!(json["size"], 42);
        assert!(json.get("mime_type").is_none());
    }

    #[test]
    fn hex_colors_are_normalized() {
        assert_eq!(normalize_hex_color("1e40af").unwrap(), "#1e40af");
        assert_eq!(normalize_hex_color("#3B82F6").unwrap(), "#3B82F6");
        assert_eq!(normalize_hex_color("#").unwrap(), "#");
        assert!(normalize_hex_color("#1234567").is_err());
        assert!(normalize_hex_color("blue").is_err());
    }
}
