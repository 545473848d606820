//! Submission payload — the one-shot projection of the answers sent to the
//! automation webhook.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::model::{AnswerSet, FileReference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAccess {
    pub title_capture: bool,
    pub ghl: bool,
    pub wordpress: bool,
    pub wordpress_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiInfo {
    pub api_key: String,
    pub needs_help: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub primary_color: String,
    pub secondary_color: String,
    pub logo: Option<FileReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Documents {
    pub sample_pdf: Option<FileReference>,
    pub additional: Vec<FileReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherInfo {
    pub calendly_link: String,
    pub notes: String,
}

/// Answers grouped by concern, plus a generated id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub submission_id: String,
    pub timestamp: String,
    pub client_info: ClientInfo,
    pub platform_access: PlatformAccess,
    pub openai: OpenAiInfo,
    pub branding: Branding,
    pub documents: Documents,
    pub other: OtherInfo,
}

impl SubmissionPayload {
    /// Project `answers` as of `at`. The id is `<prefix>-<unix millis>`.
    pub fn project(answers: &AnswerSet, prefix: &str, at: DateTime<Utc>) -> Self {
        Self {
            submission_id: format!("{prefix}-{}", at.timestamp_millis()),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            client_info: ClientInfo {
                company_name: answers.company_name.clone(),
                contact_person: answers.contact_person.clone(),
                email: answers.email.clone(),
                phone: answers.phone.clone(),
            },
            platform_access: PlatformAccess {
                title_capture: answers.title_capture_access,
                ghl: answers.ghl_access,
                wordpress: answers.wordpress_access,
                wordpress_url: answers.wordpress_url.clone(),
            },
            openai: OpenAiInfo {
                api_key: answers.openai_api_key.clone(),
                needs_help: answers.needs_openai_help,
            },
            branding: Branding {
                primary_color: answers.primary_color.clone(),
                secondary_color: answers.secondary_color.clone(),
                logo: answers.logo.clone(),
            },
            documents: Documents {
                sample_pdf: answers.sample_pdf.clone(),
                additional: answers.additional_docs.clone(),
            },
            other: OtherInfo {
                calendly_link: answers.calendly_link.clone(),
                notes: answers.notes.clone(),
            },
        }
    }

    /// Everything except the generated id and timestamp.
    pub fn same_content(&self, other: &Self) -> bool {
        self.client_info == other.client_info
            && self.platform_access == other.platform_access
            && self.openai == other.openai
            && self.branding == other.branding
            && self.documents == other.documents
            && self.other == other.other
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn answers() -> AnswerSet {
        AnswerSet {
            company_name: "Cloud Title".into(),
            contact_person: "Jane Roe".into(),
            email: "jane@cloudtitle.com".into(),
            phone: "555-0100".into(),
            ghl_access: true,
            wordpress_url: "https://cloudtitle.com".into(),
            needs_openai_help: true,
            sample_pdf: Some(FileReference {
                filename: "quote.pdf".into(),
                url: "https://blob.example.com/1700000000000-quote.pdf".into(),
                mime_type: "application/pdf".into(),
                size: 2048,
            }),
            notes: "Call after 3pm".into(),
            ..AnswerSet::default()
        }
    }

    #[test]
    fn wire_shape() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 30, 0).unwrap();
        let payload = SubmissionPayload::project(&answers(), "CT", at);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["submissionId"], format!("CT-{}", at.timestamp_millis()));
        assert_eq!(json["timestamp"], "2026-10-18T12:30:00.000Z");
        assert_eq!(json["clientInfo"]["companyName"], "Cloud Title");
        assert_eq!(json["platformAccess"]["ghl"], true);
        assert_eq!(json["platformAccess"]["titleCapture"], false);
        assert_eq!(json["platformAccess"]["wordpressUrl"], "https://cloudtitle.com");
        assert_eq!(json["openai"]["needsHelp"], true);
        assert_eq!(json["openai"]["apiKey"], "");
        assert_eq!(json["branding"]["primaryColor"], "#1E40AF");
        assert!(json["branding"]["logo"].is_null());
        assert_eq!(json["documents"]["samplePdf"]["filename"], "quote.pdf");
        assert_eq!(json["documents"]["additional"], serde_json::json!([]));
        assert_eq!(json["other"]["notes"], "Call after 3pm");
    }

    #[test]
    fn projections_differ_only_in_id_and_timestamp() {
        let a = answers();
        let first = SubmissionPayload::project(&a, "CT", Utc.timestamp_millis_opt(1_000).unwrap());
        let second = SubmissionPayload::project(&a, "CT", Utc.timestamp_millis_opt(9_000).unwrap());

        assert_ne!(first.submission_id, second.submission_id);
        assert_ne!(first.timestamp, second.timestamp);
        assert!(first.same_content(&second));

        let mut first_json = serde_json::to_value(&first).unwrap();
        let mut second_json = serde_json::to_value(&second).unwrap();
        for json in [&mut first_json, &mut second_json] {
            let obj = json.as_object_mut().unwrap();
            obj.remove("submissionId");
            obj.remove("timestamp");
        }
        assert_eq!(
            serde_json::to_vec(&first_json).unwrap(),
            serde_json::to_vec(&second_json).unwrap()
        );
    }

    #[test]
    fn custom_prefix() {
        let payload =
            SubmissionPayload::project(&AnswerSet::default(), "ACME", Utc.timestamp_millis_opt(42).unwrap());
        assert_eq!(payload.submission_id, "ACME-42");
    }
}
