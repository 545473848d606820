//! Review summary and progress indicator.

use serde::Serialize;

use super::model::{AnswerSet, FileReference};

/// Notes longer than this are truncated on the review screen.
const NOTES_PREVIEW_CHARS: usize = 50;

/// Progress through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub index: usize,
    pub total: usize,
    /// `index / (total - 1) * 100`.
    pub percent: f64,
}

impl Progress {
    pub fn new(index: usize, total: usize) -> Self {
        let percent = if total > 1 {
            index as f64 / (total - 1) as f64 * 100.0
        } else {
            100.0
        };
        Self {
            index,
            total,
            percent,
        }
    }

    pub fn label(&self) -> String {
        format!("Step {} of {}", self.index + 1, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSection {
    pub title: String,
    pub rows: Vec<ReviewRow>,
}

impl ReviewSection {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    fn row(mut self, label: &str, value: impl Into<String>) -> Self {
        self.rows.push(ReviewRow {
            label: label.to_string(),
            value: value.into(),
        });
        self
    }
}

/// Every collected answer, grouped the way the review screen lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub sections: Vec<ReviewSection>,
}

fn access(granted: bool) -> &'static str {
    if granted { "✓ Added" } else { "⏳ Pending" }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "—".to_string()
    } else {
        value.to_string()
    }
}

fn file_name_or(file: &Option<FileReference>, missing: &str) -> String {
    file.as_ref()
        .map(|f| f.filename.clone())
        .unwrap_or_else(|| missing.to_string())
}

impl ReviewSummary {
    pub fn from_answers(a: &AnswerSet) -> Self {
        let openai_status = if a.needs_openai_help {
            "Needs help setting up"
        } else if !a.openai_api_key.is_empty() {
            "✓ Provided"
        } else {
            "—"
        };

        let mut sections = vec![
            ReviewSection::new("Client Information")
                .row("Company", a.company_name.clone())
                .row("Contact", a.contact_person.clone())
                .row("Email", a.email.clone())
                .row("Phone", a.phone.clone()),
            ReviewSection::new("Platform Access")
                .row("Title Capture", access(a.title_capture_access))
                .row("GoHighLevel", access(a.ghl_access))
                .row("WordPress", access(a.wordpress_access))
                .row("WordPress URL", or_dash(&a.wordpress_url)),
            ReviewSection::new("OpenAI").row("Status", openai_status),
            ReviewSection::new("Branding")
                .row("Colors", format!("{} / {}", a.primary_color, a.secondary_color))
                .row("Logo", file_name_or(&a.logo, "— Not uploaded")),
            ReviewSection::new("Documents")
                .row("Sample PDF", file_name_or(&a.sample_pdf, "✗ Not uploaded"))
                .row("Additional", format!("{} file(s)", a.additional_docs.len())),
        ];

        if !a.calendly_link.is_empty() || !a.notes.is_empty() {
            let mut other = ReviewSection::new("Other");
            if !a.calendly_link.is_empty() {
                other = other.row("Calendly", a.calendly_link.clone());
            }
            if !a.notes.is_empty() {
                other = other.row("Notes", preview(&a.notes));
            }
            sections.push(other);
        }

        Self { sections }
    }

    /// Plain-text rendering for terminals and logs.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&section.title);
            out.push('\n');
            for row in &section.rows {
                out.push_str(&format!("  {}: {}\n", row.label, row.value));
            }
        }
        out
    }

    /// Look up a row value by section title and label.
    pub fn value(&self, section: &str, label: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title == section)?
            .rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

fn preview(notes: &str) -> String {
    if notes.chars().count() > NOTES_PREVIEW_CHARS {
        let head: String = notes.chars().take(NOTES_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        notes.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_spans_first_to_last() {
        assert_eq!(Progress::new(0, 20).percent, 0.0);
        assert_eq!(Progress::new(19, 20).percent, 100.0);
        let mid = Progress::new(5, 11);
        assert!((mid.percent - 50.0).abs() < f64::EPSILON);
        assert_eq!(mid.label(), "Step 6 of 11");
        assert_eq!(Progress::new(0, 1).percent, 100.0);
    }

    #[test]
    fn default_answers_review() {
        let summary = ReviewSummary::from_answers(&AnswerSet::default());
        assert_eq!(summary.sections.len(), 5, "no Other section without calendly/notes");
        assert_eq!(summary.value("Platform Access", "GoHighLevel"), Some("⏳ Pending"));
        assert_eq!(summary.value("Platform Access", "WordPress URL"), Some("—"));
        assert_eq!(summary.value("OpenAI", "Status"), Some("—"));
        assert_eq!(summary.value("Branding", "Colors"), Some("#1E40AF / #3B82F6"));
        assert_eq!(summary.value("Branding", "Logo"), Some("— Not uploaded"));
        assert_eq!(summary.value("Documents", "Sample PDF"), Some("✗ Not uploaded"));
        assert_eq!(summary.value("Documents", "Additional"), Some("0 file(s)"));
    }

    #[test]
    fn filled_answers_review() {
        let answers = AnswerSet {
            title_capture_access: true,
            openai_api_key: "sk-test".into(),
            sample_pdf: Some(FileReference {
                filename: "quote.pdf".into(),
                url: "data:application/pdf;base64,AAAA".into(),
                mime_type: "application/pdf".into(),
                size: 3,
            }),
            notes: "n".repeat(60),
            ..AnswerSet::default()
        };
        let summary = ReviewSummary::from_answers(&answers);
        assert_eq!(summary.value("Platform Access", "Title Capture"), Some("✓ Added"));
        assert_eq!(summary.value("OpenAI", "Status"), Some("✓ Provided"));
        assert_eq!(summary.value("Documents", "Sample PDF"), Some("quote.pdf"));
        assert_eq!(summary.value("Other", "Calendly"), None);
        let notes = summary.value("Other", "Notes").unwrap();
        assert_eq!(notes, format!("{}...", "n".repeat(50)));
    }

    #[test]
    fn needs_help_wins_over_key() {
        let answers = AnswerSet {
            needs_openai_help: true,
            openai_api_key: "sk-stale".into(),
            ..AnswerSet::default()
        };
        let summary = ReviewSummary::from_answers(&answers);
        assert_eq!(summary.value("OpenAI", "Status"), Some("Needs help setting up"));
    }

    #[test]
    fn text_rendering_lists_every_row() {
        let text = ReviewSummary::from_answers(&AnswerSet::default()).to_text();
        assert!(text.starts_with("Client Information\n"));
        assert!(text.contains("  Additional: 0 file(s)\n"));
    }
}
