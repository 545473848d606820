//! Step catalog — the ordered, immutable list of wizard steps.
//!
//! The catalog is the wizard's transition table. It is built once at startup
//! (the instruction step embeds the configured admin e-mail) and shared as
//! `Arc<StepCatalog>` afterwards.

use serde::Serialize;

use super::model::Field;

/// Whether a step must be answered before moving on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    /// Explicitly optional; the continue control reads "Skip" while empty.
    Optional,
    /// The step does not declare a requirement (choices, static content).
    Unspecified,
}

/// Input flavour of a single-line text step. Only affects rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextInput {
    Plain,
    Email,
    Phone,
    Password,
}

/// One selectable answer of a choice step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub label: String,
    pub value: bool,
}

impl Choice {
    fn new(label: &str, value: bool) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// Kind-specific shape of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Welcome,
    Text {
        input: TextInput,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    Url {
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    TextArea {
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    Instruction {
        email: String,
        platforms: Vec<String>,
    },
    Choice {
        choices: Vec<Choice>,
    },
    Color,
    File {
        accept: Vec<String>,
    },
    MultiFile {
        accept: Vec<String>,
    },
    Review,
    ThankYou,
}

/// A single wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: &'static str,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    pub requirement: Requirement,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    fn new(id: &'static str, prompt: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            description: None,
            field: None,
            requirement: Requirement::Unspecified,
            kind,
        }
    }

    fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn bind(mut self, field: Field, requirement: Requirement) -> Self {
        self.field = Some(field);
        self.requirement = requirement;
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }

    /// Whether a file of `mime` may be attached to this step.
    ///
    /// Matches the accept list exactly or through a `type/*` wildcard.
    /// Steps that take no files accept nothing.
    pub fn accepts(&self, mime: &str) -> bool {
        let accept = match &self.kind {
            StepKind::File { accept } | StepKind::MultiFile { accept } => accept,
            _ => return false,
        };
        let mime = mime.trim().to_ascii_lowercase();
        accept.iter().any(|pattern| {
            pattern == "*"
                || *pattern == mime
                || pattern
                    .strip_suffix("/*")
                    .is_some_and(|prefix| mime.split('/').next() == Some(prefix))
        })
    }

    /// Whether pressing Enter should advance. Multi-line input keeps Enter.
    pub fn submits_on_enter(&self) -> bool {
        !matches!(self.kind, StepKind::TextArea { .. })
    }

    pub fn is_review(&self) -> bool {
        matches!(self.kind, StepKind::Review)
    }

    pub fn is_thank_you(&self) -> bool {
        matches!(self.kind, StepKind::ThankYou)
    }
}

/// A conditional forward skip.
///
/// When the wizard advances from `trigger` and the flag field `when` is
/// true, the step right after `trigger` (`skipped`) is bypassed. Retreating
/// mirrors the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipRule {
    pub trigger: &'static str,
    pub skipped: &'static str,
    pub when: Field,
}

/// The ordered step list plus its skip rules.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCatalog {
    steps: Vec<Step>,
    skip_rules: Vec<SkipRule>,
}

impl StepCatalog {
    pub fn new(steps: Vec<Step>, skip_rules: Vec<SkipRule>) -> Self {
        Self { steps, skip_rules }
    }

    /// The standard client onboarding flow.
    pub fn standard(admin_email: &str) -> Self {
        let yes_or_later = |yes: &str| vec![Choice::new(yes, true), Choice::new("I'll do this later", false)];

        let steps = vec![
            Step::new("welcome", "Welcome to Cloud Title Onboarding", StepKind::Welcome).describe(
                "Let's get you set up for your AI Chatbot & Title Quote Engine project. \
                 This will take about 3-5 minutes.",
            ),
            Step::new(
                "companyName",
                "What is your company name?",
                StepKind::Text {
                    input: TextInput::Plain,
                    placeholder: Some("Cloud Title".into()),
                },
            )
            .bind(Field::CompanyName, Requirement::Required),
            Step::new(
                "contactPerson",
                "Who is the main contact for this project?",
                StepKind::Text {
                    input: TextInput::Plain,
                    placeholder: Some("John Doe".into()),
                },
            )
            .bind(Field::ContactPerson, Requirement::Required),
            Step::new(
                "email",
                "What's your email address?",
                StepKind::Text {
                    input: TextInput::Email,
                    placeholder: Some("john@cloudtitle.com".into()),
                },
            )
            .describe("We'll use this to send project updates and deliverables.")
            .bind(Field::Email, Requirement::Required),
            Step::new(
                "phone",
                "What's your phone number?",
                StepKind::Text {
                    input: TextInput::Phone,
                    placeholder: Some("(555) 123-4567".into()),
                },
            )
            .bind(Field::Phone, Requirement::Required),
            Step::new(
                "platformAccess",
                "Grant us access to your platforms",
                StepKind::Instruction {
                    email: admin_email.to_string(),
                    platforms: vec![
                        "Title Capture - Add as team member".into(),
                        "GoHighLevel - Add as agency admin (for snapshot import)".into(),
                        "WordPress - Add as administrator".into(),
                    ],
                },
            )
            .describe(
                "Please add our team member to the following platforms so we can set up your chatbot:",
            ),
            Step::new(
                "titleCaptureAccess",
                "Have you added us to Title Capture?",
                StepKind::Choice {
                    choices: yes_or_later("Yes, I've added the team member"),
                },
            )
            .describe(format!(
                "Please add {admin_email} as a team member to your Title Capture account."
            ))
            .bind(Field::TitleCaptureAccess, Requirement::Unspecified),
            Step::new(
                "ghlAccess",
                "Have you added us to GoHighLevel?",
                StepKind::Choice {
                    choices: yes_or_later("Yes, I've added the admin"),
                },
            )
            .describe(format!(
                "Please add {admin_email} as an agency admin so we can import snapshots and customize your setup."
            ))
            .bind(Field::GhlAccess, Requirement::Unspecified),
            Step::new(
                "wordpressUrl",
                "What is your WordPress site URL?",
                StepKind::Url {
                    placeholder: Some("https://cloudtitle.com".into()),
                },
            )
            .bind(Field::WordpressUrl, Requirement::Required),
            Step::new(
                "wordpressAccess",
                "Have you added us to WordPress?",
                StepKind::Choice {
                    choices: yes_or_later("Yes, I've added the admin"),
                },
            )
            .describe(format!(
                "Please add {admin_email} as an administrator to your WordPress site."
            ))
            .bind(Field::WordpressAccess, Requirement::Unspecified),
            Step::new(
                "needsOpenaiHelp",
                "Do you have an OpenAI API Key?",
                StepKind::Choice {
                    choices: vec![
                        Choice::new("Yes, I have one", false),
                        Choice::new("No, I need help setting one up", true),
                    ],
                },
            )
            .describe("Required for the AI chatbot functionality.")
            .bind(Field::NeedsOpenaiHelp, Requirement::Unspecified),
            Step::new(
                "openaiApiKey",
                "Please enter your OpenAI API Key",
                StepKind::Text {
                    input: TextInput::Password,
                    placeholder: Some("sk-xxxxxxxxxxxxx".into()),
                },
            )
            .describe("Get this from platform.openai.com → API Keys")
            .bind(Field::OpenaiApiKey, Requirement::Optional),
            Step::new("brandColors", "What are your brand colors?", StepKind::Color)
                .describe("We'll use these for the chatbot widget and PDF branding."),
            Step::new(
                "logo",
                "Upload your company logo (Optional)",
                StepKind::File {
                    accept: vec!["image/png".into(), "image/svg+xml".into(), "image/jpeg".into()],
                },
            )
            .describe(
                "PNG or SVG format recommended. This will appear on PDFs and the chat widget.",
            )
            .bind(Field::Logo, Requirement::Optional),
            Step::new(
                "samplePdf",
                "Upload a sample Title Capture PDF",
                StepKind::File {
                    accept: vec!["application/pdf".into()],
                },
            )
            .describe("We'll match the layout and styling of your current quotes.")
            .bind(Field::SamplePdf, Requirement::Required),
            Step::new(
                "additionalDocs",
                "Upload any additional documents (Optional)",
                StepKind::MultiFile {
                    accept: vec![
                        "application/pdf".into(),
                        "application/msword".into(),
                        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                            .into(),
                    ],
                },
            )
            .describe(
                "FAQ documents, Safe Listing Program info, JV/Franchise info, Fee Structure documents",
            )
            .bind(Field::AdditionalDocs, Requirement::Optional),
            Step::new(
                "calendlyLink",
                "Do you have a Calendly scheduling link? (Optional)",
                StepKind::Url {
                    placeholder: Some("https://calendly.com/your-link".into()),
                },
            )
            .describe("For JV/Franchise inquiry scheduling.")
            .bind(Field::CalendlyLink, Requirement::Optional),
            Step::new(
                "notes",
                "Any additional notes or instructions?",
                StepKind::TextArea {
                    placeholder: Some("Type your notes here...".into()),
                },
            )
            .describe("Anything else we should know about your project.")
            .bind(Field::Notes, Requirement::Optional),
            Step::new("review", "Review your information", StepKind::Review)
                .describe("Please make sure everything looks correct before submitting."),
            Step::new("thankyou", "Thank you!", StepKind::ThankYou).describe(
                "Your onboarding information has been submitted successfully. \
                 We'll be in touch shortly to kick off your project.",
            ),
        ];

        let skip_rules = vec![SkipRule {
            trigger: "needsOpenaiHelp",
            skipped: "openaiApiKey",
            when: Field::NeedsOpenaiHelp,
        }];

        Self::new(steps, skip_rules)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the final step. Zero for an empty catalog.
    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn skip_rules(&self) -> &[SkipRule] {
        &self.skip_rules
    }

    /// Position of the step with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// The step that writes `field`, if any.
    pub fn step_for_field(&self, field: Field) -> Option<&Step> {
        self.steps.iter().find(|s| s.field == Some(field))
    }
}
