// src/profile.rs
//! Applicant profile: the static record every form answer is drawn from

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub application_settings: ApplicationSettings,
    #[serde(default)]
    pub work_authorization: WorkAuthorization,
    #[serde(default)]
    pub equal_opportunity: EqualOpportunity,
    #[serde(default)]
    pub education: Education,
    #[serde(default)]
    pub screening: Screening,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default, deserialize_with = "string_or_number")]
    pub years_of_experience: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub desired_salary: Option<String>,
    #[serde(default)]
    pub notice_period_days: Option<u32>,
    #[serde(default)]
    pub resume_path: Option<PathBuf>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default = "default_true")]
    pub remote: bool,
    #[serde(default)]
    pub willing_to_relocate: bool,
    #[serde(default = "default_true")]
    pub willing_to_travel: bool,
}

/// Work eligibility. Authorization and sponsorship are independent answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkAuthorization {
    #[serde(default = "default_true")]
    pub authorized_to_work: bool,
    #[serde(default)]
    pub requires_sponsorship: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EqualOpportunity {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub ethnicity: Option<String>,
    #[serde(default)]
    pub veteran_status: Option<String>,
    #[serde(default)]
    pub disability_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field_of_study: Option<String>,
}

/// Background-check answers. Both default to "No".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Screening {
    #[serde(default)]
    pub criminal_record: bool,
    #[serde(default)]
    pub previously_terminated: bool,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            years_of_experience: None,
            desired_salary: None,
            notice_period_days: None,
            resume_path: None,
            cover_letter: None,
            remote: true,
            willing_to_relocate: false,
            willing_to_travel: true,
        }
    }
}

impl Default for WorkAuthorization {
    fn default() -> Self {
        Self {
            authorized_to_work: true,
            requires_sponsorship: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Salary and experience are written as bare numbers in most profiles.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Text(s)) => Some(s),
        Some(Scalar::Int(n)) => Some(n.to_string()),
        Some(Scalar::Float(f)) => Some(f.to_string()),
        None => None,
    })
}

/// Every profile fact a form question can be answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    Linkedin,
    Github,
    Website,
    Location,
    YearsOfExperience,
    DesiredSalary,
    NoticePeriod,
    Sponsorship,
    WorkAuthorization,
    Remote,
    Relocation,
    Travel,
    School,
    Degree,
    FieldOfStudy,
    CriminalRecord,
    Terminated,
    Gender,
    Ethnicity,
    VeteranStatus,
    DisabilityStatus,
    CoverLetter,
    Resume,
    Consent,
}

impl ProfileField {
    /// Fields whose answer is a plain "Yes"/"No".
    pub fn is_yes_no(self) -> bool {
        matches!(
            self,
            ProfileField::Sponsorship
                | ProfileField::WorkAuthorization
                | ProfileField::Remote
                | ProfileField::Relocation
                | ProfileField::Travel
                | ProfileField::CriminalRecord
                | ProfileField::Terminated
                | ProfileField::Consent
        )
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        f.write_str(&name)
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Profile {
    /// Load a profile, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading profile from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        let profile: Profile = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON profile: {}", path.display()))?,
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML profile: {}", path.display()))?,
            Some("yaml") | Some("yml") | None => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML profile: {}", path.display()))?,
            Some(other) => anyhow::bail!(
                "Unsupported profile format: .{}. Use .yaml, .json or .toml",
                other
            ),
        };

        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        let personal = &self.personal_info;
        if personal.first_name.trim().is_empty() {
            anyhow::bail!("Profile is missing personal_info.first_name");
        }
        if personal.last_name.trim().is_empty() {
            anyhow::bail!("Profile is missing personal_info.last_name");
        }
        if !personal.email.contains('@') {
            anyhow::bail!("Profile email is not valid: '{}'", personal.email);
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.personal_info.first_name.trim(),
            self.personal_info.last_name.trim()
        )
    }

    pub fn visa_answer(&self) -> &'static str {
        yes_no(self.work_authorization.requires_sponsorship)
    }

    pub fn authorization_answer(&self) -> &'static str {
        yes_no(self.work_authorization.authorized_to_work)
    }

    /// Value of a profile field, or `None` when the profile leaves it blank
    pub fn value(&self, field: ProfileField) -> Option<String> {
        let personal = &self.personal_info;
        let settings = &self.application_settings;
        let eeo = &self.equal_opportunity;
        let education = &self.education;

        match field {
            ProfileField::FirstName => non_empty(Some(&personal.first_name)),
            ProfileField::LastName => non_empty(Some(&personal.last_name)),
            ProfileField::FullName => Some(self.full_name()),
            ProfileField::Email => non_empty(Some(&personal.email)),
            ProfileField::Phone => non_empty(personal.phone.as_deref()),
            ProfileField::Linkedin => non_empty(personal.linkedin.as_deref()),
            ProfileField::Github => non_empty(personal.github.as_deref()),
            ProfileField::Website => non_empty(personal.website.as_deref())
                .or_else(|| non_empty(personal.portfolio.as_deref())),
            ProfileField::Location => non_empty(personal.location.as_deref()),
            ProfileField::YearsOfExperience => non_empty(settings.years_of_experience.as_deref()),
            ProfileField::DesiredSalary => non_empty(settings.desired_salary.as_deref()),
            ProfileField::NoticePeriod => settings
                .notice_period_days
                .map(|days| format!("{} days", days)),
            ProfileField::Sponsorship => Some(self.visa_answer().to_string()),
            ProfileField::WorkAuthorization => Some(self.authorization_answer().to_string()),
            ProfileField::Remote => Some(yes_no(settings.remote).to_string()),
            ProfileField::Relocation => Some(yes_no(settings.willing_to_relocate).to_string()),
            ProfileField::Travel => Some(yes_no(settings.willing_to_travel).to_string()),
            ProfileField::School => non_empty(education.school.as_deref()),
            ProfileField::Degree => non_empty(education.degree.as_deref()),
            ProfileField::FieldOfStudy => non_empty(education.field_of_study.as_deref()),
            ProfileField::CriminalRecord => {
                Some(yes_no(self.screening.criminal_record).to_string())
            }
            ProfileField::Terminated => {
                Some(yes_no(self.screening.previously_terminated).to_string())
            }
            ProfileField::Gender => non_empty(eeo.gender.as_deref()),
            ProfileField::Ethnicity => non_empty(eeo.ethnicity.as_deref()),
            ProfileField::VeteranStatus => non_empty(eeo.veteran_status.as_deref()),
            ProfileField::DisabilityStatus => non_empty(eeo.disability_status.as_deref()),
            ProfileField::CoverLetter => non_empty(settings.cover_letter.as_deref()),
            ProfileField::Resume => settings
                .resume_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string())
                .filter(|p| !p.is_empty()),
            ProfileField::Consent => Some("Yes".to_string()),
        }
    }

    /// Starter profile written by `autoapply profile init`
    pub fn sample() -> Self {
        Self {
            personal_info: PersonalInfo {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "jane.doe@example.com".to_string(),
                phone: Some("555-010-0199".to_string()),
                linkedin: Some("https://www.linkedin.com/in/janedoe/".to_string()),
                website: Some("https://janedoe.dev".to_string()),
                portfolio: None,
                github: Some("https://github.com/janedoe".to_string()),
                location: Some("New York, NY".to_string()),
            },
            application_settings: ApplicationSettings {
                years_of_experience: Some("5".to_string()),
                desired_salary: Some("150000".to_string()),
                notice_period_days: Some(30),
                resume_path: Some(PathBuf::from("resume.pdf")),
                cover_letter: None,
                remote: true,
                willing_to_relocate: false,
                willing_to_travel: true,
            },
            work_authorization: WorkAuthorization::default(),
            equal_opportunity: EqualOpportunity {
                gender: Some("Decline to self-identify".to_string()),
                ethnicity: Some("Decline to self-identify".to_string()),
                veteran_status: Some("I am not a protected veteran".to_string()),
                disability_status: Some("I do not wish to answer".to_string()),
            },
            education: Education {
                school: Some("State University".to_string()),
                degree: Some("Bachelor's Degree".to_string()),
                field_of_study: Some("Computer Science".to_string()),
            },
            screening: Screening::default(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize profile to YAML")
    }
}
