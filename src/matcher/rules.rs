// src/matcher/rules.rs
//! The ordered keyword table. First rule with a keyword inside the question wins.

use crate::profile::ProfileField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub keywords: &'static [&'static str],
    pub field: ProfileField,
}

impl Rule {
    pub const fn new(keywords: &'static [&'static str], field: ProfileField) -> Self {
        Self { keywords, field }
    }

    pub fn matches(&self, question: &str) -> bool {
        self.keywords.iter().any(|keyword| question.contains(keyword))
    }
}

// Order is the tie-breaker. "without sponsorship" asks about authorization and
// has to be seen before the plain sponsorship keywords.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule::new(
        &[
            "without sponsorship",
            "without visa sponsorship",
            "without requiring sponsorship",
            "without the need for sponsorship",
            "without requiring visa",
        ],
        ProfileField::WorkAuthorization,
    ),
    Rule::new(&["sponsorship", "sponsor", "visa"], ProfileField::Sponsorship),
    Rule::new(
        &[
            "authorized to work",
            "authorised to work",
            "authorized",
            "authorised",
            "legally",
            "eligible to work",
            "right to work",
            "work permit",
        ],
        ProfileField::WorkAuthorization,
    ),
    Rule::new(&["first name", "given name", "firstname"], ProfileField::FirstName),
    Rule::new(
        &["last name", "family name", "surname", "lastname"],
        ProfileField::LastName,
    ),
    Rule::new(&["full name", "legal name", "your name"], ProfileField::FullName),
    Rule::new(&["email", "e-mail"], ProfileField::Email),
    Rule::new(&["phone", "mobile", "telephone"], ProfileField::Phone),
    Rule::new(&["linkedin"], ProfileField::Linkedin),
    Rule::new(&["github"], ProfileField::Github),
    Rule::new(
        &["website", "portfolio", "personal site", "url"],
        ProfileField::Website,
    ),
    Rule::new(&["cover letter"], ProfileField::CoverLetter),
    Rule::new(&["gender"], ProfileField::Gender),
    Rule::new(
        &["race", "ethnicity", "hispanic", "latino"],
        ProfileField::Ethnicity,
    ),
    Rule::new(&["veteran"], ProfileField::VeteranStatus),
    Rule::new(&["disability", "disabled"], ProfileField::DisabilityStatus),
    Rule::new(
        &["convicted", "criminal", "felony", "felonies"],
        ProfileField::CriminalRecord,
    ),
    Rule::new(
        &["terminated", "fired", "dismissed from"],
        ProfileField::Terminated,
    ),
    Rule::new(&["travel"], ProfileField::Travel),
    Rule::new(
        &["field of study", "area of study", "major"],
        ProfileField::FieldOfStudy,
    ),
    Rule::new(
        &["degree", "education", "bachelor", "master's"],
        ProfileField::Degree,
    ),
    Rule::new(&["university", "college", "school"], ProfileField::School),
    Rule::new(
        &["years of experience", "experience", "years", "how long"],
        ProfileField::YearsOfExperience,
    ),
    Rule::new(
        &["salary", "compensation", "pay", "expectation"],
        ProfileField::DesiredSalary,
    ),
    Rule::new(
        &["notice", "available", "when can", "start"],
        ProfileField::NoticePeriod,
    ),
    Rule::new(&["city", "location", "located"], ProfileField::Location),
    Rule::new(&["remote"], ProfileField::Remote),
    Rule::new(&["relocate", "relocation"], ProfileField::Relocation),
    Rule::new(
        &["agree", "acknowledge", "confirm", "accept", "consent", "certify"],
        ProfileField::Consent,
    ),
];

/// Keywords that mark a file input as the resume upload.
pub const RESUME_KEYWORDS: &[&str] = &["resume", "résumé", "cv", "curriculum"];
