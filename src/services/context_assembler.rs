// ABOUTME: Builds the chat system prompt from the language persona and the caller's medical profile
// ABOUTME: Never fails; profile lookup errors degrade to the bare persona with a warning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Context Assembler
//!
//! Business rules:
//! - Anonymous callers get the persona for their language and nothing else
//! - Authenticated callers additionally get a confidential patient block
//! - Optional fields are omitted rather than rendered empty
//! - A failed or empty profile lookup is logged and the bare persona is used

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use karetek_core::errors::AppResult;
use karetek_core::language::Language;
use karetek_core::models::PatientProfile;
use tracing::{debug, warn};

use crate::database::Database;
use crate::llm::prompts::persona_prompt;
use crate::middleware::RequestIdentity;

/// Where patient profiles come from
#[async_trait]
pub trait PatientProfileSource: Send + Sync {
    /// Load the profile projection and child lists for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be queried
    async fn load_patient_profile(&self, user_id: &str) -> AppResult<Option<PatientProfile>>;
}

/// Production profile source backed by the SQLite database
pub struct DatabaseProfileSource {
    database: Database,
}

impl DatabaseProfileSource {
    /// Read profiles from `database`
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl PatientProfileSource for DatabaseProfileSource {
    async fn load_patient_profile(&self, user_id: &str) -> AppResult<Option<PatientProfile>> {
        let Some(mut profile) = self.database.users().get_patient_basics(user_id).await? else {
            return Ok(None);
        };

        let lists = self.database.profile_lists();
        let (conditions, allergies, medications) = tokio::try_join!(
            lists.list_conditions(user_id),
            lists.list_allergies(user_id),
            lists.list_medications(user_id),
        )?;
        profile.medical_conditions = conditions.into_iter().map(|c| c.name).collect();
        profile.allergies = allergies.into_iter().map(|a| a.allergen).collect();
        profile.current_medications = medications.into_iter().map(|m| m.name).collect();

        Ok(Some(profile))
    }
}

/// Assembles system prompts for chat turns
#[derive(Clone)]
pub struct ContextAssembler {
    source: Arc<dyn PatientProfileSource>,
}

impl ContextAssembler {
    /// Create an assembler reading profiles from `source`
    #[must_use]
    pub fn new(source: Arc<dyn PatientProfileSource>) -> Self {
        Self { source }
    }

    /// System prompt for a turn in `language` made by `identity`
    pub async fn assemble(&self, language: Language, identity: &RequestIdentity) -> String {
        let persona = persona_prompt(language);
        let Some(user) = identity.user() else {
            return persona;
        };

        match self.source.load_patient_profile(&user.user_id).await {
            Ok(Some(profile)) => {
                debug!(user_id = %user.user_id, "Adding patient context to system prompt");
                persona + &format_patient_context(&profile, Utc::now())
            }
            Ok(None) => {
                warn!(user_id = %user.user_id, "No profile for authenticated user, using bare persona");
                persona
            }
            Err(e) => {
                warn!(user_id = %user.user_id, "Failed to load patient context: {e}");
                persona
            }
        }
    }
}

/// Render the confidential patient block appended to the persona
#[must_use]
pub fn format_patient_context(profile: &PatientProfile, now: DateTime<Utc>) -> String {
    let mut block = String::from("\n\nPATIENT CONTEXT (Confidential):\n");
    let _ = writeln!(block, "- Name: {} {}", profile.first_name, profile.last_name);

    if let Some(age) = profile.age_at(now).filter(|age| *age > 0) {
        let _ = writeln!(block, "- Age: {age} years");
    }
    if let Some(gender) = non_empty(profile.gender.as_deref()) {
        let _ = writeln!(block, "- Gender: {gender}");
    }
    if let Some(blood_group) = non_empty(profile.blood_group.as_deref()) {
        let _ = writeln!(block, "- Blood Group: {blood_group}");
    }
    if let (Some(height), Some(weight)) = (profile.height, profile.weight) {
        let _ = writeln!(block, "- Height: {height}cm, Weight: {weight}kg");
    }

    let lists = [
        ("Medical Conditions", &profile.medical_conditions),
        ("Allergies", &profile.allergies),
        ("Current Medications", &profile.current_medications),
    ];
    for (label, items) in lists {
        if !items.is_empty() {
            let _ = writeln!(block, "- {label}: {}", items.join(", "));
        }
    }

    block.push_str(
        "\nUse this information to provide personalized health guidance. Consider their age, \
         gender, existing conditions, and medications when giving advice.",
    );
    block
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use karetek_core::errors::AppError;

    use super::*;
    use crate::middleware::AuthenticatedUser;

    struct FixedSource(AppResult<Option<PatientProfile>>);

    #[async_trait]
    impl PatientProfileSource for FixedSource {
        async fn load_patient_profile(&self, _user_id: &str) -> AppResult<Option<PatientProfile>> {
            match &self.0 {
                Ok(profile) => Ok(profile.clone()),
                Err(e) => Err(AppError::database(e.message.clone())),
            }
        }
    }

    fn signed_in() -> RequestIdentity {
        RequestIdentity::Authenticated(AuthenticatedUser {
            user_id: "u1".to_owned(),
            email: "a@b.c".to_owned(),
        })
    }

    fn ayesha() -> PatientProfile {
        PatientProfile {
            first_name: "Ayesha".to_owned(),
            last_name: "Khan".to_owned(),
            date_of_birth: Some("1990-01-01".to_owned()),
            gender: Some("female".to_owned()),
            blood_group: Some("O+".to_owned()),
            height: Some(165.0),
            weight: Some(60.5),
            medical_conditions: vec![],
            allergies: vec!["Penicillin".to_owned()],
            current_medications: vec!["Metformin".to_owned(), "Aspirin".to_owned()],
        }
    }

    #[test]
    fn test_full_block() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let block = format_patient_context(&ayesha(), now);
        assert!(block.starts_with("\n\nPATIENT CONTEXT (Confidential):\n- Name: Ayesha Khan\n"));
        assert!(block.contains("- Age: 35 years\n"));
        assert!(block.contains("- Gender: female\n"));
        assert!(block.contains("- Blood Group: O+\n"));
        assert!(block.contains("- Height: 165cm, Weight: 60.5kg\n"));
        assert!(block.contains("- Allergies: Penicillin\n"));
        assert!(block.contains("- Current Medications: Metformin, Aspirin\n"));
        assert!(!block.contains("Medical Conditions"));
        assert!(block.ends_with("medications when giving advice."));
    }

    #[test]
    fn test_conditions_line_when_present() {
        let mut profile = ayesha();
        profile.medical_conditions = vec!["Asthma".to_owned(), "Diabetes".to_owned()];
        let block = format_patient_context(&profile, Utc::now());
        assert!(block.contains("- Medical Conditions: Asthma, Diabetes\n"));
    }

    #[test]
    fn test_partial_fields_are_omitted() {
        let profile = PatientProfile {
            first_name: "Omar".to_owned(),
            last_name: "Ali".to_owned(),
            height: Some(180.0),
            ..PatientProfile::default()
        };
        let block = format_patient_context(&profile, Utc::now());
        assert!(!block.contains("Age"));
        assert!(!block.contains("Gender"));
        assert!(!block.contains("Height"));
    }

    #[tokio::test]
    async fn test_anonymous_gets_bare_persona() {
        let assembler = ContextAssembler::new(Arc::new(FixedSource(Ok(Some(ayesha())))));
        let prompt = assembler
            .assemble(Language::En, &RequestIdentity::Anonymous)
            .await;
        assert_eq!(prompt, persona_prompt(Language::En));
    }

    #[tokio::test]
    async fn test_fetch_failure_gets_bare_persona() {
        let assembler =
            ContextAssembler::new(Arc::new(FixedSource(Err(AppError::database("down")))));
        let prompt = assembler.assemble(Language::Ur, &signed_in()).await;
        assert_eq!(prompt, persona_prompt(Language::Ur));
    }

    #[tokio::test]
    async fn test_authenticated_gets_context() {
        let assembler = ContextAssembler::new(Arc::new(FixedSource(Ok(Some(ayesha())))));
        let prompt = assembler.assemble(Language::En, &signed_in()).await;
        assert!(prompt.starts_with(&persona_prompt(Language::En)));
        assert!(prompt.contains("PATIENT CONTEXT (Confidential):"));
    }
}
