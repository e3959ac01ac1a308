// ABOUTME: User account, profile update and profile child-list record types
// ABOUTME: Medications, allergies and conditions are rows of their own keyed by user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Registered user with demographic and vital profile fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: String,
    /// Lowercased email address
    pub email: String,
    /// bcrypt hash; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Birth date (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    /// Self-described gender
    pub gender: Option<String>,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state: Option<String>,
    /// Postal code
    pub zip_code: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Blood group (e.g. "O+")
    pub blood_group: Option<String>,
    /// Height in centimetres
    pub height: Option<f64>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Emergency contact name
    pub emergency_contact_name: Option<String>,
    /// Emergency contact phone
    pub emergency_contact_phone: Option<String>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// When the profile was last updated (RFC 3339)
    pub updated_at: String,
}

/// Data needed to insert a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Lowercased email address
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Birth date (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    /// Self-described gender
    pub gender: Option<String>,
    /// Contact phone number
    pub phone_number: Option<String>,
}

/// Partial profile update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Birth date (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    /// Gender
    pub gender: Option<String>,
    /// Phone number
    pub phone_number: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state: Option<String>,
    /// Postal code
    pub zip_code: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Blood group
    pub blood_group: Option<String>,
    /// Height in centimetres
    pub height: Option<f64>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Emergency contact name
    pub emergency_contact_name: Option<String>,
    /// Emergency contact phone
    pub emergency_contact_phone: Option<String>,
    /// Replacement list of condition names
    pub medical_conditions: Option<Vec<String>>,
    /// Replacement list of allergens
    pub allergies: Option<Vec<String>>,
    /// Replacement list of medication names
    pub current_medications: Option<Vec<String>>,
}

/// Medication the user is taking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    /// Row ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Medication name
    pub name: String,
    /// Dose (e.g. "500mg")
    pub dosage: Option<String>,
    /// Frequency (e.g. "twice daily")
    pub frequency: Option<String>,
    /// Prescribing clinician
    pub prescribed_by: Option<String>,
    /// Start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

/// Known allergy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allergy {
    /// Row ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Substance causing the reaction
    pub allergen: String,
    /// Observed reaction
    pub reaction: Option<String>,
    /// Severity (mild, moderate, severe)
    pub severity: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

/// Diagnosed medical condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Row ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Condition name
    pub name: String,
    /// Diagnosis date (YYYY-MM-DD)
    pub diagnosed_date: Option<String>,
    /// Status (active, managed, resolved)
    pub status: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

/// User row together with its profile lists
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// Account and demographic fields
    #[serde(flatten)]
    pub user: User,
    /// Current medications
    pub medications: Vec<Medication>,
    /// Known allergies
    pub allergies: Vec<Allergy>,
    /// Medical conditions
    pub conditions: Vec<Condition>,
}

/// Restricted projection of a profile used to personalize the assistant
#[derive(Debug, Clone, Default)]
pub struct PatientProfile {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Birth date (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    /// Gender
    pub gender: Option<String>,
    /// Blood group
    pub blood_group: Option<String>,
    /// Height in centimetres
    pub height: Option<f64>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Condition names
    pub medical_conditions: Vec<String>,
    /// Allergen names
    pub allergies: Vec<String>,
    /// Medication names
    pub current_medications: Vec<String>,
}

impl PatientProfile {
    /// Age in whole years at `now`, using a 365.25-day year
    ///
    /// Returns `None` when the birth date is missing or unparseable.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<i64> {
        let dob = self.date_of_birth.as_deref()?;
        let date = NaiveDate::parse_from_str(dob.get(..10).unwrap_or(dob), "%Y-%m-%d").ok()?;
        let born = date.and_hms_opt(0, 0, 0)?.and_utc();
        let elapsed_days = (now - born).num_seconds() as f64 / 86_400.0;
        Some((elapsed_days / 365.25).floor() as i64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_age_uses_fractional_year() {
        let profile = PatientProfile {
            date_of_birth: Some("1990-06-15".to_owned()),
            ..PatientProfile::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap();
        assert_eq!(profile.age_at(now), Some(34));
        let now = Utc.with_ymd_and_hms(2025, 6, 16, 12, 0, 0).unwrap();
        assert_eq!(profile.age_at(now), Some(35));
    }

    #[test]
    fn test_age_accepts_timestamp_prefix() {
        let profile = PatientProfile {
            date_of_birth: Some("2000-01-01T00:00:00Z".to_owned()),
            ..PatientProfile::default()
        };
        let now = Utc.with_ymd_and_hms(2010, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(profile.age_at(now), Some(10));
    }

    #[test]
    fn test_missing_or_bad_birth_date() {
        let now = Utc::now();
        assert_eq!(PatientProfile::default().age_at(now), None);
        let profile = PatientProfile {
            date_of_birth: Some("not a date".to_owned()),
            ..PatientProfile::default()
        };
        assert_eq!(profile.age_at(now), None);
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: "u1".to_owned(),
            email: "a@b.c".to_owned(),
            password_hash: "secret-hash".to_owned(),
            first_name: "A".to_owned(),
            last_name: "B".to_owned(),
            date_of_birth: None,
            gender: None,
            phone_number: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            country: None,
            blood_group: None,
            height: None,
            weight: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
