// ABOUTME: Core data models for the Karetek telehealth API
// ABOUTME: Re-exports user, health data and consultation record types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Data Models
//!
//! Row types mirror the database columns and serialize with the same
//! snake_case names. Request payloads live next to the routes that accept them.
//!
//! ## Core Models
//!
//! - `User`: account and demographic profile
//! - `Medication`, `Allergy`, `Condition`: per-user profile lists
//! - `HealthMetric`, `HealthRecord`: user-owned health data
//! - `Consultation`: one chat session compacted into a single row

mod consultation;
mod health;
mod user;

pub use consultation::{ChatTurn, Consultation, TurnRole};
pub use health::{HealthMetric, HealthRecord};
pub use user::{
    Allergy, Condition, Medication, NewUser, PatientProfile, ProfileUpdate, User, UserProfile,
};
