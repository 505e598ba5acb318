//! The six-step business registration flow: step schemas, defaults,
//! and a ready-made engine configuration.

use super::{Check, FieldRule, StepSchema};
use crate::answers::FormAnswers;
use crate::engine::FormEngineConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

/// 0: Info, 1: Location, 2: Logo, 3: Profile, 4: Preferences, 5: Profile image.
pub const TOTAL_STEPS: usize = 6;

/// Process-wide session key the registration snapshot persists under.
pub const SESSION_KEY: &str = "formRegistrationState";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap());
static UPPERCASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").unwrap());
static LOWERCASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").unwrap());
static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").unwrap());
static SPECIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\W_]").unwrap());

/// Every key the flow collects, each with its stable default, so
/// partial updates and snapshot merges never produce a missing read.
pub fn default_answers() -> FormAnswers {
    FormAnswers::from_value(json!({
        "businessName": "",
        "businessEmail": "",
        "businessUsername": "",
        "businessPhone": "",
        "businessWebsite": "",
        "businessDescription": "",
        "businessTags": [],
        "address": {
            "street": "", "city": "", "state": "",
            "postalCode": "", "country": "", "formattedAddress": "",
        },
        "locationCoords": { "lat": 0.0, "lng": 0.0 },
        "businessLogoFile": null,
        "existingBusinessLogoUrl": "",
        "name": "",
        "lastName": "",
        "role": "",
        "email": "",
        "phone": "",
        "password": "",
        "confirmPassword": "",
        "timezone": "",
        "preferredChannel": "",
        "currency": "",
        "dailySummaryTime": "",
        "language": "",
        "referralSources": [],
        "acceptTerms": false,
        "profileImageFile": null,
        "existingProfileImageUrl": "",
    }))
}

/// One schema per step. The logo and profile-image steps carry no
/// rules; their uploads are optional.
pub fn step_schemas() -> Vec<Option<StepSchema>> {
    vec![
        Some(business_info()),
        Some(location()),
        Some(StepSchema::empty()),
        Some(profile()),
        Some(preferences()),
        Some(StepSchema::empty()),
    ]
}

pub fn engine_config() -> FormEngineConfig {
    FormEngineConfig {
        session_key: SESSION_KEY.to_string(),
        defaults: default_answers(),
        schemas: step_schemas(),
    }
}

fn business_info() -> StepSchema {
    StepSchema::new(vec![
        FieldRule::new(
            "businessName",
            vec![Check::Required { message: "Business name is required." }],
        ),
        FieldRule::new(
            "businessEmail",
            vec![
                Check::Required { message: "Business email is required." },
                Check::Email { message: "Please enter a valid email address." },
            ],
        ),
        FieldRule::new(
            "businessUsername",
            vec![
                Check::Required { message: "Business username is required." },
                Check::Matches {
                    pattern: &USERNAME_RE,
                    message: "Username may only contain letters, numbers, dots, dashes and underscores.",
                },
            ],
        ),
        FieldRule::new(
            "businessPhone",
            vec![Check::Required { message: "Business phone is required." }],
        ),
        FieldRule::new(
            "businessTags",
            vec![Check::MinItems {
                min: 1,
                message: "Add at least one tag describing your business.",
            }],
        ),
        FieldRule::new(
            "businessWebsite",
            vec![Check::Url { message: "Please enter a valid website URL." }],
        ),
    ])
}

fn location() -> StepSchema {
    StepSchema::new(vec![
        FieldRule::new(
            "locationCoords",
            vec![Check::ObjectRequired {
                message: "Please pin your business location on the map.",
            }],
        ),
        FieldRule::new(
            "locationCoords.lat",
            vec![Check::NumberRequired {
                message: "Please pin your business location on the map.",
            }],
        ),
        FieldRule::new(
            "locationCoords.lng",
            vec![Check::NumberRequired {
                message: "Please pin your business location on the map.",
            }],
        ),
        FieldRule::new(
            "address",
            vec![Check::ObjectRequired { message: "Address details are required." }],
        ),
        FieldRule::new(
            "address.street",
            vec![Check::Required { message: "Street is required." }],
        ),
        FieldRule::new(
            "address.city",
            vec![Check::Required { message: "City is required." }],
        ),
        FieldRule::new(
            "address.postalCode",
            vec![Check::Required { message: "Postal code is required." }],
        ),
        FieldRule::new(
            "address.country",
            vec![Check::Required { message: "Country is required." }],
        ),
    ])
}

fn profile() -> StepSchema {
    StepSchema::new(vec![
        FieldRule::new(
            "name",
            vec![Check::Required { message: "Your name is required." }],
        ),
        FieldRule::new(
            "email",
            vec![
                Check::Required { message: "Your email is required." },
                Check::Email { message: "Please enter a valid email address." },
            ],
        ),
        FieldRule::new(
            "phone",
            vec![Check::Required { message: "Your phone number is required." }],
        ),
        FieldRule::new(
            "password",
            vec![
                Check::Required { message: "Password is required." },
                Check::MinLen {
                    min: 8,
                    message: "Password must be at least 8 characters.",
                },
                Check::Matches {
                    pattern: &UPPERCASE_RE,
                    message: "Password must contain an uppercase letter.",
                },
                Check::Matches {
                    pattern: &LOWERCASE_RE,
                    message: "Password must contain a lowercase letter.",
                },
                Check::Matches {
                    pattern: &DIGIT_RE,
                    message: "Password must contain a number.",
                },
                Check::Matches {
                    pattern: &SPECIAL_RE,
                    message: "Password must contain a special character.",
                },
            ],
        ),
        FieldRule::new(
            "confirmPassword",
            vec![
                Check::Required { message: "Please confirm your password." },
                Check::EqualsField {
                    other: "password",
                    message: "Passwords must match.",
                },
            ],
        ),
    ])
}

fn preferences() -> StepSchema {
    StepSchema::new(vec![
        FieldRule::new(
            "timezone",
            vec![Check::Required { message: "Timezone is required." }],
        ),
        FieldRule::new(
            "currency",
            vec![Check::Required { message: "Currency is required." }],
        ),
        FieldRule::new(
            "language",
            vec![Check::Required { message: "Language is required." }],
        ),
        FieldRule::new(
            "acceptTerms",
            vec![Check::MustBeTrue {
                message: "You must accept the terms and conditions to continue.",
            }],
        ),
    ])
}
