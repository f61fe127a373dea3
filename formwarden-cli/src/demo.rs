//! The sign-up form driven by the CLI.

use std::time::Duration;

use formwarden_lib::error::RuleError;
use formwarden_lib::host::MemoryForm;
use formwarden_lib::rules::{Rule, RuleSet};

/// Usernames the simulated lookup reports as taken.
const TAKEN: &[&str] = &["admin", "root", "guest"];

/// Simulated round-trip of the username lookup.
const LOOKUP_LATENCY: Duration = Duration::from_millis(300);

pub fn form() -> MemoryForm {
    MemoryForm::new()
        .with_field("username", "")
        .with_field("email", "")
        .with_field("password", "")
        .with_field("confirm", "")
}

pub fn rules() -> RuleSet {
    RuleSet::builder()
        .field("username")
        .required("Username is required")
        .min_length(3, "Username must be at least 3 characters")
        .rule(Rule::try_async(
            |name, cx| async move {
                tokio::select! {
                    _ = cx.cancel().cancelled() => Err(RuleError::Cancelled),
                    _ = tokio::time::sleep(LOOKUP_LATENCY) => {
                        Ok(!TAKEN.contains(&name.to_lowercase().as_str()))
                    }
                }
            },
            "Username is already taken",
        ))
        .field("email")
        .required("Email is required")
        .email("Please enter a valid email")
        .field("password")
        .required("Password is required")
        .min_length(8, "Password must be at least 8 characters")
        .field("confirm")
        .required("Please confirm your password")
        .equals_field("password", "Passwords do not match")
        .build()
}
