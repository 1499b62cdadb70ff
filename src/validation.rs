//! Form validation.
//!
//! A [`FormValidator`] holds an ordered rule list per field and records the first failing
//! rule's message per field. Values come in as a JSON object so any serialisable form
//! struct can be validated. [`check_registration`] is the fail-fast registration check used
//! by the session store; it reports only the first violated rule.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::identity::RegistrationData;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").unwrap());

pub fn is_valid_email(s: &str) -> bool { EMAIL_RE.is_match(s) }

/// Digits-only phone check: separators are stripped before matching.
pub fn is_valid_phone(s: &str) -> bool {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    PHONE_RE.is_match(&digits)
}

#[derive(Debug, Clone, PartialEq)]
enum Check {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    Phone,
    Matches(String),
    Range { min: f64, max: f64 },
    Positive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    check: Check,
    message: String,
}

impl Rule {
    fn new(check: Check, message: impl Into<String>) -> Self { Self { check, message: message.into() } }

    pub fn required(message: impl Into<String>) -> Self { Self::new(Check::Required, message) }
    pub fn email(message: impl Into<String>) -> Self { Self::new(Check::Email, message) }
    pub fn min_length(min: usize, message: impl Into<String>) -> Self { Self::new(Check::MinLength(min), message) }
    pub fn max_length(max: usize, message: impl Into<String>) -> Self { Self::new(Check::MaxLength(max), message) }
    pub fn phone(message: impl Into<String>) -> Self { Self::new(Check::Phone, message) }
    pub fn matches(other_field: &str, message: impl Into<String>) -> Self { Self::new(Check::Matches(other_field.to_string()), message) }
    pub fn range(min: f64, max: f64, message: impl Into<String>) -> Self { Self::new(Check::Range { min, max }, message) }
    pub fn positive(message: impl Into<String>) -> Self { Self::new(Check::Positive, message) }

    pub fn message(&self) -> &str { &self.message }

    /// Only `Required` rejects an absent value; the other checks apply to what is present.
    pub fn check(&self, value: &Value, all: &Value) -> bool {
        if !matches!(self.check, Check::Required | Check::Matches(_)) && is_blank(value) {
            return true;
        }
        match &self.check {
            Check::Required => !is_blank(value),
            Check::Email => is_valid_email(&as_text(value)),
            Check::MinLength(n) => as_text(value).chars().count() >= *n,
            Check::MaxLength(n) => as_text(value).chars().count() <= *n,
            Check::Phone => is_valid_phone(&as_text(value)),
            Check::Matches(other) => as_text(value) == as_text(all.get(other).unwrap_or(&Value::Null)),
            Check::Range { min, max } => as_number(value).map(|n| n >= *min && n <= *max).unwrap_or(false),
            Check::Positive => as_number(value).map(|n| n > 0.0).unwrap_or(false),
        }
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn as_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    rules: Vec<(String, Vec<Rule>)>,
    errors: BTreeMap<String, String>,
}

impl FormValidator {
    pub fn new() -> Self { Self::default() }

    pub fn field(mut self, name: &str, rules: Vec<Rule>) -> Self {
        self.rules.push((name.to_string(), rules));
        self
    }

    /// Run one field's rules; the first failure is recorded, success clears the field.
    pub fn validate_field(&mut self, field: &str, values: &Value) -> bool {
        let Some((_, rules)) = self.rules.iter().find(|(f, _)| f == field) else { return true; };
        let value = values.get(field).unwrap_or(&Value::Null);
        match rules.iter().find(|r| !r.check(value, values)) {
            Some(rule) => {
                self.errors.insert(field.to_string(), rule.message.clone());
                false
            }
            None => {
                self.errors.remove(field);
                true
            }
        }
    }

    /// Validate every field with rules; does not stop at the first invalid field.
    pub fn validate_form(&mut self, values: &Value) -> bool {
        let fields: Vec<String> = self.rules.iter().map(|(f, _)| f.clone()).collect();
        let mut ok = true;
        for f in fields.iter() {
            ok &= self.validate_field(f, values);
        }
        ok
    }

    /// Serialise `form` and validate it, returning the field errors as an [`AppError`].
    pub fn validate<T: serde::Serialize>(&mut self, form: &T) -> AppResult<()> {
        let values = serde_json::to_value(form).map_err(|e| AppError::internal("serialize_error".to_string(), e.to_string()))?;
        if self.validate_form(&values) { return Ok(()); }
        Err(AppError::validation_fields("Please check the form for errors.", self.errors.clone()))
    }

    pub fn errors(&self) -> &BTreeMap<String, String> { &self.errors }

    pub fn reset_errors(&mut self) { self.errors.clear(); }
}

pub mod schemas {
    use super::{FormValidator, Rule};

    pub fn registration() -> FormValidator {
        FormValidator::new()
            .field("name", vec![
                Rule::required("Name is required"),
                Rule::min_length(2, "Name must be at least 2 characters"),
                Rule::max_length(100, "Name must not exceed 100 characters"),
            ])
            .field("email", vec![
                Rule::required("Email is required"),
                Rule::email("Invalid email format"),
                Rule::max_length(100, "Email must not exceed 100 characters"),
            ])
            .field("phone", vec![Rule::required("Phone number is required"), Rule::phone("Invalid phone number")])
            .field("business_name", vec![
                Rule::required("Business name is required"),
                Rule::min_length(2, "Business name must be at least 2 characters"),
                Rule::max_length(200, "Business name must not exceed 200 characters"),
            ])
            .field("tin", vec![
                Rule::required("TIN is required"),
                Rule::min_length(5, "TIN must be at least 5 characters"),
                Rule::max_length(50, "TIN must not exceed 50 characters"),
            ])
            .field("password", vec![
                Rule::required("Password is required"),
                Rule::min_length(6, "Password must be at least 6 characters"),
                Rule::max_length(50, "Password must not exceed 50 characters"),
            ])
            .field("password_confirmation", vec![
                Rule::required("Password confirmation is required"),
                Rule::matches("password", "Passwords must match"),
            ])
    }

    pub fn login() -> FormValidator {
        FormValidator::new()
            .field("email", vec![Rule::required("Email is required"), Rule::email("Invalid email format")])
            .field("password", vec![Rule::required("Password is required")])
    }

    pub fn category() -> FormValidator {
        FormValidator::new()
            .field("name", vec![
                Rule::required("Category name is required"),
                Rule::min_length(2, "Category name must be at least 2 characters"),
                Rule::max_length(100, "Category name must not exceed 100 characters"),
            ])
            .field("description", vec![Rule::max_length(500, "Description must not exceed 500 characters")])
    }

    pub fn menu_item() -> FormValidator {
        FormValidator::new()
            .field("item_name", vec![
                Rule::required("Item name is required"),
                Rule::min_length(2, "Item name must be at least 2 characters"),
                Rule::max_length(100, "Item name must not exceed 100 characters"),
            ])
            .field("category_id", vec![Rule::required("Category is required"), Rule::positive("Please select a category")])
            .field("price", vec![
                Rule::required("Price is required"),
                Rule::positive("Price must be positive"),
                Rule::range(f64::MIN, 10_000.0, "Price must not exceed $10,000"),
            ])
            .field("tax_percentage", vec![
                Rule::required("Tax percentage is required"),
                Rule::range(0.0, 100.0, "Tax percentage must be between 0 and 100"),
            ])
            .field("discount", vec![Rule::range(0.0, 100.0, "Discount must be between 0 and 100")])
    }
}

const REQUIRED_REGISTRATION_FIELDS: [&str; 7] =
    ["name", "email", "phone", "business_name", "tin", "password", "password_confirmation"];

/// Fail-fast registration check. Rules run in a fixed order and the first violation is
/// returned.
pub fn check_registration(data: &RegistrationData) -> AppResult<()> {
    let values = [
        &data.name, &data.email, &data.phone, &data.business_name, &data.tin, &data.password, &data.password_confirmation,
    ];
    let missing: Vec<&str> = REQUIRED_REGISTRATION_FIELDS.iter().zip(values.iter())
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(f, _)| *f)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::validation("missing_fields".to_string(), format!("Missing required fields: {}", missing.join(", "))));
    }
    let email = data.email.trim();
    let phone = data.phone.trim();
    if !is_valid_email(email) {
        return Err(AppError::validation("invalid_email", "Please enter a valid email address"));
    }
    if data.password.chars().count() < 6 {
        return Err(AppError::validation("password_too_short", "Password must be at least 6 characters"));
    }
    if data.password != data.password_confirmation {
        return Err(AppError::validation("password_mismatch", "Password confirmation does not match"));
    }
    if phone.chars().count() < 10 {
        return Err(AppError::validation("invalid_phone", "Please enter a valid phone number"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;
