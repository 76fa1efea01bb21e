use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Symbols that satisfy the "special character" password requirement.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+\\|[{]};:'\",<.>/?";

/// ASCII digits only; `\d` in `regex` also matches other Unicode digits.
pub const PHONE_PATTERN: &str = r"^\+62[0-9]{8,11}$";

lazy_static! {
    /// Process-wide rule set, compiled once.
    pub static ref RULES: Rules = Rules::default();
}

/// Input fields that carry validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    Password,
    Phone,
}

impl Field {
    /// Name of the field in request and error bodies.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Field::FullName => "fullname",
            Field::Password => "password",
            Field::Phone => "phone",
        }
    }
}

/// Wire field name -> human readable message. One message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: Field, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.0
            .entry(field.wire_name())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(field.wire_name()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field} {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Business rules for user supplied identity fields.
#[derive(Debug, Clone)]
pub struct Rules {
    pub name_min: usize,
    pub name_max: usize,
    pub password_min: usize,
    pub password_max: usize,
    pub password_symbols: &'static str,
    phone: Regex,
}

impl Default for Rules {
    fn default() -> Self {
        Self::with_phone_pattern(PHONE_PATTERN).expect("built-in phone pattern compiles")
    }
}

impl Rules {
    pub fn with_phone_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name_min: 3,
            name_max: 60,
            password_min: 6,
            password_max: 64,
            password_symbols: PASSWORD_SYMBOLS,
            phone: Regex::new(pattern)?,
        })
    }

    pub fn check_full_name(&self, errors: &mut FieldErrors, value: &str) {
        let len = value.chars().count();
        if len == 0 {
            errors.add(Field::FullName, "is a required field");
        } else if len < self.name_min {
            errors.add(
                Field::FullName,
                format!("must be at least {} characters in length", self.name_min),
            );
        } else if len > self.name_max {
            errors.add(
                Field::FullName,
                format!("must be a maximum of {} characters in length", self.name_max),
            );
        }
    }

    pub fn check_password(&self, errors: &mut FieldErrors, value: &str) {
        let len = value.chars().count();
        if len == 0 {
            errors.add(Field::Password, "is a required field");
            return;
        }
        if len < self.password_min || len > self.password_max {
            errors.add(
                Field::Password,
                format!(
                    "must be between {} and {} characters in length",
                    self.password_min, self.password_max
                ),
            );
            return;
        }

        let has_upper = value.chars().any(char::is_uppercase);
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        let has_symbol = value.chars().any(|c| self.password_symbols.contains(c));
        if !(has_upper && has_digit && has_symbol) {
            errors.add(
                Field::Password,
                "must contain uppercase, numeric, and special character minimal 1",
            );
        }
    }

    pub fn check_phone(&self, errors: &mut FieldErrors, value: &str) {
        if value.is_empty() {
            errors.add(Field::Phone, "is a required field");
        } else if !self.phone.is_match(value) {
            errors.add(
                Field::Phone,
                "must start with +62 followed by 8 to 11 digits",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Rules {
        fn is_valid_password(&self, value: &str) -> bool {
            let mut errors = FieldErrors::new();
            self.check_password(&mut errors, value);
            errors.is_empty()
        }

        fn is_valid_phone(&self, value: &str) -> bool {
            let mut errors = FieldErrors::new();
            self.check_phone(&mut errors, value);
            errors.is_empty()
        }
    }

    #[test]
    fn password_policy() {
        assert!(RULES.is_valid_password("Abc123!"));
        assert!(!RULES.is_valid_password("abcdefg"));
        assert!(!RULES.is_valid_password("Ab1!"));
        assert!(!RULES.is_valid_password("ABC1234"));
        assert!(!RULES.is_valid_password(&format!("A1!{}", "a".repeat(62))));
        assert!(RULES.is_valid_password(&format!("A1!{}", "a".repeat(61))));
    }

    #[test]
    fn password_digit_must_be_ascii() {
        assert!(!RULES.is_valid_password("Abcdef½!"));
        assert!(!RULES.is_valid_password("Abcdef²!"));
        assert!(!RULES.is_valid_password("Abcdef٣!"));
        assert!(RULES.is_valid_password("Abcdef3!"));
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // 64 characters, 125 bytes.
        assert!(RULES.is_valid_password(&format!("A1!{}", "é".repeat(61))));
        assert!(!RULES.is_valid_password(&format!("A1!{}", "é".repeat(62))));
        // 6 characters, 9 bytes.
        assert!(RULES.is_valid_password("Aé1!éé"));
        assert!(!RULES.is_valid_password("Aé1!é"));
    }

    #[test]
    fn password_length_failure_has_its_own_message() {
        let mut errors = FieldErrors::new();
        RULES.check_password(&mut errors, "Ab1!");
        assert_eq!(
            errors.get(Field::Password),
            Some("must be between 6 and 64 characters in length")
        );
    }

    #[test]
    fn phone_policy() {
        assert!(RULES.is_valid_phone("+6212345678"));
        assert!(RULES.is_valid_phone("+6212345678901"));
        assert!(!RULES.is_valid_phone("+62123456789012"));
        assert!(!RULES.is_valid_phone("0812345678"));
        assert!(!RULES.is_valid_phone("+62123"));
        assert!(!RULES.is_valid_phone("+62 12345678"));
    }

    #[test]
    fn phone_digits_must_be_ascii() {
        assert!(!RULES.is_valid_phone("+62١٢٣٤٥٦٧٨"));
        assert!(!RULES.is_valid_phone("+62１２３４５６７８"));
        assert!(!RULES.is_valid_phone("+621234567٨"));
    }

    #[test]
    fn full_name_bounds_count_characters() {
        let mut errors = FieldErrors::new();
        RULES.check_full_name(&mut errors, "Jo");
        assert!(errors.get(Field::FullName).is_some());

        let mut errors = FieldErrors::new();
        RULES.check_full_name(&mut errors, "Émé");
        assert!(errors.is_empty());

        let mut errors = FieldErrors::new();
        RULES.check_full_name(&mut errors, &"x".repeat(61));
        assert_eq!(
            errors.get(Field::FullName),
            Some("must be a maximum of 60 characters in length")
        );
    }

    #[test]
    fn violations_aggregate_across_fields() {
        let mut errors = FieldErrors::new();
        RULES.check_full_name(&mut errors, "");
        RULES.check_password(&mut errors, "abcdefg");
        RULES.check_phone(&mut errors, "0812345678");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get(Field::FullName), Some("is a required field"));
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::single(Field::Phone, "first");
        errors.add(Field::Phone, "second");
        assert_eq!(errors.get(Field::Phone), Some("first"));
    }

    #[test]
    fn serializes_with_wire_names() {
        let errors = FieldErrors::single(Field::FullName, "is a required field");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["fullname"], "is a required field");
    }

    #[test]
    fn custom_rules_are_injectable() {
        let rules = Rules::with_phone_pattern(r"^\+1\d{10}$").unwrap();
        assert!(rules.is_valid_phone("+15551234567"));
        assert!(!rules.is_valid_phone("+6212345678"));
    }
}
