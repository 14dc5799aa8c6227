//! Field rules shared by the server (422 responses) and the client forms.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{NewMessage, UserParams};

pub const MAX_CONTENT_LEN: usize = 250;
pub const PHONE_NUMBER_DIGITS: usize = 10;
pub const MIN_PASSWORD_LEN: usize = 6;

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const IMMUTABLE: &str = "can't be changed";

/// Field name -> messages, serialized as `{"phoneNumber": ["can't be blank"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{} {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Length as the browser form counted it: UTF-16 code units.
pub fn content_len(content: &str) -> usize {
    content.encode_utf16().count()
}

pub fn is_valid_phone_number(phone: &str) -> bool {
    phone.len() == PHONE_NUMBER_DIGITS && phone.bytes().all(|b| b.is_ascii_digit())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

pub fn check_phone_number(phone: Option<&str>, errors: &mut FieldErrors) {
    match phone {
        _ if is_blank(phone) => errors.add("phoneNumber", BLANK),
        Some(p) if !is_valid_phone_number(p) => {
            errors.add("phoneNumber", format!("must be {} digits", PHONE_NUMBER_DIGITS))
        }
        _ => {}
    }
}

pub fn check_content(content: Option<&str>, errors: &mut FieldErrors) {
    match content {
        _ if is_blank(content) => errors.add("content", BLANK),
        Some(c) if content_len(c) > MAX_CONTENT_LEN => errors.add(
            "content",
            format!("is too long (maximum is {} characters)", MAX_CONTENT_LEN),
        ),
        _ => {}
    }
}

pub fn check_username_hash(hash: Option<&str>, errors: &mut FieldErrors) {
    if is_blank(hash) {
        errors.add("usernameHash", BLANK);
    }
}

pub fn validate_user(params: &UserParams) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_username_hash(params.username_hash.as_deref(), &mut errors);
    errors.into_result()
}

pub fn validate_new_message(message: &NewMessage) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_phone_number(message.phone_number.as_deref(), &mut errors);
    check_content(message.content.as_deref(), &mut errors);
    check_username_hash(message.username_hash.as_deref(), &mut errors);

    if let (Some(count), Some(content)) = (message.char_count, message.content.as_deref()) {
        if count < 0 || count as usize != content_len(content) {
            errors.add("charCount", "does not match content");
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(phone: &str, content: &str) -> NewMessage {
        NewMessage {
            phone_number: Some(phone.into()),
            content: Some(content.into()),
            username_hash: Some("abc".into()),
            ..Default::default()
        }
    }

    #[test]
    fn phone_numbers_are_exactly_ten_digits() {
        assert!(is_valid_phone_number("5551234567"));
        assert!(!is_valid_phone_number("555123456"));
        assert!(!is_valid_phone_number("55512345678"));
        assert!(!is_valid_phone_number("555-123-45"));
        assert!(!is_valid_phone_number("５５５１２３４５６７"));
    }

    #[test]
    fn content_limit_counts_utf16_units() {
        let ok = "a".repeat(MAX_CONTENT_LEN);
        assert!(validate_new_message(&message("5551234567", &ok)).is_ok());

        // Each emoji is a surrogate pair.
        let too_long = "😀".repeat(MAX_CONTENT_LEN / 2 + 1);
        let errors = validate_new_message(&message("5551234567", &too_long)).unwrap_err();
        assert!(errors.contains("content"));
    }

    #[test]
    fn missing_fields_are_reported_per_field() {
        let errors = validate_new_message(&NewMessage::default()).unwrap_err();
        assert_eq!(errors.get("phoneNumber"), &[BLANK.to_string()]);
        assert_eq!(errors.get("content"), &[BLANK.to_string()]);
        assert_eq!(errors.get("usernameHash"), &[BLANK.to_string()]);
    }

    #[test]
    fn char_count_must_match_content() {
        let mut msg = message("5551234567", "hello");
        msg.char_count = Some(5);
        assert!(validate_new_message(&msg).is_ok());
        msg.char_count = Some(4);
        assert!(validate_new_message(&msg).unwrap_err().contains("charCount"));
    }

    #[test]
    fn blank_username_hash_is_rejected() {
        let params = UserParams { username_hash: Some("   ".into()) };
        assert!(validate_user(&params).is_err());
    }

    #[test]
    fn display_joins_every_message() {
        let mut errors = FieldErrors::single("content", BLANK);
        errors.add("phoneNumber", "must be 10 digits");
        assert_eq!(errors.to_string(), "content can't be blank; phoneNumber must be 10 digits");
    }
}
