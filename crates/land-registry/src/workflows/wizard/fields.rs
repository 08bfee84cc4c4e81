use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Email,
    Choice(&'static [&'static str]),
}

/// Declarative rule for one form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub name: &'static str,
    pub label: &'static str,
    /// Label used on the review step when it differs from the input label.
    pub review_label: Option<&'static str>,
    /// Step index the input is rendered on.
    pub step: usize,
    pub kind: FieldKind,
    /// Message shown when the field is left blank. `None` marks the field optional.
    pub required: Option<&'static str>,
}

impl FieldRule {
    pub const fn required(
        name: &'static str,
        label: &'static str,
        step: usize,
        kind: FieldKind,
        message: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            review_label: None,
            step,
            kind,
            required: Some(message),
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, step: usize) -> Self {
        Self {
            name,
            label,
            review_label: None,
            step,
            kind: FieldKind::Text,
            required: None,
        }
    }

    pub fn reviewed_as(mut self, review_label: &'static str) -> Self {
        self.review_label = Some(review_label);
        self
    }

    pub fn display_label(&self) -> &'static str {
        self.review_label.unwrap_or(self.label)
    }

    /// Returns the message for the first broken constraint, if any.
    pub fn check(&self, value: Option<&str>) -> Option<String> {
        let value = value.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return self.required.map(str::to_string);
        }

        match self.kind {
            FieldKind::Text => None,
            FieldKind::Number => match value.parse::<f64>() {
                Ok(number) if number.is_finite() => None,
                _ => Some(format!("{} must be a number", self.label)),
            },
            FieldKind::Email => {
                if is_email_shaped(value) {
                    None
                } else {
                    Some("Invalid email address".to_string())
                }
            }
            FieldKind::Choice(options) => {
                if options.iter().any(|option| option.eq_ignore_ascii_case(value)) {
                    None
                } else {
                    Some(format!("{} must be one of: {}", self.label, options.join(", ")))
                }
            }
        }
    }
}

/// `\S+@\S+`: no whitespace and at least one character either side of an `@`.
pub fn is_email_shaped(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    value
        .char_indices()
        .any(|(index, ch)| ch == '@' && index > 0 && index + 1 < value.len())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

/// Entered values plus the inline error currently shown next to each field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormFieldSet {
    values: BTreeMap<&'static str, String>,
    errors: BTreeMap<&'static str, String>,
}

impl FormFieldSet {
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        self.errors.remove(name);
        self.values.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<&'static str, String> {
        &self.values
    }

    /// Checks every rule, refreshing the inline errors for those fields.
    pub fn validate<'a>(
        &mut self,
        rules: impl IntoIterator<Item = &'a FieldRule>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        for rule in rules {
            match rule.check(self.get(rule.name)) {
                Some(message) => {
                    self.errors.insert(rule.name, message.clone());
                    errors.push(FieldError {
                        field: rule.name,
                        message,
                    });
                }
                None => {
                    self.errors.remove(rule.name);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.errors.clear();
    }
}
