//! Submitted forms and their validation rules.
//!
//! A form keeps the raw submitted values so it can be shown back to the user
//! together with the per-field errors when validation fails.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::post::{Post, PostContent};

pub const POST_TEXT_MIN_CHARS: usize = 5;
pub const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl PostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id,
            image: post.image.clone(),
        }
    }

    /// Checks the field-level rules. Whether `group` points at an existing
    /// group is a store question and is answered by the post service.
    pub fn clean(&self) -> Result<PostContent, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        let length = text.chars().count();
        if length == 0 {
            errors.add("text", REQUIRED);
        } else if length < POST_TEXT_MIN_CHARS {
            errors.add(
                "text",
                format!(
                    "Post must be at least {POST_TEXT_MIN_CHARS} characters long (it has {length})."
                ),
            );
        }

        let image = self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        errors.into_result()?;
        Ok(PostContent {
            text: text.to_string(),
            group_id: self.group,
            image,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FormErrors::default();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(text.to_string())
    }
}

/// A form as rendered back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct BoundForm<F> {
    pub fields: F,
    pub errors: FormErrors,
}

impl<F> BoundForm<F> {
    pub fn unbound(fields: F) -> Self {
        Self {
            fields,
            errors: FormErrors::default(),
        }
    }

    pub fn with_errors(fields: F, errors: FormErrors) -> Self {
        Self { fields, errors }
    }
}
