use crate::entity::{EntityId, Record};
use crate::{DomainError, FieldErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

const NAME_MAX_LEN: usize = 255;
const EMAIL_MAX_LEN: usize = 255;
const PASSWORD_MAX_LEN: usize = 100;

/// Attributes of a user account.
///
/// | Field | Rules |
/// |-------|-------|
/// | `name` | not empty, at most 255 characters |
/// | `email` | an email address, not empty, at most 255 characters |
/// | `password` | not empty, at most 100 characters |
#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProps {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email, custom(function = "email_parts"), length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl UserProps {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            created_at: Utc::now(),
        }
    }
}

pub type UserEntity = Record<UserProps>;

impl Record<UserProps> {
    /// Validates the props and wraps them in a new user with a generated id.
    pub fn create(props: UserProps) -> Result<Self, DomainError> {
        validate_user_props(&props)?;
        Ok(Self::new(props))
    }

    /// Rebuilds a user whose id is already known (e.g. loaded from a fixture).
    pub fn restore(id: EntityId, props: UserProps) -> Result<Self, DomainError> {
        validate_user_props(&props)?;
        Ok(Self::with_id(id, props))
    }

    pub fn name(&self) -> &str {
        &self.props.name
    }

    pub fn email(&self) -> &str {
        &self.props.email
    }

    pub fn password(&self) -> &str {
        &self.props.password
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.props.created_at
    }

    /// Renames the user. On failure the record is left unchanged.
    pub fn update(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let props = UserProps {
            name: name.into(),
            ..self.props.clone()
        };
        validate_user_props(&props)?;
        self.props = props;
        Ok(())
    }

    pub fn update_password(&mut self, password: impl Into<String>) -> Result<(), DomainError> {
        let props = UserProps {
            password: password.into(),
            ..self.props.clone()
        };
        validate_user_props(&props)?;
        self.props = props;
        Ok(())
    }
}

// --- Validation ---

/// Checks every rule on every field and reports all failures at once.
pub fn validate_user_props(props: &UserProps) -> Result<(), DomainError> {
    props
        .validate()
        .map_err(|errors| DomainError::InvalidFields(field_messages(props, &errors)))
}

/// Rejects what the address grammar check lets through: empty dot-separated
/// segments in the local part and domains without a top-level label.
fn email_parts(email: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return Ok(());
    };
    let local_ok = local.split('.').all(|segment| !segment.is_empty());
    let tld_ok = domain
        .rsplit_once('.')
        .is_some_and(|(_, tld)| tld.len() >= 2 && tld.chars().all(|c| c.is_alphabetic()));
    if local_ok && tld_ok {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Turns validator output into one message list per field, format rules
/// first, then emptiness, then length.
fn field_messages(props: &UserProps, errors: &ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, failures) in errors.field_errors() {
        let field = field.to_string();
        let (value, max_len) = match field.as_str() {
            "name" => (props.name.as_str(), NAME_MAX_LEN),
            "email" => (props.email.as_str(), EMAIL_MAX_LEN),
            _ => (props.password.as_str(), PASSWORD_MAX_LEN),
        };

        let mut codes: Vec<&str> = failures.iter().map(|failure| failure.code.as_ref()).collect();
        codes.sort_by_key(|code| match *code {
            "email" => 0,
            "length" => 1,
            _ => 2,
        });
        codes.dedup();

        let messages = codes
            .into_iter()
            .map(|code| match code {
                "email" => format!("{field} must be an email"),
                "length" if value.is_empty() => format!("{field} should not be empty"),
                "length" => format!("{field} must be shorter than or equal to {max_len} characters"),
                other => format!("{field} is invalid ({other})"),
            })
            .collect();
        fields.insert(field, messages);
    }
    fields
}
