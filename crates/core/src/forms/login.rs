//! Console login form.

use super::{TextRule, ValidationErrors};

const USERNAME: TextRule = TextRule {
    field: "username",
    label: "Username",
    required: true,
    min: 3,
    max: 50,
};

const PASSWORD: TextRule = TextRule {
    field: "password",
    label: "Password",
    required: true,
    min: 4,
    max: 100,
};

/// Credentials entered on the login form.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginForm {
    /// Validate the credentials.
    ///
    /// # Errors
    ///
    /// Returns the field errors when a rule fails.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        USERNAME.check(&self.username, &mut errors);
        PASSWORD.check(&self.password, &mut errors);
        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_valid() {
        let form = LoginForm {
            username: "root".to_owned(),
            password: "hunter2".to_owned(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_login_both_fields_reported() {
        let err = LoginForm::default().validate().unwrap_err();
        assert_eq!(err.for_field("username"), Some("Username is required"));
        assert_eq!(err.for_field("password"), Some("Password is required"));
    }

    #[test]
    fn test_login_debug_redacts_password() {
        let form = LoginForm {
            username: "root".to_owned(),
            password: "hunter2".to_owned(),
        };
        let debug_output = format!("{form:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
