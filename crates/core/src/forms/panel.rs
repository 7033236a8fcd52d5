//! Panel create/edit form.

use super::{TextRule, ValidationErrors};
use crate::models::{PanelInput, PanelOutput};
use crate::types::PanelType;

const NAME: TextRule = TextRule {
    field: "name",
    label: "Panel name",
    required: true,
    min: 3,
    max: 100,
};

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

const MAX_URL_LENGTH: usize = 500;

/// Values of the panel form.
#[derive(Clone)]
pub struct PanelForm {
    /// Panel type tag, `3x-ui` unless chosen otherwise.
    pub panel_type: String,
    pub name: String,
    pub url: String,
    pub sub_url: Option<String>,
    pub username: String,
    pub password: String,
    pub is_active: bool,
}

impl Default for PanelForm {
    fn default() -> Self {
        Self {
            panel_type: PanelType::default().to_string(),
            name: String::new(),
            url: String::new(),
            sub_url: None,
            username: String::new(),
            password: String::new(),
            is_active: true,
        }
    }
}

impl std::fmt::Debug for PanelForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelForm")
            .field("panel_type", &self.panel_type)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("sub_url", &self.sub_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .finish()
    }
}

impl PanelForm {
    /// Prefill the form from an existing panel.
    ///
    /// Credentials are never returned by the backend, so they stay blank.
    #[must_use]
    pub fn from_panel(panel: &PanelOutput) -> Self {
        Self {
            panel_type: panel.panel_type.to_string(),
            name: panel.name.clone(),
            url: panel.url.clone(),
            sub_url: None,
            username: String::new(),
            password: String::new(),
            is_active: panel.is_active,
        }
    }

    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the field errors when a rule fails.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.panel_type.trim().is_empty() {
            errors.add("panel_type", "Panel type is required");
        }

        NAME.check(&self.name, &mut errors);

        if self.url.is_empty() {
            errors.add("url", "Panel URL is required");
        } else if !is_valid_url(&self.url) {
            errors.add("url", "Must be a valid URL");
        } else if self.url.chars().count() > MAX_URL_LENGTH {
            errors.add("url", "URL must be less than 500 characters");
        }

        if let Some(sub_url) = self.sub_url()
            && !is_valid_url(sub_url)
        {
            errors.add("sub_url", "Must be a valid URL if provided");
        }

        USERNAME.check(&self.username, &mut errors);
        PASSWORD.check(&self.password, &mut errors);

        errors.into_result()
    }

    /// Build the create/update payload.
    #[must_use]
    pub fn to_input(&self) -> PanelInput {
        PanelInput {
            panel_type: PanelType::from(self.panel_type.trim()),
            name: self.name.trim().to_owned(),
            url: self.url.trim().to_owned(),
            sub_url: self.sub_url().map(str::to_owned),
            username: self.username.clone(),
            password: self.password.clone(),
            is_active: self.is_active,
        }
    }

    /// Subscription URL, with blank input treated as absent.
    fn sub_url(&self) -> Option<&str> {
        self.sub_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn is_valid_url(s: &str) -> bool {
    url::Url::parse(s.trim()).is_ok_and(|u| u.has_host() || u.scheme() == "file")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::PanelId;

    fn valid_form() -> PanelForm {
        PanelForm {
            name: "germany".to_owned(),
            url: "https://de.example.net:2053/panel/".to_owned(),
            username: "admin".to_owned(),
            password: "s3cret!".to_owned(),
            ..PanelForm::default()
        }
    }

    #[test]
    fn test_default_panel_type() {
        assert_eq!(PanelForm::default().panel_type, "3x-ui");
        assert!(PanelForm::default().is_active);
    }

    #[test]
    fn test_valid_form() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_url_rules() {
        let form = PanelForm {
            url: String::new(),
            ..valid_form()
        };
        assert_eq!(
            form.validate().unwrap_err().for_field("url"),
            Some("Panel URL is required")
        );

        let form = PanelForm {
            url: "de.example.net".to_owned(),
            ..valid_form()
        };
        assert_eq!(
            form.validate().unwrap_err().for_field("url"),
            Some("Must be a valid URL")
        );

        let form = PanelForm {
            url: format!("https://example.net/{}", "a".repeat(500)),
            ..valid_form()
        };
        assert_eq!(
            form.validate().unwrap_err().for_field("url"),
            Some("URL must be less than 500 characters")
        );
    }

    #[test]
    fn test_sub_url_optional_but_checked() {
        let form = PanelForm {
            sub_url: Some("  ".to_owned()),
            ..valid_form()
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.to_input().sub_url, None);

        let form = PanelForm {
            sub_url: Some("not a url".to_owned()),
            ..valid_form()
        };
        assert_eq!(
            form.validate().unwrap_err().for_field("sub_url"),
            Some("Must be a valid URL if provided")
        );
    }

    #[test]
    fn test_name_and_credentials() {
        let form = PanelForm {
            name: "de".to_owned(),
            username: String::new(),
            password: "abc".to_owned(),
            ..valid_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(
            err.for_field("name"),
            Some("Panel name must be at least 3 characters")
        );
        assert_eq!(err.for_field("username"), Some("Username is required"));
        assert_eq!(
            err.for_field("password"),
            Some("Password must be at least 4 characters")
        );
    }

    #[test]
    fn test_from_panel_leaves_credentials_blank() {
        let panel = PanelOutput {
            id: PanelId::new(2),
            panel_type: PanelType::Marzban,
            name: "netherlands".to_owned(),
            url: "https://nl.example.net".to_owned(),
            is_active: false,
        };
        let form = PanelForm::from_panel(&panel);
        assert_eq!(form.panel_type, "marzban");
        assert!(form.username.is_empty());
        assert!(form.password.is_empty());
        assert!(!form.is_active);
    }
}
