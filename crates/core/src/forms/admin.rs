//! Admin create/edit form.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{TextRule, ValidationErrors};
use crate::models::{AdminInput, AdminOutput};
use crate::types::{ExpiryInput, Flow, InboundId, InboundSelection, PanelType};

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
    required: false,
    min: 4,
    max: 100,
};

/// Values of the admin form.
///
/// Traffic is entered in gigabytes and expiry as days from today; both are
/// converted to the backend representation by [`AdminForm::to_input`].
#[derive(Clone)]
pub struct AdminForm {
    pub username: String,
    pub password: String,
    /// Name of the panel the admin is provisioned on.
    pub panel: String,
    pub inbound_id: Option<InboundId>,
    pub flow: Option<Flow>,
    /// Stored flow that is not a known value. Submitting is blocked until a
    /// flow is chosen with [`AdminForm::set_flow`].
    pub unknown_flow: Option<String>,
    pub traffic_gb: Decimal,
    pub return_traffic: bool,
    pub is_active: bool,
    pub expiry: ExpiryInput,
}

impl Default for AdminForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            panel: String::new(),
            inbound_id: None,
            flow: None,
            unknown_flow: None,
            traffic_gb: Decimal::ZERO,
            return_traffic: false,
            is_active: true,
            expiry: ExpiryInput::None,
        }
    }
}

impl std::fmt::Debug for AdminForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("panel", &self.panel)
            .field("inbound_id", &self.inbound_id)
            .field("flow", &self.flow)
            .field("unknown_flow", &self.unknown_flow)
            .field("traffic_gb", &self.traffic_gb)
            .field("return_traffic", &self.return_traffic)
            .field("is_active", &self.is_active)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl AdminForm {
    /// Prefill the form from an existing admin.
    ///
    /// The password is left blank and must be entered again.
    #[must_use]
    pub fn from_admin(admin: &AdminOutput, today: NaiveDate) -> Self {
        let flow = admin.flow();
        let unknown_flow = admin
            .flow
            .as_deref()
            .map(str::trim)
            .filter(|raw| flow.is_none() && !raw.is_empty())
            .map(str::to_owned);
        Self {
            username: admin.username.clone(),
            password: String::new(),
            panel: admin.panel.clone(),
            inbound_id: admin.inbound_id,
            flow,
            unknown_flow,
            traffic_gb: admin.traffic.to_gb(),
            return_traffic: admin.return_traffic,
            is_active: admin.is_active,
            expiry: ExpiryInput::from_stored(admin.expiry_date.as_deref(), today),
        }
    }

    /// Choose the flow, replacing any unrecognised stored value.
    pub fn set_flow(&mut self, flow: Option<Flow>) {
        self.flow = flow;
        self.unknown_flow = None;
    }

    /// Validate the form against the type of the selected panel.
    ///
    /// `panel_type` is `None` when the panel name could not be resolved, in
    /// which case no panel-specific rule applies.
    ///
    /// # Errors
    ///
    /// Returns the field errors when a rule fails.
    pub fn validate(&self, panel_type: Option<&PanelType>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        USERNAME.check(&self.username, &mut errors);
        PASSWORD.check(&self.password, &mut errors);

        if self.panel.trim().is_empty() {
            errors.add("panel", "Panel selection is required");
        }

        if let Some(raw) = &self.unknown_flow
            && self.flow.is_none()
        {
            errors.add("flow", format!("Unknown flow '{raw}', choose a flow"));
        } else if let Some(panel_type) = panel_type
            && panel_type.requires_flow()
            && self.flow.is_none()
        {
            errors.add("flow", format!("Flow is required for {panel_type} panels"));
        }

        if self.traffic_gb.is_sign_negative() && !self.traffic_gb.is_zero() {
            errors.add("traffic", "Traffic cannot be negative");
        }

        if let ExpiryInput::Days(days) = self.expiry
            && !days.is_finite()
        {
            errors.add("expiry_date", "Expiry must be a number of days");
        }

        errors.into_result()
    }

    /// Build the create/update payload.
    ///
    /// Marzban admins carry their inbound selection and reuse the admin
    /// password as the Marzban password; other panel types send neither.
    #[must_use]
    pub fn to_input(
        &self,
        panel_type: Option<&PanelType>,
        selection: &InboundSelection,
        today: NaiveDate,
    ) -> AdminInput {
        let is_marzban = panel_type.is_some_and(PanelType::uses_inbound_selection);
        AdminInput {
            username: self.username.trim().to_owned(),
            password: self.password.clone(),
            panel: self.panel.clone(),
            inbound_id: self.inbound_id,
            marzban_inbounds: selection.to_wire(),
            marzban_password: is_marzban.then(|| self.password.clone()),
            flow: self.flow,
            traffic: self.traffic_gb,
            return_traffic: self.return_traffic,
            is_active: self.is_active,
            expiry_date: self.expiry.to_wire(today),
        }
    }
}
