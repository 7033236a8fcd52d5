//! Client management on the inbound an admin is bound to.
//!
//! Each admin resells one inbound of one 3x-ui / tx-ui panel. The service
//! lists that inbound's clients and creates, edits, deletes or resets them
//! directly on the panel. Every failure is logged with the admin's name and
//! returned to the caller.

use std::collections::HashSet;

use chrono::NaiveDate;
use proxy_console_core::forms::UserForm;
use proxy_console_core::{AdminOutput, Flow, InboundId, TrafficError, ValidationErrors};
use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;
use tracing::instrument;

use crate::panels::{ClientInput, InboundClient, PanelError, PanelUser, XuiClient};

/// Length of generated subscription ids.
const SUB_ID_LENGTH: usize = 16;

/// Errors that can occur in client management.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The admin has no inbound assigned.
    #[error("Admin {0} has no inbound assigned")]
    NoInbound(String),

    /// The admin's inbound does not exist on the panel.
    #[error("Inbound {0} not found on the panel")]
    InboundNotFound(InboundId),

    /// No client with this UUID is configured on the inbound.
    #[error("Client {0} not found")]
    ClientNotFound(String),

    /// The client form failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// The quota cannot be represented.
    #[error("{0}")]
    Traffic(#[from] TrafficError),

    /// The panel call failed.
    #[error(transparent)]
    Panel(#[from] PanelError),
}

/// Random lowercase alphanumeric subscription id.
#[must_use]
pub fn generate_sub_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUB_ID_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Client fields an update changes only when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOverrides {
    pub enable: Option<bool>,
    pub sub_id: Option<String>,
}

/// Client management bound to one admin's inbound.
#[derive(Debug, Clone)]
pub struct AdminTaskService {
    admin_username: String,
    inbound_id: InboundId,
    flow: Option<Flow>,
    client: XuiClient,
}

impl AdminTaskService {
    /// Bind to the inbound and flow of `admin`.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::NoInbound` if the admin has no inbound.
    pub fn new(admin: &AdminOutput, client: XuiClient) -> Result<Self, TaskError> {
        let inbound_id = admin
            .inbound_id
            .ok_or_else(|| TaskError::NoInbound(admin.username.clone()))?;
        Ok(Self::for_inbound(
            admin.username.clone(),
            inbound_id,
            admin.flow(),
            client,
        ))
    }

    /// Bind to an explicit inbound and flow.
    #[must_use]
    pub const fn for_inbound(
        admin_username: String,
        inbound_id: InboundId,
        flow: Option<Flow>,
        client: XuiClient,
    ) -> Self {
        Self {
            admin_username,
            inbound_id,
            flow,
            client,
        }
    }

    #[must_use]
    pub const fn inbound_id(&self) -> InboundId {
        self.inbound_id
    }

    fn flow(&self) -> Option<&'static str> {
        self.flow.map(|f| f.as_str())
    }

    /// Clients of the admin's inbound with their online flag.
    ///
    /// A missing inbound is logged and yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel cannot be queried.
    #[instrument(skip(self), fields(admin = %self.admin_username, inbound_id = %self.inbound_id))]
    pub async fn users(&self) -> Result<Vec<PanelUser>, TaskError> {
        let inbounds = self.client.inbounds().await.inspect_err(|e| {
            tracing::error!(admin = %self.admin_username, error = %e, "Error retrieving users");
        })?;

        let Some(inbound) = inbounds.into_iter().find(|i| i.id == self.inbound_id) else {
            tracing::warn!(
                admin = %self.admin_username,
                inbound_id = %self.inbound_id,
                "Inbound not found for admin"
            );
            return Ok(Vec::new());
        };

        let online: HashSet<String> = self
            .client
            .online_clients()
            .await
            .inspect_err(|e| {
                tracing::error!(admin = %self.admin_username, error = %e, "Error retrieving online clients");
            })?
            .into_iter()
            .collect();

        Ok(inbound
            .client_stats
            .into_iter()
            .map(|stat| PanelUser {
                is_online: online.contains(&stat.email),
                stat,
            })
            .collect())
    }

    /// Create a client with a fresh UUID and subscription id.
    ///
    /// Returns the new client's UUID.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the panel rejects it.
    #[instrument(skip(self, form, today), fields(admin = %self.admin_username, email = %form.email))]
    pub async fn add_client(&self, form: &UserForm, today: NaiveDate) -> Result<String, TaskError> {
        let input = client_input(
            form,
            uuid::Uuid::new_v4().to_string(),
            generate_sub_id(),
            true,
            today,
        )?;

        self.client
            .add_client(self.inbound_id, self.flow(), &input)
            .await
            .inspect_err(|e| {
                tracing::error!(admin = %self.admin_username, email = %input.email, error = %e, "Failed to add client");
            })?;

        tracing::info!(admin = %self.admin_username, email = %input.email, "Client added to panel");
        Ok(input.id)
    }

    /// Replace a client's quota and expiry.
    ///
    /// The enable flag, subscription id and flow keep their current values
    /// on the panel unless `overrides` sets them. The admin's flow still
    /// wins over the client's own.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid, the client does not exist or
    /// the panel rejects the change.
    #[instrument(skip(self, form, overrides, today), fields(admin = %self.admin_username, email = %form.email))]
    pub async fn update_client(
        &self,
        uuid: &str,
        form: &UserForm,
        overrides: &ClientOverrides,
        today: NaiveDate,
    ) -> Result<(), TaskError> {
        form.validate()?;
        let current = self.configured_client(uuid).await.inspect_err(|e| {
            tracing::error!(admin = %self.admin_username, uuid, error = %e, "Failed to load client");
        })?;

        let mut input = client_input(
            form,
            uuid.to_owned(),
            overrides.sub_id.clone().unwrap_or(current.sub_id),
            overrides.enable.unwrap_or(current.enable),
            today,
        )?;
        input.flow = Some(current.flow).filter(|f| !f.is_empty());

        self.client
            .update_client(uuid, self.inbound_id, self.flow(), &input)
            .await
            .inspect_err(|e| {
                tracing::error!(admin = %self.admin_username, email = %input.email, error = %e, "Failed to update client");
            })?;
        Ok(())
    }

    /// The client as currently configured on the admin's inbound.
    async fn configured_client(&self, uuid: &str) -> Result<InboundClient, TaskError> {
        let inbound = self
            .client
            .inbounds()
            .await?
            .into_iter()
            .find(|i| i.id == self.inbound_id)
            .ok_or(TaskError::InboundNotFound(self.inbound_id))?;

        inbound
            .clients()
            .map_err(PanelError::from)?
            .into_iter()
            .find(|c| c.id == uuid)
            .ok_or_else(|| TaskError::ClientNotFound(uuid.to_owned()))
    }

    /// Zero a client's traffic counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel rejects the reset.
    #[instrument(skip(self), fields(admin = %self.admin_username))]
    pub async fn reset_usage(&self, email: &str) -> Result<(), TaskError> {
        self.client
            .reset_client_usage(self.inbound_id, email)
            .await
            .inspect_err(|e| {
                tracing::error!(admin = %self.admin_username, email, error = %e, "Failed to reset usage");
            })?;
        Ok(())
    }

    /// Remove a client from the inbound.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel rejects the delete.
    #[instrument(skip(self), fields(admin = %self.admin_username))]
    pub async fn delete_client(&self, uuid: &str) -> Result<(), TaskError> {
        self.client
            .delete_client(self.inbound_id, uuid)
            .await
            .inspect_err(|e| {
                tracing::error!(admin = %self.admin_username, uuid, error = %e, "Failed to delete client");
            })?;
        Ok(())
    }
}

/// Validate a client form and convert it to panel units.
fn client_input(
    form: &UserForm,
    id: String,
    sub_id: String,
    enable: bool,
    today: NaiveDate,
) -> Result<ClientInput, TaskError> {
    form.validate()?;
    Ok(ClientInput {
        id,
        email: form.email.trim().to_owned(),
        enable,
        total: form.total()?,
        expiry_time: form.expiry_time_ms(today),
        sub_id,
        flow: None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use proxy_console_core::{BYTES_PER_GB, ExpiryInput};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_generate_sub_id() {
        let id = generate_sub_id();
        assert_eq!(id.len(), SUB_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(id, generate_sub_id());
    }

    #[test]
    fn test_client_input_converts_units() {
        let form = UserForm {
            email: " carol ".to_owned(),
            total_gb: Decimal::from(2),
            expiry: ExpiryInput::Days(1.0),
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let input = client_input(&form, "u".to_owned(), "s".to_owned(), true, today).unwrap();

        assert_eq!(input.email, "carol");
        assert_eq!(input.total.bytes(), 2 * BYTES_PER_GB);
        // 2026-01-02T00:00:00Z
        assert_eq!(input.expiry_time, 1_767_312_000_000);
    }

    #[test]
    fn test_client_input_rejects_small_quota() {
        let form = UserForm {
            email: "dave".to_owned(),
            total_gb: Decimal::from_str("0.05").unwrap(),
            expiry: ExpiryInput::None,
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let err = client_input(&form, "u".to_owned(), "s".to_owned(), true, today).unwrap_err();
        assert_eq!(err.to_string(), "Minimum traffic is 0.1 GB");
    }
}
