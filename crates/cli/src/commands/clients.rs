//! `clients` subcommands: manage end users directly on a 3x-ui / tx-ui panel.

use clap::{Args, Subcommand};
use proxy_console_admin::panels::{PanelConnection, PanelKind, PanelRegistry, PanelUser};
use proxy_console_admin::tasks::{AdminTaskService, ClientOverrides};
use proxy_console_core::forms::UserForm;
use proxy_console_core::{ExpiryInput, Flow, InboundId};
use rust_decimal::Decimal;
use secrecy::SecretString;
use url::Url;

use super::output::{Table, emit, message, or_dash, yes_no};
use super::{CliError, OutputFormat, today};

#[derive(Debug, Args)]
pub struct ClientsArgs {
    /// Panel base URL
    #[arg(long, env = "PANEL_URL")]
    pub panel_url: Url,

    #[arg(long, env = "PANEL_USERNAME")]
    pub panel_username: String,

    #[arg(long, env = "PANEL_PASSWORD", hide_env_values = true)]
    pub panel_password: String,

    /// `3x-ui` (alias `sanaei`) or `tx-ui`
    #[arg(long, default_value = "3x-ui")]
    pub panel_kind: PanelKind,

    /// Inbound the clients live on
    #[arg(long)]
    pub inbound: InboundId,

    /// Flow forced on new and updated clients
    #[arg(long)]
    pub flow: Option<Flow>,

    /// Admin name recorded in logs
    #[arg(long, default_value = "cli")]
    pub admin: String,

    #[command(subcommand)]
    pub action: ClientsAction,
}

#[derive(Debug, Subcommand)]
pub enum ClientsAction {
    /// List clients of the inbound with their online status
    List,
    /// Add a client
    Add(ClientFormArgs),
    /// Update a client; unset flags keep the client's current values
    Update {
        uuid: String,
        #[command(flatten)]
        form: ClientFormArgs,
        /// Disable the client
        #[arg(long, conflicts_with = "enable")]
        disable: bool,
        /// Enable the client
        #[arg(long)]
        enable: bool,
        /// Replace the subscription id
        #[arg(long)]
        sub_id: Option<String>,
    },
    /// Delete a client
    Delete { uuid: String },
    /// Reset a client's traffic counters
    Reset { email: String },
    /// Check that the panel accepts the credentials
    Test,
}

#[derive(Debug, Args)]
pub struct ClientFormArgs {
    /// Client name on the panel
    #[arg(long)]
    pub email: String,

    /// Traffic quota in GB
    #[arg(long)]
    pub total_gb: Decimal,

    /// Days until expiry, a `YYYY-MM-DD` date, or empty for none
    #[arg(long, default_value = "")]
    pub expiry: ExpiryInput,
}

impl From<ClientFormArgs> for UserForm {
    fn from(args: ClientFormArgs) -> Self {
        Self {
            email: args.email,
            total_gb: args.total_gb,
            expiry: args.expiry,
        }
    }
}

pub async fn run(args: ClientsArgs, format: OutputFormat) -> Result<(), CliError> {
    let connection = PanelConnection {
        kind: args.panel_kind,
        url: args.panel_url,
        username: args.panel_username,
        password: SecretString::from(args.panel_password),
    };
    let client = PanelRegistry::new().client(&connection).await?;
    let (admin, inbound, flow, panel) = (args.admin, args.inbound, args.flow, client.clone());
    let service = move || AdminTaskService::for_inbound(admin, inbound, flow, panel);

    match args.action {
        ClientsAction::Test => {
            if client.test_connection().await {
                message("Connection OK")
            } else {
                Err(CliError::Failed("Panel connection failed".to_owned()))
            }
        }
        ClientsAction::List => {
            let users = service().users().await?;
            emit(format, users.as_slice(), users_table)
        }
        ClientsAction::Add(form) => {
            let uuid = service().add_client(&form.into(), today()).await?;
            message(&format!("Client created: {uuid}"))
        }
        ClientsAction::Update {
            uuid,
            form,
            disable,
            enable,
            sub_id,
        } => {
            let overrides = ClientOverrides {
                enable: overridden_enable(enable, disable),
                sub_id,
            };
            service()
                .update_client(&uuid, &form.into(), &overrides, today())
                .await?;
            message("Client updated")
        }
        ClientsAction::Delete { uuid } => {
            service().delete_client(&uuid).await?;
            message("Client deleted")
        }
        ClientsAction::Reset { email } => {
            service().reset_usage(&email).await?;
            message("Usage reset")
        }
    }
}

/// `None` when neither `--enable` nor `--disable` was given.
const fn overridden_enable(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn users_table(users: &[PanelUser]) -> Table {
    let mut table = Table::new(&["EMAIL", "ENABLED", "ONLINE", "USED", "QUOTA", "EXPIRES"]);
    for user in users {
        let stat = &user.stat;
        let quota = if stat.total.bytes() == 0 {
            "unlimited".to_owned()
        } else {
            stat.total.display_gb(2)
        };
        let expires = (stat.expiry_time > 0)
            .then(|| chrono::DateTime::from_timestamp_millis(stat.expiry_time))
            .flatten()
            .map(|t| t.date_naive());
        table.row(vec![
            stat.email.clone(),
            yes_no(stat.enable),
            yes_no(user.is_online),
            stat.used().display_gb(2),
            quota,
            or_dash(expires),
        ]);
    }
    table
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        clients: ClientsArgs,
    }

    fn parse(extra: &[&str]) -> ClientsAction {
        let mut argv = vec![
            "clients",
            "--panel-url",
            "https://de.example.com:2053/",
            "--panel-username",
            "admin",
            "--panel-password",
            "secret",
            "--inbound",
            "2",
        ];
        argv.extend_from_slice(extra);
        Harness::try_parse_from(argv).unwrap().clients.action
    }

    #[test]
    fn test_update_without_flags_overrides_nothing() {
        let action = parse(&["update", "uuid-alice", "--email", "alice", "--total-gb", "5"]);
        let ClientsAction::Update {
            enable,
            disable,
            sub_id,
            ..
        } = action
        else {
            panic!("expected update");
        };
        assert_eq!(overridden_enable(enable, disable), None);
        assert_eq!(sub_id, None);
    }

    #[test]
    fn test_update_flags_override() {
        let action = parse(&[
            "update", "uuid-alice", "--email", "alice", "--total-gb", "5", "--disable",
            "--sub-id", "fresh",
        ]);
        let ClientsAction::Update {
            enable,
            disable,
            sub_id,
            ..
        } = action
        else {
            panic!("expected update");
        };
        assert_eq!(overridden_enable(enable, disable), Some(false));
        assert_eq!(sub_id.as_deref(), Some("fresh"));
        assert_eq!(overridden_enable(true, false), Some(true));
    }
}
