//! `admins` subcommands.
//!
//! Mutations go through [`AdminFormDialog`] and [`AdminsPage`] so they get
//! the same validation and re-fetch behaviour as the console pages.

use clap::{Args, Subcommand};
use proxy_console_admin::ConsoleClient;
use proxy_console_admin::pages::{AdminFormDialog, AdminRow, AdminsPage};
use proxy_console_core::{AdminId, ExpiryInput, Flow};
use rust_decimal::Decimal;

use super::output::{Table, emit, message, or_dash, yes_no};
use super::{CliError, OutputFormat, today};

#[derive(Debug, Subcommand)]
pub enum AdminsAction {
    /// List all admins
    List,
    /// Show one admin
    Show { id: AdminId },
    /// Create an admin
    Create(AdminArgs),
    /// Update an admin; omitted fields keep their current value
    Update {
        id: AdminId,
        #[command(flatten)]
        args: AdminArgs,
    },
    /// Delete an admin
    Delete { id: AdminId },
    /// Enable or disable an admin
    Toggle { id: AdminId },
    /// List the inbounds of a Marzban panel
    Inbounds { panel: String },
}

#[derive(Debug, Args)]
pub struct AdminArgs {
    #[arg(long)]
    pub username: Option<String>,

    /// Admin password (re-enter on update)
    #[arg(long)]
    pub password: Option<String>,

    /// Panel name
    #[arg(long)]
    pub panel: Option<String>,

    /// Inbound id on 3x-ui / tx-ui panels
    #[arg(long)]
    pub inbound_id: Option<i32>,

    /// `xtls-rprx-vision`, `xtls-rprx-vision-udp443` or `none`
    #[arg(long)]
    pub flow: Option<String>,

    /// Traffic quota in GB
    #[arg(long)]
    pub traffic: Option<Decimal>,

    /// Days until expiry, a `YYYY-MM-DD` date, or empty for none
    #[arg(long)]
    pub expiry: Option<ExpiryInput>,

    /// Return unused traffic when clients are deleted
    #[arg(long)]
    pub return_traffic: Option<bool>,

    #[arg(long)]
    pub active: Option<bool>,

    /// Marzban inbound as `protocol:tag`; repeat to select several
    #[arg(long = "inbound", value_name = "PROTOCOL:TAG")]
    pub inbounds: Vec<String>,
}

pub async fn run(
    client: &ConsoleClient,
    action: AdminsAction,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut page = AdminsPage::new();

    match action {
        AdminsAction::List => {
            load(&mut page, client).await?;
            emit(format, page.rows(today()).as_slice(), rows_table)
        }
        AdminsAction::Show { id } => {
            load(&mut page, client).await?;
            let admin = page.find(id).ok_or_else(|| not_found(id))?;
            emit(format, admin, |a| {
                let mut table = Table::new(&["FIELD", "VALUE"]);
                for (name, value) in [
                    ("id", a.id.to_string()),
                    ("username", a.username.clone()),
                    ("panel", a.panel.clone()),
                    ("inbound", or_dash(a.inbound_id)),
                    ("marzban inbounds", or_dash(a.marzban_inbounds.as_ref())),
                    ("flow", or_dash(a.flow.as_ref())),
                    ("traffic", a.traffic.display_gb(2)),
                    ("return traffic", yes_no(a.return_traffic)),
                    ("active", yes_no(a.is_active)),
                    ("expiry", or_dash(a.expiry_date.as_ref())),
                    ("days left", or_dash(a.remaining_days(today()))),
                ] {
                    table.row(vec![name.to_owned(), value]);
                }
                table
            })
        }
        AdminsAction::Create(args) => {
            let mut dialog = AdminFormDialog::open(client, None).await;
            submit(client, &mut dialog, args).await?;
            page.apply_dialog_success(client).await;
            Ok(())
        }
        AdminsAction::Update { id, args } => {
            load(&mut page, client).await?;
            let admin = page.find(id).ok_or_else(|| not_found(id))?;
            let mut dialog = AdminFormDialog::open(client, Some(admin)).await;
            submit(client, &mut dialog, args).await?;
            page.apply_dialog_success(client).await;
            Ok(())
        }
        AdminsAction::Delete { id } => message(&page.delete(client, id).await?),
        AdminsAction::Toggle { id } => message(&page.toggle_active(client, id).await?),
        AdminsAction::Inbounds { panel } => {
            let inbounds = client.panel_inbounds(&panel).await?;
            emit(format, &inbounds, |map| {
                let mut table = Table::new(&["PROTOCOL", "TAGS"]);
                for (protocol, tags) in map {
                    table.row(vec![protocol.clone(), tags.join(", ")]);
                }
                table
            })
        }
    }
}

async fn load(page: &mut AdminsPage, client: &ConsoleClient) -> Result<(), CliError> {
    page.refresh(client).await;
    match page.error() {
        Some(error) => Err(CliError::Failed(error.to_owned())),
        None => Ok(()),
    }
}

fn not_found(id: AdminId) -> CliError {
    CliError::Usage(format!("Admin {id} not found"))
}

/// Apply flags to the dialog form and submit it.
async fn submit(
    client: &ConsoleClient,
    dialog: &mut AdminFormDialog,
    args: AdminArgs,
) -> Result<(), CliError> {
    if let Some(panel) = args.panel {
        dialog.select_panel(client, &panel).await;
    }
    for inbound in &args.inbounds {
        let (protocol, tag) = inbound.split_once(':').ok_or_else(|| {
            CliError::Usage(format!("Inbound must be PROTOCOL:TAG, got '{inbound}'"))
        })?;
        dialog.toggle_inbound(protocol, tag);
    }

    let form = &mut dialog.form;
    if let Some(username) = args.username {
        form.username = username;
    }
    if let Some(password) = args.password {
        form.password = password;
    }
    if let Some(inbound_id) = args.inbound_id {
        form.inbound_id = Some(inbound_id.into());
    }
    if let Some(flow) = args.flow {
        form.set_flow(Flow::parse_optional(&flow).map_err(CliError::Usage)?);
    }
    if let Some(traffic) = args.traffic {
        form.traffic_gb = traffic;
    }
    if let Some(expiry) = args.expiry {
        form.expiry = expiry;
    }
    if let Some(return_traffic) = args.return_traffic {
        form.return_traffic = return_traffic;
    }
    if let Some(active) = args.active {
        form.is_active = active;
    }

    let reply = dialog.submit(client).await?;
    dialog.close();
    message(&reply)
}

fn rows_table(rows: &[AdminRow]) -> Table {
    let mut table = Table::new(&[
        "ID", "USERNAME", "PANEL", "ACTIVE", "TRAFFIC", "EXPIRY", "DAYS LEFT",
    ]);
    for row in rows {
        table.row(vec![
            row.id.to_string(),
            row.username.clone(),
            row.panel.clone(),
            yes_no(row.is_active),
            row.traffic.clone(),
            or_dash(row.expiry_date.as_ref()),
            or_dash(row.remaining_days),
        ]);
    }
    table
}
