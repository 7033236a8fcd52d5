//! `panels` subcommands.

use clap::{Args, Subcommand};
use proxy_console_admin::ConsoleClient;
use proxy_console_admin::pages::{PanelFormDialog, PanelsPage};
use proxy_console_core::{PanelId, PanelOutput};

use super::output::{Table, emit, message, yes_no};
use super::{CliError, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum PanelsAction {
    /// List all panels
    List,
    /// Register a panel
    Create(PanelArgs),
    /// Update a panel; credentials must be given again
    Update {
        id: PanelId,
        #[command(flatten)]
        args: PanelArgs,
    },
    /// Delete a panel
    Delete { id: PanelId },
    /// Enable or disable a panel
    Toggle { id: PanelId },
}

#[derive(Debug, Args)]
pub struct PanelArgs {
    /// `3x-ui`, `tx-ui` or `marzban`
    #[arg(long = "type")]
    pub panel_type: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    /// Panel base URL
    #[arg(long)]
    pub url: Option<String>,

    /// Subscription base URL
    #[arg(long)]
    pub sub_url: Option<String>,

    /// Panel login username
    #[arg(long = "panel-username")]
    pub username: Option<String>,

    /// Panel login password
    #[arg(long = "panel-password")]
    pub password: Option<String>,

    #[arg(long)]
    pub active: Option<bool>,
}

pub async fn run(
    client: &ConsoleClient,
    action: PanelsAction,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut page = PanelsPage::new();

    match action {
        PanelsAction::List => {
            load(&mut page, client).await?;
            emit(format, page.items(), panels_table)
        }
        PanelsAction::Create(args) => {
            let dialog = PanelFormDialog::open(None);
            submit(client, dialog, args).await?;
            page.apply_dialog_success(client).await;
            Ok(())
        }
        PanelsAction::Update { id, args } => {
            load(&mut page, client).await?;
            let panel = page
                .find(id)
                .ok_or_else(|| CliError::Usage(format!("Panel {id} not found")))?;
            let dialog = PanelFormDialog::open(Some(panel));
            submit(client, dialog, args).await?;
            page.apply_dialog_success(client).await;
            Ok(())
        }
        PanelsAction::Delete { id } => message(&page.delete(client, id).await?),
        PanelsAction::Toggle { id } => message(&page.toggle_active(client, id).await?),
    }
}

async fn load(page: &mut PanelsPage, client: &ConsoleClient) -> Result<(), CliError> {
    page.refresh(client).await;
    match page.error() {
        Some(error) => Err(CliError::Failed(error.to_owned())),
        None => Ok(()),
    }
}

async fn submit(
    client: &ConsoleClient,
    mut dialog: PanelFormDialog,
    args: PanelArgs,
) -> Result<(), CliError> {
    let form = &mut dialog.form;
    if let Some(panel_type) = args.panel_type {
        form.panel_type = panel_type;
    }
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(url) = args.url {
        form.url = url;
    }
    if let Some(sub_url) = args.sub_url {
        form.sub_url = Some(sub_url);
    }
    if let Some(username) = args.username {
        form.username = username;
    }
    if let Some(password) = args.password {
        form.password = password;
    }
    if let Some(active) = args.active {
        form.is_active = active;
    }

    let reply = dialog.submit(client).await?;
    message(&reply)
}

fn panels_table(panels: &[PanelOutput]) -> Table {
    let mut table = Table::new(&["ID", "NAME", "TYPE", "URL", "ACTIVE"]);
    for panel in panels {
        table.row(vec![
            panel.id.to_string(),
            panel.name.clone(),
            panel.panel_type.to_string(),
            panel.url.clone(),
            yes_no(panel.is_active),
        ]);
    }
    table
}
