//! `whoami` and `dashboard`.

use proxy_console_admin::ConsoleClient;
use proxy_console_core::{DashboardData, DecodedToken};
use serde::Serialize;

use super::output::{Table, emit, or_dash};
use super::{CliError, OutputFormat, today};

#[derive(Serialize)]
struct Whoami<'a> {
    #[serde(flatten)]
    token: &'a DecodedToken,
    expired: bool,
}

/// Show the claims of the current access token.
pub async fn whoami(client: &ConsoleClient, format: OutputFormat) -> Result<(), CliError> {
    let token = client.whoami().await?;
    let expired = token.is_expired(chrono::Utc::now().timestamp());
    let view = Whoami {
        token: &token,
        expired,
    };

    emit(format, &view, |v| {
        let mut table = Table::new(&["USER", "ROLE", "PANEL", "EXPIRES", "EXPIRED"]);
        let expires = chrono::DateTime::from_timestamp(v.token.exp, 0)
            .map_or_else(|| v.token.exp.to_string(), |t| t.to_rfc3339());
        table.row(vec![
            v.token.sub.clone(),
            format!("{:?}", v.token.role).to_lowercase(),
            or_dash(Some(&v.token.panel).filter(|p| !p.is_empty())),
            expires,
            super::output::yes_no(v.expired),
        ]);
        table
    })
}

/// Show the dashboard of the logged-in account.
pub async fn dashboard(client: &ConsoleClient, format: OutputFormat) -> Result<(), CliError> {
    let data = client.dashboard().await?;
    emit(format, &data, dashboard_table)
}

fn dashboard_table(data: &DashboardData) -> Table {
    let mut table = Table::new(&["FIELD", "VALUE"]);
    let mut field = |name: &str, value: String| table.row(vec![name.to_owned(), value]);

    if let Some(traffic) = data.remaining_traffic {
        field("remaining traffic", traffic.display_gb(2));
    }
    if let Some(expiry) = &data.expiry_time {
        let days = proxy_console_core::parse_expiry_date(expiry)
            .map(|date| proxy_console_core::remaining_days(date, today()));
        field("expiry", format!("{expiry} ({} days left)", or_dash(days)));
    }
    if let Some(sub_url) = &data.sub_url {
        field("subscription url", sub_url.clone());
    }
    if let Some(users) = &data.users {
        let online = users.iter().filter(|u| u.is_online).count();
        field("users", format!("{} ({online} online)", users.len()));
    }
    if let Some(admins) = &data.admins {
        let active = admins.iter().filter(|a| a.is_active).count();
        field("admins", format!("{} ({active} active)", admins.len()));
    }
    if let Some(panels) = &data.panels {
        let active = panels.iter().filter(|p| p.is_active).count();
        field("panels", format!("{} ({active} active)", panels.len()));
    }
    if let Some(system) = &data.system {
        field("cpu", format!("{:.1}%", system.cpu_percent));
        field(
            "memory",
            format!("{} / {}", gib(system.used_memory), gib(system.total_memory)),
        );
        field(
            "disk",
            format!("{} / {}", gib(system.disk_used), gib(system.disk_total)),
        );
    }
    for (i, item) in data.news.iter().flatten().enumerate() {
        field(if i == 0 { "news" } else { "" }, item.clone());
    }
    if let Some(ads) = &data.ads
        && let Some(title) = &ads.title
    {
        field("ad", format!("{title} {}", or_dash(ads.link.as_ref())));
    }
    table
}

fn gib(bytes: u64) -> String {
    proxy_console_core::Traffic::from_bytes(bytes).display_gb(1)
}
