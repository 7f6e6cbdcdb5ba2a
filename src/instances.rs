// Compute API: list the servers of one region, page by page.

use crate::api::{Access, ApiClient};
use crate::config::Region;
use crate::error::{ApiError, Result};
use crate::pagination::Paginated;
use crate::transport::{HttpResponse, Transport};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicIp {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    pub commercial_type: String,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub public_ip: Option<PublicIp>,
    #[serde(default)]
    pub private_ip: Option<String>,
}

#[derive(Deserialize)]
struct ServersPage {
    servers: Vec<InstanceRecord>,
}

fn servers(response: &HttpResponse) -> Result<Vec<InstanceRecord>> {
    Ok(response.json::<ServersPage>()?.servers)
}

/// Every server of `region`, fetched lazily. Needs a client with a token.
pub fn list_all<T: Transport>(
    client: &ApiClient<T>,
    region: Region,
) -> Result<Paginated<'_, T, InstanceRecord>> {
    client.token()?;
    let first = region
        .compute_url()?
        .join("servers")
        .map_err(|e| ApiError::Config(format!("invalid compute URL for {region}: {e}")))?;
    Ok(Paginated::new(client, first, Access::Authenticated, servers))
}

/// One fixed-width line per server. Missing IPs render as blanks.
pub fn format_instance(server: &InstanceRecord) -> String {
    let public_ip = server
        .public_ip
        .as_ref()
        .map(|ip| ip.address.as_str())
        .unwrap_or("");
    let private_ip = server.private_ip.as_deref().unwrap_or("");
    format!(
        "{} {:<10} {:<30} state={:<10} public IP={:<15} private IP={:<15}",
        server.id, server.commercial_type, server.name, server.state, public_ip, private_ip
    )
}
