use anyhow::Result;

use clinic_client::api::{ApiClient, Page, Resource};

use super::print_payload;

pub async fn run_me(client: &ApiClient) -> Result<()> {
    print_payload(client.current_user().await?)
}

pub async fn run_list(
    client: &ApiClient,
    resource: Resource,
    page: Page,
    mine: bool,
    search: Option<String>,
) -> Result<()> {
    let payload = if mine {
        client.list_mine(resource, page).await?
    } else if resource == Resource::Medications {
        client.search_medications(page, search.as_deref()).await?
    } else {
        if search.is_some() {
            anyhow::bail!("--search is only supported for medications");
        }
        client.list(resource, page).await?
    };

    print_payload(payload)
}

pub async fn run_get(client: &ApiClient, resource: Resource, id: u64) -> Result<()> {
    print_payload(client.get(resource, id).await?)
}

pub async fn run_delete(client: &ApiClient, resource: Resource, id: u64) -> Result<()> {
    print_payload(client.delete(resource, id).await?)
}
