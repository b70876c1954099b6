//! License model and endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{error_for, with_group, FossologyClient};
use crate::error::Result;
use crate::models::LicenseType;
use crate::pagination::{total_pages, PageResponse};
use crate::traits::{Get, List};
use crate::version::LICENSES_SINCE;

/// A license known to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(default)]
    pub id: Option<u64>,
    pub short_name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub risk: Option<u8>,
    #[serde(default)]
    pub is_candidate: bool,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

/// Filters for listing licenses.
#[derive(Debug, Clone, Default)]
pub struct LicenseQuery {
    pub kind: LicenseType,
    /// Only active licenses.
    pub active: bool,
    pub group: Option<String>,
}

/// Payload for creating or updating a license.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseSpec {
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<u8>,
    pub is_candidate: bool,
    pub merge_request: bool,
}

#[async_trait]
impl Get for License {
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn get(client: &FossologyClient, short_name: String) -> Result<Self> {
        client.require_version(LICENSES_SINCE, "/license")?;

        let path = format!("license/{}", urlencoding::encode(&short_name));
        let request = client.request(Method::GET, &path)?;
        let response = client
            .expect(request, StatusCode::OK, |status| match status {
                StatusCode::NOT_FOUND => format!("License {short_name} not found"),
                _ => format!("Unable to get license {short_name}"),
            })
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl List for License {
    type Query = LicenseQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &FossologyClient,
        query: &Self::Query,
        page: u32,
        page_size: u32,
    ) -> Result<PageResponse<Self>> {
        client.require_version(LICENSES_SINCE, "/license")?;

        let request = client
            .request(Method::GET, "license")?
            .query(&[("kind", query.kind.as_str())]);
        let request = if query.active {
            request.query(&[("active", "true")])
        } else {
            request
        };
        let request = with_group(client.paged(request, page, page_size), query.group.as_deref());

        let response = client
            .expect(request, StatusCode::OK, |_| {
                format!("Unable to retrieve the list of licenses from page {page}")
            })
            .await?;

        let total_pages = total_pages(response.headers());
        let items = response.json().await?;
        Ok(PageResponse { items, total_pages })
    }
}

/// Add a license. An existing license with the same short name is not an error.
#[tracing::instrument(skip(client, license), fields(short_name = %license.short_name))]
pub async fn add_license(
    client: &FossologyClient,
    license: &LicenseSpec,
    group: Option<&str>,
) -> Result<()> {
    client.require_version(LICENSES_SINCE, "/license")?;

    let request = with_group(client.request(Method::POST, "license")?.json(license), group);
    let response = client.execute(request).await?;

    match response.status() {
        StatusCode::CREATED => {
            tracing::info!(short_name = %license.short_name, "License added");
            Ok(())
        }
        StatusCode::CONFLICT => {
            tracing::info!(short_name = %license.short_name, "License already exists");
            Ok(())
        }
        _ => Err(error_for(response, |_| {
            format!("Error while adding license {}", license.short_name)
        })
        .await),
    }
}

/// Update full name, text, URL or risk of a license.
#[tracing::instrument(skip(client, license), fields(short_name = %license.short_name))]
pub async fn update_license(
    client: &FossologyClient,
    license: &LicenseSpec,
    group: Option<&str>,
) -> Result<()> {
    client.require_version(LICENSES_SINCE, "/license")?;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct LicenseUpdate<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        full_name: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        risk: Option<u8>,
    }

    let body = LicenseUpdate {
        full_name: license.full_name.as_deref(),
        text: license.text.as_deref(),
        url: license.url.as_deref(),
        risk: license.risk,
    };
    let path = format!("license/{}", urlencoding::encode(&license.short_name));
    let request = with_group(client.request(Method::PATCH, &path)?.json(&body), group);
    client
        .expect(request, StatusCode::OK, |_| {
            format!("Unable to update license {}", license.short_name)
        })
        .await?;
    tracing::info!(short_name = %license.short_name, "License updated");
    Ok(())
}
