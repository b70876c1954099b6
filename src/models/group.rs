//! Group model and endpoints, available from API 1.2.1 on.

use std::collections::HashMap;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{error_for, FossologyClient};
use crate::error::Result;
use crate::models::{MemberPerm, User};
use crate::version::GROUPS_SINCE;

/// A FOSSology group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

/// A user's membership in a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub user: User,
    pub group_perm: u8,
}

fn require_groups(client: &FossologyClient) -> Result<()> {
    client.require_version(GROUPS_SINCE, "/groups")
}

/// List the groups visible to the user (all groups for admins).
#[tracing::instrument(skip(client))]
pub async fn list_groups(client: &FossologyClient) -> Result<Vec<Group>> {
    require_groups(client)?;

    let request = client.request(Method::GET, "groups")?;
    let response = client
        .expect(request, StatusCode::OK, |_| {
            "Unable to get a list of groups".to_string()
        })
        .await?;
    Ok(response.json().await?)
}

/// Create a group.
///
/// # Errors
///
/// A group that exists already yields a 400 [`crate::FossologyError::ApiError`]
/// for which [`crate::FossologyError::is_already_exists`] holds.
#[tracing::instrument(skip(client))]
pub async fn create_group(client: &FossologyClient, name: &str) -> Result<()> {
    require_groups(client)?;

    let request = client.request(Method::POST, "groups")?.header("name", name);
    let response = client.execute(request).await?;
    if response.status() != StatusCode::OK {
        return Err(error_for(response, |status| match status {
            StatusCode::FORBIDDEN => format!("Creating group {name} not authorized"),
            _ => format!("Unable to create group {name}"),
        })
        .await);
    }
    tracing::info!(name, "Group has been added");
    Ok(())
}

/// Create a group unless a group with that name exists.
///
/// Any other failure is returned.
#[tracing::instrument(skip(client))]
pub async fn ensure_group(client: &FossologyClient, name: &str) -> Result<()> {
    match create_group(client, name).await {
        Err(e) if e.is_already_exists() => {
            tracing::debug!(name, "Group already exists");
            Ok(())
        }
        other => other,
    }
}

/// Delete a group.
#[tracing::instrument(skip(client, group), fields(id = group.id))]
pub async fn delete_group(client: &FossologyClient, group: &Group) -> Result<()> {
    require_groups(client)?;

    let request = client.request(Method::DELETE, &format!("groups/{}", group.id))?;
    client
        .expect(request, StatusCode::ACCEPTED, |_| {
            format!("Unable to delete group {}", group.name)
        })
        .await?;
    tracing::info!(name = %group.name, "Group has been scheduled for deletion");
    Ok(())
}

/// List the members of a group.
#[tracing::instrument(skip(client, group), fields(id = group.id))]
pub async fn list_group_members(
    client: &FossologyClient,
    group: &Group,
) -> Result<Vec<GroupMember>> {
    require_groups(client)?;

    let request = client.request(Method::GET, &format!("groups/{}/members", group.id))?;
    let response = client
        .expect(request, StatusCode::OK, |_| {
            format!("Unable to get a list of members for group {}", group.name)
        })
        .await?;
    Ok(response.json().await?)
}

/// Add a user to a group with the given role.
#[tracing::instrument(skip(client, group, user), fields(group = group.id, user = user.id))]
pub async fn add_group_member(
    client: &FossologyClient,
    group: &Group,
    user: &User,
    perm: MemberPerm,
) -> Result<()> {
    require_groups(client)?;

    let request = client
        .request(Method::POST, &format!("groups/{}/user/{}", group.id, user.id))?
        .json(&serde_json::json!({ "perm": perm.value() }));
    client
        .expect(request, StatusCode::OK, |_| {
            format!("Unable to add user {} to group {}", user.name, group.name)
        })
        .await?;
    tracing::info!(user = %user.name, group = %group.name, "Member added to group");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_member_deserialize() {
        let member: GroupMember = serde_json::from_value(serde_json::json!({
            "user": {
                "id": 3,
                "name": "fossy",
                "email": "fossy@localhost",
                "accessLevel": "admin"
            },
            "group_perm": 1
        }))
        .unwrap();

        assert_eq!(member.user.name, "fossy");
        assert_eq!(member.user.access_level.as_deref(), Some("admin"));
        assert_eq!(member.group_perm, MemberPerm::Admin.value());
    }
}
