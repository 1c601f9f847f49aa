#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_panics_doc)]

pub mod error;
pub mod request;
mod route;

use async_trait::async_trait;
use bloxmesh_models::roblox::{
    group::{GroupRole, GroupRoles, GroupUserRole},
    id::{GroupId, RoleId, UserId},
};
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, COOKIE},
    http::response::Parts,
    Method, Request as HyperRequest, StatusCode,
};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client as HyperClient},
    rt::TokioExecutor,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use error::DeserializeBodyError;
use request::Request;

use crate::{
    error::{ErrorKind, RobloxError},
    route::Route,
};

const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

#[derive(Clone)]
pub struct RobloxClient {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    cookie: HeaderValue,
    proxy_url: Option<String>,
    timeout: Duration,
}

#[derive(Serialize, Deserialize)]
pub struct VecWrapper<T> {
    pub data: Vec<T>,
}

/// The membership operations the automation engine needs from Roblox.
#[async_trait]
pub trait GroupMembership: Send + Sync {
    /// Moves the user to `role_id` in the group.
    async fn set_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RobloxError>;

    /// Removes the user from the group.
    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> Result<(), RobloxError>;

    /// The user's current role in the group, `None` if they are not a member.
    async fn get_user_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<GroupRole>, RobloxError>;

    /// All roles of the group, `None` if the group does not exist.
    async fn get_group_roles(&self, group_id: GroupId)
        -> Result<Option<Vec<GroupRole>>, RobloxError>;
}

impl RobloxClient {
    /// Creates a client authenticated as the bot account owning `cookie`.
    ///
    /// # Errors
    ///
    /// Returns Err if the cookie cannot be used as a header value.
    pub fn new(
        cookie: &str,
        proxy_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RobloxError> {
        let cookie = HeaderValue::from_str(&format!(".ROBLOSECURITY={cookie}")).map_err(
            |source| RobloxError {
                source: Some(Box::new(source)),
                kind: ErrorKind::BuildingRequest,
            },
        )?;
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = HyperClient::builder(TokioExecutor::new()).build(connector);
        Ok(Self {
            client,
            cookie,
            proxy_url,
            timeout,
        })
    }

    /// Changes the role of a group member.
    ///
    /// # Errors
    ///
    /// See [`RobloxError`] for details.
    #[tracing::instrument(skip(self))]
    pub async fn set_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RobloxError> {
        let route = Route::GroupMember {
            group_id: group_id.0,
            user_id: user_id.0,
        };

        let json = serde_json::json!({"roleId": role_id});
        let body = serde_json::to_vec(&json).map_err(|source| RobloxError {
            source: Some(Box::new(source)),
            kind: ErrorKind::BuildingRequest,
        })?;

        let request = Request::new()
            .uri(route.to_string())
            .method(Method::PATCH)
            .header(COOKIE, self.cookie.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(CONTENT_LENGTH, body.len())
            .proxy_uri(self.proxy_url.clone())
            .body(Full::new(Bytes::from(body)));

        let (parts, bytes) = self.send_with_csrf(request).await?;

        if !parts.status.is_success() {
            return Err(RobloxError {
                source: None,
                kind: ErrorKind::Response {
                    route: route.to_string(),
                    status: parts.status,
                    bytes,
                },
            });
        }

        Ok(())
    }

    /// Exiles a member from the group.
    ///
    /// # Errors
    ///
    /// See [`RobloxError`] for details.
    #[tracing::instrument(skip(self))]
    pub async fn remove_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<(), RobloxError> {
        let route = Route::GroupMember {
            group_id: group_id.0,
            user_id: user_id.0,
        };

        let request = Request::new()
            .uri(route.to_string())
            .method(Method::DELETE)
            .header(COOKIE, self.cookie.clone())
            .proxy_uri(self.proxy_url.clone())
            .body(Full::default());

        let (parts, bytes) = self.send_with_csrf(request).await?;

        if !parts.status.is_success() {
            return Err(RobloxError {
                source: None,
                kind: ErrorKind::Response {
                    route: route.to_string(),
                    status: parts.status,
                    bytes,
                },
            });
        }

        Ok(())
    }

    /// Get the role of the user in a group, if they are a member.
    ///
    /// # Errors
    ///
    /// See [`RobloxError`] for details.
    pub async fn get_user_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<GroupRole>, RobloxError> {
        let route = Route::UserGroupRoles { user_id: user_id.0 };

        let request = Request::new()
            .uri(route.to_string())
            .method(Method::GET)
            .proxy_uri(self.proxy_url.clone())
            .body(Full::default())
            .build()
            .map_err(|source| RobloxError {
                source: Some(Box::new(source)),
                kind: ErrorKind::BuildingRequest,
            })?;

        let (parts, bytes) = self.request(request).await?;

        if !parts.status.is_success() {
            return Err(RobloxError {
                source: None,
                kind: ErrorKind::Response {
                    route: route.to_string(),
                    status: parts.status,
                    bytes,
                },
            });
        }

        let json =
            serde_json::from_slice::<VecWrapper<GroupUserRole>>(&bytes).map_err(|source| {
                RobloxError {
                    source: Some(Box::new(DeserializeBodyError {
                        source: Some(Box::new(source)),
                        bytes,
                    })),
                    kind: ErrorKind::Deserialize,
                }
            })?;

        Ok(json
            .data
            .into_iter()
            .find(|r| r.group.id == group_id)
            .map(|r| r.role))
    }

    /// Get the roles of a Roblox Group, lowest rank first.
    ///
    /// # Errors
    ///
    /// See [`RobloxError`] for details.
    pub async fn get_group_roles(
        &self,
        group_id: GroupId,
    ) -> Result<Option<Vec<GroupRole>>, RobloxError> {
        let route = Route::GroupRoles {
            group_id: group_id.0,
        };

        let request = Request::new()
            .uri(route.to_string())
            .method(Method::GET)
            .proxy_uri(self.proxy_url.clone())
            .body(Full::default())
            .build()
            .map_err(|source| RobloxError {
                source: Some(Box::new(source)),
                kind: ErrorKind::BuildingRequest,
            })?;

        let (parts, bytes) = self.request(request).await?;

        if parts.status == StatusCode::BAD_REQUEST || parts.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !parts.status.is_success() {
            return Err(RobloxError {
                source: None,
                kind: ErrorKind::Response {
                    route: route.to_string(),
                    status: parts.status,
                    bytes,
                },
            });
        }

        let json = serde_json::from_slice::<GroupRoles>(&bytes).map_err(|source| RobloxError {
            source: Some(Box::new(DeserializeBodyError {
                source: Some(Box::new(source)),
                bytes,
            })),
            kind: ErrorKind::Deserialize,
        })?;
        tracing::trace!(?json);

        let mut roles = json.roles;
        roles.sort_by_key(|r| r.rank);
        Ok(Some(roles))
    }

    /// Sends a state-changing request. Roblox rejects those with a 403 and a
    /// fresh token in `x-csrf-token` when the token is missing or stale; the
    /// request is then replayed exactly once with that token attached.
    ///
    /// # Errors
    ///
    /// See [`RobloxError`] for details.
    pub async fn send_with_csrf(&self, request: Request) -> Result<(Parts, Vec<u8>), RobloxError> {
        let first = request.clone().build().map_err(|source| RobloxError {
            source: Some(Box::new(source)),
            kind: ErrorKind::BuildingRequest,
        })?;
        let (parts, bytes) = self.request(first).await?;

        let Some(token) = csrf_challenge(&parts) else {
            return Ok((parts, bytes));
        };

        tracing::debug!("refreshing csrf token");
        let retry = request
            .header(CSRF_HEADER, token)
            .build()
            .map_err(|source| RobloxError {
                source: Some(Box::new(source)),
                kind: ErrorKind::BuildingRequest,
            })?;
        self.request(retry).await
    }

    /// Make a request to the Roblox API.
    ///
    /// # Errors
    ///
    /// See [`RobloxError`] for details.
    pub async fn request(
        &self,
        request: HyperRequest<Full<Bytes>>,
    ) -> Result<(Parts, Vec<u8>), RobloxError> {
        let res = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|source| RobloxError {
                source: Some(Box::new(source)),
                kind: ErrorKind::Timeout,
            })?
            .map_err(|source| RobloxError {
                source: Some(Box::new(source)),
                kind: ErrorKind::Sending,
            })?;

        let (parts, body) = res.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|source| RobloxError {
                source: Some(Box::new(source)),
                kind: ErrorKind::ChunkingResponse,
            })?
            .to_bytes();

        Ok((parts, bytes.into()))
    }
}

/// The token to retry with, if the response is a CSRF challenge.
fn csrf_challenge(parts: &Parts) -> Option<HeaderValue> {
    if parts.status != StatusCode::FORBIDDEN {
        return None;
    }
    parts
        .headers
        .get(CSRF_HEADER)
        .filter(|token| !token.is_empty())
        .cloned()
}

#[async_trait]
impl GroupMembership for RobloxClient {
    async fn set_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RobloxError> {
        RobloxClient::set_role(self, group_id, user_id, role_id).await
    }

    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> Result<(), RobloxError> {
        RobloxClient::remove_member(self, group_id, user_id).await
    }

    async fn get_user_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<GroupRole>, RobloxError> {
        RobloxClient::get_user_role(self, group_id, user_id).await
    }

    async fn get_group_roles(
        &self,
        group_id: GroupId,
    ) -> Result<Option<Vec<GroupRole>>, RobloxError> {
        RobloxClient::get_group_roles(self, group_id).await
    }
}
