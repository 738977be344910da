// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by an editor access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,
}

/// Authenticated caller, extracted from a verified token.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject of the token
    pub user_id: String,
    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            expires_at: claims.exp,
        }
    }
}
