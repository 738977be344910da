// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the editor API.
//!
//! ## Auth Flow
//!
//! 1. The client obtains a token signed with the server's `SECRET_KEY` (HS256)
//! 2. The client sends `Authorization: Bearer <JWT>`
//! 3. The server:
//!    - Verifies the signature and expiry
//!    - Extracts `sub` as the caller's `user_id`
//!
//! ## Security
//!
//! - All endpoints except health require authentication
//! - Clock skew tolerance is 60 seconds
//! - The service is single-tenant: any valid token sees every file

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::{AuthenticatedUser, Claims};
pub use error::AuthError;
pub use extractor::{Auth, AuthConfig};
