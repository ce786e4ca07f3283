// SPDX-License-Identifier: MIT

//! Middleware for request processing.

pub mod signature;
