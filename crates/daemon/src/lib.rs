// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cryoflow daemon library
//!
//! Exposes the wire protocol types for use by CLI clients.

pub mod protocol;

pub use protocol::{
    decode, encode, read_message, write_message, ProtocolError, Request, Response,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE,
};
