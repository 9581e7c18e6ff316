//! sftpblob-sftp: russh-sftp adapter for sftpblob
//!
//! This crate provides the implementation of the RemoteFs trait on top of an
//! already connected `russh_sftp` session. It is the only crate that directly
//! depends on the SFTP library; connecting and authenticating stay with the
//! caller.

pub mod client;

pub use client::{SftpClient, open_bucket};
