#![doc = include_str!("../README.md")]

//! # SQLite Cursor Provider
//!
//! Executes statements on an embedded `SQLite` connection and decodes
//! results with [`sqlbind::decode`].

#![forbid(unsafe_code)]

mod database;
mod values;

pub use database::{ConnectOptions, Database};
