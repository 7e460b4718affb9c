//! Pesticide - a bug tracker with a public issue board.
//!
//! Users file issues against categories and projects, developers resolve them
//! with notes, and anyone can browse the board subject to per-issue privacy.
//! This crate holds the domain model, validation, authorization, storage and
//! the [`service::IssueService`] that the HTTP server and the admin CLI drive.

#![forbid(unsafe_code)]

pub mod app;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod id_generation;
pub mod service;
pub mod storage;
pub mod validation;

pub(crate) mod output;
