//! Developer tooling for the henkan engine: conversion diagnostics,
//! source compilation and learning-store inspection.

pub mod commands;
mod error;

pub use error::CliError;
