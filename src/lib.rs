//! Trader Lens - Rule-driven behavioral profiling of traders.
//!
//! This crate turns short social-media posts about trading activity into
//! structured, confidence-rated profiles along four dimensions: timeframe,
//! strategy, conviction, and risk, plus derived instrument preference and
//! product-fit scores.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
