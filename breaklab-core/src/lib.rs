//! Breaklab Core — event-driven backtesting engine.
//!
//! This crate contains the simulation and measurement machinery:
//! - Domain types (bars, orders, fills, positions, portfolio, trade ledger)
//! - Streaming ATR indicator and price-history buffer
//! - Realistic execution engine (slippage + spread + impact + commission)
//! - ATR-based trailing stop engine with the tighten-only ratchet
//! - Strategy trait and the ATR breakout reference strategy
//! - Streaming metrics pipeline (equity, drawdown, trades, Sharpe/Sortino)
//! - Latching kill-switch triggers and manager
//! - The bar-by-bar backtest driver
//! - Broker interface contract with an in-memory paper implementation
//!
//! The core does no file or network I/O and holds no global state: every run
//! owns its portfolio, pipeline, and trigger set, which is what makes the
//! sweep layer in `breaklab-runner` embarrassingly parallel.

pub mod broker;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod killswitch;
pub mod metrics;
pub mod risk;
pub mod strategy;
