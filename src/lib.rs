//! # search-step
//!
//! A workflow search step: given a free-text query and optional filters, it
//! calls a search provider, validates and normalizes the hits, and reports
//! them back to the host platform as step outputs.
//!
//! ## Architecture
//!
//! ```text
//!  platform event ──▶ server ──▶ step::run_step ──▶ StepFunction
//!                                     │                 │
//!                            complete / fail            ▼
//!                                     │            Assembler
//!                                     ▼                 │
//!                                 Platform ◀── SampleDataProvider
//!                                              OpenLibraryProvider ──▶ normalize
//!                                                                  ──▶ fanout (enrich)
//!                                                                  ──▶ date
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Query, result and candidate types |
//! | [`error`] | Pipeline error taxonomy |
//! | [`filters`] | Filter menu and provider filter payload |
//! | [`upstream`] | Shared HTTP client and JSON response handling |
//! | [`platform`] | Host platform Web API access |
//! | [`normalize`] | Open Library hit validation |
//! | [`date`] | Publish date canonicalization |
//! | [`fanout`] | Bounded concurrent detail fetches |
//! | [`sample_data`] | Sample-data search provider |
//! | [`open_library`] | Open Library search provider |
//! | [`assemble`] | Provider dispatch and result cap |
//! | [`traits`] | `SearchProvider` / `StepFunction` traits and registry |
//! | [`step`] | Step lifecycle, completion and ack |
//! | [`details`] | Entity detail pane |
//! | [`server`] | HTTP event receiver |

pub mod assemble;
pub mod config;
pub mod date;
pub mod details;
pub mod error;
pub mod fanout;
pub mod filters;
pub mod models;
pub mod normalize;
pub mod open_library;
pub mod platform;
pub mod sample_data;
pub mod server;
pub mod step;
pub mod traits;
pub mod upstream;
