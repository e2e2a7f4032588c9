#![doc(html_root_url = "https://docs.rs/bdpl/0.1.0")]

//! BDMV metadata parsing and episode/special-feature inference for Blu-ray discs.
//!
//! This crate reads the binary metadata that ships on a Blu-ray BDMV disc structure
//! (`PLAYLIST/*.mpls`, `CLIPINF/*.clpi`, `index.bdmv`, `MovieObject.bdmv`, and the
//! interactive-graphics menu stream inside a clip's M2TS), normalizes it into a
//! disc-agnostic domain model, and runs a deterministic analysis pipeline over that
//! model to recover episode boundaries, special features, and scene breaks without
//! any title-specific configuration.
//!
//! The crate is organized in four layers:
//!
//! - L1 ([`reader`], [`codec`], [`nav`]): a bounded big-endian cursor and the
//!   shared byte-level decoding helpers the format parsers build on.
//! - L2 ([`model`]): the normalized in-memory domain model — [`model::Playlist`],
//!   [`model::ClipInfo`], [`model::Episode`], [`model::DiscAnalysis`] and friends.
//! - L3 ([`analyze`]): the multi-stage fusion pipeline, entered through
//!   [`analyze::scan_disc`].
//! - L4 ([`output`]): pure functions that turn a [`model::DiscAnalysis`] into
//!   argument vectors and XML for chapter muxing, remuxing, and still-frame
//!   extraction. None of this crate's code spawns a process.
//!
//! Diagnostics are never printed directly; every parser and pipeline stage takes a
//! `&dyn `[`logging::Logger`]` so a host can route them anywhere (see [`logging`]).
pub mod analyze;
pub mod clpi;
pub mod codec;
pub mod error;
pub mod hints;
pub mod ig;
pub mod index_bdmv;
pub mod logging;
pub mod model;
pub mod movieobject;
pub mod mpls;
pub mod nav;
pub mod output;
pub mod reader;

pub use analyze::scan_disc;
pub use error::{Error, ErrorCode, Result};
pub use model::DiscAnalysis;
