//! 🔄 Transforms: the value-level helpers mappers lean on.
//!
//! 🎬 COLD OPEN: INT. MAPPING SCRIPT. 2:47 AM.
//! A column says `seit`. Another says `202001011230`. A third is NULL.
//! Somewhere an index expects `t1` and `t2`, eight digits each, no excuses.
//!
//! ## Knowledge Graph 🧠
//! - `time_fields`: `TimeFieldNormalizer`, per-record t0/t1/t2 bounds with open-end fallbacks.
//! - `syslist`: `SyslistLookup`, code-list entry → names in every language.
//! - Both are owned by the `MappingContext` for one pipeline run. Never globals, never singletons.
//!
//! 🦆

pub mod syslist;
pub mod time_fields;

pub use syslist::SyslistLookup;
pub use time_fields::{TimeBounds, TimeFieldNormalizer};
