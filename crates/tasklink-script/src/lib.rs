//! Scripting subsystem for tasklink.
//!
//! Payload expressions run through a [`ScriptingEngines`] registry keyed by
//! language name. Field expressions (endpoint, credentials, result variable)
//! are minijinja templates evaluated by [`evaluate_template`].
//!
//! # Languages
//!
//! | Name    | Engine                                   |
//! |---------|------------------------------------------|
//! | `jinja` | minijinja expression over the variables  |
//! | `json`  | literal JSON text                        |
//! | `lua`   | Lua 5.4 chunk (feature `lua`)            |

mod engines;
mod error;
mod jinja;
#[cfg(feature = "lua")]
mod lua;

use std::collections::BTreeMap;

pub use engines::{DEFAULT_LANGUAGE, ScriptEngine, ScriptingEngines};
pub use error::ScriptError;
pub use jinja::{JinjaEngine, JsonEngine, evaluate_template};
#[cfg(feature = "lua")]
pub use lua::LuaEngine;
pub use tasklink_codec::Value;

/// Variables visible to a script, keyed by name.
pub type Bindings = BTreeMap<String, Value>;
