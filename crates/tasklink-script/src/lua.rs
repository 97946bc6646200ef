//! Lua payload scripts.
//!
//! Each evaluation runs in a fresh Lua state. Variables are installed as
//! globals and the chunk's return value becomes the payload, e.g.
//! `return { id = order.id, lines = { 1, 2, 3 } }`.

use mlua::{Lua, Table, Value as LuaValue};

use crate::engines::ScriptEngine;
use crate::error::ScriptError;
use crate::{Bindings, Value};

const LUA: &str = "lua";

pub struct LuaEngine;

impl ScriptEngine for LuaEngine {
  fn evaluate(&self, script: &str, bindings: &Bindings) -> Result<Value, ScriptError> {
    let lua = Lua::new();
    let globals = lua.globals();
    for (name, value) in bindings {
      let value = to_lua(&lua, value).map_err(runtime)?;
      globals.set(name.as_str(), value).map_err(runtime)?;
    }

    let result: LuaValue = lua
      .load(script)
      .set_name("payload")
      .eval()
      .map_err(|e| match e {
        mlua::Error::SyntaxError { message, .. } => ScriptError::syntax(LUA, message),
        other => runtime(other),
      })?;

    from_lua(result, 0)
  }
}

fn runtime(e: mlua::Error) -> ScriptError {
  ScriptError::evaluation(LUA, e.to_string())
}

fn to_lua(lua: &Lua, value: &Value) -> mlua::Result<LuaValue> {
  let converted = match value {
    Value::Null => LuaValue::Nil,
    Value::Bool(b) => LuaValue::Boolean(*b),
    Value::Int(i) => LuaValue::Integer(*i),
    Value::Float(f) => LuaValue::Number(*f),
    Value::String(s) => LuaValue::String(lua.create_string(s)?),
    Value::Bytes(b) => LuaValue::String(lua.create_string(b)?),
    Value::List(items) => {
      let table = lua.create_table()?;
      for (i, item) in items.iter().enumerate() {
        table.raw_set(i + 1, to_lua(lua, item)?)?;
      }
      LuaValue::Table(table)
    }
    Value::Map(map) => {
      let table = lua.create_table()?;
      for (key, item) in map {
        table.raw_set(key.as_str(), to_lua(lua, item)?)?;
      }
      LuaValue::Table(table)
    }
  };
  Ok(converted)
}

fn from_lua(value: LuaValue, depth: usize) -> Result<Value, ScriptError> {
  match value {
    LuaValue::Nil => Ok(Value::Null),
    LuaValue::Boolean(b) => Ok(Value::Bool(b)),
    LuaValue::Integer(i) => Ok(Value::Int(i)),
    LuaValue::Number(n) => Ok(Value::Float(n)),
    LuaValue::String(s) => {
      let bytes = s.as_bytes().to_vec();
      Ok(match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e) => Value::Bytes(e.into_bytes()),
      })
    }
    LuaValue::Table(table) => from_table(table, depth),
    other => Err(ScriptError::evaluation(
      LUA,
      format!("cannot return a {} as payload", other.type_name()),
    )),
  }
}

/// Sequences (keys 1..=n) become lists, everything else a map with string keys.
///
/// Tables nested deeper than [`Value::MAX_DEPTH`] are rejected, which also stops cyclic tables.
fn from_table(table: Table, depth: usize) -> Result<Value, ScriptError> {
  if depth >= Value::MAX_DEPTH {
    return Err(ScriptError::evaluation(
      LUA,
      "table nesting too deep (cyclic table?)",
    ));
  }

  let mut entries = Vec::new();
  for pair in table.pairs::<LuaValue, LuaValue>() {
    entries.push(pair.map_err(runtime)?);
  }

  let len = entries.len() as i64;
  let is_sequence = len > 0
    && entries
      .iter()
      .all(|(k, _)| matches!(k, LuaValue::Integer(i) if *i >= 1 && *i <= len));

  if is_sequence {
    entries.sort_by_key(|(k, _)| match k {
      LuaValue::Integer(i) => *i,
      _ => 0,
    });
    let items = entries
      .into_iter()
      .map(|(_, v)| from_lua(v, depth + 1))
      .collect::<Result<Vec<_>, _>>()?;
    return Ok(Value::List(items));
  }

  let mut map = std::collections::BTreeMap::new();
  for (key, item) in entries {
    let key = match key {
      LuaValue::String(s) => String::from_utf8_lossy(&s.as_bytes()).into_owned(),
      LuaValue::Integer(i) => i.to_string(),
      LuaValue::Number(n) => n.to_string(),
      LuaValue::Boolean(b) => b.to_string(),
      other => {
        return Err(ScriptError::evaluation(
          LUA,
          format!("unsupported table key type: {}", other.type_name()),
        ));
      }
    };
    map.insert(key, from_lua(item, depth + 1)?);
  }
  Ok(Value::Map(map))
}
