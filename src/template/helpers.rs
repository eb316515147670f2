// ABOUTME: Helper functions callable from template pipelines
// ABOUTME: Implements date formatting, string manipulation, comparisons, and list utilities

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::HashMap;

use super::error::FuncError;
use super::layout::{format_epoch, EVENT_TIME_FORMAT};
use super::value::Value;

/// Signature shared by every registered helper.
pub type HelperFn = fn(&[Value]) -> Result<Value, FuncError>;

/// Named functions templates can call in pipelines.
#[derive(Debug, Clone)]
pub struct FuncRegistry {
    funcs: HashMap<&'static str, HelperFn>,
}

impl FuncRegistry {
    /// Registry with the full standard helper set.
    pub fn standard() -> Self {
        let mut funcs: HashMap<&'static str, HelperFn> = HashMap::new();
        register_builtins(&mut funcs);
        register_dates(&mut funcs);
        register_strings(&mut funcs);
        register_lists(&mut funcs);
        register_defaults(&mut funcs);
        register_encoding(&mut funcs);
        Self { funcs }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Invoke a registered helper by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, FuncError> {
        match self.funcs.get(name) {
            Some(func) => func(args),
            None => Err(FuncError::new(format!("function {name:?} not defined"))),
        }
    }
}

impl Default for FuncRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Comparison, logic, and indexing builtins.
fn register_builtins(funcs: &mut HashMap<&'static str, HelperFn>) {
    funcs.insert("and", and_helper);
    funcs.insert("or", or_helper);
    funcs.insert("not", not_helper);
    funcs.insert("eq", eq_helper);
    funcs.insert("ne", ne_helper);
    funcs.insert("lt", lt_helper);
    funcs.insert("le", le_helper);
    funcs.insert("gt", gt_helper);
    funcs.insert("ge", ge_helper);
    funcs.insert("len", len_helper);
    funcs.insert("index", index_helper);
}

fn register_dates(funcs: &mut HashMap<&'static str, HelperFn>) {
    funcs.insert("date", date_helper);
    funcs.insert("formatDate", format_date_helper);
}

fn register_strings(funcs: &mut HashMap<&'static str, HelperFn>) {
    funcs.insert("stringsReplace", strings_replace_helper);
    funcs.insert("stringsTrimSuffix", strings_trim_suffix_helper);
    funcs.insert("stringsTrimPrefix", strings_trim_prefix_helper);
    funcs.insert("stringsToLower", strings_to_lower_helper);
    funcs.insert("stringsToUpper", strings_to_upper_helper);
    funcs.insert("upper", upper_helper);
    funcs.insert("lower", lower_helper);
    funcs.insert("title", title_helper);
    funcs.insert("trim", trim_helper);
    funcs.insert("repeat", repeat_helper);
}

fn register_lists(funcs: &mut HashMap<&'static str, HelperFn>) {
    funcs.insert("list", list_helper);
    funcs.insert("uniq", uniq_helper);
    funcs.insert("without", without_helper);
    funcs.insert("first", first_helper);
    funcs.insert("last", last_helper);
    funcs.insert("join", join_helper);
}

fn register_defaults(funcs: &mut HashMap<&'static str, HelperFn>) {
    funcs.insert("default", default_helper);
    funcs.insert("coalesce", coalesce_helper);
    funcs.insert("empty", empty_helper);
}

fn register_encoding(funcs: &mut HashMap<&'static str, HelperFn>) {
    funcs.insert("b64enc", b64enc_helper);
    funcs.insert("b64dec", b64dec_helper);
}

/// First falsy argument, or the last argument when all are truthy.
fn and_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_min_args("and", args, 1)?;
    for arg in args {
        if !arg.is_truthy() {
            return Ok(arg.clone());
        }
    }
    Ok(args[args.len() - 1].clone())
}

/// First truthy argument, or the last argument when none are.
fn or_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_min_args("or", args, 1)?;
    for arg in args {
        if arg.is_truthy() {
            return Ok(arg.clone());
        }
    }
    Ok(args[args.len() - 1].clone())
}

fn not_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("not", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

/// True when the first argument equals any of the rest.
fn eq_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_min_args("eq", args, 2)?;
    for other in &args[1..] {
        if values_equal("eq", &args[0], other)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn ne_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("ne", args, 2)?;
    Ok(Value::Bool(!values_equal("ne", &args[0], &args[1])?))
}

fn lt_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("lt", args, 2)?;
    Ok(Value::Bool(order_values("lt", &args[0], &args[1])?.is_lt()))
}

fn le_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("le", args, 2)?;
    Ok(Value::Bool(order_values("le", &args[0], &args[1])?.is_le()))
}

fn gt_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("gt", args, 2)?;
    Ok(Value::Bool(order_values("gt", &args[0], &args[1])?.is_gt()))
}

fn ge_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("ge", args, 2)?;
    Ok(Value::Bool(order_values("ge", &args[0], &args[1])?.is_ge()))
}

fn len_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("len", args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.len() as i64)),
        Value::List(items) => Ok(Value::Int(items.len() as i64)),
        other => Err(FuncError::new(format!("len of type {}", other.type_name()))),
    }
}

/// Index into a list, with extra arguments indexing nested lists.
fn index_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_min_args("index", args, 2)?;
    let mut current = args[0].clone();
    for arg in &args[1..] {
        let items = match &current {
            Value::List(items) => items,
            other => {
                return Err(FuncError::new(format!(
                    "can't index item of type {}",
                    other.type_name()
                )));
            }
        };
        let position = arg.as_int().ok_or_else(|| {
            FuncError::new(format!("cannot index with type {}", arg.type_name()))
        })?;
        let item = if position >= 0 {
            items.get(position as usize)
        } else {
            None
        };
        current = match item {
            Some(item) => item.clone(),
            None => {
                return Err(FuncError::new(format!("index out of range: {position}")));
            }
        };
    }
    Ok(current)
}

/// Unix timestamp rendered in the local timezone as `2006-01-02 15:04:05`.
fn date_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("date", args, 1)?;
    let epoch = int_arg("date", args, 0)?;
    Ok(Value::Str(format_epoch(epoch, EVENT_TIME_FORMAT)?))
}

/// Unix timestamp rendered in the local timezone with a caller-supplied layout.
fn format_date_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("formatDate", args, 2)?;
    let epoch = int_arg("formatDate", args, 0)?;
    let layout = str_arg("formatDate", args, 1)?;
    Ok(Value::Str(format_epoch(epoch, layout)?))
}

/// Replace occurrences of a substring, a negative limit means all of them.
fn strings_replace_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("stringsReplace", args, 4)?;
    let text = str_arg("stringsReplace", args, 0)?;
    let from = str_arg("stringsReplace", args, 1)?;
    let to = str_arg("stringsReplace", args, 2)?;
    let limit = int_arg("stringsReplace", args, 3)?;
    let replaced = if limit < 0 {
        text.replace(from, to)
    } else {
        text.replacen(from, to, limit as usize)
    };
    Ok(Value::Str(replaced))
}

fn strings_trim_suffix_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("stringsTrimSuffix", args, 2)?;
    let text = str_arg("stringsTrimSuffix", args, 0)?;
    let suffix = str_arg("stringsTrimSuffix", args, 1)?;
    Ok(Value::Str(text.strip_suffix(suffix).unwrap_or(text).to_string()))
}

fn strings_trim_prefix_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("stringsTrimPrefix", args, 2)?;
    let text = str_arg("stringsTrimPrefix", args, 0)?;
    let prefix = str_arg("stringsTrimPrefix", args, 1)?;
    Ok(Value::Str(text.strip_prefix(prefix).unwrap_or(text).to_string()))
}

fn strings_to_lower_helper(args: &[Value]) -> Result<Value, FuncError> {
    string_transform("stringsToLower", args, str::to_lowercase)
}

fn strings_to_upper_helper(args: &[Value]) -> Result<Value, FuncError> {
    string_transform("stringsToUpper", args, str::to_uppercase)
}

fn upper_helper(args: &[Value]) -> Result<Value, FuncError> {
    string_transform("upper", args, str::to_uppercase)
}

fn lower_helper(args: &[Value]) -> Result<Value, FuncError> {
    string_transform("lower", args, str::to_lowercase)
}

fn title_helper(args: &[Value]) -> Result<Value, FuncError> {
    string_transform("title", args, title_case)
}

fn trim_helper(args: &[Value]) -> Result<Value, FuncError> {
    string_transform("trim", args, |s| s.trim().to_string())
}

fn string_transform(
    name: &str,
    args: &[Value],
    transform: fn(&str) -> String,
) -> Result<Value, FuncError> {
    require_args(name, args, 1)?;
    Ok(Value::Str(transform(str_arg(name, args, 0)?)))
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Repeat a string, count first so the text can be piped in.
fn repeat_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("repeat", args, 2)?;
    let count = int_arg("repeat", args, 0)?;
    let text = str_arg("repeat", args, 1)?;
    if count < 0 {
        return Err(FuncError::new(format!("negative repeat count {count}")));
    }
    let count = usize::try_from(count)
        .map_err(|_| FuncError::new(format!("repeat count {count} too large")))?;
    if text.len().checked_mul(count).is_none() {
        return Err(FuncError::new(format!("repeat count {count} too large")));
    }
    Ok(Value::Str(text.repeat(count)))
}

fn list_helper(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::List(args.to_vec()))
}

/// Drop duplicate list items, keeping first occurrences in order.
fn uniq_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("uniq", args, 1)?;
    let items = list_arg("uniq", args, 0)?;
    let mut seen: Vec<Value> = Vec::new();
    for item in items {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    Ok(Value::List(seen))
}

/// Filter out every list item equal to one of the remaining arguments.
fn without_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_min_args("without", args, 1)?;
    let items = list_arg("without", args, 0)?;
    let omit = &args[1..];
    let mut kept = Vec::new();
    for item in items {
        if !omit.contains(item) {
            kept.push(item.clone());
        }
    }
    Ok(Value::List(kept))
}

fn first_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("first", args, 1)?;
    let items = list_arg("first", args, 0)?;
    Ok(items.first().cloned().unwrap_or(Value::Null))
}

fn last_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("last", args, 1)?;
    let items = list_arg("last", args, 0)?;
    Ok(items.last().cloned().unwrap_or(Value::Null))
}

/// Join list items with a separator, the separator comes first.
fn join_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("join", args, 2)?;
    let separator = str_arg("join", args, 0)?;
    let items = list_arg("join", args, 1)?;
    let joined = items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator);
    Ok(Value::Str(joined))
}

/// The value when truthy, otherwise the supplied default.
fn default_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("default", args, 2)?;
    if args[1].is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args[0].clone())
    }
}

/// First truthy argument, nil when there is none.
fn coalesce_helper(args: &[Value]) -> Result<Value, FuncError> {
    for arg in args {
        if arg.is_truthy() {
            return Ok(arg.clone());
        }
    }
    Ok(Value::Null)
}

fn empty_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("empty", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn b64enc_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("b64enc", args, 1)?;
    let text = str_arg("b64enc", args, 0)?;
    Ok(Value::Str(BASE64.encode(text.as_bytes())))
}

fn b64dec_helper(args: &[Value]) -> Result<Value, FuncError> {
    require_args("b64dec", args, 1)?;
    let text = str_arg("b64dec", args, 0)?;
    let decoded = BASE64
        .decode(text)
        .map_err(|err| FuncError::new(format!("b64dec: {err}")))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| FuncError::new("b64dec: decoded bytes are not valid utf-8"))?;
    Ok(Value::Str(decoded))
}

fn values_equal(name: &str, left: &Value, right: &Value) -> Result<bool, FuncError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return Ok(a == b);
    }
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(a == b);
    }
    match (left, right) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        _ => Err(FuncError::new(format!(
            "incompatible types for comparison in {name}: {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn order_values(name: &str, left: &Value, right: &Value) -> Result<std::cmp::Ordering, FuncError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return a.partial_cmp(&b).ok_or_else(|| {
            FuncError::new(format!("invalid comparison in {name}: NaN operand"))
        });
    }
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    Err(FuncError::new(format!(
        "incompatible types for comparison in {name}: {} and {}",
        left.type_name(),
        right.type_name()
    )))
}

fn require_args(name: &str, args: &[Value], want: usize) -> Result<(), FuncError> {
    if args.len() != want {
        return Err(FuncError::new(format!(
            "wrong number of args for {name}: want {want} got {}",
            args.len()
        )));
    }
    Ok(())
}

fn require_min_args(name: &str, args: &[Value], want: usize) -> Result<(), FuncError> {
    if args.len() < want {
        return Err(FuncError::new(format!(
            "wrong number of args for {name}: want at least {want} got {}",
            args.len()
        )));
    }
    Ok(())
}

fn str_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str, FuncError> {
    args[index].as_str().ok_or_else(|| {
        FuncError::new(format!(
            "wrong type for argument {} to {name}: expected string, got {}",
            index + 1,
            args[index].type_name()
        ))
    })
}

fn int_arg(name: &str, args: &[Value], index: usize) -> Result<i64, FuncError> {
    args[index].as_int().ok_or_else(|| {
        FuncError::new(format!(
            "wrong type for argument {} to {name}: expected integer, got {}",
            index + 1,
            args[index].type_name()
        ))
    })
}

fn list_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a [Value], FuncError> {
    args[index].as_list().ok_or_else(|| {
        FuncError::new(format!(
            "wrong type for argument {} to {name}: expected list, got {}",
            index + 1,
            args[index].type_name()
        ))
    })
}
