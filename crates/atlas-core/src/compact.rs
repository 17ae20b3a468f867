//! Compact one-line text encoding of entities and dependencies
//!
//! ```text
//! function/method: file:line[-end]|(p1: t1, p2: t2) -> ret|sighash:bodyhash[|r=receiver][|v=visibility]
//! type:            file:line[-end]|kind|{name: type, ...}|sighash[|i=impl1,impl2]
//! const/var:       file:line|type=value
//! enum:            file:line[-end]|basetype|[Name=val,Name=val,...]
//! import:          file:line|importpath[|alias]
//! dependency:      from_id|dep_type|to_name[|q=qualified][|id=to_id]|@file:line[|optional]
//! ```
//!
//! Names and paths are written literally; nothing is escaped.
//! Const/var and import lines keep only the start line, so a multi-line
//! value parses back with `end_line == start_line`.

use crate::dependency::Dependency;
use crate::error::AtlasError;
use crate::model::{Entity, EntityKind, Visibility};

/// Location prefix: `file:line`, or `file:line-end` for multi-line spans.
fn location(entity: &Entity) -> String {
    if entity.end_line != entity.start_line {
        format!("{}:{}-{}", entity.file, entity.start_line, entity.end_line)
    } else {
        format!("{}:{}", entity.file, entity.start_line)
    }
}

fn name_and_type(name: &str, type_name: &str) -> String {
    match (name.is_empty(), type_name.is_empty()) {
        (false, false) => format!("{}: {}", name, type_name),
        (false, true) => name.to_string(),
        (true, _) => type_name.to_string(),
    }
}

/// Render one entity in the compact grammar.
pub fn format_entity(entity: &Entity) -> String {
    let loc = location(entity);
    match entity.kind {
        EntityKind::Function | EntityKind::Method => {
            let params = entity
                .params
                .iter()
                .map(|p| name_and_type(&p.name, &p.type_name))
                .collect::<Vec<_>>()
                .join(", ");
            let mut line = format!("{}|({})", loc, params);
            if !entity.returns.is_empty() {
                line.push_str(" -> ");
                line.push_str(&entity.returns.join(", "));
            }
            line.push('|');
            line.push_str(&entity.sig_hash);
            if let Some(body) = &entity.body_hash {
                line.push(':');
                line.push_str(body);
            }
            if let Some(receiver) = entity.receiver.as_deref().filter(|r| !r.is_empty()) {
                line.push_str("|r=");
                line.push_str(receiver);
            }
            if entity.visibility != Visibility::Public {
                line.push_str("|v=");
                line.push_str(entity.visibility.as_str());
            }
            line
        }
        EntityKind::Type => {
            let fields = entity
                .fields
                .iter()
                .map(|f| name_and_type(&f.name, &f.type_name))
                .collect::<Vec<_>>()
                .join(", ");
            let kind = entity.type_kind.map(|k| k.as_str()).unwrap_or("");
            let mut line = format!("{}|{}|{{{}}}|{}", loc, kind, fields, entity.sig_hash);
            if !entity.implements.is_empty() {
                line.push_str("|i=");
                line.push_str(&entity.implements.join(","));
            }
            line
        }
        EntityKind::Constant | EntityKind::Variable => format!(
            "{}:{}|{}={}",
            entity.file,
            entity.start_line,
            entity.value_type.as_deref().unwrap_or(""),
            entity.value.as_deref().unwrap_or("")
        ),
        EntityKind::Enum => {
            let values = entity
                .enum_values
                .iter()
                .map(|v| {
                    if v.value.is_empty() {
                        v.name.clone()
                    } else {
                        format!("{}={}", v.name, v.value)
                    }
                })
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "{}|{}|[{}]",
                loc,
                entity.value_type.as_deref().unwrap_or(""),
                values
            )
        }
        EntityKind::Import => {
            let mut line = format!(
                "{}:{}|{}",
                entity.file,
                entity.start_line,
                entity.import_path.as_deref().unwrap_or("")
            );
            if let Some(alias) = entity.import_alias.as_deref().filter(|a| !a.is_empty()) {
                line.push('|');
                line.push_str(alias);
            }
            line
        }
        EntityKind::Unknown => format!("{}|{}", loc, entity.name),
    }
}

/// Render one dependency in the compact grammar.
pub fn format_dependency(dep: &Dependency) -> String {
    let mut line = format!("{}|{}|{}", dep.from_id, dep.dep_type, dep.to_name);
    if let Some(q) = dep.to_qualified.as_deref().filter(|q| !q.is_empty()) {
        line.push_str("|q=");
        line.push_str(q);
    }
    if !dep.to_id.is_empty() {
        line.push_str("|id=");
        line.push_str(&dep.to_id);
    }
    line.push_str("|@");
    line.push_str(&dep.location);
    if dep.optional {
        line.push_str("|optional");
    }
    line
}

/// What can be recovered from a compact entity line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactEntity {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Parameter count; `Some` only for functions and methods.
    pub param_count: Option<usize>,
    /// Return type count; `Some` only for functions and methods.
    pub return_count: Option<usize>,
}

/// Parse a compact line produced by [`format_entity`] for an entity of `kind`.
pub fn parse_entity_line(kind: EntityKind, line: &str) -> Result<CompactEntity, AtlasError> {
    let (loc, rest) = line
        .split_once('|')
        .ok_or_else(|| AtlasError::Compact(format!("missing '|' in {line:?}")))?;
    let (file, start_line, end_line) = parse_location(loc)?;

    let (param_count, return_count) = if kind.is_callable() {
        let (params, returns) = parse_callable_signature(rest)?;
        (Some(params), Some(returns))
    } else {
        (None, None)
    };

    Ok(CompactEntity {
        file,
        start_line,
        end_line,
        param_count,
        return_count,
    })
}

fn parse_location(loc: &str) -> Result<(String, u32, u32), AtlasError> {
    let (file, lines) = loc
        .rsplit_once(':')
        .ok_or_else(|| AtlasError::Compact(format!("missing line number in {loc:?}")))?;
    let parse = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| AtlasError::Compact(format!("bad line number {s:?} in {loc:?}")))
    };
    let (start, end) = match lines.split_once('-') {
        Some((start, end)) => (parse(start)?, parse(end)?),
        None => {
            let line = parse(lines)?;
            (line, line)
        }
    };
    if file.is_empty() {
        return Err(AtlasError::Compact(format!("empty file in {loc:?}")));
    }
    Ok((file.to_string(), start, end))
}

/// `(params) -> returns|sig[:body][|r=..][|v=..]` => (param arity, return arity).
fn parse_callable_signature(rest: &str) -> Result<(usize, usize), AtlasError> {
    // Peel optional trailers and the hash segment from the right; whatever
    // is left may itself contain '|' (union return types).
    let mut sig = rest;
    loop {
        let (head, tail) = sig
            .rsplit_once('|')
            .ok_or_else(|| AtlasError::Compact(format!("missing hash segment in {rest:?}")))?;
        sig = head;
        if !(tail.starts_with("r=") || tail.starts_with("v=")) {
            break;
        }
    }

    if !sig.starts_with('(') {
        return Err(AtlasError::Compact(format!("missing parameter list in {rest:?}")));
    }
    let close = matching_paren(sig)
        .ok_or_else(|| AtlasError::Compact(format!("unbalanced parameter list in {rest:?}")))?;
    let params = count_top_level(&sig[1..close]);

    let after = &sig[close + 1..];
    let returns = match after.strip_prefix(" -> ") {
        Some(ret) => count_top_level(ret),
        None if after.is_empty() => 0,
        None => {
            return Err(AtlasError::Compact(format!(
                "unexpected text after parameters in {rest:?}"
            )));
        }
    };
    Ok((params, returns))
}

/// Byte offset of the ')' closing the '(' at offset 0.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut prev = '\0';
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let delta = bracket_delta(prev, c, chars.peek().map(|&(_, n)| n));
        depth += delta;
        if delta < 0 && depth == 0 {
            return (c == ')').then_some(i);
        }
        prev = c;
    }
    None
}

/// Number of comma-separated items at bracket depth zero; 0 for blank input.
fn count_top_level(s: &str) -> usize {
    if s.trim().is_empty() {
        return 0;
    }
    let mut depth = 0i32;
    let mut prev = '\0';
    let mut count = 1;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        depth += bracket_delta(prev, c, chars.peek().copied());
        if c == ',' && depth == 0 {
            count += 1;
        }
        prev = c;
    }
    count
}

/// Depth change for `c`. Channel arrows (`<-`) and `->`/`=>` are not brackets.
fn bracket_delta(prev: char, c: char, next: Option<char>) -> i32 {
    match c {
        '<' if next == Some('-') => 0,
        '(' | '[' | '{' | '<' => 1,
        '>' if prev == '-' || prev == '=' => 0,
        ')' | ']' | '}' | '>' => -1,
        _ => 0,
    }
}
