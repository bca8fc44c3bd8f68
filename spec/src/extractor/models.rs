//! Data-model extraction from `python` fenced blocks.

use crate::model::{FieldKind, ModelSpec, RelationKind};

/// Extracts model classes from one code block.
///
/// A top-level `class Name(Bases):` opens a class whose body runs until the
/// next top-level class or a top-level comment. A class counts as a model
/// when its body or bases mention the ORM (`models.` / `Model`).
#[must_use]
pub fn extract_models(block: &str) -> Vec<ModelSpec> {
    let mut out: Vec<ModelSpec> = Vec::new();
    let mut current: Option<(String, String, Vec<&str>)> = None;

    for line in block.lines() {
        let top_level = !line.starts_with(char::is_whitespace);
        if top_level {
            if let Some(header) = class_header(line) {
                flush(&mut out, current.take());
                current = Some((header.0, header.1, Vec::new()));
                continue;
            }
            if line.starts_with('#') {
                flush(&mut out, current.take());
                continue;
            }
        }
        if let Some((_, _, body)) = current.as_mut() {
            body.push(line);
        }
    }
    flush(&mut out, current);

    out
}

fn class_header(line: &str) -> Option<(String, String)> {
    let caps = regex!(r"^class\s+(\w+)\s*\(([^)]*)\)\s*:")?.captures(line)?;
    Some((caps[1].to_string(), caps[2].trim().to_string()))
}

fn flush(out: &mut Vec<ModelSpec>, current: Option<(String, String, Vec<&str>)>) {
    let Some((name, bases, lines)) = current else {
        return;
    };
    let body = lines.join("\n");
    if !(body.contains("models.") || body.contains("Model") || bases.contains("Model")) {
        return;
    }
    let model = parse_model(name, bases, &body);
    // A later declaration of the same class replaces the earlier one in place.
    match out.iter_mut().find(|m| m.name == model.name) {
        Some(existing) => *existing = model,
        None => out.push(model),
    }
}

/// Parses fields, relations, methods and the abstract flag from a class body.
#[must_use]
pub fn parse_model(name: String, bases: String, body: &str) -> ModelSpec {
    let mut model = ModelSpec {
        name,
        bases,
        ..ModelSpec::default()
    };

    if let Some(re) = regex!(r"(?m)^[ \t]*(\w+)\s*=\s*models\.(\w+)\s*\(([^)]*)") {
        for caps in re.captures_iter(body) {
            let field = caps[1].to_string();
            let constructor = &caps[2];
            let kind = match RelationKind::from_constructor(constructor) {
                Some(relation) => match relation_target(&caps[3]) {
                    Some(target) => {
                        if !model.relations.contains(&target) {
                            model.relations.push(target.clone());
                        }
                        FieldKind::Relation { relation, target }
                    }
                    None => FieldKind::Plain {
                        constructor: constructor.to_string(),
                    },
                },
                None => FieldKind::Plain {
                    constructor: constructor.to_string(),
                },
            };
            if !model.has_field(&field) {
                model.fields.push(field.clone());
            }
            model.field_kinds.insert(field, kind);
        }
    }

    model.is_abstract = regex!(r"abstract\s*=\s*True").is_some_and(|re| re.is_match(body));

    if let Some(re) = regex!(r"def\s+(\w+)\s*\(") {
        for caps in re.captures_iter(body) {
            let method = &caps[1];
            if !method.starts_with('_') && !model.methods.iter().any(|m| m == method) {
                model.methods.push(method.to_string());
            }
        }
    }

    model
}

/// Target of a relationship constructor: the first positional argument or
/// the `to=` keyword, quoted or bare. Arguments may span several lines.
fn relation_target(args: &str) -> Option<String> {
    let mut args = args.split(',').map(str::trim).filter(|a| !a.is_empty());
    let first = args.next()?;
    let first = if first.contains('=') {
        std::iter::once(first)
            .chain(args)
            .find_map(|a| a.strip_prefix("to").map(str::trim_start).and_then(|a| a.strip_prefix('=')))?
            .trim()
    } else {
        first
    };
    let target = first.trim_matches(|c| c == '"' || c == '\'');
    let valid = !target.is_empty()
        && !target.contains('=')
        && target.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    valid.then(|| target.to_string())
}
