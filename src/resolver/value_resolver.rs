//! Resolution of a template's candidate values and selection flags.
//!
//! Values are refreshed against a live data source on every hydration, so a
//! previously chosen value may have disappeared (a dropped tag value, a
//! deleted database). Every fallback chain here degrades to "first available"
//! instead of keeping a dangling selection.
//!
//! Within the returned list at most one value is `selected` and at most one
//! is `local_selected`. Flags are assigned by position, so duplicate literal
//! values never end up flagged twice.

use crate::models::{Template, TemplateType, TemplateValue, TemplateValueType};

/// Produce the canonical candidate list for `template`.
///
/// * `fresh_values` - values just fetched for a query-backed template; ignored
///   for literal kinds. `None` is treated as an empty fetch.
/// * `hint` - a value the caller would like locally selected (for map
///   templates this is matched against the key). Empty hints are ignored.
pub fn resolve_values(
    template: &Template,
    fresh_values: Option<&[String]>,
    hint: Option<&str>,
) -> Vec<TemplateValue> {
    let hint = hint.filter(|h| !h.is_empty());

    match template.template_type {
        TemplateType::Text => resolve_text(template, hint),
        TemplateType::Csv | TemplateType::Map | TemplateType::Constant => {
            resolve_constant(template, hint)
        }
        TemplateType::MetaQuery
        | TemplateType::FieldKeys
        | TemplateType::Measurements
        | TemplateType::TagKeys
        | TemplateType::TagValues
        | TemplateType::Databases => resolve_query(template, fresh_values.unwrap_or(&[]), hint),
    }
}

fn resolve_text(template: &Template, hint: Option<&str>) -> Vec<TemplateValue> {
    if let Some(hint) = hint {
        return vec![TemplateValue::new(hint, TemplateValueType::Constant).local_selected(true)];
    }

    match template.values.first() {
        Some(first) => vec![first.clone().local_selected(true)],
        None => vec![TemplateValue::new("", TemplateValueType::Constant).local_selected(true)],
    }
}

fn resolve_constant(template: &Template, hint: Option<&str>) -> Vec<TemplateValue> {
    let values = &template.values;
    if values.is_empty() {
        return Vec::new();
    }

    let selected = values.iter().position(|v| v.selected).unwrap_or(0);

    let matches_hint = |v: &TemplateValue| match (template.template_type, hint) {
        (TemplateType::Map, Some(hint)) => v.key.as_deref() == Some(hint),
        (_, Some(hint)) => v.value == hint,
        (_, None) => false,
    };

    let local_selected = values
        .iter()
        .position(matches_hint)
        .or_else(|| values.iter().position(|v| v.local_selected))
        .unwrap_or(selected);

    values
        .iter()
        .enumerate()
        .map(|(i, v)| v.clone().selected(i == selected).local_selected(i == local_selected))
        .collect()
}

fn resolve_query(
    template: &Template,
    fresh_values: &[String],
    hint: Option<&str>,
) -> Vec<TemplateValue> {
    if fresh_values.is_empty() {
        return Vec::new();
    }

    let position_of = |wanted: &str| fresh_values.iter().position(|v| v == wanted);

    let selected = template
        .selected_value()
        .and_then(|v| position_of(&v.value))
        .unwrap_or(0);

    let local_selected = hint
        .and_then(position_of)
        .or_else(|| template.local_selected_value().and_then(|v| position_of(&v.value)))
        .unwrap_or(selected);

    let value_type = template.template_type.value_type();

    fresh_values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            TemplateValue::new(value.as_str(), value_type)
                .selected(i == selected)
                .local_selected(i == local_selected)
        })
        .collect()
}
