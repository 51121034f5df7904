// crates/reqmgr-init-cli/src/tests/i18n.rs
// ============================================================================
// Module: Message Catalog Tests
// Description: Unit tests for catalog integrity and substitution.
// Purpose: Keep operator messages well formed and uniquely keyed.
// Dependencies: reqmgr-init-cli i18n module
// ============================================================================

//! ## Overview
//! Verifies catalog keys are unique, templates only use well-formed
//! placeholders, and substitution leaves no placeholder behind.

#![allow(clippy::expect_used, clippy::panic, reason = "Tests use expect and panic for failure reporting.")]

use std::collections::BTreeSet;

use crate::i18n::CATALOG_EN;
use crate::i18n::MessageArg;
use crate::i18n::catalog;
use crate::i18n::translate;

fn parse_placeholder_names(template: &str) -> Result<BTreeSet<String>, String> {
    let mut placeholders = BTreeSet::new();
    let bytes = template.as_bytes();
    let mut index = 0usize;
    while index < bytes.len() {
        match bytes[index] {
            b'{' => {
                let mut end = index + 1;
                while end < bytes.len() && bytes[end] != b'}' {
                    if bytes[end] == b'{' {
                        return Err(format!("nested '{{' at byte {end}"));
                    }
                    end += 1;
                }
                if end >= bytes.len() {
                    return Err(format!("unclosed '{{' at byte {index}"));
                }
                let name = &template[index + 1 .. end];
                if name.is_empty()
                    || !name.chars().all(|ch| ch.is_ascii_lowercase() || ch == '_')
                {
                    return Err(format!("placeholder '{name}' at byte {index} must use [a-z_]"));
                }
                placeholders.insert(name.to_string());
                index = end + 1;
            }
            b'}' => return Err(format!("unmatched '}}' at byte {index}")),
            _ => index += 1,
        }
    }
    Ok(placeholders)
}

#[test]
fn catalog_keys_are_unique() {
    let keys: BTreeSet<&str> = CATALOG_EN.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys.len(), CATALOG_EN.len(), "duplicate catalog key");
    assert_eq!(catalog().len(), CATALOG_EN.len());
}

#[test]
fn catalog_templates_have_well_formed_placeholders() {
    for (key, template) in CATALOG_EN {
        parse_placeholder_names(template)
            .unwrap_or_else(|err| panic!("template {key} is malformed: {err}"));
    }
}

#[test]
fn substituting_every_placeholder_leaves_none_behind() {
    for (key, template) in CATALOG_EN {
        let names = parse_placeholder_names(template).expect("well-formed template");
        let args = names.iter().map(|name| MessageArg::new(leak(name), "x")).collect();
        let rendered = translate(key, args);
        assert!(!rendered.contains('{'), "{key} kept a placeholder: {rendered}");
    }
}

#[test]
fn failure_line_matches_operator_format() {
    let line = crate::t!("failure.line", kind = "config", message = "boom");
    assert_eq!(line, "error [config] boom");
}

#[test]
fn unknown_key_falls_back_to_key() {
    assert_eq!(translate("missing.key", Vec::new()), "missing.key");
}

/// Produces a `'static` placeholder name for [`MessageArg`].
fn leak(name: &str) -> &'static str {
    Box::leak(name.to_string().into_boxed_str())
}
