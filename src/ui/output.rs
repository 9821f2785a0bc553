//! Message helpers for the eavbase CLI

use crate::ui::{theme, Icons, Theme};
use owo_colors::OwoColorize;

/// Top-of-command banner
pub fn banner(text: &str) {
    println!("{} {}", Icons::DATABASE, text.style(theme().title.clone()));
}

/// Something was written to, or confirmed in, the store
pub fn persisted(text: &str) {
    println!("{} {}", Icons::CHECK, text.style(theme().persisted.clone()));
}

/// The command fell back to memory or found no usable store
pub fn fallback(text: &str) {
    eprintln!("{} {}", Icons::MEMORY, text.style(theme().fallback.clone()));
}

pub fn failure(text: &str) {
    eprintln!("{} {}", Icons::CROSS, text.style(theme().failure.clone()));
}

/// `label: value` line
pub fn field(label: &str, value: &str) {
    println!("{}", render_field(theme(), label, value, false));
}

/// `label: identifier` line, identifier highlighted
pub fn ident_field(label: &str, ident: &str) {
    println!("{}", render_field(theme(), label, ident, true));
}

/// Heading above one found record
pub fn record_heading(class: &str, id: &str) {
    println!();
    println!("{} {} #{}", Icons::PACKAGE, class.style(theme().title.clone()), id);
}

pub fn faint(text: &str) -> String {
    text.style(theme().label.clone()).to_string()
}

fn render_field(theme: &Theme, label: &str, value: &str, ident: bool) -> String {
    let label = format!("{}:", label);
    let value = if ident {
        value.style(theme.ident.clone()).to_string()
    } else {
        value.to_string()
    };
    format!("  {:<12}{}", label.style(theme.label.clone()).to_string(), value)
}
