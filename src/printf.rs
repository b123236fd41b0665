// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! printf-style rendering of a reporting call's own message.
//!
//! Registry keys are the host's printf templates, so a call site that also
//! wants the human-readable line renders it from the same template and
//! arguments. Conversions take the next argument's `Display` text; flags,
//! width, precision and length modifiers are accepted and ignored.

use crate::args::TestArgs;

const CONVERSIONS: &[char] = &['s', 'd', 'i', 'u', 'f', 'x', 'c', 'g', 'e'];
const MODIFIERS: &[char] = &['-', '+', ' ', '#', '0', '.', 'l', 'h', 'z', 'j', 't', 'q'];

/// Render `format` with `args`.
///
/// A conversion with no argument left is copied through verbatim; extra
/// arguments are ignored. `%%` yields `%`.
pub fn render<A: TestArgs + ?Sized>(format: &str, args: &A) -> String {
    let mut out = String::with_capacity(format.len() + 16);
    let mut next_arg = 0;
    let mut rest = format;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let spec = &rest[start + 1..];

        if let Some(tail) = spec.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }

        let modifiers = spec
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || MODIFIERS.contains(c)))
            .map(|(i, _)| i)
            .unwrap_or(spec.len());

        match spec[modifiers..].chars().next() {
            Some(conv) if CONVERSIONS.contains(&conv) => {
                let end = modifiers + conv.len_utf8();
                if next_arg < args.arg_count() {
                    out.push_str(&args.arg_text(next_arg));
                    next_arg += 1;
                } else {
                    out.push('%');
                    out.push_str(&spec[..end]);
                }
                rest = &spec[end..];
            }
            // Not a conversion we know: keep the '%' literally
            _ => {
                out.push('%');
                rest = spec;
            }
        }
    }

    out.push_str(rest);
    out
}
