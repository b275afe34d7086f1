//! Reversible escaping of element and attribute names.
//!
//! CX names may contain `.`, which strict markup grammars reject in names.
//! Before markup is handed to a parser every name is rewritten with
//! [`escape_name`], and parsed names are restored with [`unescape_name`].
//! A name that already contains the escape token could not be restored
//! exactly and is rejected with [`Error::NameEscapingCollision`].

use std::borrow::Cow;

use teacx_common::memchr::{memchr, memmem};

use crate::{Error, Result};

/// Character that is not allowed in parsed names.
pub const FORBIDDEN: char = '.';

/// Replacement for [`FORBIDDEN`] inside escaped names.
pub const ESCAPE_TOKEN: &str = "_x002E_";

/// Escape one name.
///
/// Names without the forbidden character are returned unchanged.
pub fn escape_name(name: &str) -> Result<Cow<'_, str>> {
    let escaped = if name.contains(FORBIDDEN) {
        Cow::Owned(name.replace(FORBIDDEN, ESCAPE_TOKEN))
    } else {
        Cow::Borrowed(name)
    };

    if unescape_name(&escaped) != name {
        return Err(Error::NameEscapingCollision {
            name: name.to_string(),
        });
    }
    Ok(escaped)
}

/// Restore a name produced by [`escape_name`].
pub fn unescape_name(name: &str) -> Cow<'_, str> {
    if name.contains(ESCAPE_TOKEN) {
        let mut buf = [0u8; 4];
        Cow::Owned(name.replace(ESCAPE_TOKEN, FORBIDDEN.encode_utf8(&mut buf)))
    } else {
        Cow::Borrowed(name)
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

#[inline]
fn is_name_end(b: u8) -> bool {
    is_space(b) || matches!(b, b'/' | b'>' | b'=')
}

/// Escape every element and attribute name of a markup document.
///
/// Text, attribute values, comments, CDATA sections, processing instructions
/// and declarations are copied unchanged. Line structure is preserved.
pub fn escape_markup(text: &str) -> Result<Cow<'_, str>> {
    if !text.contains(FORBIDDEN) && !text.contains(ESCAPE_TOKEN) {
        return Ok(Cow::Borrowed(text));
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut pos = 0;

    // Every slice boundary below sits on an ASCII byte, so slicing `text` is
    // always on a char boundary.
    while let Some(offset) = memchr(b'<', &bytes[pos..]) {
        let start = pos + offset;
        out.push_str(&text[pos..start]);
        let rest = &bytes[start..];

        let skip_to = |terminator: &[u8]| {
            memmem::find(rest, terminator).map_or(bytes.len(), |i| start + i + terminator.len())
        };

        if rest.starts_with(b"<!--") {
            pos = skip_to(b"-->");
        } else if rest.starts_with(b"<![CDATA[") {
            pos = skip_to(b"]]>");
        } else if rest.starts_with(b"<?") {
            pos = skip_to(b"?>");
        } else if rest.starts_with(b"<!") {
            pos = skip_to(b">");
        } else {
            pos = escape_tag(text, start, &mut out)?;
            continue;
        }
        out.push_str(&text[start..pos]);
    }

    out.push_str(&text[pos..]);
    Ok(Cow::Owned(out))
}

/// Copy one start or end tag beginning at `start`, escaping its names.
/// Returns the position just past the tag.
fn escape_tag(text: &str, start: usize, out: &mut String) -> Result<usize> {
    let bytes = text.as_bytes();
    let mut pos = start + 1;
    out.push('<');

    if bytes.get(pos) == Some(&b'/') {
        out.push('/');
        pos += 1;
    }

    let name_start = pos;
    while pos < bytes.len() && !is_name_end(bytes[pos]) {
        pos += 1;
    }
    out.push_str(&escape_name(&text[name_start..pos])?);

    while pos < bytes.len() {
        match bytes[pos] {
            b'>' => {
                out.push('>');
                return Ok(pos + 1);
            }
            b if is_space(b) || b == b'/' || b == b'=' => {
                out.push(b as char);
                pos += 1;
            }
            quote @ (b'"' | b'\'') => {
                let end = memchr(quote, &bytes[pos + 1..]).map_or(bytes.len(), |i| pos + 2 + i);
                out.push_str(&text[pos..end]);
                pos = end;
            }
            _ => {
                let name_start = pos;
                while pos < bytes.len() && !is_name_end(bytes[pos]) {
                    pos += 1;
                }
                out.push_str(&escape_name(&text[name_start..pos])?);
            }
        }
    }

    Ok(pos)
}
