//! Byte classes from RFC 5234, RFC 3986, RFC 9110 and RFC 7239.

#[inline]
pub(crate) const fn is_alpha(byte: u8) -> bool {
    byte.is_ascii_alphabetic()
}

#[inline]
pub(crate) const fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

#[inline]
pub(crate) const fn is_hexdig(byte: u8) -> bool {
    byte.is_ascii_hexdigit()
}

/// SP / HTAB
#[inline]
pub(crate) const fn is_ws(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t')
}

/// token   = 1*tchar
/// tchar   = "!" / "#" / "$" / "%" / "&" / "'" / "*"
///         / "+" / "-" / "." / "^" / "_" / "`" / "|" / "~"
///         / DIGIT / ALPHA
#[inline]
pub(crate) const fn is_tchar(byte: u8) -> bool {
    matches!(
        byte,
        | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*'
        | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z'
    )
}

#[inline]
pub(crate) const fn is_vchar(byte: u8) -> bool {
    matches!(byte, 0x21..=0x7E)
}

#[inline]
pub(crate) const fn is_obs_text(byte: u8) -> bool {
    byte >= 0x80
}

/// field-vchar = VCHAR / obs-text
#[inline]
pub(crate) const fn is_field_vchar(byte: u8) -> bool {
    is_vchar(byte) || is_obs_text(byte)
}

/// qdtext = HTAB / SP / %x21 / %x23-5B / %x5D-7E / obs-text
#[inline]
pub(crate) const fn is_qdtext(byte: u8) -> bool {
    matches!(byte, b'\t' | b' ' | 0x21 | 0x23..=0x5B | 0x5D..=0x7E) || is_obs_text(byte)
}

/// ctext = HTAB / SP / %x21-27 / %x2A-5B / %x5D-7E / obs-text
#[inline]
pub(crate) const fn is_ctext(byte: u8) -> bool {
    matches!(byte, b'\t' | b' ' | 0x21..=0x27 | 0x2A..=0x5B | 0x5D..=0x7E) || is_obs_text(byte)
}

/// The byte following the backslash of a quoted-pair: HTAB / SP / VCHAR / obs-text
#[inline]
pub(crate) const fn is_quoted_pair_byte(byte: u8) -> bool {
    is_ws(byte) || is_vchar(byte) || is_obs_text(byte)
}

/// unreserved = ALPHA / DIGIT / "-" / "." / "_" / "~"
#[inline]
pub(crate) const fn is_unreserved(byte: u8) -> bool {
    matches!(byte, b'-' | b'.' | b'_' | b'~') || byte.is_ascii_alphanumeric()
}

/// sub-delims = "!" / "$" / "&" / "'" / "(" / ")" / "*" / "+" / "," / ";" / "="
#[inline]
pub(crate) const fn is_sub_delim(byte: u8) -> bool {
    matches!(byte, b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=')
}

/// Interior of a bracketed IPv6 literal, accepted permissively as `%x21-5C / %x5E-7E`.
///
/// Strict validation happens when the address is constructed.
#[inline]
pub(crate) const fn is_ipv6_literal(byte: u8) -> bool {
    matches!(byte, 0x21..=0x5C | 0x5E..=0x7E)
}

/// Characters of an obfuscated node or port: ALPHA / DIGIT / "." / "_" / "-"
#[inline]
pub(crate) const fn is_obf_char(byte: u8) -> bool {
    matches!(byte, b'.' | b'_' | b'-') || byte.is_ascii_alphanumeric()
}
