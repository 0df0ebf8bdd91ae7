//! Pre-generated Unicode code-point ranges, exposed as `CharSet`s.
//!
//! The conversion core treats Unicode property data as a read-only
//! collaborator: named tables of `(min, max)` ranges over `[0, 0x10FFFF]`
//! that callers turn into transition labels. The tables here cover the
//! general categories and properties the bundled demos and tests exercise;
//! how such tables are generated is not this crate's concern.
//!
//! Based on Unicode 15.0 data.

use crate::charset::{CharRange, CharSet, UNICODE_MAXIMUM};
use crate::ConvertError;

/// Nd (Number, Decimal Digit)
const CATEGORY_ND: &[(u32, u32)] = &[
    (0x0030, 0x0039),
    (0x0660, 0x0669),
    (0x06F0, 0x06F9),
    (0x07C0, 0x07C9),
    (0x0966, 0x096F),
    (0x09E6, 0x09EF),
    (0x0A66, 0x0A6F),
    (0x0AE6, 0x0AEF),
    (0x0B66, 0x0B6F),
    (0x0BE6, 0x0BEF),
    (0x0C66, 0x0C6F),
    (0x0CE6, 0x0CEF),
    (0x0D66, 0x0D6F),
    (0x0DE6, 0x0DEF),
    (0x0E50, 0x0E59),
    (0x0ED0, 0x0ED9),
    (0x0F20, 0x0F29),
    (0x1040, 0x1049),
    (0x1090, 0x1099),
    (0x17E0, 0x17E9),
    (0x1810, 0x1819),
    (0x1946, 0x194F),
    (0x19D0, 0x19D9),
    (0x1A80, 0x1A89),
    (0x1A90, 0x1A99),
    (0x1B50, 0x1B59),
    (0x1BB0, 0x1BB9),
    (0x1C40, 0x1C49),
    (0x1C50, 0x1C59),
    (0xA620, 0xA629),
    (0xA8D0, 0xA8D9),
    (0xA900, 0xA909),
    (0xA9D0, 0xA9D9),
    (0xA9F0, 0xA9F9),
    (0xAA50, 0xAA59),
    (0xABF0, 0xABF9),
    (0xFF10, 0xFF19),
    (0x1D7CE, 0x1D7FF),
];

/// Pd (Punctuation, Dash)
const CATEGORY_PD: &[(u32, u32)] = &[
    (0x002D, 0x002D),
    (0x058A, 0x058A),
    (0x05BE, 0x05BE),
    (0x1400, 0x1400),
    (0x1806, 0x1806),
    (0x2010, 0x2015),
    (0x2E17, 0x2E17),
    (0x2E1A, 0x2E1A),
    (0x2E3A, 0x2E3B),
    (0x2E40, 0x2E40),
    (0x301C, 0x301C),
    (0x3030, 0x3030),
    (0x30A0, 0x30A0),
    (0xFE31, 0xFE32),
    (0xFE58, 0xFE58),
    (0xFE63, 0xFE63),
    (0xFF0D, 0xFF0D),
];

/// Zs (Separator, Space)
const CATEGORY_ZS: &[(u32, u32)] = &[
    (0x0020, 0x0020),
    (0x00A0, 0x00A0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
];

/// Zl (Separator, Line)
const CATEGORY_ZL: &[(u32, u32)] = &[(0x2028, 0x2028)];

/// Zp (Separator, Paragraph)
const CATEGORY_ZP: &[(u32, u32)] = &[(0x2029, 0x2029)];

/// Cc (Other, Control)
const CATEGORY_CC: &[(u32, u32)] = &[(0x0000, 0x001F), (0x007F, 0x009F)];

/// White_Space binary property
const PROPERTY_WHITE_SPACE: &[(u32, u32)] = &[
    (0x0009, 0x000D),
    (0x0020, 0x0020),
    (0x0085, 0x0085),
    (0x00A0, 0x00A0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x2028, 0x2029),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
];

/// ASCII_Hex_Digit binary property
const PROPERTY_ASCII_HEX_DIGIT: &[(u32, u32)] = &[
    (0x0030, 0x0039),
    (0x0041, 0x0046),
    (0x0061, 0x0066),
];

/// Gothic script
const SCRIPT_GOTHIC: &[(u32, u32)] = &[(0x10330, 0x1034A)];

/// Ogham script
const SCRIPT_OGHAM: &[(u32, u32)] = &[(0x1680, 0x169C)];

fn to_charset(table: &[(u32, u32)]) -> Result<CharSet, ConvertError> {
    CharSet::from_ranges(
        UNICODE_MAXIMUM,
        table.iter().map(|&(min, max)| CharRange::new(min, max)),
    )
}

/// Ranges of a Unicode general category by short name, as a `CharSet` over
/// the full Unicode alphabet. Returns `None` for categories this build does
/// not carry tables for.
pub fn general_category(name: &str) -> Option<Result<CharSet, ConvertError>> {
    let table = match name {
        "Nd" => CATEGORY_ND,
        "Pd" => CATEGORY_PD,
        "Zs" => CATEGORY_ZS,
        "Zl" => CATEGORY_ZL,
        "Zp" => CATEGORY_ZP,
        "Cc" => CATEGORY_CC,
        _ => return None,
    };
    Some(to_charset(table))
}

/// Ranges of a binary property, as a `CharSet` over the full Unicode
/// alphabet.
pub fn binary_property(name: &str) -> Option<Result<CharSet, ConvertError>> {
    let table = match name {
        "White_Space" => PROPERTY_WHITE_SPACE,
        "ASCII_Hex_Digit" => PROPERTY_ASCII_HEX_DIGIT,
        _ => return None,
    };
    Some(to_charset(table))
}

/// Ranges of a script, as a `CharSet` over the full Unicode alphabet.
pub fn script(name: &str) -> Option<Result<CharSet, ConvertError>> {
    let table = match name {
        "Gothic" => SCRIPT_GOTHIC,
        "Ogham" => SCRIPT_OGHAM,
        _ => return None,
    };
    Some(to_charset(table))
}
