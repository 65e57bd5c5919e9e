//! Constant rules: integer, real, complex, string, vector and poly-int
//! literals

use super::tokens::Tokens;
use super::Classifier;
use crate::value::{NodeMeta, Value};
use gex_ir::{RealValue, TreeCode, TreeData, TreeId};

/// Decimal text of an integer constant, hexadecimal once it no longer fits
/// a 64-bit host word. Pointer constants print their low word with a `B`
/// (bytes) suffix.
pub fn format_integer(value: i128, is_pointer: bool) -> String {
    if is_pointer {
        return format!("{}B", value as u64);
    }
    if i64::try_from(value).is_ok() || u64::try_from(value).is_ok() {
        return value.to_string();
    }
    if value < 0 {
        format!("-{:#x}", value.unsigned_abs())
    } else {
        format!("{:#x}", value)
    }
}

/// Scientific form with an explicit fraction and exponent sign, `1.0e+0`.
pub fn format_real(value: f64) -> String {
    let text = format!("{:e}", value);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let mantissa = if mantissa.contains('.') {
        mantissa.to_string()
    } else {
        format!("{}.0", mantissa)
    };
    match exponent.strip_prefix('-') {
        Some(digits) => format!("{}e-{}", mantissa, digits),
        None => format!("{}e+{}", mantissa, exponent),
    }
}

/// One token per byte of a string literal. A trailing NUL is dropped.
pub fn escape_string_bytes(bytes: &[u8]) -> Vec<String> {
    let last = bytes.len().saturating_sub(1);
    let mut out = Vec::with_capacity(bytes.len());
    for (i, &byte) in bytes.iter().enumerate() {
        let token = match byte {
            0 if i == last => continue,
            b'\x08' => "\\b".to_string(),
            b'\x0c' => "\\f".to_string(),
            b'\n' => "\\n".to_string(),
            b'\r' => "\\r".to_string(),
            b'\t' => "\\t".to_string(),
            b'\x0b' => "\\v".to_string(),
            b'\\' => "\\\\".to_string(),
            b'"' => "\\\"".to_string(),
            b'\'' => "\\'".to_string(),
            b' '..=b'~' => char::from(byte).to_string(),
            _ => format!("\\x{:02x}", byte),
        };
        out.push(token);
    }
    out
}

impl Classifier<'_> {
    pub(super) fn integer_cst(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let cst = arena.int_cst(id).unwrap_or_default();
        let Some(ty) = arena.ty(id) else {
            return Value::simple(meta, format_integer(cst.value, false));
        };

        let target = self.target;
        let is_pointer = arena.code(ty).is_pointer_type();
        let byte_offset = *arena.code(ty) == TreeCode::PointerType;
        let precision = arena.type_precision(ty);
        let unusual_width = precision < target.int_bits || !precision.is_power_of_two();

        let mut text = format_integer(cst.value, byte_offset);
        if !is_pointer && !unusual_width {
            if arena.type_unsigned(ty) {
                text.push('u');
            }
            if precision == target.long_bits && precision != target.int_bits {
                text.push('l');
            } else if precision == target.long_long_bits && precision != target.int_bits {
                text.push_str("ll");
            }
        }
        if cst.overflow {
            text.push_str("(OVF)");
        }

        if !(is_pointer || unusual_width || cst.value < 0) {
            return Value::simple(meta, text);
        }
        let mut t = Tokens::new(meta);
        t.text("_Literal (");
        self.sub(&mut t, Some(ty));
        t.text(") ");
        t.text(text);
        t.complex()
    }

    pub(super) fn poly_int_cst(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        t.text("POLY_INT_CST [");
        for (i, coeff) in self.elements(id).into_iter().enumerate() {
            if i > 0 {
                t.text(", ");
            }
            self.sub(&mut t, coeff);
        }
        t.rbracket();
        t.complex()
    }

    pub(super) fn real_cst(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let TreeData::Real(real) = &self.arena.get(id).data else {
            return Value::simple(meta, String::new());
        };
        let mut text = String::new();
        if real.overflow {
            text.push_str(" overflow");
        }
        match real.value {
            RealValue::Infinity { negative: true } => text.push_str(" -Inf"),
            RealValue::Infinity { negative: false } => text.push_str(" Inf"),
            RealValue::Nan => text.push_str(" Nan"),
            RealValue::Finite(value) => text.push_str(&format_real(value)),
        }
        Value::simple(meta, text)
    }

    pub(super) fn complex_cst(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let (real, imag) = match &self.arena.get(id).data {
            TreeData::Complex { real, imag } => (*real, *imag),
            _ => (None, None),
        };
        let mut t = Tokens::new(meta);
        t.text("__complex__ (");
        self.sub(&mut t, real);
        t.text(", ");
        self.sub(&mut t, imag);
        t.rparen();
        t.complex()
    }

    pub(super) fn string_cst(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let bytes: &[u8] = match &self.arena.get(id).data {
            TreeData::Str(bytes) => bytes.as_slice(),
            _ => &[],
        };
        let mut t = Tokens::new(meta);
        t.text("\"");
        for token in escape_string_bytes(bytes) {
            t.text(token);
        }
        t.text("\"");
        t.complex()
    }

    pub(super) fn vector_cst(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let vector = match &self.arena.get(id).data {
            TreeData::Vector(vector) => vector.clone(),
            _ => Default::default(),
        };
        let mut t = Tokens::new(meta);
        t.text("_Literal (");
        self.sub(&mut t, self.arena.ty(id));
        t.text(") ");
        t.text("{ ");
        for (i, element) in vector.elements.into_iter().enumerate() {
            if i > 0 {
                t.text(", ");
            }
            self.sub(&mut t, element);
        }
        if vector.variable_length {
            t.text(", ...");
        }
        t.text(" }");
        t.complex()
    }
}
