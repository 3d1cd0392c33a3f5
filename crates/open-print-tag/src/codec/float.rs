//! Half-precision conversion and float compression for region encoding.

use crate::model::{FloatPrecision, Value};

/// Converts an `f32` to IEEE 754 binary16 bits, rounding to nearest even.
pub fn f32_to_f16_bits(value: f32) -> u16 {
    let x = value.to_bits();
    let sign = x & 0x8000_0000;
    let exp = x & 0x7F80_0000;
    let man = x & 0x007F_FFFF;
    let half_sign = sign >> 16;

    // Infinity or NaN; keep a quiet bit so NaN stays NaN.
    if exp == 0x7F80_0000 {
        let nan_bit = if man == 0 { 0 } else { 0x0200 };
        return (half_sign | 0x7C00 | nan_bit | (man >> 13)) as u16;
    }

    let half_exp = ((exp >> 23) as i32) - 127 + 15;

    if half_exp >= 0x1F {
        return (half_sign | 0x7C00) as u16;
    }

    if half_exp <= 0 {
        // Too small even for a subnormal.
        if 14 - half_exp > 24 {
            return half_sign as u16;
        }
        let man = man | 0x0080_0000;
        let mut half_man = man >> (14 - half_exp) as u32;
        let round_bit = 1u32 << (13 - half_exp) as u32;
        if (man & round_bit) != 0 && (man & (3 * round_bit - 1)) != 0 {
            half_man += 1;
        }
        return (half_sign | half_man) as u16;
    }

    let half_exp = (half_exp as u32) << 10;
    let half_man = man >> 13;
    let round_bit = 0x0000_1000u32;
    let bits = half_sign | half_exp | half_man;
    if (man & round_bit) != 0 && (man & (3 * round_bit - 1)) != 0 {
        // A mantissa carry correctly bumps the exponent.
        (bits + 1) as u16
    } else {
        bits as u16
    }
}

/// Converts IEEE 754 binary16 bits to an `f32` (exact).
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    if bits & 0x7FFF == 0 {
        return f32::from_bits((bits as u32) << 16);
    }

    let sign = ((bits & 0x8000) as u32) << 16;
    let half_exp = (bits & 0x7C00) as u32;
    let half_man = (bits & 0x03FF) as u32;

    if half_exp == 0x7C00 {
        if half_man == 0 {
            return f32::from_bits(sign | 0x7F80_0000);
        }
        return f32::from_bits(sign | 0x7FC0_0000 | (half_man << 13));
    }

    if half_exp == 0 {
        // Subnormal: normalize the mantissa.
        let e = (half_man as u16).leading_zeros() - 6;
        let exp = (127 - 15 - e) << 23;
        let man = (half_man << (14 + e)) & 0x007F_FFFF;
        return f32::from_bits(sign | exp | man);
    }

    let exp = ((half_exp >> 10) + 127 - 15) << 23;
    f32::from_bits(sign | exp | (half_man << 13))
}

/// The narrowest lossless CBOR float width for a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatWidth {
    Half(u16),
    Single(f32),
    Double(f64),
}

/// Picks the smallest float encoding that reproduces `value` exactly.
pub fn shortest_float(value: f64) -> FloatWidth {
    if value.is_nan() {
        return FloatWidth::Half(0x7E00);
    }
    let single = value as f32;
    if single as f64 != value {
        return FloatWidth::Double(value);
    }
    let half = f32_to_f16_bits(single);
    if f16_bits_to_f32(half).to_bits() == single.to_bits() {
        FloatWidth::Half(half)
    } else {
        FloatWidth::Single(single)
    }
}

/// Shrinks a float field value before it is written.
///
/// Whole numbers that fit a small integer are emitted as integers. Anything
/// else is rounded to the region's float precision ceiling; the writer then
/// chooses the narrowest width that holds the rounded value without loss.
pub fn compress_float(value: f64, precision: FloatPrecision) -> Value {
    if value < 0.0 {
        if (value as i8) as f64 == value {
            return Value::Signed(value as i8 as i64);
        }
        if (value as i16) as f64 == value {
            return Value::Signed(value as i16 as i64);
        }
    }

    if (value as u8) as f64 == value {
        return Value::Unsigned(value as u8 as u64);
    }
    if (value as u16) as f64 == value {
        return Value::Unsigned(value as u16 as u64);
    }

    match precision {
        FloatPrecision::P16 => Value::Float(f16_bits_to_f32(f32_to_f16_bits(value as f32)) as f64),
        FloatPrecision::P32 => Value::Float(value as f32 as f64),
        FloatPrecision::P64 => Value::Float(value),
    }
}
