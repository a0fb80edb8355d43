//! Pure decoders for standardized GATT measurement payloads.
//! Each function takes the raw notification value for one characteristic and
//! returns a typed reading. A malformed or truncated payload is a
//! [`DecodeError`], which subscription handlers treat as "no reading this
//! event" rather than tearing down the session.

use crate::core::bluetooth::types::BloodPressure;
use crate::error::DecodeError;

fn require(data: &[u8], need: usize) -> Result<(), DecodeError> {
    if data.len() < need {
        Err(DecodeError::Truncated {
            need,
            got: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Decodes a Heart Rate Measurement (0x2A37) payload.
/// Bit 0 of the flags byte selects an 8-bit or 16-bit little-endian value
/// starting at offset 1.
pub fn decode_heart_rate(data: &[u8]) -> Result<u16, DecodeError> {
    require(data, 2)?;
    let flags = data[0];
    let is_16bit = flags & 0x01 != 0;

    if is_16bit {
        require(data, 3)?;
        Ok(u16::from_le_bytes([data[1], data[2]]))
    } else {
        Ok(u16::from(data[1]))
    }
}

/// Decodes a Temperature Measurement (0x2A1C) payload into degrees Celsius.
/// The value is an IEEE-11073 style triple: a signed 16-bit little-endian
/// mantissa at offset 1 scaled by a signed 8-bit decimal exponent at offset
/// 3. Bit 0 of the flags byte marks Fahrenheit, which is converted before
/// returning.
pub fn decode_temperature(data: &[u8]) -> Result<f32, DecodeError> {
    require(data, 4)?;
    let flags = data[0];
    let mantissa = i16::from_le_bytes([data[1], data[2]]);
    let exponent = data[3] as i8;
    let value = f32::from(mantissa) * 10f32.powi(i32::from(exponent));

    let is_fahrenheit = flags & 0x01 != 0;
    if is_fahrenheit {
        Ok((value - 32.0) * 5.0 / 9.0)
    } else {
        Ok(value)
    }
}

/// Decodes a Blood Pressure Measurement (0x2A35) payload.
/// Systolic and diastolic are read as 32-bit little-endian IEEE-754 floats
/// at offsets 1 and 3 respectively (the flags byte at offset 0 is not
/// consumed) and rounded to whole mmHg.
pub fn decode_blood_pressure(data: &[u8]) -> Result<BloodPressure, DecodeError> {
    require(data, 7)?;
    let systolic = f32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    let diastolic = f32::from_le_bytes([data[3], data[4], data[5], data[6]]);

    Ok(BloodPressure {
        systolic: systolic.round() as u16,
        diastolic: diastolic.round() as u16,
    })
}

/// Decodes a Battery Level (0x2A19) payload: a single unsigned byte holding
/// the charge percentage.
pub fn decode_battery_level(data: &[u8]) -> Result<u8, DecodeError> {
    require(data, 1)?;
    Ok(data[0])
}
