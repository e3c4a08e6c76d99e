//! Latitude/longitude normal compression
//!
//! A normal is stored as two angles quantized to a byte each, `0..=255`
//! mapping onto `0..2π`. Latitude is the azimuth around Z, longitude the
//! angle from +Z.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::f32::consts::TAU;

use glam::Vec3;
use serde::Serialize;

const STEP: f32 = TAU / 255.0;

/// A compressed unit normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PackedNormal {
    pub lat: u8,
    pub lng: u8,
}

impl PackedNormal {
    /// Split the stored 16-bit value: high byte latitude, low byte longitude.
    pub fn from_u16(packed: u16) -> Self {
        let [lng, lat] = packed.to_le_bytes();
        Self { lat, lng }
    }

    pub fn to_u16(self) -> u16 {
        u16::from_le_bytes([self.lng, self.lat])
    }

    /// Expand to a unit vector.
    pub fn decode(self) -> Vec3 {
        let lat = f32::from(self.lat) * STEP;
        let lng = f32::from(self.lng) * STEP;
        Vec3::new(lat.cos() * lng.sin(), lat.sin() * lng.sin(), lng.cos())
    }

    /// Quantize a direction. Zero-length input encodes as +Z.
    pub fn encode(normal: Vec3) -> Self {
        let n = normal.normalize_or_zero();
        if n == Vec3::ZERO {
            return Self::default();
        }
        if n.x == 0.0 && n.y == 0.0 {
            // Poles: the azimuth is meaningless
            return if n.z > 0.0 {
                Self { lat: 0, lng: 0 }
            } else {
                Self { lat: 0, lng: 128 }
            };
        }

        let azimuth = n.y.atan2(n.x).rem_euclid(TAU);
        let polar = n.z.clamp(-1.0, 1.0).acos();
        Self {
            lat: quantize(azimuth),
            lng: quantize(polar),
        }
    }
}

fn quantize(angle: f32) -> u8 {
    ((angle / STEP).round() as u32 % 256) as u8
}
