//! Fixed-width big-endian encodings of scalars and points, and the typed
//! encoder used to build every tagged-hash input.
//!
//! Coordinates are always 32 bytes, zero-padded. The point at infinity has no
//! affine coordinates; it encodes as 32 zero bytes for both x and y so that
//! every encoder here is total. Operations that must never see the identity
//! reject it before anything is encoded.

use crate::errors::{MuSigError, Result};
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};

/// Width of one coordinate or scalar encoding.
pub const ENCODED_LEN: usize = 32;

fn coordinates(point: &ProjectivePoint) -> ([u8; ENCODED_LEN], [u8; ENCODED_LEN]) {
    let encoded = point.to_affine().to_encoded_point(false);
    let mut x = [0u8; ENCODED_LEN];
    let mut y = [0u8; ENCODED_LEN];
    if let (Some(ex), Some(ey)) = (encoded.x(), encoded.y()) {
        x.copy_from_slice(ex);
        y.copy_from_slice(ey);
    }
    (x, y)
}

pub fn encode_x(point: &ProjectivePoint) -> [u8; ENCODED_LEN] {
    coordinates(point).0
}

pub fn encode_y(point: &ProjectivePoint) -> [u8; ENCODED_LEN] {
    coordinates(point).1
}

/// x || y, 64 bytes.
pub fn encode_point(point: &ProjectivePoint) -> [u8; 2 * ENCODED_LEN] {
    let (x, y) = coordinates(point);
    let mut out = [0u8; 2 * ENCODED_LEN];
    out[..ENCODED_LEN].copy_from_slice(&x);
    out[ENCODED_LEN..].copy_from_slice(&y);
    out
}

pub fn encode_scalar(scalar: &Scalar) -> [u8; ENCODED_LEN] {
    let mut out = [0u8; ENCODED_LEN];
    out.copy_from_slice(&scalar.to_bytes());
    out
}

/// Decodes an affine point from its big-endian coordinates.
///
/// Fails with [`MuSigError::InvalidPoint`] if `(x, y)` is not on the curve.
pub fn decode_point(x: &[u8; ENCODED_LEN], y: &[u8; ENCODED_LEN]) -> Result<ProjectivePoint> {
    let encoded = EncodedPoint::from_affine_coordinates(
        &FieldBytes::from(*x),
        &FieldBytes::from(*y),
        false,
    );
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .map(ProjectivePoint::from)
        .ok_or(MuSigError::InvalidPoint)
}

/// Decodes a canonical scalar. Values `>= n` are rejected, not reduced.
pub fn decode_scalar(bytes: &[u8; ENCODED_LEN]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))
        .ok_or(MuSigError::InvalidScalar)
}

/// One element of a tagged-hash input. Each variant has exactly one encoding.
#[derive(Clone, Copy, Debug)]
pub enum HashInput<'a> {
    /// 32-byte big-endian scalar.
    Scalar(&'a Scalar),
    /// x || y.
    Point(&'a ProjectivePoint),
    /// x only.
    XCoordinate(&'a ProjectivePoint),
    /// Raw bytes, no length prefix.
    Bytes(&'a [u8]),
}

impl HashInput<'_> {
    fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            HashInput::Scalar(s) => buf.extend_from_slice(&encode_scalar(s)),
            HashInput::Point(p) => buf.extend_from_slice(&encode_point(p)),
            HashInput::XCoordinate(p) => buf.extend_from_slice(&encode_x(p)),
            HashInput::Bytes(b) => buf.extend_from_slice(b),
        }
    }
}

/// Concatenates the encodings of `inputs` in order.
pub fn encode_inputs(inputs: &[HashInput<'_>]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(inputs.len() * 2 * ENCODED_LEN);
    for input in inputs {
        input.write_to(&mut buf);
    }
    buf
}

/// Serializes a `ProjectivePoint` field through its affine form.
pub(crate) mod point_serde {
    use k256::{AffinePoint, ProjectivePoint};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(point: &ProjectivePoint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        point.to_affine().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ProjectivePoint, D::Error>
    where
        D: Deserializer<'de>,
    {
        AffinePoint::deserialize(deserializer).map(ProjectivePoint::from)
    }
}

/// Same as [`point_serde`] for a sequence of points.
pub(crate) mod points_serde {
    use k256::{AffinePoint, ProjectivePoint};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(points: &[ProjectivePoint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let affine: Vec<AffinePoint> = points.iter().map(ProjectivePoint::to_affine).collect();
        affine.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<ProjectivePoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let affine = Vec::<AffinePoint>::deserialize(deserializer)?;
        Ok(affine.into_iter().map(ProjectivePoint::from).collect())
    }
}
