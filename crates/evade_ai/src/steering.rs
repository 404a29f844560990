//! Escape direction blending

use crate::error::{EvasionError, Result};
use crate::perception::ThreatRecord;
use evade_math::Vec3;

/// Blended vectors shorter than this are treated as "no preferred direction"
pub const DEGENERATE_EPSILON: f32 = 1e-5;

/// Direction to flee in, before obstacles are considered.
///
/// One threat: the unit vector from the threat to the agent. Several threats:
/// the sum of each unit flee vector weighted by `(R - d) / R`, so near threats
/// dominate. The blended sum is returned as is, not normalized; pass it through
/// [`preferred_direction`] before using it as a heading.
pub fn blend_escape_direction(
    agent_position: Vec3,
    records: &[ThreatRecord],
    awareness_radius: f32,
) -> Result<Vec3> {
    match records {
        [] => Err(EvasionError::NoThreats),
        [only] => Ok((agent_position - only.position()).normalize()),
        _ => Ok(records.iter().fold(Vec3::ZERO, |sum, record| {
            let flee = (agent_position - record.position()).normalize();
            let weight = (awareness_radius - record.distance) / awareness_radius;
            sum + flee * weight
        })),
    }
}

/// Normalize a blended escape vector into a heading.
///
/// Threats that cancel out (or a threat standing on the agent) leave nothing to
/// normalize; the flattened `fallback` is used instead, then +Z.
pub fn preferred_direction(blended: Vec3, fallback: Vec3) -> Vec3 {
    blended
        .try_normalize(DEGENERATE_EPSILON)
        .or_else(|| {
            log::debug!("Escape vector {} degenerate, falling back to {}", blended, fallback);
            fallback.flatten().try_normalize(DEGENERATE_EPSILON)
        })
        .unwrap_or(Vec3::Z)
}
