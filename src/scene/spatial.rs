//! Spatial relationships between a new layer and the existing scene.
//!
//! The analysis is what lets the language model place the next piece of
//! geometry relative to what it already built: for every prior layer it
//! reports either how deeply the new bounds penetrate it (shallowest axis)
//! or how far away it is (largest separating axis), plus center distances
//! and the nearest neighbor.

use serde::Serialize;

use crate::scene::bounds::{Aabb, Axis};
use crate::scene::layer::LayerMeta;

/// An axis together with a distance along it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisSeparation {
    pub axis: Axis,
    pub magnitude: f32,
}

/// Relationship of the new layer to one prior layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialRelation {
    pub id: String,
    pub description: String,
    pub overlaps: bool,
    /// Present when the boxes do not overlap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<AxisSeparation>,
    /// Present when the boxes overlap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penetration: Option<AxisSeparation>,
    pub center_distance: f32,
}

/// Relationships to every prior layer, in scene insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialAnalysis {
    pub relations: Vec<SpatialRelation>,
    /// Id of the prior layer with the smallest center distance; the
    /// earliest-inserted wins ties.
    pub nearest: String,
}

/// Analyzes `bounds` against prior layers. Absent when the scene is empty.
#[must_use]
pub fn analyze(bounds: &Aabb, prior: &[LayerMeta]) -> Option<SpatialAnalysis> {
    if prior.is_empty() {
        return None;
    }

    let mut relations = Vec::with_capacity(prior.len());
    let mut nearest: Option<(usize, f32)> = None;

    for (index, meta) in prior.iter().enumerate() {
        let center_distance = bounds.center_distance(&meta.bounds);
        let penetration = bounds.penetration(&meta.bounds);

        let relation = match penetration {
            Some((axis, magnitude)) => SpatialRelation {
                id: meta.id.clone(),
                description: meta.description.clone(),
                overlaps: true,
                gap: None,
                penetration: Some(AxisSeparation { axis, magnitude }),
                center_distance,
            },
            None => {
                let (axis, magnitude) = bounds.gap(&meta.bounds);
                SpatialRelation {
                    id: meta.id.clone(),
                    description: meta.description.clone(),
                    overlaps: false,
                    gap: Some(AxisSeparation { axis, magnitude }),
                    penetration: None,
                    center_distance,
                }
            }
        };
        relations.push(relation);

        // Strict comparison keeps the first of equally-near layers
        if nearest.is_none_or(|(_, best)| center_distance < best) {
            nearest = Some((index, center_distance));
        }
    }

    let nearest_id = prior[nearest?.0].id.clone();
    Some(SpatialAnalysis {
        relations,
        nearest: nearest_id,
    })
}
