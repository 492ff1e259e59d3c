use serde::{Deserialize, Serialize};

use crate::core::model::Detection;

/// How a row's confidence is derived from its member detections.
///
/// `Fixed` reports 1.0 for every row regardless of the detector scores,
/// which is what existing consumers of the row output expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowConfidence {
    #[default]
    Fixed,
    Min,
    Mean,
}

impl RowConfidence {
    pub fn score(&self, members: &[Detection]) -> f32 {
        if members.is_empty() {
            return 1.0;
        }
        let score = match self {
            RowConfidence::Fixed => return 1.0,
            RowConfidence::Min => members
                .iter()
                .map(|det| det.confidence)
                .fold(f32::INFINITY, f32::min),
            RowConfidence::Mean => {
                members.iter().map(|det| det.confidence).sum::<f32>() / members.len() as f32
            }
        };
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;

    fn det(confidence: f32) -> Detection {
        Detection::new("descripcion", "x", confidence, BBox::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn fixed_ignores_member_scores() {
        assert_eq!(RowConfidence::Fixed.score(&[det(0.2), det(0.4)]), 1.0);
    }

    #[test]
    fn aggregates_member_scores() {
        let members = [det(0.5), det(0.9)];
        assert_eq!(RowConfidence::Min.score(&members), 0.5);
        assert!((RowConfidence::Mean.score(&members) - 0.7).abs() < 1e-6);
    }
}
