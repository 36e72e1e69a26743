//! Mapping tensor axes onto image width, height and channels.
//!
//! A [`RoleSpec`] names, for each of width, height and channels, the tensor
//! axis that carries it. `"102"` on a `[H, W, C]` tensor reads width from
//! axis 1, height from axis 0 and channels from axis 2. Any role pointing
//! past the tensor's rank resolves to 1.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result, Shape};

/// Character appended to short role specs; it decodes to an axis index no
/// real tensor reaches.
pub const ROLE_FILLER: char = 'z';

const OUT_OF_RANGE: usize = 99;

/// Axis indices for the (width, height, channels) roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleSpec {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl RoleSpec {
    pub const fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Parses up to three digits; missing trailing roles are filled with
    /// [`ROLE_FILLER`], which may also be written explicitly.
    pub fn parse(raw: &str) -> Result<Self> {
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() > 3 {
            return Err(Error::invalid_argument(format!(
                "role spec {raw:?} has more than 3 characters"
            )));
        }

        let mut slots = [0usize; 3];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = match chars.get(i) {
                Some(&c) => decode_role(c).ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "role spec {raw:?} has non-digit character {c:?} at position {i}"
                    ))
                })?,
                None => filler_index(),
            };
        }

        Ok(Self::new(slots[0], slots[1], slots[2]))
    }
}

impl FromStr for RoleSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn decode_role(c: char) -> Option<usize> {
    if c == ROLE_FILLER {
        return Some(filler_index());
    }
    c.to_digit(10).map(|d| d as usize)
}

fn filler_index() -> usize {
    ROLE_FILLER as usize - '0' as usize
}

/// Image extent derived from a tensor shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageDims {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl ImageDims {
    pub const fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }
}

impl fmt::Display for ImageDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// Resolves the image extent of `shape` under `roles`.
///
/// When the rank is below 3 the role indices are rewritten before lookup:
///
/// | rank | width | height | channels |
/// |------|-------|--------|----------|
/// | ≥ 3  | as given | as given | as given |
/// | 2, height > width | 0 | 1 | 1 |
/// | 2, otherwise | 1 | 0 | 1 |
/// | 1    | 1 | as given | as given |
/// | 0    | 1 | 1 | 1 |
pub fn map_tensor_to_image_dims(shape: &Shape, roles: RoleSpec) -> ImageDims {
    let rank = shape.rank();
    let roles = match rank {
        1 => RoleSpec {
            width: OUT_OF_RANGE,
            ..roles
        },
        2 if roles.height > roles.width => RoleSpec::new(0, 1, OUT_OF_RANGE),
        2 => RoleSpec::new(1, 0, OUT_OF_RANGE),
        _ => roles,
    };

    let size = |axis: usize| shape.dim(axis).unwrap_or(1);
    ImageDims::new(size(roles.width), size(roles.height), size(roles.channels))
}

/// [`map_tensor_to_image_dims`] for a role spec given as text.
pub fn map_tensor_to_image_dims_str(shape: &Shape, roles: &str) -> Result<ImageDims> {
    Ok(map_tensor_to_image_dims(shape, RoleSpec::parse(roles)?))
}

/// Reads `[N?, H, W, C]` shapes, with `N` present when `includes_batch`.
pub fn image_dims_for_shape(shape: &Shape, includes_batch: bool) -> ImageDims {
    let offset = usize::from(includes_batch);
    let size = |axis: usize| shape.dim(axis + offset).unwrap_or(1);
    ImageDims::new(size(1), size(0), size(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(d: &[usize]) -> Shape {
        Shape::from_slice(d)
    }

    #[test]
    fn parse_pads_short_specs() {
        assert_eq!(RoleSpec::parse("120").unwrap(), RoleSpec::new(1, 2, 0));
        assert_eq!(RoleSpec::parse("10").unwrap(), RoleSpec::new(1, 0, 74));
        assert_eq!(RoleSpec::parse("").unwrap(), RoleSpec::new(74, 74, 74));
        assert_eq!(RoleSpec::parse("1z").unwrap(), RoleSpec::parse("1").unwrap());
    }

    #[test]
    fn parse_rejects_bad_characters() {
        assert!(RoleSpec::parse("1a0").unwrap_err().is_invalid_argument());
        assert!(RoleSpec::parse("xyz").unwrap_err().is_invalid_argument());
        assert!(RoleSpec::parse("1Z").unwrap_err().is_invalid_argument());
        assert!(RoleSpec::parse("0123").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn rank_three_and_up_uses_literal_axes() {
        let roles = RoleSpec::parse("012").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&shape(&[4, 5, 6]), roles),
            ImageDims::new(4, 5, 6)
        );
        assert_eq!(
            map_tensor_to_image_dims(&shape(&[4, 5, 6, 7, 8]), roles),
            ImageDims::new(4, 5, 6)
        );

        let hwc = RoleSpec::parse("120").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&shape(&[480, 640, 3]), hwc),
            ImageDims::new(640, 3, 480)
        );
    }

    #[test]
    fn rank_three_with_axis_past_rank_defaults_to_one() {
        let roles = RoleSpec::parse("129").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&shape(&[2, 3, 4]), roles),
            ImageDims::new(3, 4, 1)
        );
    }

    #[test]
    fn rank_two_orders_by_role_magnitude() {
        let hw = shape(&[480, 640]);

        // height index above width index: width from axis 0
        let roles = RoleSpec::parse("01").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&hw, roles),
            ImageDims::new(480, 640, 1)
        );

        let roles = RoleSpec::parse("10").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&hw, roles),
            ImageDims::new(640, 480, 1)
        );

        // equal indices fall in the "otherwise" branch
        let roles = RoleSpec::parse("22").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&hw, roles),
            ImageDims::new(640, 480, 1)
        );

        // a padded height (74) is above any width digit
        let roles = RoleSpec::parse("5").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&hw, roles),
            ImageDims::new(480, 640, 1)
        );
    }

    #[test]
    fn rank_one_forces_width_to_one() {
        let v = shape(&[1000]);
        assert_eq!(
            map_tensor_to_image_dims(&v, RoleSpec::parse("012").unwrap()),
            ImageDims::new(1, 1, 1)
        );
        assert_eq!(
            map_tensor_to_image_dims(&v, RoleSpec::parse("").unwrap()),
            ImageDims::new(1, 1, 1)
        );
        // height keeps its decoded index and can still land on axis 0
        assert_eq!(
            map_tensor_to_image_dims(&v, RoleSpec::parse("10").unwrap()),
            ImageDims::new(1, 1000, 1)
        );
        assert_eq!(
            map_tensor_to_image_dims(&v, RoleSpec::parse("110").unwrap()),
            ImageDims::new(1, 1, 1000)
        );
    }

    #[test]
    fn rank_zero_is_all_ones() {
        assert_eq!(
            map_tensor_to_image_dims(&shape(&[]), RoleSpec::parse("012").unwrap()),
            ImageDims::new(1, 1, 1)
        );
    }

    #[test]
    fn mapping_is_repeatable() {
        let s = shape(&[7, 9]);
        let roles = RoleSpec::parse("10").unwrap();
        assert_eq!(
            map_tensor_to_image_dims(&s, roles),
            map_tensor_to_image_dims(&s, roles)
        );
    }

    #[test]
    fn string_form_surfaces_parse_errors() {
        let s = shape(&[2, 3, 4]);
        assert_eq!(
            map_tensor_to_image_dims_str(&s, "210").unwrap(),
            ImageDims::new(4, 3, 2)
        );
        assert!(map_tensor_to_image_dims_str(&s, "2-0").is_err());
    }

    #[test]
    fn fixed_layout_with_and_without_batch() {
        assert_eq!(
            image_dims_for_shape(&shape(&[1, 224, 320, 3]), true),
            ImageDims::new(320, 224, 3)
        );
        assert_eq!(
            image_dims_for_shape(&shape(&[224, 320, 3]), false),
            ImageDims::new(320, 224, 3)
        );
        assert_eq!(
            image_dims_for_shape(&shape(&[8, 10]), true),
            ImageDims::new(1, 10, 1)
        );
        assert_eq!(
            image_dims_for_shape(&shape(&[]), false),
            ImageDims::new(1, 1, 1)
        );
    }
}
