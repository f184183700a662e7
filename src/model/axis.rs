//! Axis roles and the descriptor that assigns them.

use serde::{Deserialize, Serialize};

use crate::error::ArrayError;

/// Largest number of collection axes a descriptor may declare.
pub const MAX_COLLECTION_AXES: usize = 2;

/// Largest number of datum axes a descriptor may declare.
pub const MAX_DATUM_AXES: usize = 2;

/// Semantic role of one axis of a logical array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisRole {
    /// Repeated measurements (time series, frame stack)
    Sequence,
    /// Indexes related datum arrays (e.g. scan position)
    Collection,
    /// Spans the measured data itself
    Datum,
}

/// Assignment of roles to the axes of an array.
///
/// Axes are always in the logical order `(sequence?)(collection...)(datum...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisDescriptor {
    is_sequence: bool,
    collection_axis_count: usize,
    datum_axis_count: usize,
}

impl AxisDescriptor {
    /// Create a descriptor, validating the axis counts.
    ///
    /// `collection_axis_count` must be in `0..=2` and `datum_axis_count` in `1..=2`.
    pub fn new(
        is_sequence: bool,
        collection_axis_count: usize,
        datum_axis_count: usize,
    ) -> Result<Self, ArrayError> {
        if collection_axis_count > MAX_COLLECTION_AXES
            || datum_axis_count == 0
            || datum_axis_count > MAX_DATUM_AXES
        {
            return Err(ArrayError::InvalidDescriptor {
                collection: collection_axis_count,
                datum: datum_axis_count,
            });
        }
        Ok(Self {
            is_sequence,
            collection_axis_count,
            datum_axis_count,
        })
    }

    /// Default descriptor for an array of the given rank, if one exists.
    ///
    /// 1D is a single datum axis, 2D an image and 3D a sequence of images.
    pub fn default_for_rank(ndim: usize) -> Option<Self> {
        match ndim {
            1 => Some(Self::datum(1)),
            2 => Some(Self::datum(2)),
            3 => Some(Self {
                is_sequence: true,
                collection_axis_count: 0,
                datum_axis_count: 2,
            }),
            _ => None,
        }
    }

    /// Descriptor for `count` datum axes and nothing else.
    fn datum(count: usize) -> Self {
        Self {
            is_sequence: false,
            collection_axis_count: 0,
            datum_axis_count: count,
        }
    }

    #[inline]
    pub fn is_sequence(&self) -> bool {
        self.is_sequence
    }

    #[inline]
    pub fn collection_axis_count(&self) -> usize {
        self.collection_axis_count
    }

    #[inline]
    pub fn datum_axis_count(&self) -> usize {
        self.datum_axis_count
    }

    /// Total number of axes described.
    pub fn axis_count(&self) -> usize {
        usize::from(self.is_sequence) + self.collection_axis_count + self.datum_axis_count
    }

    /// Index of the first collection axis (0 or 1).
    #[inline]
    pub fn collection_start(&self) -> usize {
        usize::from(self.is_sequence)
    }

    /// Index of the first datum axis.
    #[inline]
    pub fn datum_start(&self) -> usize {
        self.collection_start() + self.collection_axis_count
    }

    /// Per-axis roles in logical order.
    pub fn roles(&self) -> Vec<AxisRole> {
        let mut roles = Vec::with_capacity(self.axis_count());
        if self.is_sequence {
            roles.push(AxisRole::Sequence);
        }
        roles.extend(std::iter::repeat(AxisRole::Collection).take(self.collection_axis_count));
        roles.extend(std::iter::repeat(AxisRole::Datum).take(self.datum_axis_count));
        roles
    }
}

impl std::fmt::Display for AxisDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.is_sequence, self.collection_axis_count, self.datum_axis_count
        )
    }
}
