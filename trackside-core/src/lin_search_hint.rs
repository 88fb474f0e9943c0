use crate::imports::*;

/// Direction of travel along the track
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    #[default]
    Unk,
    Fwd,
    Bwd,
}

impl Dir {
    /// Direction implied by the sign of `delta`; zero is [Dir::Unk]
    pub fn from_delta(delta: si::Length) -> Self {
        if delta > si::Length::ZERO {
            Self::Fwd
        } else if delta < si::Length::ZERO {
            Self::Bwd
        } else {
            Self::Unk
        }
    }

    /// `+1`, `-1` or `0`
    pub fn sign(&self) -> i8 {
        match self {
            Self::Fwd => 1,
            Self::Bwd => -1,
            Self::Unk => 0,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Self::Fwd => Self::Bwd,
            Self::Bwd => Self::Fwd,
            Self::Unk => Self::Unk,
        }
    }
}

/// Has method that returns offset along the track
pub trait GetOffset {
    /// Returns offset along the track
    fn get_offset(&self) -> si::Length;
}

/// Contains method to calculate the index of the entry owning `offset` (the last entry whose
/// offset is not past `offset`) given a previously calculated index, `idx`, and a direction.
pub trait LinSearchHint {
    /// # Arguments
    /// - `offset`: position along the track
    /// - `idx`: previously calculated index, used as the starting point of the search
    /// - `dir`: direction of travel since `idx` was calculated; [Dir::Unk] searches both ways
    fn calc_idx(&self, offset: si::Length, idx: usize, dir: &Dir) -> anyhow::Result<usize>;
}

impl<T: GetOffset> LinSearchHint for &[T] {
    fn calc_idx(&self, offset: si::Length, mut idx: usize, dir: &Dir) -> anyhow::Result<usize> {
        ensure!(!self.is_empty(), "{}\nCannot search an empty slice!", format_dbg!());
        ensure!(
            idx < self.len(),
            "{}\nStarting index {} out of bounds for length {}!",
            format_dbg!(),
            idx,
            self.len()
        );
        if dir != &Dir::Bwd {
            while idx + 1 < self.len() && self[idx + 1].get_offset() <= offset {
                idx += 1;
            }
        }
        if dir != &Dir::Fwd {
            while idx > 0 && offset < self[idx].get_offset() {
                idx -= 1;
            }
        }
        Ok(idx)
    }
}
