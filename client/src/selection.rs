//! Banner selection as a pure state machine.
//!
//! Selecting a banner freezes the viewport the user was looking at until the
//! banner's detail arrives, so the list does not reshuffle under them while
//! the fetch is in flight. A banner that was already selected stays selected
//! and pinned until the new detail lands.

use banner_map_shared::{BannerId, Viewport};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Initial,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Loading {
        banner_id: BannerId,
        previous: Option<BannerId>,
        frozen_viewport: Viewport,
    },
    Ready {
        banner_id: BannerId,
        frozen_viewport: Viewport,
    },
    /// The last detail fetch failed; nothing is selected.
    Failed,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    FetchDetail(BannerId),
    Cleared,
}

impl Selection {
    /// Click on a banner in the list or on the map.
    pub fn select(&self, banner_id: BannerId, live_viewport: Viewport) -> (Self, Effect) {
        match *self {
            Self::Ready { banner_id: current, .. } if current == banner_id => {
                (Self::Idle, Effect::Cleared)
            }
            Self::Loading { banner_id: pending, .. } if pending == banner_id => (*self, Effect::None),
            _ => (
                Self::Loading {
                    banner_id,
                    previous: self.selected_banner_id(),
                    frozen_viewport: live_viewport,
                },
                Effect::FetchDetail(banner_id),
            ),
        }
    }

    pub fn deselect(&self) -> (Self, Effect) {
        match self {
            Self::Idle => (Self::Idle, Effect::None),
            _ => (Self::Idle, Effect::Cleared),
        }
    }

    /// Apply the outcome of the detail fetch for `banner_id`. Outcomes for any
    /// other banner leave the state untouched.
    pub fn resolve(&self, banner_id: BannerId, succeeded: bool) -> Self {
        match *self {
            Self::Loading {
                banner_id: pending,
                frozen_viewport,
                ..
            } if pending == banner_id => {
                if succeeded {
                    Self::Ready {
                        banner_id,
                        frozen_viewport,
                    }
                } else {
                    Self::Failed
                }
            }
            _ => *self,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Idle => Status::Initial,
            Self::Loading { .. } => Status::Loading,
            Self::Ready { .. } => Status::Ready,
            Self::Failed => Status::Error,
        }
    }

    /// The banner shown as selected. While a new detail is loading this is
    /// still the previous selection, if any.
    pub fn selected_banner_id(&self) -> Option<BannerId> {
        match self {
            Self::Ready { banner_id, .. } => Some(*banner_id),
            Self::Loading { previous, .. } => *previous,
            _ => None,
        }
    }

    pub fn frozen_viewport(&self) -> Option<Viewport> {
        match self {
            Self::Loading {
                frozen_viewport, ..
            }
            | Self::Ready {
                frozen_viewport, ..
            } => Some(*frozen_viewport),
            _ => None,
        }
    }

    /// Viewport the aggregator should query: the frozen one while a detail
    /// fetch is pending, the live one otherwise.
    pub fn aggregation_viewport(&self, live_viewport: Viewport) -> Viewport {
        match self {
            Self::Loading {
                frozen_viewport, ..
            } => *frozen_viewport,
            _ => live_viewport,
        }
    }

    /// Banner that must stay in the list regardless of the viewport.
    pub fn pinned_banner(&self) -> Option<BannerId> {
        self.selected_banner_id()
    }
}
