pub mod banner;
pub mod bounds_codec;
pub mod geo;
pub mod merge;
pub mod normalize;

pub use banner::{Banner, BannerId, Mission, Objective, Poi, PoiKind, Step};
pub use bounds_codec::DeepLink;
pub use geo::{GeoPoint, Viewport};
pub use merge::{extend_sorted, merge_banners};
pub use normalize::{QueryRect, decompose};
