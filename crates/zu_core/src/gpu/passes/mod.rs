//! The fixed chain of passes recorded every frame:
//! seed -> jump flood -> distance field -> radiance -> show.

mod distance;
mod jfa;
mod radiance;
mod seed;
mod show;

pub(crate) use distance::DistanceFieldPass;
pub(crate) use jfa::JfaPasses;
pub(crate) use radiance::RadiancePasses;
pub(crate) use seed::SeedPass;
pub(crate) use show::ShowPass;
