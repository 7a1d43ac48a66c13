#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
//! Representative sample selection for calibration and validation sets.
//!
//! Every selector takes a dense matrix of observations (rows) by features
//! (columns) and returns row indices in the original order. Distances are
//! Euclidean, or Mahalanobis through whitened principal component scores.

pub mod config;
pub mod distance;
pub mod duplex;
pub mod error;
pub mod group;
pub mod honigs;
pub mod kennard_stone;
pub mod kmeans;
pub mod matrix;
pub mod naes;
pub mod projection;
pub mod puchwein;
pub mod result;
pub mod shenk_west;

pub use config::{ConfigError, SelectionConfig};
pub use distance::{DistanceMatrix, Metric, NearestSelected, cross_distances, metric_space};
pub use duplex::{DuplexOptions, DuplexResult, duplex};
pub use error::SelectionError;
pub use group::GroupPartition;
pub use honigs::{HonigsOptions, HonigsResult, SignalType, honigs};
pub use kennard_stone::{KennardStoneOptions, kennard_stone};
pub use matrix::LabeledMatrix;
pub use naes::{CentroidPolicy, NaesOptions, NaesResult, naes};
pub use projection::{ComponentSpec, PcaOptions, Projection};
pub use puchwein::{PuchweinOptions, PuchweinPass, PuchweinResult, puchwein};
pub use result::SelectionResult;
pub use shenk_west::{ShenkWestOptions, ShenkWestResult, shenk_west};
