//! Serializes matrices as nested row arrays and vectors as flat arrays, the shape the
//! telemetry consumers read.

use ndarray::{Array1, Array2};
use serde::Serializer;

pub fn serialize_rows<S: Serializer>(a: &Array2<f32>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(a.rows().into_iter().map(|row| row.to_vec()))
}

pub fn serialize_vec<S: Serializer>(a: &Array1<f32>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(a.iter())
}
