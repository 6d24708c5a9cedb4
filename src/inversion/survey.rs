use crate::assembly::Source;
use crate::field::{FieldSolution, Receiver};
use crate::grid::Point2D;
use axires_traits::Real;
use nalgebra::Scalar;
use serde::{Deserialize, Serialize};

/// Plan position of an electrode on the ground surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint<T> {
    pub x: T,
    pub y: T,
}

impl<T> SurfacePoint<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Real> SurfacePoint<T> {
    pub fn distance(&self, other: &Self) -> T {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A measuring dipole `M`-`N` on the ground surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceReceiver<T> {
    pub m: SurfacePoint<T>,
    pub n: SurfacePoint<T>,
}

impl<T> SurfaceReceiver<T> {
    pub fn new(m: SurfacePoint<T>, n: SurfacePoint<T>) -> Self {
        Self { m, n }
    }
}

/// Electrode positions and measuring dipoles of a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Survey<T> {
    /// Electrodes in the `(r, z)` half-plane, loaded together into a single solve. Every
    /// measurement is `u(M) - u(N)` of that solve.
    Axial {
        positive: Point2D<T>,
        negative: Option<Point2D<T>>,
        receivers: Vec<Receiver<T>>,
    },
    /// A four-electrode `AB`-`MN` array laid out on the ground surface.
    ///
    /// A single pole is solved on the axis at `z = 0`. With `u(d)` the surface potential at
    /// distance `d` from the pole, a measurement is
    /// `[u(|AM|) - u(|AN|)] - [u(|BM|) - u(|BN|)]`, where the bracket of `B` is absent for a
    /// pole-dipole array.
    SurfaceArray {
        a: SurfacePoint<T>,
        b: Option<SurfacePoint<T>>,
        receivers: Vec<SurfaceReceiver<T>>,
    },
}

impl<T: Scalar> Survey<T> {
    pub fn new(positive: Point2D<T>, negative: Option<Point2D<T>>, receivers: Vec<Receiver<T>>) -> Self {
        Self::Axial {
            positive,
            negative,
            receivers,
        }
    }

    pub fn surface_array(
        a: SurfacePoint<T>,
        b: Option<SurfacePoint<T>>,
        receivers: Vec<SurfaceReceiver<T>>,
    ) -> Self {
        Self::SurfaceArray { a, b, receivers }
    }

    pub fn num_measurements(&self) -> usize {
        match self {
            Self::Axial { receivers, .. } => receivers.len(),
            Self::SurfaceArray { receivers, .. } => receivers.len(),
        }
    }
}

impl<T: Real> Survey<T> {
    /// The source injected into the forward problem for the given current.
    pub fn source(&self, current: T) -> Source<T> {
        match self {
            Self::Axial { positive, negative, .. } => Source {
                positive: *positive,
                negative: *negative,
                current,
            },
            Self::SurfaceArray { .. } => Source::pole(Point2D::new(T::zero(), T::zero()), current),
        }
    }

    /// Computes the `k`-th measurement from the solution of the survey's source.
    ///
    /// Panics if `k` is out of bounds.
    pub fn measure(&self, field: &FieldSolution<T>, k: usize) -> T {
        match self {
            Self::Axial { receivers, .. } => field.potential_difference(&receivers[k]),
            Self::SurfaceArray { a, b, receivers } => {
                let receiver = &receivers[k];
                let from_a = surface_difference(field, a, receiver);
                match b {
                    Some(b) => from_a - surface_difference(field, b, receiver),
                    None => from_a,
                }
            }
        }
    }
}

fn surface_difference<T: Real>(
    field: &FieldSolution<T>,
    electrode: &SurfacePoint<T>,
    receiver: &SurfaceReceiver<T>,
) -> T {
    let at_distance = |d: T| field.evaluate(&Point2D::new(d, T::zero()));
    at_distance(electrode.distance(&receiver.m)) - at_distance(electrode.distance(&receiver.n))
}
