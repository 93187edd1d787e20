//! Port state values.
//!
//! A state is an immutable value carried by a port. Every kind supports
//! blending (`mix`) and a relative distance (`max_residual`); combining two
//! different kinds is a `StateError::KindMismatch`.

use std::fmt;

use nalgebra::DVector;
use tn_core::units::{MassRate, Power, Pressure, Temperature};
use tn_core::{Real, k, kgps, lerp, max_nan, pa, relative_residual, w};

use crate::error::StateError;

/// Discriminant of a [`PortState`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Scalar,
    Vector,
    Power,
    MassRate,
    Gas,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateKind::Scalar => "scalar",
            StateKind::Vector => "vector",
            StateKind::Power => "power",
            StateKind::MassRate => "mass rate",
            StateKind::Gas => "gas",
        };
        f.write_str(s)
    }
}

/// Stagnation parameters of a gas stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasState {
    pub temperature: Temperature,
    pub pressure: Pressure,
    pub mass_rate: MassRate,
}

impl GasState {
    /// Build from SI values (K, Pa, kg/s).
    pub fn new(temperature_k: Real, pressure_pa: Real, mass_rate_kgps: Real) -> Self {
        Self {
            temperature: k(temperature_k),
            pressure: pa(pressure_pa),
            mass_rate: kgps(mass_rate_kgps),
        }
    }

    fn mix(&self, other: &GasState, relax: Real) -> GasState {
        GasState::new(
            lerp(self.temperature.value, other.temperature.value, relax),
            lerp(self.pressure.value, other.pressure.value, relax),
            lerp(self.mass_rate.value, other.mass_rate.value, relax),
        )
    }

    fn max_residual(&self, other: &GasState) -> Real {
        let t = relative_residual(self.temperature.value, other.temperature.value);
        let p = relative_residual(self.pressure.value, other.pressure.value);
        let m = relative_residual(self.mass_rate.value, other.mass_rate.value);
        max_nan(max_nan(t, p), m)
    }
}

/// Value carried by a port.
#[derive(Debug, Clone, PartialEq)]
pub enum PortState {
    Scalar(Real),
    Vector(DVector<Real>),
    Power(Power),
    MassRate(MassRate),
    Gas(GasState),
}

impl PortState {
    pub fn scalar(v: Real) -> Self {
        PortState::Scalar(v)
    }

    pub fn vector(values: impl IntoIterator<Item = Real>) -> Self {
        PortState::Vector(DVector::from_vec(values.into_iter().collect()))
    }

    pub fn power(watts: Real) -> Self {
        PortState::Power(w(watts))
    }

    pub fn mass_rate(kg_per_s: Real) -> Self {
        PortState::MassRate(kgps(kg_per_s))
    }

    pub fn gas(temperature_k: Real, pressure_pa: Real, mass_rate_kgps: Real) -> Self {
        PortState::Gas(GasState::new(temperature_k, pressure_pa, mass_rate_kgps))
    }

    pub fn kind(&self) -> StateKind {
        match self {
            PortState::Scalar(_) => StateKind::Scalar,
            PortState::Vector(_) => StateKind::Vector,
            PortState::Power(_) => StateKind::Power,
            PortState::MassRate(_) => StateKind::MassRate,
            PortState::Gas(_) => StateKind::Gas,
        }
    }

    /// Blend toward `other`: `relax = 0` keeps `self`, `relax = 1` yields `other`.
    pub fn mix(&self, other: &PortState, relax: Real) -> Result<PortState, StateError> {
        match (self, other) {
            (PortState::Scalar(a), PortState::Scalar(b)) => Ok(PortState::Scalar(lerp(*a, *b, relax))),
            (PortState::Vector(a), PortState::Vector(b)) => {
                check_dims(a, b)?;
                Ok(PortState::Vector(a.zip_map(b, |x, y| lerp(x, y, relax))))
            }
            (PortState::Power(a), PortState::Power(b)) => {
                Ok(PortState::Power(w(lerp(a.value, b.value, relax))))
            }
            (PortState::MassRate(a), PortState::MassRate(b)) => {
                Ok(PortState::MassRate(kgps(lerp(a.value, b.value, relax))))
            }
            (PortState::Gas(a), PortState::Gas(b)) => Ok(PortState::Gas(a.mix(b, relax))),
            _ => Err(self.mismatch(other)),
        }
    }

    /// Largest relative change from `self` (the earlier value) to `other`.
    pub fn max_residual(&self, other: &PortState) -> Result<Real, StateError> {
        match (self, other) {
            (PortState::Scalar(a), PortState::Scalar(b)) => Ok(relative_residual(*a, *b)),
            (PortState::Vector(a), PortState::Vector(b)) => {
                check_dims(a, b)?;
                Ok(a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| relative_residual(*x, *y))
                    .fold(0.0, max_nan))
            }
            (PortState::Power(a), PortState::Power(b)) => Ok(relative_residual(a.value, b.value)),
            (PortState::MassRate(a), PortState::MassRate(b)) => {
                Ok(relative_residual(a.value, b.value))
            }
            (PortState::Gas(a), PortState::Gas(b)) => Ok(a.max_residual(b)),
            _ => Err(self.mismatch(other)),
        }
    }

    /// Numeric value of scalar-like kinds, in SI base units.
    pub fn as_scalar(&self) -> Result<Real, StateError> {
        match self {
            PortState::Scalar(v) => Ok(*v),
            PortState::Power(p) => Ok(p.value),
            PortState::MassRate(m) => Ok(m.value),
            other => Err(StateError::KindMismatch {
                expected: StateKind::Scalar,
                found: other.kind(),
            }),
        }
    }

    pub fn as_vector(&self) -> Result<&DVector<Real>, StateError> {
        match self {
            PortState::Vector(v) => Ok(v),
            other => Err(StateError::KindMismatch {
                expected: StateKind::Vector,
                found: other.kind(),
            }),
        }
    }

    pub fn as_gas(&self) -> Result<&GasState, StateError> {
        match self {
            PortState::Gas(g) => Ok(g),
            other => Err(StateError::KindMismatch {
                expected: StateKind::Gas,
                found: other.kind(),
            }),
        }
    }

    fn mismatch(&self, other: &PortState) -> StateError {
        StateError::KindMismatch {
            expected: self.kind(),
            found: other.kind(),
        }
    }
}

fn check_dims(a: &DVector<Real>, b: &DVector<Real>) -> Result<(), StateError> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(StateError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        })
    }
}
