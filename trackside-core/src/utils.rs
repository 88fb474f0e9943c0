use crate::imports::*;

/// Default tolerance used by [almost_eq] and [almost_eq_uom]
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Returns true if `val1` and `val2` are within a relative/absolute `epsilon`
/// of each other, depending on magnitude.
pub fn almost_eq(val1: f64, val2: f64, epsilon: Option<f64>) -> bool {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    ((val2 - val1) / (val1 + val2)).abs() < epsilon || (val2 - val1).abs() < epsilon
}

/// [almost_eq] for `uom` quantities, compared in base units
pub fn almost_eq_uom<D, U>(
    val1: &uom::si::Quantity<D, U, f64>,
    val2: &uom::si::Quantity<D, U, f64>,
    epsilon: Option<f64>,
) -> bool
where
    D: uom::si::Dimension + ?Sized,
    U: uom::si::Units<f64> + ?Sized,
{
    almost_eq(val1.value, val2.value, epsilon)
}

/// Component-wise [almost_eq] for vectors
pub fn almost_eq_vec(val1: DVec3, val2: DVec3, epsilon: Option<f64>) -> bool {
    almost_eq(val1.x, val2.x, epsilon)
        && almost_eq(val1.y, val2.y, epsilon)
        && almost_eq(val1.z, val2.z, epsilon)
}
