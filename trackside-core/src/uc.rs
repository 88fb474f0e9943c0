//! Unit constants for building quantities by multiplication, e.g. `50.0 * uc::M`

use crate::si;
use std::marker::PhantomData;

macro_rules! unit_const {
    ($($name: ident: $T: ty = $value: expr),+ $(,)?) => {
        $(
            pub const $name: $T = uom::si::Quantity {
                dimension: PhantomData,
                units: PhantomData,
                value: $value,
            };
        )+
    };
}

unit_const!(
    M: si::Length = 1.0,
    KM: si::Length = 1.0e3,
    S: si::Time = 1.0,
    MPS: si::Velocity = 1.0,
    KPH: si::Velocity = 1.0 / 3.6,
    RAD: si::Angle = 1.0,
    RADPS: si::AngularVelocity = 1.0,
    R: si::Ratio = 1.0,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::almost_eq_uom;

    #[test]
    fn test_unit_constants_match_uom_units() {
        assert_eq!(M, si::Length::new::<si::meter>(1.0));
        assert_eq!(KM, si::Length::new::<si::kilometer>(1.0));
        assert_eq!(S, si::Time::new::<si::second>(1.0));
        assert!(almost_eq_uom(
            &KPH,
            &si::Velocity::new::<si::kilometer_per_hour>(1.0),
            None
        ));
        assert_eq!(RADPS, si::AngularVelocity::new::<si::radian_per_second>(1.0));
        assert_eq!((2.0 * M) / (4.0 * S), 0.5 * MPS);
    }
}
