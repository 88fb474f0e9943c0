use super::track_event::TrackEvent;
use crate::imports::*;

/// How cant is blended from one element's value toward the next element's value
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CantInterpolation {
    #[default]
    Linear,
    /// Holds the element's own cant longer; the transition happens mostly near the
    /// end of the element
    BiasBackward,
    /// Takes on the next element's cant early; the transition happens mostly near
    /// the start of the element
    BiasForward,
}

impl CantInterpolation {
    /// Maps linear progress `t` in `[0, 1]` onto blend weight in `[0, 1]`
    pub fn blend(&self, t: f64) -> f64 {
        let mut t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => {}
            Self::BiasBackward => {
                t *= t;
                t = 1.0 - t * t;
                t = 1.0 - t * t;
            }
            Self::BiasForward => {
                t = 1.0 - t;
                t *= t;
                t = 1.0 - t * t;
                t *= t;
            }
        }
        t
    }
}

/// Local orthonormal frame in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub position: DVec3,
    pub direction: DVec3,
    pub up: DVec3,
    pub side: DVec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            direction: DVec3::Z,
            up: DVec3::Y,
            side: DVec3::X,
        }
    }
}

/// One span of constant curvature, cant and inaccuracy, anchored at
/// `starting_track_position` and extending to the next element's start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackElement {
    pub starting_track_position: si::Length,
    /// Signed radius; zero means straight.  Positive curves to the right.
    #[serde(default)]
    pub curve_radius: si::Length,
    #[serde(default)]
    pub curve_cant: si::Length,
    #[serde(default)]
    pub curve_cant_interpolation: CantInterpolation,
    /// Amplitude multiplier for the deterministic track irregularity noise
    #[serde(default)]
    pub inaccuracy: f64,
    #[serde(default = "default_adhesion_multiplier")]
    pub adhesion_multiplier: f64,
    /// Frame at `starting_track_position`
    #[serde(default)]
    pub frame: Frame,
    #[serde(default)]
    pub events: Vec<TrackEvent>,
}

fn default_adhesion_multiplier() -> f64 {
    1.0
}

impl TrackElement {
    /// Straight, level element with the default frame and no events
    pub fn new(starting_track_position: si::Length) -> Self {
        Self {
            starting_track_position,
            curve_radius: si::Length::ZERO,
            curve_cant: si::Length::ZERO,
            curve_cant_interpolation: CantInterpolation::default(),
            inaccuracy: 0.0,
            adhesion_multiplier: default_adhesion_multiplier(),
            frame: Frame::default(),
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: TrackEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_curve(mut self, radius: si::Length, cant: si::Length) -> Self {
        self.curve_radius = radius;
        self.curve_cant = cant;
        self
    }

    /// Frame at `delta` past the element start.  Straight elements interpolate along the
    /// element direction; curved elements follow a circular arc about the vertical axis.
    pub fn frame_at(&self, delta: si::Length) -> Frame {
        let db = delta.get::<si::meter>();
        if db == 0.0 {
            return self.frame;
        }
        let r = self.curve_radius.get::<si::meter>();
        if r == 0.0 {
            return Frame {
                position: self.frame.position + db * self.frame.direction,
                ..self.frame
            };
        }
        let dir = self.frame.direction;
        let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
        // grade as rise over horizontal run
        let p = if horizontal > 0.0 { dir.y / horizontal } else { 0.0 };
        let s = db / (1.0 + p * p).sqrt();
        let h = s * p;
        let b = s / r.abs();
        let f = 2.0 * r * r * (1.0 - b.cos());
        let c = db.signum() * f.max(0.0).sqrt();
        let a = 0.5 * r.signum() * b;

        let mut d = DVec3::new(dir.x, 0.0, dir.z).normalize_or_zero();
        d = rotate_about_y(d, a);
        let position = self.frame.position + DVec3::new(c * d.x, h, c * d.z);
        d = rotate_about_y(d, a);
        let direction = DVec3::new(d.x, p, d.z).normalize_or_zero();
        let side = rotate_about_y(self.frame.side, 2.0 * a);
        let up = direction.cross(side);
        Frame {
            position,
            direction,
            up,
            side,
        }
    }

    /// Cant at `delta` past the element start, blended toward `next`'s cant
    pub fn cant_at(&self, delta: si::Length, next: Option<&TrackElement>) -> si::Length {
        match next {
            Some(next) => {
                let span = next.starting_track_position - self.starting_track_position;
                let t = if span > si::Length::ZERO {
                    (delta / span).get::<si::ratio>()
                } else {
                    1.0
                };
                let t = self.curve_cant_interpolation.blend(t);
                self.curve_cant * (1.0 - t) + next.curve_cant * t
            }
            None => self.curve_cant,
        }
    }

    /// Deterministic lateral and vertical irregularity at `track_position`, as
    /// `(side, up)` displacements in meters.
    pub fn irregularity_at(&self, track_position: si::Length) -> (f64, f64) {
        let x = track_position.get::<si::meter>();
        let scale = 0.15 * self.inaccuracy;
        let f = 0.3121 * (0.9843 * x).sin()
            + 1.1217 * (0.1874 * x).sin()
            + 1.6421 * (0.1126 * x).sin()
            + 1.8421 * (0.2546 * x).sin();
        let g = 0.3495 * (0.8272 * x).sin() + 1.6321 * (0.2356 * x).sin();
        (f * scale, g * scale)
    }
}

impl GetOffset for TrackElement {
    fn get_offset(&self) -> si::Length {
        self.starting_track_position
    }
}

/// Rotates `v` by `angle` radians about the world up (Y) axis
pub(crate) fn rotate_about_y(v: DVec3, angle: f64) -> DVec3 {
    glam::DQuat::from_rotation_y(angle) * v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_frame() {
        let elem = TrackElement::new(100.0 * uc::M);
        let frame = elem.frame_at(25.0 * uc::M);
        assert!(utils::almost_eq_vec(frame.position, DVec3::new(0.0, 0.0, 25.0), None));
        assert_eq!(frame.direction, DVec3::Z);
        assert_eq!(elem.frame_at(si::Length::ZERO), elem.frame);
    }

    #[test]
    fn test_curved_frame_stays_on_circle() {
        let radius = 500.0;
        let elem = TrackElement::new(si::Length::ZERO).with_curve(radius * uc::M, si::Length::ZERO);
        // positive radius turns right, i.e. toward +X when heading +Z
        let center = DVec3::new(radius, 0.0, 0.0);
        for db in [10.0, 100.0, 400.0] {
            let frame = elem.frame_at(db * uc::M);
            assert!(almost_eq((frame.position - center).length(), radius, Some(1e-6)));
            assert!(almost_eq(frame.direction.length(), 1.0, Some(1e-9)));
            assert!(frame.direction.dot(frame.side).abs() < 1e-9);
            assert!(frame.up.y > 0.99);
        }
        // heading change equals arc angle
        let frame = elem.frame_at(100.0 * uc::M);
        let turned = frame.direction.angle_between(DVec3::Z);
        assert!(almost_eq(turned, 100.0 / radius, Some(1e-6)));
        assert!(frame.position.x > 0.0);
    }

    #[test]
    fn test_cant_blend() {
        let mut elem = TrackElement::new(si::Length::ZERO);
        elem.curve_cant = 0.0 * uc::M;
        let mut next = TrackElement::new(100.0 * uc::M);
        next.curve_cant = 0.1 * uc::M;
        let mid = elem.cant_at(50.0 * uc::M, Some(&next));
        assert!(almost_eq(mid.get::<si::meter>(), 0.05, None));
        assert_eq!(elem.cant_at(50.0 * uc::M, None), elem.curve_cant);

        assert_eq!(CantInterpolation::BiasBackward.blend(0.0), 0.0);
        assert_eq!(CantInterpolation::BiasForward.blend(1.0), 1.0);
        assert!(CantInterpolation::BiasBackward.blend(0.5) < 0.2);
        assert!(CantInterpolation::BiasForward.blend(0.5) > 0.8);
        assert!(CantInterpolation::BiasBackward.blend(0.9) > 0.5);
        assert!(CantInterpolation::BiasForward.blend(0.1) < 0.5);
    }

    #[test]
    fn test_irregularity_is_deterministic() {
        let mut elem = TrackElement::new(si::Length::ZERO);
        assert_eq!(elem.irregularity_at(12.0 * uc::M), (0.0, 0.0));
        elem.inaccuracy = 2.0;
        assert_eq!(
            elem.irregularity_at(12.0 * uc::M),
            elem.irregularity_at(12.0 * uc::M)
        );
        assert_ne!(elem.irregularity_at(12.0 * uc::M).0, 0.0);
    }
}
